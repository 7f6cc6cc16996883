use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use crate::{
    dao::models::{GameEntity, NewGame, NewPlayer, PlayerEntity, Tier},
    dto::validation::validate_not_blank,
};

/// Player as listed by the roster endpoints.
#[derive(Debug, Clone, Serialize, ToSchema, PartialEq, Eq)]
pub struct PlayerView {
    pub id: Uuid,
    pub name: String,
    pub regular: bool,
}

impl From<PlayerEntity> for PlayerView {
    fn from(player: PlayerEntity) -> Self {
        Self {
            id: player.id,
            name: player.name,
            regular: player.regular,
        }
    }
}

/// Game as listed by the roster endpoints.
#[derive(Debug, Clone, Serialize, ToSchema, PartialEq, Eq)]
pub struct GameView {
    pub id: Uuid,
    pub name: String,
    pub tier: Tier,
    pub hi_score_wins: bool,
    pub best_score: Option<String>,
}

impl From<GameEntity> for GameView {
    fn from(game: GameEntity) -> Self {
        Self {
            id: game.id,
            name: game.name,
            tier: game.tier,
            hi_score_wins: game.hi_score_wins,
            best_score: game.best_score,
        }
    }
}

/// Payload of `POST /players`.
#[derive(Debug, Deserialize, ToSchema, Validate)]
pub struct CreatePlayerRequest {
    #[validate(custom(function = "validate_not_blank"))]
    pub name: String,
    #[serde(default)]
    pub regular: bool,
}

impl From<CreatePlayerRequest> for NewPlayer {
    fn from(request: CreatePlayerRequest) -> Self {
        Self {
            name: request.name.trim().to_owned(),
            regular: request.regular,
        }
    }
}

/// Payload of `POST /games`.
#[derive(Debug, Deserialize, ToSchema, Validate)]
pub struct CreateGameRequest {
    #[validate(custom(function = "validate_not_blank"))]
    pub name: String,
    #[validate(required(message = "a tier must be selected"))]
    pub tier: Option<Tier>,
    #[serde(default)]
    pub hi_score_wins: bool,
}

impl CreateGameRequest {
    /// Normalize a validated request into a game record.
    pub fn into_new_game(self) -> Option<NewGame> {
        Some(NewGame {
            name: self.name.trim().to_owned(),
            tier: self.tier?,
            hi_score_wins: self.hi_score_wins,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blank_names_fail_validation() {
        let request: CreatePlayerRequest = serde_json::from_str(r#"{ "name": "  " }"#).unwrap();
        assert!(request.validate().is_err());

        let request: CreatePlayerRequest =
            serde_json::from_str(r#"{ "name": " Ann ", "regular": true }"#).unwrap();
        assert!(request.validate().is_ok());
        assert_eq!(NewPlayer::from(request).name, "Ann");
    }

    #[test]
    fn games_need_a_tier() {
        let request: CreateGameRequest = serde_json::from_str(r#"{ "name": "Azul" }"#).unwrap();
        let errors = request.validate().unwrap_err();
        assert!(errors.field_errors().contains_key("tier"));

        let request: CreateGameRequest =
            serde_json::from_str(r#"{ "name": "Azul", "tier": "light", "hi_score_wins": true }"#)
                .unwrap();
        assert!(request.validate().is_ok());
        let game = request.into_new_game().unwrap();
        assert_eq!(game.tier, Tier::Light);
        assert!(game.hi_score_wins);
    }
}
