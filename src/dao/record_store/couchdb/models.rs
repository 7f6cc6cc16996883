use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

use crate::dao::{
    models::{
        GameEntity, PlayEntity, PlayEntryEntity, PlayerEntity, Tier, from_unix_millis,
        to_unix_millis,
    },
    record_store::couchdb::error::CouchDaoError,
};

pub const PLAYER_PREFIX: &str = "player::";
pub const GAME_PREFIX: &str = "game::";
pub const PLAY_PREFIX: &str = "play::";
pub const END_SUFFIX: &str = "\u{ffff}";

#[derive(Debug, Deserialize)]
pub struct AllDocsResponse {
    pub rows: Vec<AllDocsRow>,
}

#[derive(Debug, Deserialize)]
pub struct AllDocsRow {
    pub id: String,
    #[serde(default)]
    pub doc: Option<Value>,
}

/// Page of results returned by a Mango `_find` query.
#[derive(Debug, Deserialize)]
pub struct FindResponse {
    pub docs: Vec<Value>,
    #[serde(default)]
    pub bookmark: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CouchPlayerDocument {
    #[serde(rename = "_id")]
    pub id: String,
    #[serde(rename = "_rev", skip_serializing_if = "Option::is_none")]
    pub rev: Option<String>,
    #[serde(flatten)]
    pub player: PlayerBody,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlayerBody {
    pub name: String,
    #[serde(default)]
    pub regular: bool,
}

impl From<PlayerEntity> for CouchPlayerDocument {
    fn from(player: PlayerEntity) -> Self {
        Self {
            id: doc_id(PLAYER_PREFIX, player.id),
            rev: None,
            player: PlayerBody {
                name: player.name,
                regular: player.regular,
            },
        }
    }
}

impl TryFrom<CouchPlayerDocument> for PlayerEntity {
    type Error = CouchDaoError;

    fn try_from(doc: CouchPlayerDocument) -> Result<Self, Self::Error> {
        Ok(Self {
            id: extract_uuid(&doc.id)?,
            name: doc.player.name,
            regular: doc.player.regular,
        })
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CouchGameDocument {
    #[serde(rename = "_id")]
    pub id: String,
    #[serde(rename = "_rev", skip_serializing_if = "Option::is_none")]
    pub rev: Option<String>,
    #[serde(flatten)]
    pub game: GameBody,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GameBody {
    pub name: String,
    #[serde(default)]
    pub tier: Tier,
    #[serde(default = "default_hi_score_wins")]
    pub hi_score_wins: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub best_score: Option<String>,
}

fn default_hi_score_wins() -> bool {
    true
}

impl From<GameEntity> for CouchGameDocument {
    fn from(game: GameEntity) -> Self {
        Self {
            id: doc_id(GAME_PREFIX, game.id),
            rev: None,
            game: GameBody {
                name: game.name,
                tier: game.tier,
                hi_score_wins: game.hi_score_wins,
                best_score: game.best_score,
            },
        }
    }
}

impl TryFrom<CouchGameDocument> for GameEntity {
    type Error = CouchDaoError;

    fn try_from(doc: CouchGameDocument) -> Result<Self, Self::Error> {
        Ok(Self {
            id: extract_uuid(&doc.id)?,
            name: doc.game.name,
            tier: doc.game.tier,
            hi_score_wins: doc.game.hi_score_wins,
            best_score: doc.game.best_score,
        })
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CouchPlayDocument {
    #[serde(rename = "_id")]
    pub id: String,
    #[serde(rename = "_rev", skip_serializing_if = "Option::is_none")]
    pub rev: Option<String>,
    #[serde(flatten)]
    pub play: PlayBody,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlayBody {
    pub game: Uuid,
    /// Milliseconds since the Unix epoch so Mango range selectors compare numerically.
    #[serde(rename = "dateTime")]
    pub date_time: i64,
    pub players: Vec<PlayEntryBody>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlayEntryBody {
    pub player: Uuid,
    pub rank: u32,
    #[serde(default)]
    pub score: Option<i64>,
    #[serde(default)]
    pub players_beaten: u32,
}

impl From<PlayEntity> for CouchPlayDocument {
    fn from(play: PlayEntity) -> Self {
        Self {
            id: doc_id(PLAY_PREFIX, play.id),
            rev: None,
            play: PlayBody {
                game: play.game_id,
                date_time: to_unix_millis(play.date_time),
                players: play
                    .entries
                    .into_iter()
                    .map(|entry| PlayEntryBody {
                        player: entry.player_id,
                        rank: entry.rank,
                        score: entry.score,
                        players_beaten: entry.players_beaten,
                    })
                    .collect(),
            },
        }
    }
}

impl TryFrom<CouchPlayDocument> for PlayEntity {
    type Error = CouchDaoError;

    fn try_from(doc: CouchPlayDocument) -> Result<Self, Self::Error> {
        let date_time =
            from_unix_millis(doc.play.date_time).map_err(|_| CouchDaoError::Malformed {
                doc_id: doc.id.clone(),
                reason: format!("timestamp {} is out of range", doc.play.date_time),
            })?;

        Ok(Self {
            id: extract_uuid(&doc.id)?,
            game_id: doc.play.game,
            date_time,
            entries: doc
                .play
                .players
                .into_iter()
                .map(|entry| PlayEntryEntity {
                    player_id: entry.player,
                    rank: entry.rank,
                    score: entry.score,
                    players_beaten: entry.players_beaten,
                })
                .collect(),
        })
    }
}

pub fn doc_id(prefix: &str, id: Uuid) -> String {
    format!("{}{}", prefix, id)
}

pub fn extract_uuid(doc_id: &str) -> Result<Uuid, CouchDaoError> {
    let (_, id) = doc_id
        .split_once("::")
        .ok_or_else(|| CouchDaoError::Malformed {
            doc_id: doc_id.to_string(),
            reason: "missing separator".into(),
        })?;

    Uuid::parse_str(id).map_err(|_| CouchDaoError::Malformed {
        doc_id: doc_id.to_string(),
        reason: "invalid UUID".into(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn play_document_round_trips_through_json_shape() {
        let game_id = Uuid::new_v4();
        let player_id = Uuid::new_v4();
        let play_id = Uuid::new_v4();
        let raw = json!({
            "_id": format!("play::{play_id}"),
            "_rev": "1-abc",
            "game": game_id,
            "dateTime": 1_700_000_000_000_i64,
            "players": [{ "player": player_id, "rank": 1, "score": null, "players_beaten": 2 }]
        });

        let doc: CouchPlayDocument = serde_json::from_value(raw).unwrap();
        let entity = PlayEntity::try_from(doc).unwrap();
        assert_eq!(entity.id, play_id);
        assert_eq!(entity.game_id, game_id);
        assert_eq!(entity.entries[0].players_beaten, 2);
        assert_eq!(to_unix_millis(entity.date_time), 1_700_000_000_000);
    }

    #[test]
    fn game_document_defaults_missing_fields() {
        let raw = json!({ "_id": format!("game::{}", Uuid::new_v4()), "name": "Brass" });
        let doc: CouchGameDocument = serde_json::from_value(raw).unwrap();
        let game = GameEntity::try_from(doc).unwrap();
        assert_eq!(game.tier, Tier::Other);
        assert!(game.hi_score_wins);
        assert!(game.best_score.is_none());
    }

    #[test]
    fn extract_uuid_rejects_malformed_ids() {
        assert!(matches!(
            extract_uuid("player-123"),
            Err(CouchDaoError::Malformed { reason, .. }) if reason == "missing separator"
        ));
        assert!(matches!(
            extract_uuid("player::nope"),
            Err(CouchDaoError::Malformed { reason, .. }) if reason == "invalid UUID"
        ));
    }
}
