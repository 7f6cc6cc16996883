use mongodb::bson::{DateTime, Document, doc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::dao::models::{
    GameEntity, PlayEntity, PlayEntryEntity, PlayerEntity, Tier, from_unix_millis, to_unix_millis,
};

use super::error::{MongoDaoError, MongoResult};

pub const PLAYER_COLLECTION: &str = "players";
pub const GAME_COLLECTION: &str = "games";
pub const PLAY_COLLECTION: &str = "plays";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MongoPlayerDocument {
    #[serde(rename = "_id")]
    id: String,
    name: String,
    #[serde(default)]
    regular: bool,
}

impl From<PlayerEntity> for MongoPlayerDocument {
    fn from(value: PlayerEntity) -> Self {
        Self {
            id: value.id.to_string(),
            name: value.name,
            regular: value.regular,
        }
    }
}

impl TryFrom<MongoPlayerDocument> for PlayerEntity {
    type Error = MongoDaoError;

    fn try_from(value: MongoPlayerDocument) -> MongoResult<Self> {
        Ok(Self {
            id: parse_id(PLAYER_COLLECTION, &value.id)?,
            name: value.name,
            regular: value.regular,
        })
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MongoGameDocument {
    #[serde(rename = "_id")]
    id: String,
    name: String,
    #[serde(default)]
    tier: Tier,
    #[serde(default = "default_hi_score_wins")]
    hi_score_wins: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    best_score: Option<String>,
}

fn default_hi_score_wins() -> bool {
    true
}

impl From<GameEntity> for MongoGameDocument {
    fn from(value: GameEntity) -> Self {
        Self {
            id: value.id.to_string(),
            name: value.name,
            tier: value.tier,
            hi_score_wins: value.hi_score_wins,
            best_score: value.best_score,
        }
    }
}

impl TryFrom<MongoGameDocument> for GameEntity {
    type Error = MongoDaoError;

    fn try_from(value: MongoGameDocument) -> MongoResult<Self> {
        Ok(Self {
            id: parse_id(GAME_COLLECTION, &value.id)?,
            name: value.name,
            tier: value.tier,
            hi_score_wins: value.hi_score_wins,
            best_score: value.best_score,
        })
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MongoPlayDocument {
    #[serde(rename = "_id")]
    id: String,
    game: String,
    #[serde(rename = "dateTime")]
    date_time: DateTime,
    players: Vec<MongoPlayEntry>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct MongoPlayEntry {
    player: String,
    rank: u32,
    #[serde(default)]
    score: Option<i64>,
    #[serde(default)]
    players_beaten: u32,
}

impl From<PlayEntity> for MongoPlayDocument {
    fn from(value: PlayEntity) -> Self {
        Self {
            id: value.id.to_string(),
            game: value.game_id.to_string(),
            date_time: DateTime::from_millis(to_unix_millis(value.date_time)),
            players: value
                .entries
                .into_iter()
                .map(|entry| MongoPlayEntry {
                    player: entry.player_id.to_string(),
                    rank: entry.rank,
                    score: entry.score,
                    players_beaten: entry.players_beaten,
                })
                .collect(),
        }
    }
}

impl TryFrom<MongoPlayDocument> for PlayEntity {
    type Error = MongoDaoError;

    fn try_from(value: MongoPlayDocument) -> MongoResult<Self> {
        let id = parse_id(PLAY_COLLECTION, &value.id)?;
        let millis = value.date_time.timestamp_millis();
        let date_time =
            from_unix_millis(millis).map_err(|_| MongoDaoError::InvalidTimestamp { id, millis })?;

        let entries = value
            .players
            .into_iter()
            .map(|entry| {
                Ok(PlayEntryEntity {
                    player_id: parse_id(PLAYER_COLLECTION, &entry.player)?,
                    rank: entry.rank,
                    score: entry.score,
                    players_beaten: entry.players_beaten,
                })
            })
            .collect::<MongoResult<Vec<_>>>()?;

        Ok(Self {
            id,
            game_id: parse_id(GAME_COLLECTION, &value.game)?,
            date_time,
            entries,
        })
    }
}

fn parse_id(collection: &'static str, raw: &str) -> MongoResult<Uuid> {
    Uuid::parse_str(raw).map_err(|_| MongoDaoError::InvalidId {
        collection,
        raw: raw.to_owned(),
    })
}

pub fn doc_id(id: Uuid) -> Document {
    doc! {"_id": id.to_string()}
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::macros::datetime;

    #[test]
    fn play_document_keeps_millisecond_timestamp() {
        let play = PlayEntity {
            id: Uuid::new_v4(),
            game_id: Uuid::new_v4(),
            date_time: datetime!(2025-03-14 19:30:00.250 UTC),
            entries: vec![PlayEntryEntity {
                player_id: Uuid::new_v4(),
                rank: 1,
                score: Some(42),
                players_beaten: 0,
            }],
        };

        let doc = MongoPlayDocument::from(play.clone());
        assert_eq!(doc.date_time.timestamp_millis(), to_unix_millis(play.date_time));
        assert_eq!(PlayEntity::try_from(doc).unwrap(), play);
    }

    #[test]
    fn malformed_id_is_reported_with_its_collection() {
        let doc = MongoPlayerDocument {
            id: "not-a-uuid".into(),
            name: "Ann".into(),
            regular: false,
        };
        assert!(matches!(
            PlayerEntity::try_from(doc),
            Err(MongoDaoError::InvalidId { collection: "players", .. })
        ));
    }
}
