use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use utoipa::ToSchema;
use uuid::Uuid;

/// Weight class of a game, driving the weighted-win multiplier.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema,
)]
#[serde(rename_all = "lowercase")]
pub enum Tier {
    /// Short filler games.
    Light,
    /// Regular evening games.
    Medium,
    /// Long strategy games.
    Heavy,
    /// Any tier the board does not know about.
    #[default]
    #[serde(other)]
    Other,
}

impl Tier {
    /// Win contribution of a single rank-1 finish in a game of this tier.
    pub fn win_weight(self) -> f64 {
        match self {
            Tier::Light => 0.5,
            Tier::Medium => 1.0,
            _ => 1.5,
        }
    }
}

/// Player registered on the board.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct PlayerEntity {
    /// Stable identifier of the player.
    pub id: Uuid,
    /// Display name.
    pub name: String,
    /// Regulars are pre-checked in the start-player picker.
    pub regular: bool,
}

/// Game that plays can be recorded against.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct GameEntity {
    /// Stable identifier of the game.
    pub id: Uuid,
    /// Display name.
    pub name: String,
    /// Weight class.
    pub tier: Tier,
    /// Whether a higher score is better (false: lower is better).
    pub hi_score_wins: bool,
    /// Denormalized `"<player name>:<score>"`, the `"N/A"` sentinel, or nothing yet.
    pub best_score: Option<String>,
}

/// One participant of a play.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct PlayEntryEntity {
    /// Participating player.
    pub player_id: Uuid,
    /// Finishing position, 1 being the winner.
    pub rank: u32,
    /// Final score, when the game keeps one.
    pub score: Option<i64>,
    /// Number of participants of the same play with a strictly worse rank.
    pub players_beaten: u32,
}

/// Recorded session of a game.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct PlayEntity {
    /// Stable identifier of the play.
    pub id: Uuid,
    /// Game that was played.
    pub game_id: Uuid,
    /// When the session happened.
    #[serde(with = "time::serde::rfc3339")]
    pub date_time: OffsetDateTime,
    /// Participants in entry order.
    pub entries: Vec<PlayEntryEntity>,
}

/// Payload for registering a player; the store assigns the identifier.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewPlayer {
    pub name: String,
    pub regular: bool,
}

/// Payload for registering a game; the store assigns the identifier.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewGame {
    pub name: String,
    pub tier: Tier,
    pub hi_score_wins: bool,
}

/// Payload for recording a play; the store assigns the identifier.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewPlay {
    pub game_id: Uuid,
    pub date_time: OffsetDateTime,
    pub entries: Vec<PlayEntryEntity>,
}

impl NewPlayer {
    pub(crate) fn into_entity(self, id: Uuid) -> PlayerEntity {
        PlayerEntity {
            id,
            name: self.name,
            regular: self.regular,
        }
    }
}

impl NewGame {
    pub(crate) fn into_entity(self, id: Uuid) -> GameEntity {
        GameEntity {
            id,
            name: self.name,
            tier: self.tier,
            hi_score_wins: self.hi_score_wins,
            best_score: None,
        }
    }
}

impl NewPlay {
    pub(crate) fn into_entity(self, id: Uuid) -> PlayEntity {
        PlayEntity {
            id,
            game_id: self.game_id,
            date_time: self.date_time,
            entries: self.entries,
        }
    }
}

/// Milliseconds since the Unix epoch, the timestamp representation used by the document stores.
pub(crate) fn to_unix_millis(value: OffsetDateTime) -> i64 {
    (value.unix_timestamp_nanos() / 1_000_000) as i64
}

/// Inverse of [`to_unix_millis`], always yielding a UTC timestamp.
pub(crate) fn from_unix_millis(
    millis: i64,
) -> Result<OffsetDateTime, time::error::ComponentRange> {
    OffsetDateTime::from_unix_timestamp_nanos(i128::from(millis) * 1_000_000)
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::macros::datetime;

    #[test]
    fn win_weight_follows_tier() {
        assert_eq!(Tier::Light.win_weight(), 0.5);
        assert_eq!(Tier::Medium.win_weight(), 1.0);
        assert_eq!(Tier::Heavy.win_weight(), 1.5);
        assert_eq!(Tier::Other.win_weight(), 1.5);
    }

    #[test]
    fn unknown_tier_deserializes_as_other() {
        let tier: Tier = serde_json::from_str("\"epic\"").unwrap();
        assert_eq!(tier, Tier::Other);
        let tier: Tier = serde_json::from_str("\"light\"").unwrap();
        assert_eq!(tier, Tier::Light);
    }

    #[test]
    fn unix_millis_conversion_keeps_the_instant() {
        let at = datetime!(2025-03-14 19:30:15.250 +01:00);
        let millis = to_unix_millis(at);
        let back = from_unix_millis(millis).unwrap();
        assert_eq!(back, at);
        assert_eq!(back.offset(), time::UtcOffset::UTC);
    }
}
