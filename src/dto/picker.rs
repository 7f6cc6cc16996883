use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

/// Label returned when no checked player can be picked.
pub const NO_PLAYERS_SELECTED: &str = "No players selected";

/// Roster entry of the start-player picker; regulars come pre-checked.
#[derive(Debug, Clone, Serialize, ToSchema, PartialEq, Eq)]
pub struct PickerPlayerView {
    pub id: Uuid,
    pub name: String,
    pub checked: bool,
}

/// Payload of `POST /picker/start-player`.
#[derive(Debug, Deserialize, ToSchema)]
pub struct PickRequest {
    /// Players currently checked in the picker.
    pub checked: Vec<Uuid>,
}

/// Outcome of a pick.
#[derive(Debug, Serialize, ToSchema, PartialEq, Eq)]
pub struct PickResponse {
    /// Chosen player, absent when nobody was eligible.
    pub player_id: Option<Uuid>,
    /// Name of the chosen player or [`NO_PLAYERS_SELECTED`].
    pub label: String,
}

impl PickResponse {
    pub fn picked(player_id: Uuid, name: String) -> Self {
        Self {
            player_id: Some(player_id),
            label: name,
        }
    }

    pub fn nobody() -> Self {
        Self {
            player_id: None,
            label: NO_PLAYERS_SELECTED.to_owned(),
        }
    }
}
