use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::{
    dao::models::{GameEntity, PlayerEntity},
    dto::board::BoardResponse,
    state::form::{FormFlags, ParticipantRow, PlayForm, PlayerOption, RowFlags},
};

/// Game offered by the form's game selector.
#[derive(Debug, Clone, Serialize, ToSchema, PartialEq, Eq)]
pub struct GameOptionView {
    pub id: Uuid,
    pub name: String,
}

impl From<&GameEntity> for GameOptionView {
    fn from(game: &GameEntity) -> Self {
        Self {
            id: game.id,
            name: game.name.clone(),
        }
    }
}

/// Roster entry of one row's player selector.
#[derive(Debug, Clone, Serialize, ToSchema, PartialEq, Eq)]
pub struct PlayerOptionView {
    pub player_id: Uuid,
    pub name: String,
    pub disabled: bool,
    pub hidden: bool,
}

impl From<PlayerOption> for PlayerOptionView {
    fn from(option: PlayerOption) -> Self {
        Self {
            player_id: option.player_id,
            name: option.name,
            disabled: option.disabled,
            hidden: option.hidden,
        }
    }
}

/// One participant row with its selector options.
#[derive(Debug, Clone, Serialize, ToSchema, PartialEq, Eq)]
pub struct ParticipantRowView {
    pub player_id: Option<Uuid>,
    pub rank: Option<u32>,
    pub score: Option<i64>,
    pub options: Vec<PlayerOptionView>,
}

/// Add-play form as rendered to the client.
#[derive(Debug, Clone, Serialize, ToSchema, PartialEq, Eq)]
pub struct PlayFormView {
    pub game_id: Option<Uuid>,
    #[serde(with = "time::serde::rfc3339::option")]
    #[schema(value_type = Option<String>, format = DateTime)]
    pub date_time: Option<OffsetDateTime>,
    pub rows: Vec<ParticipantRowView>,
    /// Games sorted by name.
    pub games: Vec<GameOptionView>,
}

impl PlayFormView {
    /// Project the form against the roster (selector options) and the sorted games.
    pub fn build(form: &PlayForm, roster: &[PlayerEntity], games: &[GameEntity]) -> Self {
        let rows = form
            .rows()
            .iter()
            .zip(form.player_options(roster))
            .map(|(row, options)| ParticipantRowView {
                player_id: row.player_id,
                rank: row.rank,
                score: row.score,
                options: options.into_iter().map(PlayerOptionView::from).collect(),
            })
            .collect();

        Self {
            game_id: form.game_id,
            date_time: form.date_time,
            rows,
            games: games.iter().map(GameOptionView::from).collect(),
        }
    }
}

/// Row of a form synchronization payload.
#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct ParticipantRowInput {
    pub player_id: Option<Uuid>,
    pub rank: Option<u32>,
    pub score: Option<i64>,
}

impl From<ParticipantRowInput> for ParticipantRow {
    fn from(input: ParticipantRowInput) -> Self {
        Self {
            player_id: input.player_id,
            rank: input.rank,
            score: input.score,
        }
    }
}

/// Payload of `POST /forms/play/sync`: every field of the form at once.
#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct FormSyncRequest {
    pub game_id: Option<Uuid>,
    #[serde(default, with = "time::serde::rfc3339::option")]
    #[schema(value_type = Option<String>, format = DateTime)]
    pub date_time: Option<OffsetDateTime>,
    pub rows: Vec<ParticipantRowInput>,
}

/// Invalid markers of one row.
#[derive(Debug, Clone, Copy, Serialize, ToSchema, PartialEq, Eq)]
pub struct RowFlagsView {
    pub player: bool,
    pub rank: bool,
}

/// Invalid fields of a rejected submission; `true` marks a field to fix.
#[derive(Debug, Clone, Serialize, ToSchema, PartialEq, Eq)]
pub struct FormFlagsView {
    pub game: bool,
    pub date_time: bool,
    pub rows: Vec<RowFlagsView>,
}

impl From<FormFlags> for FormFlagsView {
    fn from(flags: FormFlags) -> Self {
        Self {
            game: flags.game,
            date_time: flags.date_time,
            rows: flags
                .rows
                .into_iter()
                .map(|RowFlags { player, rank }| RowFlagsView { player, rank })
                .collect(),
        }
    }
}

/// Result of a successful submission: the stored play, a fresh form and refreshed tables.
///
/// `form` and `board` are absent when reloading them failed after the play was stored;
/// `refresh_error` then says why.
#[derive(Debug, Serialize, ToSchema)]
pub struct SubmitPlayResponse {
    pub play_id: Uuid,
    pub form: Option<PlayFormView>,
    pub board: Option<BoardResponse>,
    pub refresh_error: Option<String>,
}
