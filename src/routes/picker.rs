use axum::{
    Json, Router,
    extract::State,
    routing::{get, post},
};

use crate::{
    dto::picker::{PickRequest, PickResponse, PickerPlayerView},
    error::AppError,
    services::picker,
    state::SharedState,
};

/// Random start-player picker.
pub fn router() -> Router<SharedState> {
    Router::new()
        .route("/picker/players", get(list_candidates))
        .route("/picker/start-player", post(pick_start_player))
}

#[utoipa::path(
    get,
    path = "/picker/players",
    tag = "picker",
    responses((status = 200, description = "Roster with regulars pre-checked", body = [PickerPlayerView]))
)]
pub async fn list_candidates(
    State(state): State<SharedState>,
) -> Result<Json<Vec<PickerPlayerView>>, AppError> {
    Ok(Json(picker::roster(&state).await?))
}

/// Pick who starts among the checked players, never the previous pick.
#[utoipa::path(
    post,
    path = "/picker/start-player",
    tag = "picker",
    request_body = PickRequest,
    responses((status = 200, description = "Chosen player or `No players selected`", body = PickResponse))
)]
pub async fn pick_start_player(
    State(state): State<SharedState>,
    Json(payload): Json<PickRequest>,
) -> Result<Json<PickResponse>, AppError> {
    Ok(Json(picker::start_player(&state, payload).await?))
}
