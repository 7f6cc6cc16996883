use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{delete, post},
};
use uuid::Uuid;

use crate::{
    dto::{
        board::{BoardResponse, ViewportQuery},
        form::SubmitPlayResponse,
        tables::Viewport,
    },
    error::AppError,
    services::play_service,
    state::SharedState,
};

/// Play submission and deletion.
pub fn router() -> Router<SharedState> {
    Router::new()
        .route("/plays", post(submit_play))
        .route("/games/{game_id}/plays/{play_id}", delete(delete_play))
}

/// Store the add-play form as a new play.
#[utoipa::path(
    post,
    path = "/plays",
    tag = "plays",
    params(ViewportQuery),
    responses(
        (status = 201, description = "Play recorded", body = SubmitPlayResponse),
        (status = 422, description = "Form has flagged fields, including an unknown game")
    )
)]
pub async fn submit_play(
    State(state): State<SharedState>,
    Query(query): Query<ViewportQuery>,
) -> Result<(StatusCode, Json<SubmitPlayResponse>), AppError> {
    let viewport = Viewport::from_width(query.viewport_width);
    let response = play_service::submit(&state, viewport).await?;
    Ok((StatusCode::CREATED, Json(response)))
}

/// Delete a play and recompute its game's best score.
#[utoipa::path(
    delete,
    path = "/games/{game_id}/plays/{play_id}",
    tag = "plays",
    params(
        ("game_id" = Uuid, Path, description = "Game the play was recorded against"),
        ("play_id" = Uuid, Path, description = "Play to delete"),
        ViewportQuery
    ),
    responses(
        (status = 200, description = "Refreshed tables", body = BoardResponse),
        (status = 404, description = "Play not found for this game")
    )
)]
pub async fn delete_play(
    State(state): State<SharedState>,
    Path((game_id, play_id)): Path<(Uuid, Uuid)>,
    Query(query): Query<ViewportQuery>,
) -> Result<Json<BoardResponse>, AppError> {
    let viewport = Viewport::from_width(query.viewport_width);
    Ok(Json(
        play_service::delete_play(&state, game_id, play_id, viewport).await?,
    ))
}
