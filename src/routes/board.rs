use axum::{
    Json, Router,
    extract::{Query, State},
    routing::{get, put},
};

use crate::{
    dto::board::{BoardQuery, BoardResponse, RangeUpdateRequest},
    error::AppError,
    services::board_service,
    state::SharedState,
};

/// Board tables and range selection.
pub fn router() -> Router<SharedState> {
    Router::new()
        .route("/board", get(get_board))
        .route("/board/range", put(set_range))
}

/// Render the three tables for a range mode.
#[utoipa::path(
    get,
    path = "/board",
    tag = "board",
    params(BoardQuery),
    responses(
        (status = 200, description = "Rendered tables", body = BoardResponse),
        (status = 503, description = "Records could not be loaded")
    )
)]
pub async fn get_board(
    State(state): State<SharedState>,
    Query(query): Query<BoardQuery>,
) -> Result<Json<BoardResponse>, AppError> {
    Ok(Json(board_service::board(&state, query).await?))
}

/// Select the range mode (and custom bounds) and render it.
#[utoipa::path(
    put,
    path = "/board/range",
    tag = "board",
    request_body = RangeUpdateRequest,
    responses(
        (status = 200, description = "Rendered tables for the new range", body = BoardResponse),
        (status = 400, description = "Missing or inverted custom bounds")
    )
)]
pub async fn set_range(
    State(state): State<SharedState>,
    Json(payload): Json<RangeUpdateRequest>,
) -> Result<Json<BoardResponse>, AppError> {
    Ok(Json(board_service::set_range(&state, payload).await?))
}
