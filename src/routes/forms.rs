use axum::{
    Json, Router,
    extract::{Path, State},
    routing::{get, post},
};

use crate::{
    dto::form::{FormSyncRequest, PlayFormView},
    error::AppError,
    services::play_service,
    state::SharedState,
};

/// Add-play form editing.
pub fn router() -> Router<SharedState> {
    Router::new()
        .route("/forms/play", get(get_form))
        .route("/forms/play/rows", post(add_row))
        .route("/forms/play/rows/{index}/remove", post(remove_row))
        .route("/forms/play/sync", post(sync_form))
}

/// Current form with its selector options.
#[utoipa::path(
    get,
    path = "/forms/play",
    tag = "forms",
    responses((status = 200, description = "Add-play form", body = PlayFormView))
)]
pub async fn get_form(State(state): State<SharedState>) -> Result<Json<PlayFormView>, AppError> {
    Ok(Json(play_service::form_view(&state).await?))
}

#[utoipa::path(
    post,
    path = "/forms/play/rows",
    tag = "forms",
    responses((status = 200, description = "Form with a new row", body = PlayFormView))
)]
pub async fn add_row(State(state): State<SharedState>) -> Result<Json<PlayFormView>, AppError> {
    Ok(Json(play_service::add_row(&state).await?))
}

#[utoipa::path(
    post,
    path = "/forms/play/rows/{index}/remove",
    tag = "forms",
    params(("index" = usize, Path, description = "Zero-based row index")),
    responses(
        (status = 200, description = "Form without the row", body = PlayFormView),
        (status = 404, description = "No such row")
    )
)]
pub async fn remove_row(
    State(state): State<SharedState>,
    Path(index): Path<usize>,
) -> Result<Json<PlayFormView>, AppError> {
    Ok(Json(play_service::remove_row(&state, index).await?))
}

/// Replace every field of the form.
#[utoipa::path(
    post,
    path = "/forms/play/sync",
    tag = "forms",
    request_body = FormSyncRequest,
    responses(
        (status = 200, description = "Updated form", body = PlayFormView),
        (status = 409, description = "A player was selected in two rows")
    )
)]
pub async fn sync_form(
    State(state): State<SharedState>,
    Json(payload): Json<FormSyncRequest>,
) -> Result<Json<PlayFormView>, AppError> {
    Ok(Json(play_service::sync_form(&state, payload).await?))
}
