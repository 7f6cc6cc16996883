use axum::{Json, Router, extract::State, http::StatusCode, routing::get};
use axum_valid::Valid;

use crate::{
    dto::roster::{CreateGameRequest, CreatePlayerRequest, GameView, PlayerView},
    error::AppError,
    services::roster_service,
    state::SharedState,
};

/// Player and game registration.
pub fn router() -> Router<SharedState> {
    Router::new()
        .route("/players", get(list_players).post(add_player))
        .route("/games", get(list_games).post(add_game))
}

#[utoipa::path(
    get,
    path = "/players",
    tag = "roster",
    responses((status = 200, description = "Players sorted by name", body = [PlayerView]))
)]
pub async fn list_players(
    State(state): State<SharedState>,
) -> Result<Json<Vec<PlayerView>>, AppError> {
    Ok(Json(roster_service::list_players(&state).await?))
}

/// Register a player.
#[utoipa::path(
    post,
    path = "/players",
    tag = "roster",
    request_body = CreatePlayerRequest,
    responses(
        (status = 201, description = "Player added", body = PlayerView),
        (status = 400, description = "Blank name")
    )
)]
pub async fn add_player(
    State(state): State<SharedState>,
    Valid(Json(payload)): Valid<Json<CreatePlayerRequest>>,
) -> Result<(StatusCode, Json<PlayerView>), AppError> {
    let player = roster_service::add_player(&state, payload).await?;
    Ok((StatusCode::CREATED, Json(player)))
}

#[utoipa::path(
    get,
    path = "/games",
    tag = "roster",
    responses((status = 200, description = "Games sorted by name", body = [GameView]))
)]
pub async fn list_games(State(state): State<SharedState>) -> Result<Json<Vec<GameView>>, AppError> {
    Ok(Json(roster_service::list_games(&state).await?))
}

/// Register a game.
#[utoipa::path(
    post,
    path = "/games",
    tag = "roster",
    request_body = CreateGameRequest,
    responses(
        (status = 201, description = "Game added", body = GameView),
        (status = 400, description = "Blank name or missing tier")
    )
)]
pub async fn add_game(
    State(state): State<SharedState>,
    Valid(Json(payload)): Valid<Json<CreateGameRequest>>,
) -> Result<(StatusCode, Json<GameView>), AppError> {
    let game = roster_service::add_game(&state, payload).await?;
    Ok((StatusCode::CREATED, Json(game)))
}
