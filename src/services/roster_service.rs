use tracing::info;

use crate::{
    dao::models::{GameEntity, NewPlayer, PlayerEntity},
    dto::roster::{CreateGameRequest, CreatePlayerRequest, GameView, PlayerView},
    error::ServiceError,
    services::stats::compare_names,
    state::SharedState,
};

pub(crate) fn sort_players(players: &mut [PlayerEntity]) {
    players.sort_by(|a, b| compare_names(&a.name, &b.name));
}

pub(crate) fn sort_games(games: &mut [GameEntity]) {
    games.sort_by(|a, b| compare_names(&a.name, &b.name));
}

/// Roster sorted by name.
pub async fn list_players(state: &SharedState) -> Result<Vec<PlayerView>, ServiceError> {
    let store = state.require_record_store().await?;
    let mut players = store.list_players().await?;
    sort_players(&mut players);
    Ok(players.into_iter().map(PlayerView::from).collect())
}

pub async fn add_player(
    state: &SharedState,
    request: CreatePlayerRequest,
) -> Result<PlayerView, ServiceError> {
    let new_player = NewPlayer::from(request);
    if new_player.name.is_empty() {
        return Err(ServiceError::InvalidInput("player name must not be blank".into()));
    }

    let store = state.require_record_store().await?;
    let player = store.add_player(new_player).await?;
    info!(player_id = %player.id, name = %player.name, regular = player.regular, "player added");
    Ok(player.into())
}

/// Games sorted by name, case-insensitively.
pub async fn list_games(state: &SharedState) -> Result<Vec<GameView>, ServiceError> {
    let store = state.require_record_store().await?;
    let mut games = store.list_games().await?;
    sort_games(&mut games);
    Ok(games.into_iter().map(GameView::from).collect())
}

pub async fn add_game(
    state: &SharedState,
    request: CreateGameRequest,
) -> Result<GameView, ServiceError> {
    let new_game = request
        .into_new_game()
        .ok_or_else(|| ServiceError::InvalidInput("a tier must be selected".into()))?;
    if new_game.name.is_empty() {
        return Err(ServiceError::InvalidInput("game name must not be blank".into()));
    }

    let store = state.require_record_store().await?;
    let game = store.add_game(new_game).await?;
    info!(game_id = %game.id, name = %game.name, tier = ?game.tier, "game added");
    Ok(game.into())
}
