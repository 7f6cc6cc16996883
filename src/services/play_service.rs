use tracing::{error, info, warn};
use uuid::Uuid;

use crate::{
    dto::{
        board::BoardResponse,
        form::{FormSyncRequest, PlayFormView, SubmitPlayResponse},
        tables::Viewport,
    },
    error::ServiceError,
    services::{best_score, board_service, roster_service},
    state::{SharedState, form::ParticipantRow},
};

/// Render the add-play form against the current roster and games.
pub async fn form_view(state: &SharedState) -> Result<PlayFormView, ServiceError> {
    let store = state.require_record_store().await?;
    let (mut players, mut games) = futures::try_join!(store.list_players(), store.list_games())?;
    roster_service::sort_players(&mut players);
    roster_service::sort_games(&mut games);

    let form = state.form().read().await;
    Ok(PlayFormView::build(&form, &players, &games))
}

/// Append a participant row.
pub async fn add_row(state: &SharedState) -> Result<PlayFormView, ServiceError> {
    {
        let mut form = state.form().write().await;
        let index = form.add_row();
        info!(index, "form row added");
    }
    form_view(state).await
}

/// Remove a participant row, releasing its player.
pub async fn remove_row(state: &SharedState, index: usize) -> Result<PlayFormView, ServiceError> {
    {
        let mut form = state.form().write().await;
        let removed = form.remove_row(index)?;
        info!(index, player_id = ?removed.player_id, "form row removed");
    }
    form_view(state).await
}

/// Replace every form field at once.
pub async fn sync_form(
    state: &SharedState,
    request: FormSyncRequest,
) -> Result<PlayFormView, ServiceError> {
    {
        let rows = request.rows.into_iter().map(ParticipantRow::from).collect();
        let mut form = state.form().write().await;
        form.sync(request.game_id, request.date_time, rows)?;
    }
    form_view(state).await
}

/// Validate and store the form as a play, update the game's best score, reset the form
/// and refresh the board.
///
/// The form stays write-locked from validation to reset so one form is stored once. Once
/// the play is stored the call succeeds; a failed refresh is reported in the response.
pub async fn submit(
    state: &SharedState,
    viewport: Viewport,
) -> Result<SubmitPlayResponse, ServiceError> {
    let store = state.require_record_store().await?;
    let play = {
        let mut form = state.form().write().await;
        let new_play = form.to_new_play().map_err(ServiceError::InvalidForm)?;

        if store.find_game(new_play.game_id).await?.is_none() {
            warn!(game_id = %new_play.game_id, "form refers to an unknown game");
            let mut flags = form.validate();
            flags.game = true;
            return Err(ServiceError::InvalidForm(flags));
        }

        let play = store.add_play(new_play).await?;
        form.reset(state.now());
        play
    };
    info!(
        play_id = %play.id,
        game_id = %play.game_id,
        entries = play.entries.len(),
        "play recorded"
    );

    if let Err(err) = best_score::on_play_created(store.as_ref(), &play).await {
        error!(error = %err, game_id = %play.game_id, "failed to update best score");
    }

    let board = board_service::refresh(state, viewport).await;
    let form = form_view(state).await;
    let refresh_error = match (&board, &form) {
        (Err(err), _) | (_, Err(err)) => {
            warn!(error = %err, play_id = %play.id, "play recorded but the refresh failed");
            Some(err.to_string())
        }
        _ => None,
    };

    Ok(SubmitPlayResponse {
        play_id: play.id,
        form: form.ok(),
        board: board.ok(),
        refresh_error,
    })
}

/// Delete a play of a game, recompute the game's best score and refresh the board.
pub async fn delete_play(
    state: &SharedState,
    game_id: Uuid,
    play_id: Uuid,
    viewport: Viewport,
) -> Result<BoardResponse, ServiceError> {
    let store = state.require_record_store().await?;

    match store.find_play(play_id).await? {
        Some(play) if play.game_id == game_id => {}
        Some(play) => {
            warn!(%play_id, %game_id, actual = %play.game_id, "play belongs to another game");
            return Err(ServiceError::NotFound(format!(
                "play `{play_id}` not found for game `{game_id}`"
            )));
        }
        None => return Err(ServiceError::NotFound(format!("play `{play_id}` not found"))),
    }

    if !store.delete_play(play_id).await? {
        return Err(ServiceError::NotFound(format!("play `{play_id}` not found")));
    }
    info!(%play_id, %game_id, "play deleted");

    if let Err(err) = best_score::on_play_deleted(store.as_ref(), game_id).await {
        error!(error = %err, %game_id, "failed to recompute best score");
    }

    board_service::refresh(state, viewport).await
}
