use tracing::{error, info};

use crate::{
    dto::{
        board::{BoardQuery, BoardResponse, RangeUpdateRequest},
        tables::{self, Viewport},
    },
    error::ServiceError,
    services::{
        date_range::{DateInterval, RangeError, RangeMode},
        stats,
    },
    state::SharedState,
};

/// Tables for the requested mode, or the selected one. The selection is left unchanged.
pub async fn board(state: &SharedState, query: BoardQuery) -> Result<BoardResponse, ServiceError> {
    let now = state.now();
    let (mode, interval) = {
        let controller = state.controller().read().await;
        let mode = query.mode.unwrap_or(controller.mode());
        (mode, controller.interval(Some(mode), now)?)
    };

    render(
        state,
        mode,
        interval,
        Viewport::from_width(query.viewport_width),
    )
    .await
}

/// Change the selected range, then render it.
pub async fn set_range(
    state: &SharedState,
    request: RangeUpdateRequest,
) -> Result<BoardResponse, ServiceError> {
    let now = state.now();
    let (mode, interval) = {
        let mut controller = state.controller().write().await;
        match (request.mode, request.start, request.end) {
            (RangeMode::Custom, Some(start), Some(end)) => {
                controller.set_custom(DateInterval::new(start, end)?);
            }
            (RangeMode::Custom, None, None) => controller.set_mode(RangeMode::Custom, now),
            (RangeMode::Custom, _, _) => return Err(RangeError::MissingCustomBounds.into()),
            (mode, _, _) => controller.set_mode(mode, now),
        }
        (controller.mode(), controller.interval(None, now)?)
    };

    info!(?mode, start = %interval.start, end = %interval.end, "board range selected");
    render(
        state,
        mode,
        interval,
        Viewport::from_width(request.viewport_width),
    )
    .await
}

/// Re-render the selected range after records changed.
pub async fn refresh(state: &SharedState, viewport: Viewport) -> Result<BoardResponse, ServiceError> {
    let now = state.now();
    let (mode, interval) = {
        let controller = state.controller().read().await;
        (controller.mode(), controller.interval(None, now)?)
    };
    render(state, mode, interval, viewport).await
}

async fn render(
    state: &SharedState,
    mode: RangeMode,
    interval: DateInterval,
    viewport: Viewport,
) -> Result<BoardResponse, ServiceError> {
    let store = state.require_record_store().await?;
    let stats = stats::load(store.as_ref(), interval)
        .await
        .inspect_err(|err| error!(error = %err, ?mode, "failed to load board data"))?;

    Ok(BoardResponse {
        mode,
        interval,
        tables: tables::render(&stats, viewport, state.config().utc_offset()),
    })
}
