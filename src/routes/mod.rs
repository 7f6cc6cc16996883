use axum::{Router, routing::get};

use crate::state::SharedState;

pub mod assets;
pub mod board;
pub mod docs;
pub mod forms;
pub mod health;
pub mod picker;
pub mod plays;
pub mod roster;

/// Compose all route trees, wiring in shared state, documentation routes and the asset
/// fallback.
pub fn router(state: SharedState) -> Router<()> {
    let api_router = health::router()
        .merge(board::router())
        .merge(roster::router())
        .merge(forms::router())
        .merge(plays::router())
        .merge(picker::router())
        .merge(docs::router());

    api_router
        .fallback(get(assets::serve_asset))
        .with_state(state)
}
