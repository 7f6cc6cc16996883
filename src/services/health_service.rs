use tracing::warn;

use crate::{dto::health::HealthResponse, state::SharedState};

/// Report store reachability and offline cache readiness, logging connectivity issues.
pub async fn health_status(state: &SharedState) -> HealthResponse {
    match state.record_store().await {
        Some(store) => {
            if let Err(err) = store.health_check().await {
                warn!(error = %err, "record store health check failed");
            }
        }
        None => warn!("record store unavailable (degraded mode)"),
    }

    let offline_cache = state.offline().active_worker().await.is_some();
    HealthResponse::new(state.is_degraded(), offline_cache)
}
