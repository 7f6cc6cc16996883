use serde::Serialize;
use utoipa::ToSchema;

/// Whether the board can currently reach its record store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum HealthStatus {
    Ok,
    Degraded,
}

/// Health payload returned by the `/healthcheck` route.
#[derive(Debug, Serialize, ToSchema)]
pub struct HealthResponse {
    pub status: HealthStatus,
    /// Whether an offline asset cache worker is active.
    pub offline_cache: bool,
}

impl HealthResponse {
    pub fn new(degraded: bool, offline_cache: bool) -> Self {
        let status = if degraded {
            HealthStatus::Degraded
        } else {
            HealthStatus::Ok
        };
        Self {
            status,
            offline_cache,
        }
    }

    pub fn is_degraded(&self) -> bool {
        self.status == HealthStatus::Degraded
    }
}
