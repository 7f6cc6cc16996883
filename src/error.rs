use axum::{Json, http::StatusCode, response::IntoResponse};
use serde::Serialize;
use thiserror::Error;

use crate::{
    dao::storage::StorageError,
    dto::form::FormFlagsView,
    offline::worker::FetchError,
    services::{date_range::RangeError, stats::StatsError},
    state::form::{FormError, FormFlags},
};

/// Errors that can occur in service layer operations.
#[derive(Debug, Error)]
pub enum ServiceError {
    /// Storage backend is unavailable.
    #[error("storage unavailable")]
    Unavailable(#[source] StorageError),
    /// Application is running in degraded mode without storage.
    #[error("storage unavailable (degraded mode)")]
    Degraded,
    /// Stored records contradict each other.
    #[error("inconsistent records: {0}")]
    Inconsistent(String),
    /// Invalid input provided by the client.
    #[error("invalid input: {0}")]
    InvalidInput(String),
    /// The add-play form has missing or invalid fields.
    #[error("form has invalid fields")]
    InvalidForm(FormFlags),
    /// Request conflicts with the current state.
    #[error("conflict: {0}")]
    Conflict(String),
    /// Requested resource was not found.
    #[error("not found: {0}")]
    NotFound(String),
}

impl From<StorageError> for ServiceError {
    fn from(err: StorageError) -> Self {
        match err {
            StorageError::NotFound { collection, id } => {
                ServiceError::NotFound(format!("{id} in {collection}"))
            }
            other => ServiceError::Unavailable(other),
        }
    }
}

impl From<StatsError> for ServiceError {
    fn from(err: StatsError) -> Self {
        match err {
            StatsError::Storage(source) => ServiceError::Unavailable(source),
            unknown @ StatsError::UnknownGame { .. } => {
                ServiceError::Inconsistent(unknown.to_string())
            }
        }
    }
}

impl From<RangeError> for ServiceError {
    fn from(err: RangeError) -> Self {
        ServiceError::InvalidInput(err.to_string())
    }
}

impl From<FormError> for ServiceError {
    fn from(err: FormError) -> Self {
        match err {
            FormError::NoSuchRow { .. } => ServiceError::NotFound(err.to_string()),
            FormError::PlayerTaken { .. } => ServiceError::Conflict(err.to_string()),
        }
    }
}

/// Application-level errors that are converted to HTTP responses.
#[derive(Debug, Error)]
pub enum AppError {
    /// Bad request with invalid input.
    #[error("bad request: {0}")]
    BadRequest(String),
    /// Requested resource not found.
    #[error("not found: {0}")]
    NotFound(String),
    /// Conflict with current state.
    #[error("conflict: {0}")]
    Conflict(String),
    /// Form submission with flagged fields.
    #[error("invalid form")]
    InvalidForm(FormFlagsView),
    /// Board data could not be loaded.
    #[error("failed to load data: {0}")]
    LoadFailed(String),
    /// Service unavailable or degraded.
    #[error("service unavailable: {0}")]
    ServiceUnavailable(String),
    /// Neither the network nor the offline cache could answer.
    #[error("offline: {0}")]
    Offline(String),
}

impl From<ServiceError> for AppError {
    fn from(err: ServiceError) -> Self {
        match err {
            ServiceError::Unavailable(source) => AppError::LoadFailed(source.to_string()),
            ServiceError::Degraded => AppError::ServiceUnavailable("degraded mode".into()),
            ServiceError::Inconsistent(message) => AppError::LoadFailed(message),
            ServiceError::InvalidInput(message) => AppError::BadRequest(message),
            ServiceError::InvalidForm(flags) => AppError::InvalidForm(flags.into()),
            ServiceError::Conflict(message) => AppError::Conflict(message),
            ServiceError::NotFound(message) => AppError::NotFound(message),
        }
    }
}

impl From<FetchError> for AppError {
    fn from(err: FetchError) -> Self {
        AppError::Offline(err.to_string())
    }
}

#[derive(Serialize)]
struct ErrorBody {
    message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    flags: Option<FormFlagsView>,
}

impl IntoResponse for AppError {
    fn into_response(self) -> axum::response::Response {
        let status = match &self {
            AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Conflict(_) => StatusCode::CONFLICT,
            AppError::InvalidForm(_) => StatusCode::UNPROCESSABLE_ENTITY,
            AppError::LoadFailed(_) | AppError::ServiceUnavailable(_) => {
                StatusCode::SERVICE_UNAVAILABLE
            }
            AppError::Offline(_) => StatusCode::GATEWAY_TIMEOUT,
        };

        let message = self.to_string();
        let flags = match self {
            AppError::InvalidForm(flags) => Some(flags),
            _ => None,
        };
        let payload = Json(ErrorBody { message, flags });

        (status, payload).into_response()
    }
}

#[cfg(test)]
mod tests {
    use axum::body::to_bytes;
    use uuid::Uuid;

    use super::*;
    use crate::state::form::RowFlags;

    #[test]
    fn storage_errors_keep_not_found_apart() {
        let missing = StorageError::NotFound {
            collection: "games",
            id: Uuid::nil(),
        };
        assert!(matches!(
            AppError::from(ServiceError::from(missing)),
            AppError::NotFound(_)
        ));

        let down = StorageError::unavailable("boom".into(), std::io::Error::other("boom"));
        let err = AppError::from(ServiceError::from(down));
        assert!(err.to_string().starts_with("failed to load data"));
    }

    #[tokio::test]
    async fn invalid_form_answers_422_with_flags() {
        let flags = FormFlags {
            game: true,
            date_time: false,
            rows: vec![RowFlags {
                player: true,
                rank: false,
            }],
        };
        let response = AppError::from(ServiceError::InvalidForm(flags)).into_response();
        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);

        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let value: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(value["flags"]["game"], true);
        assert_eq!(value["flags"]["rows"][0]["player"], true);
    }
}
