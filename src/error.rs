//! Error types for the query interface. Rule violations inside a live game
//! never reach this module; they travel back over the socket as `error`
//! frames instead.

use axum::{Json, http::StatusCode, response::IntoResponse};
use serde::Serialize;
use thiserror::Error;

use crate::dao::storage::StorageError;

/// Failures surfaced by the read-side services (health, leaderboard).
#[derive(Debug, Error)]
pub enum ServiceError {
    /// A storage call was attempted and failed.
    #[error("storage unavailable")]
    Unavailable(#[source] StorageError),
    /// No storage backend is connected; the process is in degraded mode.
    #[error("storage unavailable (degraded mode)")]
    Degraded,
}

impl From<StorageError> for ServiceError {
    fn from(err: StorageError) -> Self {
        ServiceError::Unavailable(err)
    }
}

/// HTTP-facing error, rendered as a JSON `{message}` body.
#[derive(Debug, Error)]
pub enum AppError {
    /// The leaderboard cannot be served while storage is down.
    #[error("service unavailable: {0}")]
    ServiceUnavailable(String),
    /// Anything unexpected on the read path.
    #[error("internal error: {0}")]
    Internal(String),
}

impl From<ServiceError> for AppError {
    fn from(err: ServiceError) -> Self {
        match err {
            ServiceError::Unavailable(source) => AppError::ServiceUnavailable(source.to_string()),
            ServiceError::Degraded => AppError::ServiceUnavailable("degraded mode".into()),
        }
    }
}

#[derive(Serialize)]
struct ErrorBody {
    message: String,
}

impl IntoResponse for AppError {
    fn into_response(self) -> axum::response::Response {
        let status = match &self {
            AppError::ServiceUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };

        let payload = Json(ErrorBody {
            message: self.to_string(),
        });

        (status, payload).into_response()
    }
}
