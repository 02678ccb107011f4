use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use thiserror::Error;

use crate::core::staging::StagingError;

/// Message returned to clients for unexpected failures; the diagnostic only
/// goes to the server log.
pub const GENERIC_INTERNAL_ERROR: &str = "An unexpected error occurred. Please try again later.";

/// Application error type
///
/// Every failure of a request handler ends up here and is serialized as
/// `{"detail": "<message>"}` with the matching status code.
#[derive(Debug, Error)]
pub enum AppError {
    /// Malformed or disallowed request content (400)
    #[error("{0}")]
    InvalidInput(String),

    /// Required form field absent or empty (422)
    #[error("Field required: {0}")]
    MissingField(String),

    /// Upload larger than the configured limit (413)
    #[error("Uploaded file exceeds the maximum size of {limit_mb} MB")]
    PayloadTooLarge { limit_mb: u64 },

    /// Provider client could not be constructed at startup (500)
    #[error("{0}")]
    ServiceUnavailable(String),

    /// Conversion capability disabled or unsupported (501)
    #[error("{0}")]
    NotImplemented(String),

    /// Any unexpected failure while staging, converting or publishing (500)
    #[error("Internal error: {0}")]
    InternalError(String),
}

impl AppError {
    /// HTTP status for this error kind
    pub fn status_code(&self) -> StatusCode {
        match self {
            AppError::InvalidInput(_) => StatusCode::BAD_REQUEST,
            AppError::MissingField(_) => StatusCode::UNPROCESSABLE_ENTITY,
            AppError::PayloadTooLarge { .. } => StatusCode::PAYLOAD_TOO_LARGE,
            AppError::ServiceUnavailable(_) => StatusCode::INTERNAL_SERVER_ERROR,
            AppError::NotImplemented(_) => StatusCode::NOT_IMPLEMENTED,
            AppError::InternalError(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Client-facing message. Internal diagnostics are replaced by a generic text.
    pub fn detail(&self) -> String {
        match self {
            AppError::InternalError(_) => GENERIC_INTERNAL_ERROR.to_string(),
            other => other.to_string(),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();

        match &self {
            AppError::InternalError(msg) => {
                tracing::error!("Internal server error: {}", msg);
            }
            AppError::ServiceUnavailable(msg) => {
                tracing::error!("Service unavailable: {}", msg);
            }
            AppError::NotImplemented(msg) => {
                tracing::info!("Not implemented: {}", msg);
            }
            other => {
                tracing::warn!("Rejected request ({}): {}", status.as_u16(), other);
            }
        }

        let body = Json(json!({
            "detail": self.detail(),
        }));

        (status, body).into_response()
    }
}

impl From<StagingError> for AppError {
    fn from(err: StagingError) -> Self {
        match err {
            StagingError::TooLarge { limit_bytes } => AppError::PayloadTooLarge {
                limit_mb: limit_bytes.div_ceil(1024 * 1024),
            },
            StagingError::Empty => {
                AppError::InvalidInput("Uploaded audio file is empty.".to_string())
            }
            StagingError::Read(msg) => {
                AppError::InvalidInput(format!("Failed to read uploaded file: {msg}"))
            }
            StagingError::Io(e) => {
                AppError::InternalError(format!("Failed to stage uploaded file: {e}"))
            }
        }
    }
}

// Result type alias for convenience
pub type AppResult<T> = Result<T, AppError>;
