//! Error types for the API layer.
//!
//! [`ApiError`] unifies all failure modes into a single enum that is
//! converted into an Axum HTTP response with a JSON body of the shape
//! `{"status": "error", "message": ...}`.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use tilestats_core::{ArbiterError, StoreError};
use tracing::error;

/// Errors that can occur in the API layer.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// The request body or query was rejected.
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// Reading or writing the store failed.
    #[error("persistence failure: {0}")]
    Persistence(String),

    /// An internal error occurred.
    #[error("internal error: {0}")]
    Internal(String),
}

impl ApiError {
    /// HTTP status for this error.
    pub const fn status(&self) -> StatusCode {
        match self {
            Self::InvalidInput(_) => StatusCode::BAD_REQUEST,
            Self::Persistence(_) | Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<ArbiterError> for ApiError {
    fn from(err: ArbiterError) -> Self {
        Self::Persistence(err.to_string())
    }
}

impl From<StoreError> for ApiError {
    fn from(err: StoreError) -> Self {
        Self::Persistence(err.to_string())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let message = match &self {
            Self::InvalidInput(msg) => msg.clone(),
            Self::Persistence(msg) | Self::Internal(msg) => {
                error!(error = %msg, "request failed");
                msg.clone()
            }
        };

        let body = serde_json::json!({
            "status": "error",
            "message": message,
        });

        (status, axum::Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_codes() {
        assert_eq!(
            ApiError::InvalidInput(String::new()).status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            ApiError::Persistence(String::new()).status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
        assert_eq!(
            ApiError::Internal(String::new()).status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn store_errors_map_to_persistence() {
        let err = ApiError::from(StoreError::Unavailable {
            message: String::from("locked"),
        });
        assert!(matches!(err, ApiError::Persistence(msg) if msg.contains("locked")));
    }
}
