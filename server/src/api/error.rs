//! API Error Types

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

use crate::buffer::SubmitError;

/// Errors surfaced to inbound callers.
#[derive(Debug, Error)]
pub enum ApiError {
    /// Shared secret missing or wrong.
    #[error("Unauthorized")]
    Unauthorized,

    /// Request body is not valid JSON.
    #[error("Invalid JSON")]
    InvalidJson,

    /// No sender id anywhere in the payload.
    #[error("Missing waId")]
    MissingKey,

    /// Unexpected failure while handling the request.
    #[error("Internal error")]
    Internal,
}

/// Error response body for JSON responses.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    /// Always `false`.
    pub ok: bool,
    /// Human-readable error message.
    pub error: String,
}

impl From<SubmitError> for ApiError {
    fn from(err: SubmitError) -> Self {
        match err {
            SubmitError::MissingKey => Self::MissingKey,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match &self {
            Self::Unauthorized => StatusCode::UNAUTHORIZED,
            Self::InvalidJson | Self::MissingKey => StatusCode::BAD_REQUEST,
            Self::Internal => StatusCode::INTERNAL_SERVER_ERROR,
        };

        let body = Json(ErrorResponse {
            ok: false,
            error: self.to_string(),
        });

        (status, body).into_response()
    }
}

/// Result type for API handlers.
pub type ApiResult<T> = Result<T, ApiError>;
