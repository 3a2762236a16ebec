//! API error types with JSON responses.
//!
//! Every error leaves the server as `{ "error": "<message>" }`.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use shelf_rules::Violation;
use shelf_store::StoreError;

/// API error that can be returned from handlers and middleware.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// A write or delete rule turned the request away.
    #[error("{0}")]
    Rejected(#[from] Violation),

    /// Bad request (400).
    #[error("{0}")]
    BadRequest(String),

    /// Request body over the configured limit (413).
    #[error("Request body too large")]
    PayloadTooLarge,

    /// Not found (404).
    #[error("{0}")]
    NotFound(String),

    /// Internal server error (500).
    #[error("{0}")]
    Internal(String),

    /// Store error.
    #[error("storage error: {0}")]
    Store(#[from] StoreError),
}

impl ApiError {
    /// Get the error code string for this error, for logs.
    pub fn code(&self) -> &'static str {
        match self {
            Self::Rejected(v) => v.kind(),
            Self::BadRequest(_) => "bad_request",
            Self::PayloadTooLarge => "payload_too_large",
            Self::NotFound(_) => "not_found",
            Self::Internal(_) => "internal",
            Self::Store(e) if e.is_not_found() => "not_found",
            Self::Store(StoreError::DuplicateId { .. } | StoreError::IdSpaceExhausted { .. }) => {
                "conflict"
            }
            Self::Store(_) => "storage",
        }
    }

    /// Get the HTTP status code for this error.
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::Rejected(v) => v.status_code(),
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::PayloadTooLarge => StatusCode::PAYLOAD_TOO_LARGE,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::Store(e) if e.is_not_found() => StatusCode::NOT_FOUND,
            Self::Store(StoreError::DuplicateId { .. } | StoreError::IdSpaceExhausted { .. }) => {
                StatusCode::CONFLICT
            }
            Self::Store(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Message shown to the client.
    ///
    /// Storage failures other than missing records and id clashes are not
    /// described to the client; they are logged instead.
    pub fn message(&self) -> String {
        match self {
            Self::Store(e) if e.is_not_found() => Violation::NotFound.to_string(),
            Self::Store(e @ (StoreError::DuplicateId { .. } | StoreError::IdSpaceExhausted { .. })) => {
                e.to_string()
            }
            Self::Store(_) | Self::Internal(_) => "Internal server error".to_string(),
            other => other.to_string(),
        }
    }
}

/// JSON error response body.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    /// Human-readable error message.
    pub error: String,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() {
            tracing::error!(code = self.code(), error = %self, "Request failed");
        }

        (status, Json(ErrorResponse { error: self.message() })).into_response()
    }
}

/// Result type for API handlers.
pub type ApiResult<T> = Result<T, ApiError>;
