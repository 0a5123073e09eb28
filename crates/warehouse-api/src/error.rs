//! Maps domain `AppError` to HTTP responses.

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::{Deserialize, Serialize};

use warehouse_core::{AppError, ErrorKind};

/// Standard API error response body.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiErrorResponse {
    /// Machine-readable error code.
    pub error: String,
    /// Fixed human-readable message for the code.
    pub message: String,
    /// Caller-facing detail, present only for input validation failures.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

/// An [`AppError`] on its way out of a handler.
#[derive(Debug)]
pub struct ApiError(pub AppError);

impl From<AppError> for ApiError {
    fn from(err: AppError) -> Self {
        Self(err)
    }
}

/// Status code and fixed message for an error kind.
pub fn status_for(kind: ErrorKind) -> (StatusCode, &'static str) {
    match kind {
        ErrorKind::NotFound => (StatusCode::NOT_FOUND, "not found"),
        ErrorKind::Forbidden => (StatusCode::FORBIDDEN, "insufficient permissions"),
        ErrorKind::InvalidCredentials => (StatusCode::UNAUTHORIZED, "invalid credentials"),
        ErrorKind::TokenInvalid => (StatusCode::UNAUTHORIZED, "invalid token"),
        ErrorKind::TokenExpired => (StatusCode::UNAUTHORIZED, "token expired"),
        ErrorKind::DuplicateSku => (StatusCode::CONFLICT, "item with this SKU already exists"),
        ErrorKind::AlreadyExists => (StatusCode::CONFLICT, "already exists"),
        ErrorKind::NoChanges => (StatusCode::BAD_REQUEST, "no changes provided"),
        ErrorKind::Validation => (StatusCode::BAD_REQUEST, "validation error"),
        ErrorKind::Cancelled | ErrorKind::Configuration | ErrorKind::Internal => {
            (StatusCode::INTERNAL_SERVER_ERROR, "internal server error")
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let err = self.0;
        let (status, message) = status_for(err.kind);

        if status.is_server_error() {
            tracing::error!(kind = %err.kind, error = %err, source = ?err.source, "Request failed");
        } else {
            tracing::debug!(kind = %err.kind, error = %err.message, "Request rejected");
        }

        let details = (err.kind == ErrorKind::Validation).then_some(err.message);
        let body = ApiErrorResponse {
            error: err.kind.code().to_string(),
            message: message.to_string(),
            details,
        };

        (status, Json(body)).into_response()
    }
}
