//! Ledger error types with HTTP status code mapping.
//!
//! [`LedgerError`] is the central error type of the crate. Each variant
//! maps to a specific HTTP status code and structured JSON error response.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;
use utoipa::ToSchema;

/// Structured JSON error response body.
///
/// All error responses follow this shape:
/// ```json
/// {
///   "error": {
///     "code": 2001,
///     "message": "account not found: 10001",
///     "details": null
///   }
/// }
/// ```
#[derive(Debug, Serialize, ToSchema)]
pub struct ErrorResponse {
    /// Structured error payload.
    pub error: ErrorBody,
}

/// Inner error body with numeric code and human-readable message.
#[derive(Debug, Serialize, ToSchema)]
pub struct ErrorBody {
    /// Numeric error code.
    pub code: u32,
    /// Human-readable error message.
    pub message: String,
    /// Optional additional details.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

/// Server-side error enum with HTTP status code mapping.
///
/// # Error Code Ranges
///
/// | Range     | Category        | HTTP Status                  |
/// |-----------|-----------------|------------------------------|
/// | 1000–1999 | Validation      | 400 Bad Request              |
/// | 2000–2999 | State/Not Found | 404 Not Found / 409 Conflict |
/// | 3000–3999 | Server          | 500 Internal Server Error    |
/// | 5000–5999 | Upstream        | 502 Bad Gateway              |
#[derive(Debug, thiserror::Error)]
pub enum LedgerError {
    /// No stored account has the given uid.
    #[error("account not found: {0}")]
    AccountNotFound(String),

    /// An operation needs a selected account and none is active.
    #[error("no active account")]
    NoActiveAccount,

    /// Request validation failed.
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    /// Unsupported sync mode string.
    #[error("invalid sync mode: {0}")]
    InvalidSyncMode(String),

    /// The remote record source failed or rejected the request.
    #[error("remote error: {0}")]
    Remote(String),

    /// Persistence layer failure.
    #[error("persistence error: {0}")]
    PersistenceError(String),

    /// Metadata package could not be read.
    #[error("metadata error: {0}")]
    Metadata(String),

    /// Internal server error.
    #[error("internal error: {0}")]
    Internal(String),
}

impl LedgerError {
    /// Returns the numeric error code for this variant.
    #[must_use]
    pub const fn error_code(&self) -> u32 {
        match self {
            Self::InvalidRequest(_) => 1001,
            Self::InvalidSyncMode(_) => 1002,
            Self::AccountNotFound(_) => 2001,
            Self::NoActiveAccount => 2002,
            Self::Internal(_) => 3000,
            Self::PersistenceError(_) => 3001,
            Self::Metadata(_) => 3002,
            Self::Remote(_) => 5001,
        }
    }

    /// Returns the HTTP status code for this variant.
    #[must_use]
    pub const fn status_code(&self) -> StatusCode {
        match self {
            Self::InvalidRequest(_) | Self::InvalidSyncMode(_) => StatusCode::BAD_REQUEST,
            Self::AccountNotFound(_) => StatusCode::NOT_FOUND,
            Self::NoActiveAccount => StatusCode::CONFLICT,
            Self::PersistenceError(_) | Self::Metadata(_) | Self::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
            Self::Remote(_) => StatusCode::BAD_GATEWAY,
        }
    }
}

impl From<sqlx::Error> for LedgerError {
    fn from(err: sqlx::Error) -> Self {
        Self::PersistenceError(err.to_string())
    }
}

impl From<reqwest::Error> for LedgerError {
    fn from(err: reqwest::Error) -> Self {
        Self::Remote(err.to_string())
    }
}

impl IntoResponse for LedgerError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let body = ErrorResponse {
            error: ErrorBody {
                code: self.error_code(),
                message: self.to_string(),
                details: None,
            },
        };
        let mut response = axum::Json(body).into_response();
        *response.status_mut() = status;
        response
    }
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;

    #[test]
    fn precondition_errors_are_client_errors() {
        assert_eq!(
            LedgerError::AccountNotFound("u1".into()).status_code(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            LedgerError::NoActiveAccount.status_code(),
            StatusCode::CONFLICT
        );
        assert_eq!(
            LedgerError::InvalidSyncMode("x".into()).status_code(),
            StatusCode::BAD_REQUEST
        );
    }

    #[test]
    fn upstream_failures_map_to_bad_gateway() {
        let err = LedgerError::Remote("code 3".into());
        assert_eq!(err.status_code(), StatusCode::BAD_GATEWAY);
        assert_eq!(err.error_code(), 5001);
    }

    #[test]
    fn into_response_carries_status() {
        let response = LedgerError::NoActiveAccount.into_response();
        assert_eq!(response.status(), StatusCode::CONFLICT);
    }
}
