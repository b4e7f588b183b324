//! # API error handling
//!
//! A single error type crosses the handler boundary. The two gate rejections
//! carry fixed, generic messages: callers never learn which verification or
//! permission check failed.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use thiserror::Error;

/// A unified `Result` type for request handling.
pub type Result<T> = std::result::Result<T, ApiError>;

/// Errors surfaced to API callers.
#[derive(Debug, Error)]
pub enum ApiError {
    /// Missing, malformed, expired or otherwise unverifiable credentials.
    #[error("Authentication failed: Please log in")]
    Unauthenticated,

    /// Verified caller without the rights for the requested operation.
    #[error("Authorization failed: You are not permitted to do this")]
    Forbidden,

    /// The referenced member does not exist.
    #[error("Member not found")]
    MemberNotFound,

    /// The requested username is already in use.
    #[error("Username is already taken")]
    UsernameTaken,

    /// Unexpected internal failure. The message is logged, not returned.
    #[error("internal error: {0}")]
    Internal(String),
}

impl ApiError {
    /// HTTP status for this error.
    #[must_use]
    pub const fn status(&self) -> StatusCode {
        match self {
            Self::Unauthenticated => StatusCode::UNAUTHORIZED,
            Self::Forbidden => StatusCode::FORBIDDEN,
            Self::MemberNotFound => StatusCode::NOT_FOUND,
            Self::UsernameTaken => StatusCode::CONFLICT,
            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!(error = %self, "request failed");
            return (status, "Internal server error").into_response();
        }
        (status, self.to_string()).into_response()
    }
}
