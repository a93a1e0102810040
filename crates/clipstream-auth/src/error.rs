//! Authentication error types

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum AuthError {
    #[error("Invalid credentials")]
    InvalidCredentials,

    #[error("Missing authentication token")]
    MissingToken,

    #[error("Malformed token")]
    Malformed,

    #[error("Invalid token signature")]
    BadSignature,

    #[error("Token expired")]
    Expired,

    #[error("Refresh token is expired or already used")]
    Reused,

    #[error("User not found")]
    UserNotFound,

    #[error("Not the resource owner")]
    Forbidden,

    #[error("Refresh slot changed concurrently")]
    Stale,

    #[error("Password hashing error: {0}")]
    PasswordHash(String),

    #[error("Store error: {0}")]
    Db(#[from] clipstream_db::DbError),
}

impl AuthError {
    /// Stable machine-readable code for the error envelope
    pub fn code(&self) -> &'static str {
        match self {
            AuthError::InvalidCredentials => "INVALID_CREDENTIALS",
            AuthError::MissingToken => "MISSING_TOKEN",
            AuthError::Malformed => "MALFORMED_TOKEN",
            AuthError::BadSignature => "BAD_SIGNATURE",
            AuthError::Expired => "TOKEN_EXPIRED",
            AuthError::Reused => "TOKEN_REUSED",
            AuthError::UserNotFound => "USER_NOT_FOUND",
            AuthError::Forbidden => "FORBIDDEN",
            AuthError::Stale => "STALE_TOKEN",
            AuthError::PasswordHash(_) | AuthError::Db(_) => "INTERNAL_ERROR",
        }
    }
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        let status = match &self {
            AuthError::InvalidCredentials
            | AuthError::MissingToken
            | AuthError::Malformed
            | AuthError::BadSignature
            | AuthError::Expired
            | AuthError::Reused
            | AuthError::UserNotFound => StatusCode::UNAUTHORIZED,
            AuthError::Forbidden => StatusCode::FORBIDDEN,
            AuthError::Stale => StatusCode::CONFLICT,
            AuthError::PasswordHash(_) | AuthError::Db(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };

        // Internal detail stays in the log, not in the response
        let message = if status == StatusCode::INTERNAL_SERVER_ERROR {
            tracing::error!("auth internal error: {}", self);
            "Internal error".to_string()
        } else {
            self.to_string()
        };

        let body = axum::Json(json!({
            "error": {
                "code": self.code(),
                "message": message,
            }
        }));

        (status, body).into_response()
    }
}
