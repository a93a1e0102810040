//! API error types

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ApiError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Auth error: {0}")]
    Auth(#[from] clipstream_auth::AuthError),

    #[error("Database error: {0}")]
    Database(#[from] clipstream_db::DbError),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, code, message) = match self {
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, "NOT_FOUND", msg),
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, "BAD_REQUEST", msg),
            // AuthError carries its own status mapping and envelope
            ApiError::Auth(e) => return e.into_response(),
            ApiError::Database(e) => match e {
                clipstream_db::DbError::NotFound(msg) => (StatusCode::NOT_FOUND, "NOT_FOUND", msg),
                clipstream_db::DbError::Duplicate(msg) => {
                    (StatusCode::CONFLICT, "DUPLICATE_IDENTITY", msg)
                }
                other => {
                    tracing::error!("database error: {}", other);
                    (
                        StatusCode::INTERNAL_SERVER_ERROR,
                        "INTERNAL_ERROR",
                        "Internal error".to_string(),
                    )
                }
            },
        };

        let body = axum::Json(json!({
            "error": {
                "code": code,
                "message": message,
            }
        }));

        (status, body).into_response()
    }
}
