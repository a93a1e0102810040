//! Verified request identity
//!
//! `AuthUser` is produced once per request by verifying the access token and
//! is then passed down the call chain as an immutable value; handlers never
//! reach back into headers or any ambient per-request storage.

use axum::http::HeaderMap;
use axum::http::header::{AUTHORIZATION, COOKIE};
use serde::{Deserialize, Serialize};

use crate::token::AccessClaims;

/// Cookie carrying the access token
pub const ACCESS_TOKEN_COOKIE: &str = "accessToken";
/// Cookie carrying the refresh token
pub const REFRESH_TOKEN_COOKIE: &str = "refreshToken";

/// Authenticated user information
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthUser {
    pub id: i64,
    pub username: String,
    pub email: String,
    pub full_name: String,
}

impl AuthUser {
    /// Create from verified access-token claims
    pub fn from_claims(claims: &AccessClaims) -> Result<Self, crate::AuthError> {
        Ok(Self {
            id: claims.user_id()?,
            username: claims.username.clone(),
            email: claims.email.clone(),
            full_name: claims.full_name.clone(),
        })
    }
}

/// Extract the access token from a request: `Authorization: Bearer` header
/// first, then the `accessToken` cookie.
pub fn bearer_token(headers: &HeaderMap) -> Option<String> {
    if let Some(header) = headers.get(AUTHORIZATION).and_then(|h| h.to_str().ok())
        && let Some(token) = header.strip_prefix("Bearer ")
    {
        let token = token.trim();
        if !token.is_empty() {
            return Some(token.to_string());
        }
    }
    cookie_value(headers, ACCESS_TOKEN_COOKIE)
}

/// Read a single cookie value from the `Cookie` header
pub fn cookie_value(headers: &HeaderMap, name: &str) -> Option<String> {
    let cookies = headers.get(COOKIE)?.to_str().ok()?;
    for pair in cookies.split(';') {
        let mut parts = pair.trim().splitn(2, '=');
        if parts.next() == Some(name) {
            let value = parts.next().unwrap_or("");
            if !value.is_empty() {
                return Some(value.to_string());
            }
        }
    }
    None
}
