//! JWT access and refresh token management
//!
//! Access tokens are self-contained: any holder of the verification secret
//! can check integrity and expiry without a store lookup. Refresh tokens are
//! signed with a separate secret and live materially longer; their signed
//! string is additionally persisted in the user's refresh slot (see
//! [`crate::rotate`]).

use chrono::{Duration, Utc};
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};
use tracing::debug;
use uuid::Uuid;

use clipstream_db::User;

use crate::error::AuthError;

/// Claims carried by an access token
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct AccessClaims {
    /// Subject (user ID)
    pub sub: String,
    /// Email
    pub email: String,
    /// Username
    pub username: String,
    /// Display name
    pub full_name: String,
    /// Expiration time (Unix timestamp)
    pub exp: i64,
    /// Issued at (Unix timestamp)
    pub iat: i64,
}

impl AccessClaims {
    /// Parse the subject back into a user ID
    pub fn user_id(&self) -> Result<i64, AuthError> {
        self.sub.parse().map_err(|_| AuthError::Malformed)
    }
}

/// Claims carried by a refresh token
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct RefreshClaims {
    /// Subject (user ID)
    pub sub: String,
    /// Token ID; makes every issued refresh token distinct, which the
    /// stored-slot comparison in rotation depends on
    pub jti: String,
    /// Expiration time (Unix timestamp)
    pub exp: i64,
    /// Issued at (Unix timestamp)
    pub iat: i64,
}

impl RefreshClaims {
    /// Parse the subject back into a user ID
    pub fn user_id(&self) -> Result<i64, AuthError> {
        self.sub.parse().map_err(|_| AuthError::Malformed)
    }
}

/// A freshly issued access/refresh pair
#[derive(Debug, Clone)]
pub struct TokenPair {
    pub access_token: String,
    pub refresh_token: String,
}

/// Token issue and verification service
///
/// Stateless: issuing never touches the store, and verification needs only
/// the decoding keys, so any number of requests can verify concurrently.
#[derive(Clone)]
pub struct TokenService {
    access_encoding: EncodingKey,
    access_decoding: DecodingKey,
    refresh_encoding: EncodingKey,
    refresh_decoding: DecodingKey,
    access_ttl_minutes: i64,
    refresh_ttl_days: i64,
}

impl TokenService {
    /// Create a new token service from the two signing secrets
    pub fn new(
        access_secret: &str,
        refresh_secret: &str,
        access_ttl_minutes: i64,
        refresh_ttl_days: i64,
    ) -> Self {
        Self {
            access_encoding: EncodingKey::from_secret(access_secret.as_bytes()),
            access_decoding: DecodingKey::from_secret(access_secret.as_bytes()),
            refresh_encoding: EncodingKey::from_secret(refresh_secret.as_bytes()),
            refresh_decoding: DecodingKey::from_secret(refresh_secret.as_bytes()),
            access_ttl_minutes,
            refresh_ttl_days,
        }
    }

    /// Access-token lifetime in seconds, for cookie Max-Age and `expires_in`
    pub fn access_ttl_secs(&self) -> i64 {
        self.access_ttl_minutes * 60
    }

    /// Refresh-token lifetime in seconds
    pub fn refresh_ttl_secs(&self) -> i64 {
        self.refresh_ttl_days * 24 * 3600
    }

    /// Issue an access token for a user
    pub fn issue_access_token(&self, user: &User) -> Result<String, AuthError> {
        let now = Utc::now();
        let exp = now + Duration::minutes(self.access_ttl_minutes);

        let claims = AccessClaims {
            sub: user.id.to_string(),
            email: user.email.clone(),
            username: user.username.clone(),
            full_name: user.full_name.clone(),
            exp: exp.timestamp(),
            iat: now.timestamp(),
        };

        debug!("Issuing access token for user: {}", user.username);

        encode(&Header::default(), &claims, &self.access_encoding).map_err(map_jwt_error)
    }

    /// Issue a refresh token for a subject
    ///
    /// The caller is responsible for persisting the returned string into the
    /// user's refresh slot; issuing alone activates nothing.
    pub fn issue_refresh_token(&self, user_id: i64) -> Result<String, AuthError> {
        let now = Utc::now();
        let exp = now + Duration::days(self.refresh_ttl_days);

        let claims = RefreshClaims {
            sub: user_id.to_string(),
            jti: Uuid::new_v4().to_string(),
            exp: exp.timestamp(),
            iat: now.timestamp(),
        };

        encode(&Header::default(), &claims, &self.refresh_encoding).map_err(map_jwt_error)
    }

    /// Issue a fresh access/refresh pair
    pub fn issue_pair(&self, user: &User) -> Result<TokenPair, AuthError> {
        Ok(TokenPair {
            access_token: self.issue_access_token(user)?,
            refresh_token: self.issue_refresh_token(user.id)?,
        })
    }

    /// Validate an access token and return its claims
    pub fn verify_access(&self, token: &str) -> Result<AccessClaims, AuthError> {
        let token_data = decode::<AccessClaims>(token, &self.access_decoding, &validation())
            .map_err(map_jwt_error)?;
        Ok(token_data.claims)
    }

    /// Validate a refresh token and return its claims
    pub fn verify_refresh(&self, token: &str) -> Result<RefreshClaims, AuthError> {
        let token_data = decode::<RefreshClaims>(token, &self.refresh_decoding, &validation())
            .map_err(map_jwt_error)?;
        Ok(token_data.claims)
    }
}

/// Expiry must be exact; the default 60s leeway would keep just-expired
/// tokens alive past their claim.
fn validation() -> Validation {
    let mut validation = Validation::default();
    validation.leeway = 0;
    validation
}

/// Collapse jsonwebtoken's error kinds into the auth taxonomy
fn map_jwt_error(err: jsonwebtoken::errors::Error) -> AuthError {
    match err.kind() {
        ErrorKind::ExpiredSignature => AuthError::Expired,
        ErrorKind::InvalidSignature => AuthError::BadSignature,
        _ => AuthError::Malformed,
    }
}
