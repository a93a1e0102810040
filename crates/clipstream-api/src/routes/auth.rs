//! Authentication extractors and routes

use axum::{
    Json, Router,
    extract::{FromRef, FromRequestParts, State},
    http::{HeaderMap, HeaderName, StatusCode, header::SET_COOKIE, request::Parts},
    response::AppendHeaders,
    routing::{get, post},
};
use clipstream_auth::{
    ACCESS_TOKEN_COOKIE, AuthError, AuthUser, REFRESH_TOKEN_COOKIE, TokenPair, bearer_token,
    cookie_value, hash_password, rotate_refresh_token, verify_password,
};
use clipstream_db::NewUser;
use tracing::{debug, info};

use crate::error::ApiError;
use crate::state::AppState;

use super::types::{
    ChangePasswordRequest, LoginRequest, LoginResponse, MessageResponse, RefreshRequest,
    RegisterRequest, TokenPairResponse, UserResponse,
};

// ==================== Auth Extractor ====================

/// Extractor for authenticated user (required)
///
/// Verifies the access token once and hands the handler an immutable
/// [`AuthUser`]; handlers never read headers or tokens themselves.
pub struct RequireAuth(pub AuthUser);

impl<S> FromRequestParts<S> for RequireAuth
where
    AppState: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let app_state = AppState::from_ref(state);

        let token = bearer_token(&parts.headers).ok_or(AuthError::MissingToken)?;
        let claims = app_state.tokens.verify_access(&token)?;
        let user = AuthUser::from_claims(&claims)?;

        debug!("Authenticated user: {}", user.username);
        Ok(RequireAuth(user))
    }
}

// ==================== Input Validation ====================

/// Maximum allowed username length
const MAX_USERNAME_LENGTH: usize = 64;
/// Maximum allowed password length (prevent DoS with very large passwords)
const MAX_PASSWORD_LENGTH: usize = 256;
/// Minimum allowed password length
const MIN_PASSWORD_LENGTH: usize = 8;

/// Validate username format and length
fn validate_username(username: &str) -> Result<(), ApiError> {
    if username.trim().is_empty() {
        return Err(ApiError::BadRequest("Username cannot be empty".to_string()));
    }
    if username.len() > MAX_USERNAME_LENGTH {
        return Err(ApiError::BadRequest(format!(
            "Username exceeds maximum length of {} characters",
            MAX_USERNAME_LENGTH
        )));
    }
    // Only allow alphanumeric characters, underscores, and hyphens
    if !username.chars().all(|c| c.is_alphanumeric() || c == '_' || c == '-') {
        return Err(ApiError::BadRequest(
            "Username can only contain alphanumeric characters, underscores, and hyphens"
                .to_string(),
        ));
    }
    Ok(())
}

/// Validate password length
fn validate_password(password: &str) -> Result<(), ApiError> {
    if password.len() < MIN_PASSWORD_LENGTH {
        return Err(ApiError::BadRequest(format!(
            "Password must be at least {} characters long",
            MIN_PASSWORD_LENGTH
        )));
    }
    if password.len() > MAX_PASSWORD_LENGTH {
        return Err(ApiError::BadRequest(format!(
            "Password exceeds maximum length of {} characters",
            MAX_PASSWORD_LENGTH
        )));
    }
    Ok(())
}

/// Minimal shape check; real deliverability is the mail system's problem
fn validate_email(email: &str) -> Result<(), ApiError> {
    let trimmed = email.trim();
    if trimmed.is_empty() {
        return Err(ApiError::BadRequest("Email cannot be empty".to_string()));
    }
    if !trimmed.contains('@') || trimmed.starts_with('@') || trimmed.ends_with('@') {
        return Err(ApiError::BadRequest("Invalid email address".to_string()));
    }
    Ok(())
}

// ==================== Cookies ====================

type CookieHeaders = AppendHeaders<[(HeaderName, String); 2]>;

/// Set-Cookie headers for a fresh token pair
fn session_cookies(state: &AppState, pair: &TokenPair) -> CookieHeaders {
    AppendHeaders([
        (
            SET_COOKIE,
            format!(
                "{}={}; Path=/; Max-Age={}; HttpOnly; Secure; SameSite=None",
                ACCESS_TOKEN_COOKIE,
                pair.access_token,
                state.tokens.access_ttl_secs()
            ),
        ),
        (
            SET_COOKIE,
            format!(
                "{}={}; Path=/; Max-Age={}; HttpOnly; Secure; SameSite=None",
                REFRESH_TOKEN_COOKIE,
                pair.refresh_token,
                state.tokens.refresh_ttl_secs()
            ),
        ),
    ])
}

/// Set-Cookie headers that drop both cookies
fn clear_session_cookies() -> CookieHeaders {
    AppendHeaders([
        (
            SET_COOKIE,
            format!(
                "{}=; Path=/; Max-Age=0; HttpOnly; Secure; SameSite=None",
                ACCESS_TOKEN_COOKIE
            ),
        ),
        (
            SET_COOKIE,
            format!(
                "{}=; Path=/; Max-Age=0; HttpOnly; Secure; SameSite=None",
                REFRESH_TOKEN_COOKIE
            ),
        ),
    ])
}

// ==================== Auth Routes ====================

/// POST /api/v1/auth/register
async fn register(
    State(state): State<AppState>,
    Json(request): Json<RegisterRequest>,
) -> Result<(StatusCode, Json<UserResponse>), ApiError> {
    validate_username(&request.username)?;
    validate_email(&request.email)?;
    validate_password(&request.password)?;
    if request.full_name.trim().is_empty() {
        return Err(ApiError::BadRequest("Full name cannot be empty".to_string()));
    }

    debug!("Registering user: {}", request.username);

    let password_hash = hash_password(&request.password)?;

    let user = state
        .db
        .insert_user(NewUser {
            username: request.username,
            email: request.email,
            full_name: request.full_name.trim().to_string(),
            password_hash,
        })
        .await?;

    info!("Registered user: {}", user.username);

    Ok((StatusCode::CREATED, Json(user.into())))
}

/// POST /api/v1/auth/login
async fn login(
    State(state): State<AppState>,
    Json(request): Json<LoginRequest>,
) -> Result<(CookieHeaders, Json<LoginResponse>), ApiError> {
    if request.login.trim().is_empty() {
        return Err(ApiError::BadRequest(
            "Username or email is required".to_string(),
        ));
    }
    if request.password.is_empty() {
        return Err(ApiError::BadRequest("Password is required".to_string()));
    }
    if request.password.len() > MAX_PASSWORD_LENGTH {
        return Err(ApiError::BadRequest(format!(
            "Password exceeds maximum length of {} characters",
            MAX_PASSWORD_LENGTH
        )));
    }

    debug!("Login attempt for: {}", request.login);

    // Find user - but don't return early to prevent timing attacks
    let user_result = state.db.get_user_by_login(&request.login).await?;

    // Verify password - always perform verification to prevent timing attacks
    // Use a dummy hash when user doesn't exist to maintain constant-time behavior
    // This dummy hash is a valid Argon2 hash that will always fail verification
    const DUMMY_HASH: &str =
        "$argon2id$v=19$m=19456,t=2,p=1$dGltaW5nX2F0dGFja19wcmV2ZW50aW9u$K8rI5T7VdQ8xkO0GqK5K2w";

    let (hash_to_verify, user) = match user_result {
        Some(u) => (u.password_hash.clone(), Some(u)),
        None => (DUMMY_HASH.to_string(), None),
    };

    let password_valid = verify_password(&request.password, &hash_to_verify)?;

    let user = match (user, password_valid) {
        (Some(u), true) => u,
        _ => return Err(AuthError::InvalidCredentials.into()),
    };

    // Rotate the new refresh token into the slot against the value read with
    // the credentials; a concurrent login shows up as a retryable conflict
    // instead of silently overwriting it
    let pair = state.tokens.issue_pair(&user)?;
    let swapped = state
        .db
        .compare_and_swap_refresh_token(
            user.id,
            user.refresh_token.as_deref(),
            Some(&pair.refresh_token),
        )
        .await?;
    if !swapped {
        return Err(AuthError::Stale.into());
    }

    info!("User {} logged in successfully", user.username);

    let cookies = session_cookies(&state, &pair);
    Ok((
        cookies,
        Json(LoginResponse {
            user: user.into(),
            access_token: pair.access_token,
            refresh_token: pair.refresh_token,
            expires_in: state.tokens.access_ttl_secs(),
        }),
    ))
}

/// POST /api/v1/auth/logout
async fn logout(
    RequireAuth(user): RequireAuth,
    State(state): State<AppState>,
) -> Result<(CookieHeaders, Json<MessageResponse>), ApiError> {
    state.db.clear_refresh_token(user.id).await?;

    info!("User {} logged out", user.username);

    Ok((
        clear_session_cookies(),
        Json(MessageResponse {
            message: "Logged out".to_string(),
        }),
    ))
}

/// POST /api/v1/auth/refresh-token
///
/// The body is optional; cookie-only clients send none at all.
async fn refresh_token(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: String,
) -> Result<(CookieHeaders, Json<TokenPairResponse>), ApiError> {
    let incoming = cookie_value(&headers, REFRESH_TOKEN_COOKIE)
        .or_else(|| {
            serde_json::from_str::<RefreshRequest>(&body)
                .ok()
                .and_then(|b| b.refresh_token)
        })
        .ok_or(AuthError::MissingToken)?;

    let (pair, user) = rotate_refresh_token(&state.db, &state.tokens, &incoming).await?;

    debug!("Refreshed session for user: {}", user.username);

    let cookies = session_cookies(&state, &pair);
    Ok((
        cookies,
        Json(TokenPairResponse {
            access_token: pair.access_token,
            refresh_token: pair.refresh_token,
            expires_in: state.tokens.access_ttl_secs(),
        }),
    ))
}

/// POST /api/v1/auth/change-password
///
/// Re-hashes the credential; the outstanding refresh token stays valid.
async fn change_password(
    RequireAuth(auth): RequireAuth,
    State(state): State<AppState>,
    Json(request): Json<ChangePasswordRequest>,
) -> Result<Json<MessageResponse>, ApiError> {
    let user = state
        .db
        .get_user_by_id(auth.id)
        .await?
        .ok_or(AuthError::UserNotFound)?;

    if !verify_password(&request.old_password, &user.password_hash)? {
        return Err(AuthError::InvalidCredentials.into());
    }

    validate_password(&request.new_password)?;

    let password_hash = hash_password(&request.new_password)?;
    state.db.update_user_password(user.id, &password_hash).await?;

    info!("User {} changed password", user.username);

    Ok(Json(MessageResponse {
        message: "Password changed".to_string(),
    }))
}

/// GET /api/v1/auth/me
async fn me(
    RequireAuth(auth): RequireAuth,
    State(state): State<AppState>,
) -> Result<Json<UserResponse>, ApiError> {
    let user = state
        .db
        .get_user_by_id(auth.id)
        .await?
        .ok_or(AuthError::UserNotFound)?;

    Ok(Json(user.into()))
}

/// Create auth routes
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/api/v1/auth/register", post(register))
        .route("/api/v1/auth/login", post(login))
        .route("/api/v1/auth/logout", post(logout))
        .route("/api/v1/auth/refresh-token", post(refresh_token))
        .route("/api/v1/auth/change-password", post(change_password))
        .route("/api/v1/auth/me", get(me))
}
