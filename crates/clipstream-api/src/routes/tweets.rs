//! Tweet routes
//!
//! Mutations are gated to the tweet owner via the ownership guard.

use axum::{
    Json, Router,
    extract::{Path, State},
    http::StatusCode,
    routing::{delete, patch, post},
};
use clipstream_auth::authorize_owner;
use clipstream_db::{NewTweet, Tweet};
use tracing::{debug, info};

use crate::error::ApiError;
use crate::state::AppState;

use super::auth::RequireAuth;
use super::types::{TweetRequest, TweetResponse};

fn validate_content(content: &str) -> Result<(), ApiError> {
    if content.trim().is_empty() {
        return Err(ApiError::BadRequest("Tweet cannot be empty".to_string()));
    }
    Ok(())
}

async fn load_tweet(state: &AppState, id: i64) -> Result<Tweet, ApiError> {
    state
        .db
        .get_tweet_by_id(id)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("Tweet: {}", id)))
}

/// POST /api/v1/tweets
async fn add_tweet(
    RequireAuth(user): RequireAuth,
    State(state): State<AppState>,
    Json(request): Json<TweetRequest>,
) -> Result<(StatusCode, Json<TweetResponse>), ApiError> {
    validate_content(&request.content)?;

    let tweet = state
        .db
        .insert_tweet(NewTweet {
            owner_id: user.id,
            content: request.content,
        })
        .await?;

    debug!("User {} posted tweet {}", user.username, tweet.id);

    Ok((StatusCode::CREATED, Json(tweet.into())))
}

/// PATCH /api/v1/tweets/{id} (owner only)
async fn update_tweet(
    RequireAuth(user): RequireAuth,
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(request): Json<TweetRequest>,
) -> Result<Json<TweetResponse>, ApiError> {
    validate_content(&request.content)?;

    let tweet = load_tweet(&state, id).await?;
    authorize_owner(tweet.owner_id, user.id)?;

    state.db.update_tweet_content(id, &request.content).await?;
    let updated = load_tweet(&state, id).await?;

    Ok(Json(updated.into()))
}

/// DELETE /api/v1/tweets/{id} (owner only)
async fn delete_tweet(
    RequireAuth(user): RequireAuth,
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<StatusCode, ApiError> {
    let tweet = load_tweet(&state, id).await?;
    authorize_owner(tweet.owner_id, user.id)?;

    state.db.delete_tweet(id).await?;

    info!("User {} deleted tweet {}", user.username, id);

    Ok(StatusCode::NO_CONTENT)
}

/// Create tweet routes
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/api/v1/tweets", post(add_tweet))
        .route("/api/v1/tweets/{id}", patch(update_tweet))
        .route("/api/v1/tweets/{id}", delete(delete_tweet))
}
