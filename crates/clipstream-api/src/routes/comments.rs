//! Comment routes
//!
//! Mutations are gated to the comment owner via the ownership guard.

use axum::{
    Json, Router,
    extract::{Path, State},
    http::StatusCode,
    routing::{delete, patch, post},
};
use clipstream_auth::authorize_owner;
use clipstream_db::{Comment, NewComment};
use tracing::{debug, info};

use crate::error::ApiError;
use crate::state::AppState;

use super::auth::RequireAuth;
use super::types::{CommentRequest, CommentResponse};

fn validate_content(content: &str) -> Result<(), ApiError> {
    if content.trim().is_empty() {
        return Err(ApiError::BadRequest("Comment cannot be empty".to_string()));
    }
    Ok(())
}

async fn load_comment(state: &AppState, id: i64) -> Result<Comment, ApiError> {
    state
        .db
        .get_comment_by_id(id)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("Comment: {}", id)))
}

/// POST /api/v1/videos/{video_id}/comments
async fn add_comment(
    RequireAuth(user): RequireAuth,
    State(state): State<AppState>,
    Path(video_id): Path<i64>,
    Json(request): Json<CommentRequest>,
) -> Result<(StatusCode, Json<CommentResponse>), ApiError> {
    validate_content(&request.content)?;

    let comment = state
        .db
        .insert_comment(NewComment {
            video_id,
            owner_id: user.id,
            content: request.content,
        })
        .await?;

    debug!("User {} commented on video {}", user.username, video_id);

    Ok((StatusCode::CREATED, Json(comment.into())))
}

/// PATCH /api/v1/comments/{id} (owner only)
async fn update_comment(
    RequireAuth(user): RequireAuth,
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(request): Json<CommentRequest>,
) -> Result<Json<CommentResponse>, ApiError> {
    validate_content(&request.content)?;

    let comment = load_comment(&state, id).await?;
    authorize_owner(comment.owner_id, user.id)?;

    state.db.update_comment_content(id, &request.content).await?;
    let updated = load_comment(&state, id).await?;

    Ok(Json(updated.into()))
}

/// DELETE /api/v1/comments/{id} (owner only)
async fn delete_comment(
    RequireAuth(user): RequireAuth,
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<StatusCode, ApiError> {
    let comment = load_comment(&state, id).await?;
    authorize_owner(comment.owner_id, user.id)?;

    state.db.delete_comment(id).await?;

    info!("User {} deleted comment {}", user.username, id);

    Ok(StatusCode::NO_CONTENT)
}

/// Create comment routes
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/api/v1/videos/{video_id}/comments", post(add_comment))
        .route("/api/v1/comments/{id}", patch(update_comment))
        .route("/api/v1/comments/{id}", delete(delete_comment))
}
