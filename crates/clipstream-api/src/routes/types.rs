//! Request/Response DTOs

use clipstream_db::{Comment, Tweet, User};
use serde::{Deserialize, Serialize};

// ==================== Auth Types ====================

/// Register request
#[derive(Deserialize)]
pub struct RegisterRequest {
    pub username: String,
    pub email: String,
    pub full_name: String,
    pub password: String,
}

/// Login request; `login` is a username or an email
#[derive(Deserialize)]
pub struct LoginRequest {
    pub login: String,
    pub password: String,
}

/// Login response
#[derive(Serialize)]
pub struct LoginResponse {
    pub user: UserResponse,
    pub access_token: String,
    pub refresh_token: String,
    pub expires_in: i64,
}

/// Refresh request body; the token may come from the cookie instead
#[derive(Deserialize, Default)]
pub struct RefreshRequest {
    #[serde(default)]
    pub refresh_token: Option<String>,
}

/// Refresh response
#[derive(Serialize)]
pub struct TokenPairResponse {
    pub access_token: String,
    pub refresh_token: String,
    pub expires_in: i64,
}

/// Change-password request
#[derive(Deserialize)]
pub struct ChangePasswordRequest {
    pub old_password: String,
    pub new_password: String,
}

/// Plain acknowledgement
#[derive(Serialize)]
pub struct MessageResponse {
    pub message: String,
}

/// User response (no credential material)
#[derive(Serialize)]
pub struct UserResponse {
    pub id: i64,
    pub username: String,
    pub email: String,
    pub full_name: String,
    pub created_at: String,
    pub updated_at: String,
}

impl From<User> for UserResponse {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            username: user.username,
            email: user.email,
            full_name: user.full_name,
            created_at: user.created_at.to_rfc3339(),
            updated_at: user.updated_at.to_rfc3339(),
        }
    }
}

// ==================== Comment Types ====================

/// Create/update comment request
#[derive(Deserialize)]
pub struct CommentRequest {
    pub content: String,
}

/// Comment response
#[derive(Serialize)]
pub struct CommentResponse {
    pub id: i64,
    pub video_id: i64,
    pub owner_id: i64,
    pub content: String,
    pub created_at: String,
    pub updated_at: String,
}

impl From<Comment> for CommentResponse {
    fn from(comment: Comment) -> Self {
        Self {
            id: comment.id,
            video_id: comment.video_id,
            owner_id: comment.owner_id,
            content: comment.content,
            created_at: comment.created_at.to_rfc3339(),
            updated_at: comment.updated_at.to_rfc3339(),
        }
    }
}

// ==================== Tweet Types ====================

/// Create/update tweet request
#[derive(Deserialize)]
pub struct TweetRequest {
    pub content: String,
}

/// Tweet response
#[derive(Serialize)]
pub struct TweetResponse {
    pub id: i64,
    pub owner_id: i64,
    pub content: String,
    pub created_at: String,
    pub updated_at: String,
}

impl From<Tweet> for TweetResponse {
    fn from(tweet: Tweet) -> Self {
        Self {
            id: tweet.id,
            owner_id: tweet.owner_id,
            content: tweet.content,
            created_at: tweet.created_at.to_rfc3339(),
            updated_at: tweet.updated_at.to_rfc3339(),
        }
    }
}
