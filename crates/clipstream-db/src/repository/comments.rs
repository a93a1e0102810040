//! Comment operations

use chrono::Utc;
use sqlx::Row;

use crate::error::DbError;
use crate::models::{Comment, NewComment};

use super::Database;

impl Database {
    /// Insert a new comment
    pub async fn insert_comment(&self, comment: NewComment) -> Result<Comment, DbError> {
        let now = Utc::now();
        let result = sqlx::query(
            r#"
            INSERT INTO comments (video_id, owner_id, content, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?)
            RETURNING id
            "#,
        )
        .bind(comment.video_id)
        .bind(comment.owner_id)
        .bind(&comment.content)
        .bind(now.to_rfc3339())
        .bind(now.to_rfc3339())
        .fetch_one(&self.pool)
        .await?;

        let id: i64 = result.get("id");

        Ok(Comment {
            id,
            video_id: comment.video_id,
            owner_id: comment.owner_id,
            content: comment.content,
            created_at: now,
            updated_at: now,
        })
    }

    /// Get a comment by ID
    pub async fn get_comment_by_id(&self, id: i64) -> Result<Option<Comment>, DbError> {
        let result = sqlx::query(
            r#"
            SELECT id, video_id, owner_id, content, created_at, updated_at
            FROM comments
            WHERE id = ?
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        result.map(|row| Comment::try_from(&row).map_err(DbError::from)).transpose()
    }

    /// Update comment content
    pub async fn update_comment_content(&self, id: i64, content: &str) -> Result<bool, DbError> {
        let now = Utc::now();
        let result = sqlx::query(
            r#"
            UPDATE comments
            SET content = ?, updated_at = ?
            WHERE id = ?
            "#,
        )
        .bind(content)
        .bind(now.to_rfc3339())
        .bind(id)
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Delete a comment
    pub async fn delete_comment(&self, id: i64) -> Result<bool, DbError> {
        let result = sqlx::query("DELETE FROM comments WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}
