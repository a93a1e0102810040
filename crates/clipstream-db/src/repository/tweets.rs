//! Tweet operations

use chrono::Utc;
use sqlx::Row;

use crate::error::DbError;
use crate::models::{NewTweet, Tweet};

use super::Database;

impl Database {
    /// Insert a new tweet
    pub async fn insert_tweet(&self, tweet: NewTweet) -> Result<Tweet, DbError> {
        let now = Utc::now();
        let result = sqlx::query(
            r#"
            INSERT INTO tweets (owner_id, content, created_at, updated_at)
            VALUES (?, ?, ?, ?)
            RETURNING id
            "#,
        )
        .bind(tweet.owner_id)
        .bind(&tweet.content)
        .bind(now.to_rfc3339())
        .bind(now.to_rfc3339())
        .fetch_one(&self.pool)
        .await?;

        let id: i64 = result.get("id");

        Ok(Tweet {
            id,
            owner_id: tweet.owner_id,
            content: tweet.content,
            created_at: now,
            updated_at: now,
        })
    }

    /// Get a tweet by ID
    pub async fn get_tweet_by_id(&self, id: i64) -> Result<Option<Tweet>, DbError> {
        let result = sqlx::query(
            r#"
            SELECT id, owner_id, content, created_at, updated_at
            FROM tweets
            WHERE id = ?
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        result.map(|row| Tweet::try_from(&row).map_err(DbError::from)).transpose()
    }

    /// Update tweet content
    pub async fn update_tweet_content(&self, id: i64, content: &str) -> Result<bool, DbError> {
        let now = Utc::now();
        let result = sqlx::query(
            r#"
            UPDATE tweets
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

    /// Delete a tweet
    pub async fn delete_tweet(&self, id: i64) -> Result<bool, DbError> {
        let result = sqlx::query("DELETE FROM tweets WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}
