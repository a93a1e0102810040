//! User operations
//!
//! The `refresh_token` column is a single nullable slot: the one refresh
//! token currently acceptable for that user. All concurrent mutation of the
//! slot goes through [`Database::compare_and_swap_refresh_token`].

use chrono::Utc;
use sqlx::Row;

use crate::error::DbError;
use crate::models::{NewUser, User};
use crate::repository::Database;

impl Database {
    // ==================== User Operations ====================

    /// Insert a new user
    ///
    /// Username and email are stored lowercase and must both be unique.
    pub async fn insert_user(&self, user: NewUser) -> Result<User, DbError> {
        let now = Utc::now();
        let username = user.username.to_lowercase();
        let email = user.email.to_lowercase();

        // Check both unique keys up front for a precise error message
        if self.get_user_by_login(&username).await?.is_some() {
            return Err(DbError::Duplicate(format!(
                "User '{}' already exists",
                username
            )));
        }
        if self.get_user_by_login(&email).await?.is_some() {
            return Err(DbError::Duplicate(format!(
                "Email '{}' already registered",
                email
            )));
        }

        let result = sqlx::query(
            r#"
            INSERT INTO users (username, email, full_name, password_hash, refresh_token, created_at, updated_at)
            VALUES (?, ?, ?, ?, NULL, ?, ?)
            RETURNING id
            "#,
        )
        .bind(&username)
        .bind(&email)
        .bind(&user.full_name)
        .bind(&user.password_hash)
        .bind(now.to_rfc3339())
        .bind(now.to_rfc3339())
        .fetch_one(&self.pool)
        .await
        .map_err(|e| match e {
            // Unique constraint races past the pre-check under concurrency
            sqlx::Error::Database(ref db) if db.is_unique_violation() => {
                DbError::Duplicate(format!("User '{}' already exists", username))
            }
            other => DbError::Connection(other),
        })?;

        let id: i64 = result.get("id");

        Ok(User {
            id,
            username,
            email,
            full_name: user.full_name,
            password_hash: user.password_hash,
            refresh_token: None,
            created_at: now,
            updated_at: now,
        })
    }

    /// Get a user by username or email (both stored lowercase)
    pub async fn get_user_by_login(&self, login: &str) -> Result<Option<User>, DbError> {
        let key = login.to_lowercase();
        let result = sqlx::query(
            r#"
            SELECT id, username, email, full_name, password_hash, refresh_token, created_at, updated_at
            FROM users
            WHERE username = ? OR email = ?
            "#,
        )
        .bind(&key)
        .bind(&key)
        .fetch_optional(&self.pool)
        .await?;

        result.map(|row| User::try_from(&row).map_err(DbError::from)).transpose()
    }

    /// Get a user by ID
    pub async fn get_user_by_id(&self, id: i64) -> Result<Option<User>, DbError> {
        let result = sqlx::query(
            r#"
            SELECT id, username, email, full_name, password_hash, refresh_token, created_at, updated_at
            FROM users
            WHERE id = ?
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        result.map(|row| User::try_from(&row).map_err(DbError::from)).transpose()
    }

    /// Atomically replace the refresh-token slot, but only if it still holds
    /// `expected`. Returns `false` when the persisted value no longer matches,
    /// leaving the slot untouched.
    ///
    /// `IS` (rather than `=`) makes the comparison NULL-safe, so an empty
    /// slot can participate in the swap.
    pub async fn compare_and_swap_refresh_token(
        &self,
        user_id: i64,
        expected: Option<&str>,
        new: Option<&str>,
    ) -> Result<bool, DbError> {
        let now = Utc::now();
        let result = sqlx::query(
            r#"
            UPDATE users
            SET refresh_token = ?, updated_at = ?
            WHERE id = ? AND refresh_token IS ?
            "#,
        )
        .bind(new)
        .bind(now.to_rfc3339())
        .bind(user_id)
        .bind(expected)
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Unconditionally empty the refresh-token slot (logout/revocation)
    pub async fn clear_refresh_token(&self, user_id: i64) -> Result<bool, DbError> {
        let now = Utc::now();
        let result = sqlx::query(
            r#"
            UPDATE users
            SET refresh_token = NULL, updated_at = ?
            WHERE id = ?
            "#,
        )
        .bind(now.to_rfc3339())
        .bind(user_id)
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Update user password hash
    pub async fn update_user_password(&self, id: i64, password_hash: &str) -> Result<bool, DbError> {
        let now = Utc::now();
        let result = sqlx::query(
            r#"
            UPDATE users
            SET password_hash = ?, updated_at = ?
            WHERE id = ?
            "#,
        )
        .bind(password_hash)
        .bind(now.to_rfc3339())
        .bind(id)
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }
}
