//! Refresh-token rotation
//!
//! A refresh token is single-use: presenting it mints a new access/refresh
//! pair and atomically replaces the stored slot value. Replay of an already
//! rotated token is rejected, and a compare-and-swap failure aborts the whole
//! rotation so the store is never left between states.

use tracing::{debug, warn};

use clipstream_db::{Database, User};

use crate::error::AuthError;
use crate::token::{TokenPair, TokenService};

/// Rotate a refresh token into a fresh access/refresh pair
///
/// Fails with:
/// - [`AuthError::Malformed`] / [`AuthError::BadSignature`] /
///   [`AuthError::Expired`] when the presented token does not verify,
/// - [`AuthError::UserNotFound`] when the subject no longer exists,
/// - [`AuthError::Reused`] when the token does not match the stored slot
///   (already rotated, revoked by logout, or never issued),
/// - [`AuthError::Stale`] when the slot changed between the comparison and
///   the swap; nothing is issued and the store is unchanged.
pub async fn rotate_refresh_token(
    db: &Database,
    tokens: &TokenService,
    incoming: &str,
) -> Result<(TokenPair, User), AuthError> {
    let claims = tokens.verify_refresh(incoming)?;
    let user_id = claims.user_id()?;

    let user = db
        .get_user_by_id(user_id)
        .await?
        .ok_or(AuthError::UserNotFound)?;

    // Replay detection: the token must still be the one in the slot. An
    // empty slot (logged out) fails the same way.
    match user.refresh_token.as_deref() {
        Some(stored) if stored == incoming => {}
        _ => {
            warn!(user_id, "refresh token replay or revoked-session use rejected");
            return Err(AuthError::Reused);
        }
    }

    let pair = tokens.issue_pair(&user)?;

    let swapped = db
        .compare_and_swap_refresh_token(user.id, Some(incoming), Some(&pair.refresh_token))
        .await?;
    if !swapped {
        // A concurrent rotation won the slot; discard the pair we minted
        warn!(user_id, "refresh slot changed during rotation");
        return Err(AuthError::Stale);
    }

    debug!(user_id, "refresh token rotated");
    Ok((pair, user))
}

#[cfg(test)]
mod tests {
    use super::*;
    use clipstream_db::NewUser;

    async fn setup() -> (Database, TokenService, User) {
        let db = Database::open_in_memory().await.unwrap();
        let tokens = TokenService::new("access-secret", "refresh-secret", 15, 7);
        let user = db
            .insert_user(NewUser {
                username: "alice".to_string(),
                email: "alice@example.com".to_string(),
                full_name: "Alice Example".to_string(),
                password_hash: "$argon2id$stub".to_string(),
            })
            .await
            .unwrap();
        (db, tokens, user)
    }

    /// Put a refresh token into the slot the way a login does
    async fn activate_session(db: &Database, tokens: &TokenService, user: &User) -> String {
        let refresh = tokens.issue_refresh_token(user.id).unwrap();
        assert!(
            db.compare_and_swap_refresh_token(user.id, None, Some(&refresh))
                .await
                .unwrap()
        );
        refresh
    }

    #[tokio::test]
    async fn test_rotation_replaces_slot() {
        let (db, tokens, user) = setup().await;
        let r1 = activate_session(&db, &tokens, &user).await;

        let (pair, rotated_user) = rotate_refresh_token(&db, &tokens, &r1).await.unwrap();
        assert_eq!(rotated_user.id, user.id);
        assert_ne!(pair.refresh_token, r1);

        let stored = db.get_user_by_id(user.id).await.unwrap().unwrap();
        assert_eq!(stored.refresh_token.as_deref(), Some(pair.refresh_token.as_str()));
    }

    #[tokio::test]
    async fn test_replay_of_rotated_token_rejected() {
        let (db, tokens, user) = setup().await;
        let r1 = activate_session(&db, &tokens, &user).await;

        let (pair, _) = rotate_refresh_token(&db, &tokens, &r1).await.unwrap();

        // R1 was spent by the rotation above
        let replay = rotate_refresh_token(&db, &tokens, &r1).await;
        assert!(matches!(replay, Err(AuthError::Reused)));

        // R2 still works, exactly once
        let (pair2, _) = rotate_refresh_token(&db, &tokens, &pair.refresh_token)
            .await
            .unwrap();
        let replay2 = rotate_refresh_token(&db, &tokens, &pair.refresh_token).await;
        assert!(matches!(replay2, Err(AuthError::Reused)));
        assert_ne!(pair2.refresh_token, pair.refresh_token);
    }

    #[tokio::test]
    async fn test_rotation_after_logout_rejected() {
        let (db, tokens, user) = setup().await;
        let r1 = activate_session(&db, &tokens, &user).await;

        db.clear_refresh_token(user.id).await.unwrap();

        let result = rotate_refresh_token(&db, &tokens, &r1).await;
        assert!(matches!(result, Err(AuthError::Reused)));
    }

    #[tokio::test]
    async fn test_never_issued_token_rejected() {
        let (db, tokens, user) = setup().await;
        // Valid signature and subject, but the slot is empty
        let stray = tokens.issue_refresh_token(user.id).unwrap();

        let result = rotate_refresh_token(&db, &tokens, &stray).await;
        assert!(matches!(result, Err(AuthError::Reused)));
    }

    #[tokio::test]
    async fn test_unknown_subject_rejected() {
        let (db, tokens, _user) = setup().await;
        let ghost = tokens.issue_refresh_token(9999).unwrap();

        let result = rotate_refresh_token(&db, &tokens, &ghost).await;
        assert!(matches!(result, Err(AuthError::UserNotFound)));
    }

    #[tokio::test]
    async fn test_expired_refresh_token_rejected() {
        let (db, _tokens, user) = setup().await;
        let expired = TokenService::new("access-secret", "refresh-secret", 15, -1);
        let r1 = expired.issue_refresh_token(user.id).unwrap();
        db.compare_and_swap_refresh_token(user.id, None, Some(&r1))
            .await
            .unwrap();

        let result = rotate_refresh_token(&db, &expired, &r1).await;
        assert!(matches!(result, Err(AuthError::Expired)));
    }

    #[tokio::test]
    async fn test_garbage_token_rejected() {
        let (db, tokens, _user) = setup().await;
        let result = rotate_refresh_token(&db, &tokens, "garbage").await;
        assert!(matches!(result, Err(AuthError::Malformed)));
    }
}
