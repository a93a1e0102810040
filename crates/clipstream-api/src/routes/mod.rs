//! API routes

pub mod auth;
mod comments;
mod health;
mod tweets;
pub mod types;

use axum::Router;

use crate::state::AppState;

// Re-export the guard so any route in the surrounding service can require
// authentication with the same extractor
pub use auth::RequireAuth;

/// Create the main router
pub fn create_router(state: AppState) -> Router {
    Router::new()
        // Health check
        .merge(health::routes())
        // Identity & session API
        .merge(auth::routes())
        // Owner-gated resources
        .merge(comments::routes())
        .merge(tweets::routes())
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::AppState;
    use axum::body::{Body, to_bytes};
    use axum::http::{Request, StatusCode, header};
    use clipstream_auth::TokenService;
    use clipstream_db::Database;
    use serde_json::{Value, json};
    use std::sync::Arc;
    use tower::ServiceExt;

    async fn test_app() -> Router {
        let db = Database::open_in_memory().await.unwrap();
        let tokens = Arc::new(TokenService::new("access-secret", "refresh-secret", 15, 7));
        create_router(AppState::new(db, tokens))
    }

    async fn send(
        app: &Router,
        method: &str,
        uri: &str,
        token: Option<&str>,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
        }
        let request = match body {
            Some(value) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(value.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };

        let response = app.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let value = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };
        (status, value)
    }

    async fn register(app: &Router, username: &str, password: &str) -> (StatusCode, Value) {
        send(
            app,
            "POST",
            "/api/v1/auth/register",
            None,
            Some(json!({
                "username": username,
                "email": format!("{}@example.com", username),
                "full_name": format!("{} Example", username),
                "password": password,
            })),
        )
        .await
    }

    async fn login(app: &Router, login: &str, password: &str) -> (StatusCode, Value) {
        send(
            app,
            "POST",
            "/api/v1/auth/login",
            None,
            Some(json!({ "login": login, "password": password })),
        )
        .await
    }

    #[tokio::test]
    async fn test_health() {
        let app = test_app().await;
        let (status, body) = send(&app, "GET", "/healthz", None, None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "healthy");
    }

    #[tokio::test]
    async fn test_register_login_me_flow() {
        let app = test_app().await;

        let (status, body) = register(&app, "alice", "Secret123!").await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(body["username"], "alice");
        // Credential material never leaves the service
        assert!(body.get("password_hash").is_none());
        assert!(body.get("refresh_token").is_none());

        let (status, _) = login(&app, "alice", "wrong").await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);

        let (status, body) = login(&app, "alice", "Secret123!").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["user"]["username"], "alice");
        let access = body["access_token"].as_str().unwrap().to_string();

        let (status, body) = send(&app, "GET", "/api/v1/auth/me", Some(&access), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["username"], "alice");

        // Login by email works too
        let (status, _) = login(&app, "alice@example.com", "Secret123!").await;
        assert_eq!(status, StatusCode::OK);
    }

    #[tokio::test]
    async fn test_duplicate_registration_conflicts() {
        let app = test_app().await;

        let (status, _) = register(&app, "alice", "Secret123!").await;
        assert_eq!(status, StatusCode::CREATED);

        let (status, body) = register(&app, "alice", "Other456!").await;
        assert_eq!(status, StatusCode::CONFLICT);
        assert_eq!(body["error"]["code"], "DUPLICATE_IDENTITY");
    }

    #[tokio::test]
    async fn test_register_validation() {
        let app = test_app().await;

        let (status, _) = register(&app, "", "Secret123!").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let (status, _) = register(&app, "alice", "short").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let (status, _) = send(
            &app,
            "POST",
            "/api/v1/auth/register",
            None,
            Some(json!({
                "username": "alice",
                "email": "not-an-email",
                "full_name": "Alice",
                "password": "Secret123!",
            })),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_refresh_rotation_flow() {
        let app = test_app().await;
        register(&app, "alice", "Secret123!").await;
        let (_, body) = login(&app, "alice", "Secret123!").await;
        let r1 = body["refresh_token"].as_str().unwrap().to_string();

        // R1 rotates into R2
        let (status, body) = send(
            &app,
            "POST",
            "/api/v1/auth/refresh-token",
            None,
            Some(json!({ "refresh_token": r1 })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        let r2 = body["refresh_token"].as_str().unwrap().to_string();
        assert_ne!(r1, r2);

        // Replaying R1 is rejected
        let (status, body) = send(
            &app,
            "POST",
            "/api/v1/auth/refresh-token",
            None,
            Some(json!({ "refresh_token": r1 })),
        )
        .await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["error"]["code"], "TOKEN_REUSED");

        // R2 succeeds exactly once
        let (status, _) = send(
            &app,
            "POST",
            "/api/v1/auth/refresh-token",
            None,
            Some(json!({ "refresh_token": r2.clone() })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        let (status, _) = send(
            &app,
            "POST",
            "/api/v1/auth/refresh-token",
            None,
            Some(json!({ "refresh_token": r2 })),
        )
        .await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_refresh_token_from_cookie() {
        let app = test_app().await;
        register(&app, "alice", "Secret123!").await;
        let (_, body) = login(&app, "alice", "Secret123!").await;
        let r1 = body["refresh_token"].as_str().unwrap();

        let request = Request::builder()
            .method("POST")
            .uri("/api/v1/auth/refresh-token")
            .header(header::COOKIE, format!("refreshToken={}", r1))
            .body(Body::empty())
            .unwrap();
        let response = app.clone().oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        // Rotation must also re-set both cookies
        let set_cookies: Vec<_> = response
            .headers()
            .get_all(header::SET_COOKIE)
            .iter()
            .map(|v| v.to_str().unwrap().to_string())
            .collect();
        assert!(set_cookies.iter().any(|c| c.starts_with("accessToken=")));
        assert!(set_cookies.iter().any(|c| c.starts_with("refreshToken=")));
    }

    #[tokio::test]
    async fn test_refresh_without_token() {
        let app = test_app().await;
        let (status, body) = send(&app, "POST", "/api/v1/auth/refresh-token", None, None).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["error"]["code"], "MISSING_TOKEN");
    }

    #[tokio::test]
    async fn test_logout_revokes_refresh_token() {
        let app = test_app().await;
        register(&app, "alice", "Secret123!").await;
        let (_, body) = login(&app, "alice", "Secret123!").await;
        let access = body["access_token"].as_str().unwrap().to_string();
        let refresh = body["refresh_token"].as_str().unwrap().to_string();

        let (status, _) = send(&app, "POST", "/api/v1/auth/logout", Some(&access), None).await;
        assert_eq!(status, StatusCode::OK);

        // The not-yet-expired refresh token is dead after logout
        let (status, _) = send(
            &app,
            "POST",
            "/api/v1/auth/refresh-token",
            None,
            Some(json!({ "refresh_token": refresh })),
        )
        .await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_change_password() {
        let app = test_app().await;
        register(&app, "alice", "Secret123!").await;
        let (_, body) = login(&app, "alice", "Secret123!").await;
        let access = body["access_token"].as_str().unwrap().to_string();
        let refresh = body["refresh_token"].as_str().unwrap().to_string();

        // Wrong old password is rejected
        let (status, _) = send(
            &app,
            "POST",
            "/api/v1/auth/change-password",
            Some(&access),
            Some(json!({ "old_password": "wrong", "new_password": "NewSecret456!" })),
        )
        .await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);

        let (status, _) = send(
            &app,
            "POST",
            "/api/v1/auth/change-password",
            Some(&access),
            Some(json!({ "old_password": "Secret123!", "new_password": "NewSecret456!" })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);

        // The outstanding refresh token is not revoked by a password change
        let (status, _) = send(
            &app,
            "POST",
            "/api/v1/auth/refresh-token",
            None,
            Some(json!({ "refresh_token": refresh })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);

        // Old password no longer logs in, new one does
        let (status, _) = login(&app, "alice", "Secret123!").await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        let (status, _) = login(&app, "alice", "NewSecret456!").await;
        assert_eq!(status, StatusCode::OK);
    }

    #[tokio::test]
    async fn test_second_login_revokes_first_session() {
        let app = test_app().await;
        register(&app, "alice", "Secret123!").await;

        let (_, body) = login(&app, "alice", "Secret123!").await;
        let first_refresh = body["refresh_token"].as_str().unwrap().to_string();

        // Logging in again claims the single session slot
        let (status, _) = login(&app, "alice", "Secret123!").await;
        assert_eq!(status, StatusCode::OK);

        let (status, _) = send(
            &app,
            "POST",
            "/api/v1/auth/refresh-token",
            None,
            Some(json!({ "refresh_token": first_refresh })),
        )
        .await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_protected_routes_require_token() {
        let app = test_app().await;

        let (status, body) = send(&app, "GET", "/api/v1/auth/me", None, None).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["error"]["code"], "MISSING_TOKEN");

        let (status, _) = send(
            &app,
            "POST",
            "/api/v1/tweets",
            None,
            Some(json!({ "content": "hi" })),
        )
        .await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);

        let (status, _) = send(&app, "GET", "/api/v1/auth/me", Some("not-a-jwt"), None).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_comment_ownership() {
        let app = test_app().await;
        register(&app, "alice", "Secret123!").await;
        register(&app, "bob", "Secret123!").await;
        let (_, body) = login(&app, "alice", "Secret123!").await;
        let alice = body["access_token"].as_str().unwrap().to_string();
        let (_, body) = login(&app, "bob", "Secret123!").await;
        let bob = body["access_token"].as_str().unwrap().to_string();

        let (status, body) = send(
            &app,
            "POST",
            "/api/v1/videos/1/comments",
            Some(&alice),
            Some(json!({ "content": "nice clip" })),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        let comment_id = body["id"].as_i64().unwrap();

        // Bob cannot touch Alice's comment
        let uri = format!("/api/v1/comments/{}", comment_id);
        let (status, body) = send(&app, "DELETE", &uri, Some(&bob), None).await;
        assert_eq!(status, StatusCode::FORBIDDEN);
        assert_eq!(body["error"]["code"], "FORBIDDEN");
        let (status, _) = send(
            &app,
            "PATCH",
            &uri,
            Some(&bob),
            Some(json!({ "content": "hijacked" })),
        )
        .await;
        assert_eq!(status, StatusCode::FORBIDDEN);

        // Alice can
        let (status, body) = send(
            &app,
            "PATCH",
            &uri,
            Some(&alice),
            Some(json!({ "content": "nice clip (edited)" })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["content"], "nice clip (edited)");
        let (status, _) = send(&app, "DELETE", &uri, Some(&alice), None).await;
        assert_eq!(status, StatusCode::NO_CONTENT);

        let (status, _) = send(&app, "DELETE", &uri, Some(&alice), None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_tweet_ownership() {
        let app = test_app().await;
        register(&app, "alice", "Secret123!").await;
        register(&app, "bob", "Secret123!").await;
        let (_, body) = login(&app, "alice", "Secret123!").await;
        let alice = body["access_token"].as_str().unwrap().to_string();
        let (_, body) = login(&app, "bob", "Secret123!").await;
        let bob = body["access_token"].as_str().unwrap().to_string();

        let (status, body) = send(
            &app,
            "POST",
            "/api/v1/tweets",
            Some(&alice),
            Some(json!({ "content": "first tweet" })),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        let uri = format!("/api/v1/tweets/{}", body["id"].as_i64().unwrap());

        let (status, _) = send(&app, "DELETE", &uri, Some(&bob), None).await;
        assert_eq!(status, StatusCode::FORBIDDEN);

        let (status, _) = send(&app, "DELETE", &uri, Some(&alice), None).await;
        assert_eq!(status, StatusCode::NO_CONTENT);
    }

    #[tokio::test]
    async fn test_empty_content_rejected() {
        let app = test_app().await;
        register(&app, "alice", "Secret123!").await;
        let (_, body) = login(&app, "alice", "Secret123!").await;
        let alice = body["access_token"].as_str().unwrap().to_string();

        let (status, _) = send(
            &app,
            "POST",
            "/api/v1/tweets",
            Some(&alice),
            Some(json!({ "content": "   " })),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let (status, _) = send(
            &app,
            "POST",
            "/api/v1/videos/1/comments",
            Some(&alice),
            Some(json!({ "content": "" })),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_login_sets_cookies() {
        let app = test_app().await;
        register(&app, "alice", "Secret123!").await;

        let request = Request::builder()
            .method("POST")
            .uri("/api/v1/auth/login")
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(
                json!({ "login": "alice", "password": "Secret123!" }).to_string(),
            ))
            .unwrap();
        let response = app.clone().oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let set_cookies: Vec<_> = response
            .headers()
            .get_all(header::SET_COOKIE)
            .iter()
            .map(|v| v.to_str().unwrap().to_string())
            .collect();
        assert_eq!(set_cookies.len(), 2);
        assert!(set_cookies.iter().all(|c| c.contains("HttpOnly")));
        assert!(set_cookies.iter().all(|c| c.contains("Secure")));
    }
}
