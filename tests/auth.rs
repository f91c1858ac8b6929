//! Registration, login, and current-user tests.

mod common;

use axum::http::StatusCode;
use common::{app, DEFAULT_PASSWORD};
use serde_json::json;

// ===========================================================================
// Registration
// ===========================================================================

#[tokio::test]
async fn register_returns_public_projection() {
    let app = app().await;

    let resp = app
        .post_json(
            "/api/auth/register",
            json!({
                "name": "Alice",
                "email": "alice_register@example.com",
                "password": DEFAULT_PASSWORD
            }),
            None,
        )
        .await;

    assert_eq!(resp.status, StatusCode::OK);
    let body = resp.json();
    assert!(body["id"].is_i64());
    assert_eq!(body["name"].as_str().unwrap(), "Alice");
    assert_eq!(body["email"].as_str().unwrap(), "alice_register@example.com");
    assert!(body["createdAt"].is_string());
    // The password hash must never be echoed
    assert!(body.get("password").is_none());
    assert!(body.get("passwordHash").is_none());
}

#[tokio::test]
async fn register_duplicate_email_conflict() {
    let app = app().await;
    let email = "dup_register@example.com";

    let first = app
        .post_json(
            "/api/auth/register",
            json!({ "name": "First", "email": email, "password": DEFAULT_PASSWORD }),
            None,
        )
        .await;
    assert_eq!(first.status, StatusCode::OK);

    let second = app
        .post_json(
            "/api/auth/register",
            json!({ "name": "Second", "email": email, "password": DEFAULT_PASSWORD }),
            None,
        )
        .await;
    assert_eq!(second.status, StatusCode::CONFLICT);
    assert_eq!(second.error_code(), "conflict");
    assert_eq!(second.error_message(), "user with this email already exists");

    // No second row persisted
    let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM users WHERE email = $1")
        .bind(email)
        .fetch_one(app.pool())
        .await
        .unwrap();
    assert_eq!(count, 1);
}

#[tokio::test]
async fn register_rejects_empty_name() {
    let app = app().await;

    let resp = app
        .post_json(
            "/api/auth/register",
            json!({ "name": "  ", "email": "noname@example.com", "password": DEFAULT_PASSWORD }),
            None,
        )
        .await;

    assert_eq!(resp.status, StatusCode::BAD_REQUEST);
    assert_eq!(resp.error_code(), "validation");
}

#[tokio::test]
async fn register_rejects_short_password() {
    let app = app().await;

    let resp = app
        .post_json(
            "/api/auth/register",
            json!({ "name": "Shorty", "email": "short_pw@example.com", "password": "short" }),
            None,
        )
        .await;

    assert_eq!(resp.status, StatusCode::BAD_REQUEST);
    assert_eq!(resp.error_message(), "password must be at least 8 characters");
}

// ===========================================================================
// Login
// ===========================================================================

#[tokio::test]
async fn login_returns_token_and_user() {
    let app = app().await;
    let user = app.create_user("login_ok").await;

    let resp = app
        .post_json(
            "/api/auth/login",
            json!({ "email": user.email, "password": DEFAULT_PASSWORD }),
            None,
        )
        .await;

    assert_eq!(resp.status, StatusCode::OK);
    let body = resp.json();
    assert!(!body["token"].as_str().unwrap().is_empty());
    assert_eq!(body["user"]["id"].as_i64().unwrap(), user.id);
    assert_eq!(body["user"]["email"].as_str().unwrap(), user.email);
    assert!(body["user"].get("password").is_none());
}

#[tokio::test]
async fn login_wrong_password() {
    let app = app().await;
    let user = app.create_user("login_badpw").await;

    let resp = app
        .post_json(
            "/api/auth/login",
            json!({ "email": user.email, "password": "wrong-password" }),
            None,
        )
        .await;

    assert_eq!(resp.status, StatusCode::UNAUTHORIZED);
    assert_eq!(resp.error_message(), "invalid credentials");
}

#[tokio::test]
async fn login_unknown_email() {
    let app = app().await;

    let resp = app
        .post_json(
            "/api/auth/login",
            json!({ "email": "nobody@example.com", "password": DEFAULT_PASSWORD }),
            None,
        )
        .await;

    // Indistinguishable from a wrong password
    assert_eq!(resp.status, StatusCode::UNAUTHORIZED);
    assert_eq!(resp.error_message(), "invalid credentials");
}

// ===========================================================================
// Current user
// ===========================================================================

#[tokio::test]
async fn me_returns_authenticated_user() {
    let app = app().await;
    let user = app.create_user("me_ok").await;

    let resp = app.get("/api/auth/me", Some(&user.token)).await;

    assert_eq!(resp.status, StatusCode::OK);
    let body = resp.json();
    assert_eq!(body["id"].as_i64().unwrap(), user.id);
    assert_eq!(body["email"].as_str().unwrap(), user.email);
}

#[tokio::test]
async fn me_without_token() {
    let app = app().await;

    let resp = app.get("/api/auth/me", None).await;

    assert_eq!(resp.status, StatusCode::UNAUTHORIZED);
    assert_eq!(resp.error_code(), "unauthorized");
}

#[tokio::test]
async fn me_with_garbage_token() {
    let app = app().await;

    let resp = app.get("/api/auth/me", Some("not-a-real-token")).await;

    assert_eq!(resp.status, StatusCode::UNAUTHORIZED);
    assert_eq!(resp.error_message(), "invalid token");
}
