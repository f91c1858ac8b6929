//! Comment creation tests.

mod common;

use axum::http::StatusCode;
use common::app;
use serde_json::json;

#[tokio::test]
async fn create_comment_returns_author_projection() {
    let app = app().await;
    let author = app.create_user("comment_author").await;
    let commenter = app.create_user("comment_user").await;
    let post_id = app.create_post(author.id, "Commented post", "body", 10).await;

    let resp = app
        .post_json(
            "/api/comments",
            json!({ "content": "Nice post!", "postId": post_id }),
            Some(&commenter.token),
        )
        .await;

    assert_eq!(resp.status, StatusCode::OK);
    let body = resp.json();
    assert!(body["id"].is_i64());
    assert_eq!(body["content"].as_str().unwrap(), "Nice post!");
    assert_eq!(body["postId"].as_i64().unwrap(), post_id);
    assert_eq!(body["authorId"].as_i64().unwrap(), commenter.id);
    assert_eq!(body["author"]["id"].as_i64().unwrap(), commenter.id);
    assert_eq!(body["author"]["name"].as_str().unwrap(), commenter.name);
}

#[tokio::test]
async fn comment_appears_in_post_detail() {
    let app = app().await;
    let user = app.create_user("comment_refetch").await;
    let post_id = app.create_post(user.id, "Refetch post", "body", 10).await;

    let resp = app
        .post_json(
            "/api/comments",
            json!({ "content": "visible after refetch", "postId": post_id }),
            Some(&user.token),
        )
        .await;
    assert_eq!(resp.status, StatusCode::OK);
    let comment_id = resp.json()["id"].as_i64().unwrap();

    let resp = app.get(&format!("/api/posts/{}", post_id), None).await;
    assert_eq!(resp.status, StatusCode::OK);
    let comments = resp.json()["comments"].as_array().unwrap().clone();
    assert_eq!(comments.len(), 1);
    assert_eq!(comments[0]["id"].as_i64().unwrap(), comment_id);
}

#[tokio::test]
async fn comment_on_missing_post() {
    let app = app().await;
    let user = app.create_user("comment_nopost").await;

    let resp = app
        .post_json(
            "/api/comments",
            json!({ "content": "into the void", "postId": 999_999_999 }),
            Some(&user.token),
        )
        .await;

    assert_eq!(resp.status, StatusCode::NOT_FOUND);
    assert_eq!(resp.error_message(), "post not found");
}

#[tokio::test]
async fn comment_requires_auth() {
    let app = app().await;
    let user = app.create_user("comment_noauth").await;
    let post_id = app.create_post(user.id, "No auth post", "body", 10).await;

    let resp = app
        .post_json(
            "/api/comments",
            json!({ "content": "anonymous", "postId": post_id }),
            None,
        )
        .await;

    assert_eq!(resp.status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn comment_rejects_empty_content() {
    let app = app().await;
    let user = app.create_user("comment_empty").await;
    let post_id = app.create_post(user.id, "Empty comment post", "body", 10).await;

    let resp = app
        .post_json(
            "/api/comments",
            json!({ "content": "   ", "postId": post_id }),
            Some(&user.token),
        )
        .await;

    assert_eq!(resp.status, StatusCode::BAD_REQUEST);
    assert_eq!(resp.error_message(), "content cannot be empty");
}
