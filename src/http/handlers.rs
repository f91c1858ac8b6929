use axum::extract::{Path, Query, State};
use axum::Json;
use serde::{Deserialize, Serialize};

use crate::app::auth::AuthService;
use crate::app::comments::CommentService;
use crate::app::posts::{page_count, PostService};
use crate::domain::comment::Comment;
use crate::domain::post::{Pagination, Post, PostDetail, PostPage};
use crate::domain::user::User;
use crate::http::{AppError, AuthUser};
use crate::AppState;

#[derive(Serialize)]
pub(crate) struct HealthResponse {
    status: &'static str,
}

pub(crate) async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    let status = if state.db.ping().await.is_ok() {
        "ok"
    } else {
        "degraded"
    };
    Json(HealthResponse { status })
}

#[derive(Deserialize)]
pub struct RegisterRequest {
    pub name: String,
    pub email: String,
    pub password: String,
}

pub async fn register(
    State(state): State<AppState>,
    Json(payload): Json<RegisterRequest>,
) -> Result<Json<User>, AppError> {
    const MAX_PASSWORD_LEN: usize = 128;

    if payload.name.trim().is_empty() {
        return Err(AppError::validation("name cannot be empty"));
    }
    if payload.email.trim().is_empty() {
        return Err(AppError::validation("email cannot be empty"));
    }
    if payload.password.trim().len() < 8 {
        return Err(AppError::validation("password must be at least 8 characters"));
    }
    if payload.password.len() > MAX_PASSWORD_LEN {
        return Err(AppError::validation("password must be at most 128 characters"));
    }

    let service = auth_service(&state);
    let user = service
        .register(payload.name, payload.email, payload.password)
        .await
        .map_err(|err| {
            if is_unique_violation(&err, "users_email_key") {
                return AppError::conflict("user with this email already exists");
            }
            tracing::error!(error = ?err, "failed to register user");
            AppError::internal("failed to register user")
        })?;

    Ok(Json(user))
}

#[derive(Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Serialize)]
pub struct LoginResponse {
    pub token: String,
    pub user: User,
}

pub async fn login(
    State(state): State<AppState>,
    Json(payload): Json<LoginRequest>,
) -> Result<Json<LoginResponse>, AppError> {
    if payload.email.trim().is_empty() || payload.password.trim().is_empty() {
        return Err(AppError::validation("email and password are required"));
    }

    let service = auth_service(&state);
    let result = service
        .login(&payload.email, &payload.password)
        .await
        .map_err(|err| {
            tracing::error!(error = ?err, "failed to login");
            AppError::internal("failed to login")
        })?;

    match result {
        Some((token, user)) => Ok(Json(LoginResponse { token, user })),
        None => Err(AppError::unauthorized("invalid credentials")),
    }
}

pub async fn get_current_user(
    auth: AuthUser,
    State(state): State<AppState>,
) -> Result<Json<User>, AppError> {
    let service = auth_service(&state);
    let user = service.current_user(auth.user_id).await.map_err(|err| {
        tracing::error!(error = ?err, user_id = auth.user_id, "failed to fetch current user");
        AppError::internal("failed to fetch current user")
    })?;

    match user {
        Some(user) => Ok(Json(user)),
        None => Err(AppError::not_found("user not found")),
    }
}

#[derive(Deserialize)]
pub struct ListPostsQuery {
    pub page: Option<i64>,
    pub limit: Option<i64>,
    pub search: Option<String>,
}

pub async fn list_posts(
    State(state): State<AppState>,
    Query(query): Query<ListPostsQuery>,
) -> Result<Json<PostPage>, AppError> {
    let page = query.page.unwrap_or(1);
    let limit = query.limit.unwrap_or(10);
    let search = query.search.unwrap_or_default();

    let service = PostService::new(state.db.clone());
    let (posts, total) = service.list(page, limit, &search).await.map_err(|err| {
        tracing::error!(error = ?err, "failed to list posts");
        AppError::internal("failed to list posts")
    })?;

    Ok(Json(PostPage {
        posts,
        pagination: Pagination {
            total,
            pages: page_count(total, limit),
            page,
            limit,
        },
    }))
}

pub async fn get_post(
    Path(id): Path<i64>,
    State(state): State<AppState>,
) -> Result<Json<PostDetail>, AppError> {
    let service = PostService::new(state.db.clone());
    let post = service.get_detail(id).await.map_err(|err| {
        tracing::error!(error = ?err, post_id = id, "failed to fetch post");
        AppError::internal("failed to fetch post")
    })?;

    match post {
        Some(post) => Ok(Json(post)),
        None => Err(AppError::not_found("post not found")),
    }
}

#[derive(Deserialize)]
pub struct CreatePostRequest {
    pub title: String,
    pub content: String,
}

pub async fn create_post(
    auth: AuthUser,
    State(state): State<AppState>,
    Json(payload): Json<CreatePostRequest>,
) -> Result<Json<Post>, AppError> {
    if payload.title.trim().is_empty() {
        return Err(AppError::validation("title cannot be empty"));
    }
    if payload.content.trim().is_empty() {
        return Err(AppError::validation("content cannot be empty"));
    }

    let service = PostService::new(state.db.clone());
    let post = service
        .create_post(auth.user_id, payload.title, payload.content)
        .await
        .map_err(|err| {
            tracing::error!(error = ?err, user_id = auth.user_id, "failed to create post");
            AppError::internal("failed to create post")
        })?;

    Ok(Json(post))
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateCommentRequest {
    pub content: String,
    pub post_id: i64,
}

pub async fn create_comment(
    auth: AuthUser,
    State(state): State<AppState>,
    Json(payload): Json<CreateCommentRequest>,
) -> Result<Json<Comment>, AppError> {
    if payload.content.trim().is_empty() {
        return Err(AppError::validation("content cannot be empty"));
    }

    let service = CommentService::new(state.db.clone());
    let comment = service
        .create_comment(auth.user_id, payload.post_id, payload.content)
        .await
        .map_err(|err| {
            if is_foreign_key_violation(&err, "comments_post_id_fkey") {
                return AppError::not_found("post not found");
            }
            tracing::error!(
                error = ?err,
                user_id = auth.user_id,
                post_id = payload.post_id,
                "failed to create comment"
            );
            AppError::internal("failed to create comment")
        })?;

    Ok(Json(comment))
}

fn auth_service(state: &AppState) -> AuthService {
    AuthService::new(state.db.clone(), state.paseto_key, state.token_ttl_hours)
}

fn is_unique_violation(err: &anyhow::Error, constraint: &str) -> bool {
    db_error_matches(err, "23505", constraint)
}

fn is_foreign_key_violation(err: &anyhow::Error, constraint: &str) -> bool {
    db_error_matches(err, "23503", constraint)
}

fn db_error_matches(err: &anyhow::Error, sqlstate: &str, constraint: &str) -> bool {
    if let Some(sqlx_err) = err.downcast_ref::<sqlx::Error>() {
        if let Some(db_err) = sqlx_err.as_database_error() {
            if let Some(code) = db_err.code() {
                if code == sqlstate {
                    return db_err.constraint().unwrap_or_default().contains(constraint);
                }
            }
        }
    }
    false
}
