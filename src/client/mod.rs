//! Typed client for the plume HTTP API.
//!
//! Session state lives in a [`SessionStore`] and is passed to authenticated
//! calls as an explicit [`Session`] value rather than read from ambient
//! global state.

pub mod session;

use serde_json::json;
use thiserror::Error;

use crate::domain::comment::Comment;
use crate::domain::post::{Post, PostDetail, PostPage};
use crate::domain::user::User;

pub use session::{FileSessionStore, Session, SessionStore};

const DEFAULT_API_URL: &str = "http://localhost:8080/api";

#[derive(Debug, Error)]
pub enum ClientError {
    /// Non-2xx response, carrying the server's error string when it sent one.
    #[error("api error ({status}): {message}")]
    Api { status: u16, message: String },
    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("session storage failed: {0}")]
    Storage(#[from] std::io::Error),
}

#[derive(Clone)]
pub struct ApiClient {
    http: reqwest::Client,
    base_url: String,
}

impl ApiClient {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: base_url.into(),
        }
    }

    /// Base URL from `PLUME_API_URL`, falling back to the local default.
    pub fn from_env() -> Self {
        let base_url =
            std::env::var("PLUME_API_URL").unwrap_or_else(|_| DEFAULT_API_URL.to_string());
        Self::new(base_url)
    }

    pub async fn register(
        &self,
        name: &str,
        email: &str,
        password: &str,
    ) -> Result<User, ClientError> {
        let response = self
            .http
            .post(self.url("/auth/register"))
            .json(&json!({ "name": name, "email": email, "password": password }))
            .send()
            .await?;
        decode(response).await
    }

    /// Log in and persist the session (token plus user projection) in the
    /// store on success.
    pub async fn login(
        &self,
        email: &str,
        password: &str,
        store: &dyn SessionStore,
    ) -> Result<Session, ClientError> {
        let response = self
            .http
            .post(self.url("/auth/login"))
            .json(&json!({ "email": email, "password": password }))
            .send()
            .await?;
        let session: Session = decode(response).await?;
        store.save(&session)?;
        Ok(session)
    }

    /// Clear both persisted session entries.
    pub fn logout(&self, store: &dyn SessionStore) -> Result<(), ClientError> {
        store.clear()?;
        Ok(())
    }

    /// Synchronous read of the stored user projection; `None` when logged out.
    pub fn current_user(&self, store: &dyn SessionStore) -> Option<User> {
        store.load().ok().flatten().map(|session| session.user)
    }

    pub async fn get_posts(
        &self,
        page: i64,
        limit: i64,
        search: &str,
    ) -> Result<PostPage, ClientError> {
        let mut request = self
            .http
            .get(self.url("/posts"))
            .query(&[("page", page.to_string()), ("limit", limit.to_string())]);
        if !search.is_empty() {
            request = request.query(&[("search", search)]);
        }
        decode(request.send().await?).await
    }

    pub async fn get_post(&self, id: i64) -> Result<PostDetail, ClientError> {
        let response = self
            .http
            .get(self.url(&format!("/posts/{}", id)))
            .send()
            .await?;
        decode(response).await
    }

    pub async fn create_post(
        &self,
        session: &Session,
        title: &str,
        content: &str,
    ) -> Result<Post, ClientError> {
        let response = self
            .http
            .post(self.url("/posts"))
            .bearer_auth(&session.token)
            .json(&json!({ "title": title, "content": content }))
            .send()
            .await?;
        decode(response).await
    }

    pub async fn create_comment(
        &self,
        session: &Session,
        post_id: i64,
        content: &str,
    ) -> Result<Comment, ClientError> {
        let response = self
            .http
            .post(self.url("/comments"))
            .bearer_auth(&session.token)
            .json(&json!({ "content": content, "postId": post_id }))
            .send()
            .await?;
        decode(response).await
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url.trim_end_matches('/'), path)
    }
}

async fn decode<T: serde::de::DeserializeOwned>(
    response: reqwest::Response,
) -> Result<T, ClientError> {
    let status = response.status();
    if !status.is_success() {
        let message = response
            .json::<serde_json::Value>()
            .await
            .ok()
            .and_then(|body| body["error"].as_str().map(str::to_string))
            .unwrap_or_else(|| format!("request failed with status {}", status.as_u16()));
        return Err(ClientError::Api {
            status: status.as_u16(),
            message,
        });
    }
    Ok(response.json::<T>().await?)
}
