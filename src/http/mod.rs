use axum::Router;

use crate::AppState;

mod auth;
mod error;
mod handlers;
mod routes;

pub use auth::AuthUser;
pub use error::{AppError, ErrorKind};

pub fn router(state: AppState) -> Router {
    let api = Router::new()
        .merge(routes::auth())
        .merge(routes::posts())
        .merge(routes::comments());

    Router::new()
        .merge(routes::health())
        .nest("/api", api)
        .with_state(state)
}
