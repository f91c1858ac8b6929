pub mod app;
pub mod client;
pub mod config;
pub mod domain;
pub mod http;
pub mod infra;

use crate::infra::db::Db;

#[derive(Clone)]
pub struct AppState {
    pub db: Db,
    pub paseto_key: [u8; 32],
    pub token_ttl_hours: u64,
}
