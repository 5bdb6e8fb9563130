pub mod config;
pub mod db;
pub mod errors;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod services;
pub mod store;

use std::sync::Arc;

use sqlx::PgPool;

use crate::services::session::SessionStore;
use crate::services::stats::StatsAggregator;

/// Shared application state passed to all Axum handlers.
#[derive(Clone)]
pub struct AppState {
    pub db: PgPool,
    pub config: config::AppConfig,
    pub stats: StatsAggregator,
    pub sessions: Arc<dyn SessionStore>,
}
