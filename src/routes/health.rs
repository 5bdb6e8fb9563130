//! Health check endpoints for liveness and readiness probes.

use axum::{extract::State, Json};
use serde::Serialize;

use crate::errors::ApiResponse;
use crate::AppState;

/// Readiness probe detail.
#[derive(Debug, Serialize)]
pub struct HealthStatus {
    pub status: String,
    pub database: String,
    pub stats_store: String,
    pub sessions: String,
}

/// Liveness probe: always returns OK if the process is running.
pub async fn live() -> &'static str {
    "OK"
}

/// Readiness probe: checks the database, statistics store and session store.
pub async fn ready(State(state): State<AppState>) -> Json<ApiResponse<HealthStatus>> {
    let db_status = match sqlx::query("SELECT 1").execute(&state.db).await {
        Ok(_) => "connected".to_string(),
        Err(e) => {
            tracing::warn!(error = %e, "Database health check failed");
            format!("error: {e}")
        }
    };

    let store = state.stats.store();
    let store_status = match store.ping().await {
        Ok(()) => format!("{} connected", store.backend()),
        Err(e) => {
            tracing::warn!(backend = store.backend(), error = %e, "Statistics store health check failed");
            format!("error: {e}")
        }
    };

    let session_status = match state.sessions.ping().await {
        Ok(()) => format!("{} connected", state.sessions.backend()),
        Err(e) => {
            tracing::warn!(error = %e, "Session store health check failed");
            format!("error: {e}")
        }
    };

    let healthy = [&db_status, &store_status, &session_status]
        .iter()
        .all(|s| !s.starts_with("error"));

    ApiResponse::success(HealthStatus {
        status: if healthy { "ok" } else { "degraded" }.to_string(),
        database: db_status,
        stats_store: store_status,
        sessions: session_status,
    })
}
