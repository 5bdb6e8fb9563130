//! Route definitions for the Growth Hub API.

pub mod auth;
pub mod dashboard;
pub mod health;
pub mod pages;

use axum::http::{header, HeaderValue, Method};
use axum::routing::{get, post};
use axum::Router;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::AppState;

const PAGE_PATHS: [&str; 5] = ["/", "/dashboard", "/logout", "/health/live", "/health/ready"];

/// Build the full router with all routes and middleware.
pub fn build_router(state: AppState) -> Router {
    let auth_routes = Router::new()
        .route("/auth/login", post(auth::login))
        .route("/auth/refresh", post(auth::refresh))
        .route("/auth/logout", post(auth::logout))
        .route("/auth/users", post(auth::create_user))
        .route("/auth/me", get(auth::me));

    let dashboard_routes = Router::new()
        .route("/dashboard", get(dashboard::view))
        .route("/dashboard/stats", get(dashboard::stats))
        .route("/dashboard/export", post(dashboard::export));

    let cors = cors_layer(&state.config.frontend_url);

    let mut router = Router::new()
        .route("/", get(pages::index))
        .route("/dashboard", get(pages::dashboard))
        .route("/logout", post(pages::logout));

    // A login path pointing elsewhere (e.g. the frontend) is not served here.
    let login_path = state.config.login_path.as_str();
    if login_path.starts_with('/') && !PAGE_PATHS.contains(&login_path) {
        router = router.route(login_path, get(pages::login));
    }

    router
        .route("/health/live", get(health::live))
        .route("/health/ready", get(health::ready))
        .nest("/api/v1", auth_routes.merge(dashboard_routes))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

/// Credentialed CORS for the configured frontend origin.
fn cors_layer(frontend_url: &str) -> CorsLayer {
    let base = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST])
        .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE]);

    match HeaderValue::from_str(frontend_url) {
        Ok(origin) => base.allow_origin(origin).allow_credentials(true),
        Err(e) => {
            tracing::warn!(frontend_url, error = %e, "Invalid FRONTEND_URL; CORS origin not set");
            base
        }
    }
}
