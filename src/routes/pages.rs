//! Browser navigation routes. Unauthenticated visitors are redirected to the
//! login path instead of receiving 401s.

use axum::{
    extract::State,
    response::{IntoResponse, Redirect, Response},
};
use axum_extra::extract::cookie::CookieJar;
use serde::Serialize;

use crate::errors::{ApiResponse, AppError};
use crate::middleware::auth::CurrentUser;
use crate::routes::auth::clear_session_cookie;
use crate::routes::dashboard::render;
use crate::services::auth as auth_service;
use crate::AppState;

const DASHBOARD_PATH: &str = "/dashboard";
const LOGIN_ENDPOINT: &str = "/api/v1/auth/login";
const REFRESH_ENDPOINT: &str = "/api/v1/auth/refresh";

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Landing {
    pub title: &'static str,
    pub tagline: &'static str,
    pub login_path: String,
}

/// GET /: signed-in visitors go to the dashboard, others get the landing info.
pub async fn index(State(state): State<AppState>, user: Option<CurrentUser>) -> Response {
    if user.is_some() {
        return Redirect::to(DASHBOARD_PATH).into_response();
    }
    ApiResponse::success(Landing {
        title: "Growth Hub",
        tagline: "All-in-One Marketing Automation Platform for Lead Nurturing, Chatbot Qualification, and Form Management",
        login_path: state.config.login_path.clone(),
    })
    .into_response()
}

/// Where and how to sign in.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginPage {
    pub title: &'static str,
    pub login_endpoint: &'static str,
    pub refresh_endpoint: &'static str,
    pub fields: [&'static str; 2],
}

/// GET on the login path: what a sign-in form needs. Signed-in visitors go to
/// the dashboard.
pub async fn login(user: Option<CurrentUser>) -> Response {
    if user.is_some() {
        return Redirect::to(DASHBOARD_PATH).into_response();
    }
    ApiResponse::success(LoginPage {
        title: "Sign in to Growth Hub",
        login_endpoint: LOGIN_ENDPOINT,
        refresh_endpoint: REFRESH_ENDPOINT,
        fields: ["email", "password"],
    })
    .into_response()
}

/// GET /dashboard: the dashboard view, or a redirect to the login path.
pub async fn dashboard(State(state): State<AppState>, user: Option<CurrentUser>) -> Response {
    match user {
        Some(user) => ApiResponse::success(render(&state, &user).await).into_response(),
        None => {
            tracing::debug!(to = %state.config.login_path, "Unauthenticated dashboard visit");
            Redirect::to(&state.config.login_path).into_response()
        }
    }
}

/// POST /logout: sign out if signed in, then go to the login path.
pub async fn logout(
    State(state): State<AppState>,
    user: Option<CurrentUser>,
    jar: CookieJar,
) -> Result<(CookieJar, Redirect), AppError> {
    if let Some(user) = user {
        auth_service::sign_out(state.sessions.as_ref(), user.session_id).await?;
    }
    Ok((
        clear_session_cookie(jar),
        Redirect::to(&state.config.login_path),
    ))
}
