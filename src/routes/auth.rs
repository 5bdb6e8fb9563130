//! Authentication routes: login, refresh, logout, user creation, profile.

use axum::{extract::State, Json};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use serde::Deserialize;

use crate::errors::{ApiResponse, AppError};
use crate::middleware::auth::{CurrentUser, SESSION_COOKIE};
use crate::middleware::rbac::RequireAdmin;
use crate::models::user::{CreateUser, UserResponse};
use crate::services::auth as auth_service;
use crate::services::auth::TokenPair;
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// Body of a refresh call. Browsers may send `{}` and rely on the refresh cookie.
#[derive(Debug, Default, Deserialize)]
pub struct RefreshRequest {
    #[serde(default)]
    pub refresh_token: Option<String>,
}

/// Cookie holding the refresh token. Only sent to the auth endpoints.
pub const REFRESH_COOKIE: &str = "growth_hub_refresh";
const REFRESH_COOKIE_PATH: &str = "/api/v1/auth";

pub(crate) fn session_cookie(access_token: String) -> Cookie<'static> {
    Cookie::build((SESSION_COOKIE, access_token))
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax)
        .build()
}

fn refresh_cookie(refresh_token: String) -> Cookie<'static> {
    Cookie::build((REFRESH_COOKIE, refresh_token))
        .path(REFRESH_COOKIE_PATH)
        .http_only(true)
        .same_site(SameSite::Strict)
        .build()
}

/// Store both tokens of a fresh pair in the jar.
fn with_token_cookies(jar: CookieJar, tokens: &TokenPair) -> CookieJar {
    jar.add(session_cookie(tokens.access_token.clone()))
        .add(refresh_cookie(tokens.refresh_token.clone()))
}

pub(crate) fn clear_session_cookie(jar: CookieJar) -> CookieJar {
    jar.remove(Cookie::build(SESSION_COOKIE).path("/"))
        .remove(Cookie::build(REFRESH_COOKIE).path(REFRESH_COOKIE_PATH))
}

/// The refresh token from the body, else from the refresh cookie.
fn refresh_credential(body: Option<String>, jar: &CookieJar) -> Option<String> {
    body.filter(|t| !t.is_empty())
        .or_else(|| jar.get(REFRESH_COOKIE).map(|c| c.value().to_string()))
}

/// POST /api/v1/auth/login
pub async fn login(
    State(state): State<AppState>,
    jar: CookieJar,
    Json(body): Json<LoginRequest>,
) -> Result<(CookieJar, Json<ApiResponse<TokenPair>>), AppError> {
    let tokens = auth_service::login(
        &state.db,
        state.sessions.as_ref(),
        &body.email,
        &body.password,
        &state.config.token_settings(),
    )
    .await?;

    let jar = with_token_cookies(jar, &tokens);
    Ok((jar, ApiResponse::success(tokens)))
}

/// POST /api/v1/auth/refresh
pub async fn refresh(
    State(state): State<AppState>,
    jar: CookieJar,
    Json(body): Json<RefreshRequest>,
) -> Result<(CookieJar, Json<ApiResponse<TokenPair>>), AppError> {
    let refresh_token =
        refresh_credential(body.refresh_token, &jar).ok_or(AppError::Unauthorized)?;
    let tokens = auth_service::refresh_token(
        &state.db,
        state.sessions.as_ref(),
        &refresh_token,
        &state.config.token_settings(),
    )
    .await?;

    let jar = with_token_cookies(jar, &tokens);
    Ok((jar, ApiResponse::success(tokens)))
}

/// POST /api/v1/auth/logout: closes the session, revoking its tokens.
pub async fn logout(
    State(state): State<AppState>,
    current_user: CurrentUser,
    jar: CookieJar,
) -> Result<(CookieJar, Json<ApiResponse<&'static str>>), AppError> {
    auth_service::sign_out(state.sessions.as_ref(), current_user.session_id).await?;
    Ok((
        clear_session_cookie(jar),
        ApiResponse::success("Logged out successfully"),
    ))
}

/// POST /api/v1/auth/users: admin-only user creation
pub async fn create_user(
    State(state): State<AppState>,
    RequireAdmin(_admin): RequireAdmin,
    Json(body): Json<CreateUser>,
) -> Result<Json<ApiResponse<UserResponse>>, AppError> {
    let user = auth_service::create_user(&state.db, &body).await?;
    Ok(ApiResponse::success(UserResponse::from(user)))
}

/// GET /api/v1/auth/me: current user profile
pub async fn me(
    State(state): State<AppState>,
    current_user: CurrentUser,
) -> Result<Json<ApiResponse<UserResponse>>, AppError> {
    let user = auth_service::find_user_by_id(&state.db, current_user.id).await?;
    Ok(ApiResponse::success(UserResponse::from(user)))
}
