//! Session authentication extractor for Axum handlers.

use axum::{
    extract::{FromRequestParts, OptionalFromRequestParts},
    http::{header, request::Parts, HeaderMap},
};
use axum_extra::extract::cookie::CookieJar;
use uuid::Uuid;

use crate::errors::AppError;
use crate::models::user::UserRole;
use crate::services::auth as auth_service;
use crate::AppState;

/// Cookie holding the access token for browser navigation.
pub const SESSION_COOKIE: &str = "growth_hub_session";

/// Authenticated operator with a live session.
///
/// Credentials come from an `Authorization: Bearer` header or the
/// [`SESSION_COOKIE`]. Use as an extractor in handlers that require a session:
/// ```ignore
/// async fn handler(current_user: CurrentUser) -> impl IntoResponse { ... }
/// ```
/// Wrap it in `Option` where unauthenticated visitors are redirected instead.
#[derive(Debug, Clone)]
pub struct CurrentUser {
    pub id: Uuid,
    pub email: String,
    pub role: UserRole,
    pub session_id: Uuid,
}

fn bearer_token(headers: &HeaderMap) -> Option<String> {
    headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .map(str::to_string)
}

fn cookie_token(headers: &HeaderMap) -> Option<String> {
    CookieJar::from_headers(headers)
        .get(SESSION_COOKIE)
        .map(|c| c.value().to_string())
}

/// Resolve the request's credentials to a live session.
pub async fn authenticate(parts: &Parts, state: &AppState) -> Result<CurrentUser, AppError> {
    let token = bearer_token(&parts.headers)
        .or_else(|| cookie_token(&parts.headers))
        .ok_or(AppError::Unauthorized)?;

    let claims = auth_service::validate_token(&token, &state.config.jwt_secret)?;

    if claims.token_type != "access" {
        return Err(AppError::Unauthorized);
    }

    let session_id = auth_service::session_id(&claims)?;
    let session = state
        .sessions
        .get(session_id)
        .await?
        .ok_or(AppError::Unauthorized)?;

    let user_id: Uuid = claims
        .user_id
        .parse()
        .map_err(|_| AppError::Unauthorized)?;

    if session.user_id != user_id {
        tracing::warn!(%session_id, %user_id, "Token user does not own its session");
        return Err(AppError::Unauthorized);
    }

    Ok(CurrentUser {
        id: user_id,
        email: session.email,
        role: session.role,
        session_id,
    })
}

impl FromRequestParts<AppState> for CurrentUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        authenticate(parts, state).await
    }
}

impl OptionalFromRequestParts<AppState> for CurrentUser {
    type Rejection = AppError;

    /// Missing, invalid or revoked credentials yield `None`; session store
    /// failures still reject.
    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Option<Self>, Self::Rejection> {
        match authenticate(parts, state).await {
            Ok(user) => Ok(Some(user)),
            Err(AppError::Unauthorized) => Ok(None),
            Err(e) => Err(e),
        }
    }
}
