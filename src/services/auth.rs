//! Authentication service: password hashing, JWT, login, sign-out and user management.

use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use chrono::{Duration, Utc};
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use uuid::Uuid;
use validator::Validate;

use crate::config::TokenSettings;
use crate::errors::AppError;
use crate::models::user::{CreateUser, User};
use crate::services::session::{Session, SessionStore};

/// Maximum failed login attempts before account lockout.
const MAX_FAILED_ATTEMPTS: i32 = 3;

/// Lockout duration in minutes after exceeding max failed attempts.
const LOCKOUT_DURATION_MINUTES: i64 = 30;

/// JWT claims embedded in access and refresh tokens.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Claims {
    pub sub: String,
    pub user_id: String,
    pub session_id: String,
    pub role: String,
    pub token_type: String,
    pub exp: i64,
    pub iat: i64,
}

/// Token pair returned on successful login.
#[derive(Debug, Serialize)]
pub struct TokenPair {
    pub access_token: String,
    pub refresh_token: String,
    pub token_type: String,
    pub expires_in: i64,
}

/// Hash a plaintext password with argon2id.
pub fn hash_password(password: &str) -> Result<String, AppError> {
    let salt = SaltString::generate(&mut OsRng);
    let argon2 = Argon2::default();
    argon2
        .hash_password(password.as_bytes(), &salt)
        .map(|h| h.to_string())
        .map_err(|e| AppError::Internal(format!("Password hashing failed: {e}")))
}

/// Verify a plaintext password against a stored hash.
pub fn verify_password(password: &str, hash: &str) -> Result<bool, AppError> {
    let parsed_hash =
        PasswordHash::new(hash).map_err(|e| AppError::Internal(format!("Invalid hash: {e}")))?;
    Ok(Argon2::default()
        .verify_password(password.as_bytes(), &parsed_hash)
        .is_ok())
}

/// Generate a JWT token pair (access + refresh) bound to a session.
pub fn generate_tokens(
    user: &User,
    session_id: Uuid,
    settings: &TokenSettings,
) -> Result<TokenPair, AppError> {
    let now = Utc::now();
    let encoding_key = EncodingKey::from_secret(settings.secret.as_bytes());

    let access_claims = Claims {
        sub: user.email.clone(),
        user_id: user.id.to_string(),
        session_id: session_id.to_string(),
        role: user.role.as_str().to_string(),
        token_type: "access".to_string(),
        exp: (now + Duration::seconds(settings.access_expiry_secs)).timestamp(),
        iat: now.timestamp(),
    };

    let refresh_claims = Claims {
        token_type: "refresh".to_string(),
        exp: (now + Duration::seconds(settings.refresh_expiry_secs)).timestamp(),
        ..access_claims.clone()
    };

    let access_token = jsonwebtoken::encode(&Header::default(), &access_claims, &encoding_key)
        .map_err(|e| AppError::Internal(format!("Token generation failed: {e}")))?;

    let refresh_token = jsonwebtoken::encode(&Header::default(), &refresh_claims, &encoding_key)
        .map_err(|e| AppError::Internal(format!("Token generation failed: {e}")))?;

    Ok(TokenPair {
        access_token,
        refresh_token,
        token_type: "Bearer".to_string(),
        expires_in: settings.access_expiry_secs,
    })
}

/// Validate a JWT and return the claims.
pub fn validate_token(token: &str, jwt_secret: &str) -> Result<Claims, AppError> {
    let decoding_key = DecodingKey::from_secret(jwt_secret.as_bytes());
    let validation = Validation::default();

    jsonwebtoken::decode::<Claims>(token, &decoding_key, &validation)
        .map(|data| data.claims)
        .map_err(|_| AppError::Unauthorized)
}

/// Parse the session id carried in validated claims.
pub fn session_id(claims: &Claims) -> Result<Uuid, AppError> {
    claims
        .session_id
        .parse()
        .map_err(|_| AppError::Unauthorized)
}

/// Create a new user with hashed password.
pub async fn create_user(pool: &PgPool, input: &CreateUser) -> Result<User, AppError> {
    input.validate()?;
    let password_hash = hash_password(&input.password)?;

    let user = sqlx::query_as::<_, User>(
        r#"
        INSERT INTO users (email, password_hash, display_name, role)
        VALUES ($1, $2, $3, $4)
        RETURNING *
        "#,
    )
    .bind(input.email.to_lowercase())
    .bind(&password_hash)
    .bind(&input.display_name)
    .bind(input.role)
    .fetch_one(pool)
    .await
    .map_err(|e| match e {
        sqlx::Error::Database(ref db_err) if db_err.is_unique_violation() => {
            AppError::Conflict("Email already exists".to_string())
        }
        _ => AppError::Database(e),
    })?;

    tracing::info!(user_id = %user.id, role = user.role.as_str(), "User created");
    Ok(user)
}

/// Authenticate a user by email and password, opening a session and returning a token pair.
pub async fn login(
    pool: &PgPool,
    sessions: &dyn SessionStore,
    email: &str,
    password: &str,
    settings: &TokenSettings,
) -> Result<TokenPair, AppError> {
    let user = sqlx::query_as::<_, User>("SELECT * FROM users WHERE email = $1")
        .bind(email.to_lowercase())
        .fetch_optional(pool)
        .await?
        .ok_or(AppError::Unauthorized)?;

    // Check account lockout
    if let Some(locked_until) = user.locked_until {
        if locked_until > Utc::now() {
            tracing::warn!(user_id = %user.id, "Login attempt on locked account");
            return Err(AppError::Unauthorized);
        }
    }

    if !user.is_active {
        return Err(AppError::Unauthorized);
    }

    if !verify_password(password, &user.password_hash)? {
        let new_attempts = user.failed_login_attempts + 1;
        if new_attempts >= MAX_FAILED_ATTEMPTS {
            let lock_until = Utc::now() + Duration::minutes(LOCKOUT_DURATION_MINUTES);
            sqlx::query(
                "UPDATE users SET failed_login_attempts = $1, locked_until = $2 WHERE id = $3",
            )
            .bind(new_attempts)
            .bind(lock_until)
            .bind(user.id)
            .execute(pool)
            .await?;
            tracing::warn!(user_id = %user.id, until = %lock_until, "Account locked");
        } else {
            sqlx::query("UPDATE users SET failed_login_attempts = $1 WHERE id = $2")
                .bind(new_attempts)
                .bind(user.id)
                .execute(pool)
                .await?;
        }
        return Err(AppError::Unauthorized);
    }

    // Reset failed attempts on successful login
    sqlx::query(
        "UPDATE users SET failed_login_attempts = 0, locked_until = NULL, last_login = NOW() WHERE id = $1",
    )
    .bind(user.id)
    .execute(pool)
    .await?;

    let session = Session::new(&user, settings.refresh_expiry_secs);
    let session_id = session.id;
    sessions.create(session).await?;
    tracing::info!(user_id = %user.id, %session_id, "Session opened");

    generate_tokens(&user, session_id, settings)
}

/// Refresh an access token using a valid refresh token of a live session.
pub async fn refresh_token(
    pool: &PgPool,
    sessions: &dyn SessionStore,
    refresh_token_str: &str,
    settings: &TokenSettings,
) -> Result<TokenPair, AppError> {
    let claims = validate_token(refresh_token_str, &settings.secret)?;

    if claims.token_type != "refresh" {
        return Err(AppError::Unauthorized);
    }

    let session_id = session_id(&claims)?;
    let user_id: Uuid = claims
        .user_id
        .parse()
        .map_err(|_| AppError::Unauthorized)?;

    let user = sqlx::query_as::<_, User>("SELECT * FROM users WHERE id = $1 AND is_active = true")
        .bind(user_id)
        .fetch_optional(pool)
        .await?
        .ok_or(AppError::Unauthorized)?;

    let expires_at = Utc::now() + Duration::seconds(settings.refresh_expiry_secs);
    if !sessions.extend(session_id, expires_at).await? {
        return Err(AppError::Unauthorized);
    }

    generate_tokens(&user, session_id, settings)
}

/// Invalidate a session. Tokens bound to it stop authenticating immediately.
pub async fn sign_out(sessions: &dyn SessionStore, session_id: Uuid) -> Result<(), AppError> {
    if sessions.invalidate(session_id).await? {
        tracing::info!(%session_id, "Session closed");
    } else {
        tracing::debug!(%session_id, "Sign-out for a session that was already gone");
    }
    Ok(())
}

/// Find a user by ID.
pub async fn find_user_by_id(pool: &PgPool, id: Uuid) -> Result<User, AppError> {
    sqlx::query_as::<_, User>("SELECT * FROM users WHERE id = $1")
        .bind(id)
        .fetch_optional(pool)
        .await?
        .ok_or_else(|| AppError::NotFound("User not found".to_string()))
}
