//! Authenticated sessions.
//!
//! A session is created at successful login, extended on token refresh and
//! invalidated at sign-out or when it expires. Access and refresh tokens carry
//! the session id, so removing the session revokes both.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use redis::aio::MultiplexedConnection;
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::models::user::{User, UserRole};

/// Key prefix for sessions stored in Redis.
const REDIS_KEY_PREFIX: &str = "growth_hub:session:";

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Session {
    pub id: Uuid,
    pub user_id: Uuid,
    pub email: String,
    pub role: UserRole,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

impl Session {
    pub fn new(user: &User, ttl_secs: i64) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            user_id: user.id,
            email: user.email.clone(),
            role: user.role,
            created_at: now,
            expires_at: now + Duration::seconds(ttl_secs),
        }
    }

    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.expires_at <= now
    }
}

#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    #[error("Redis error: {0}")]
    Redis(#[from] redis::RedisError),

    #[error("Corrupt session record: {0}")]
    Corrupt(#[from] serde_json::Error),
}

#[async_trait]
pub trait SessionStore: Send + Sync {
    fn backend(&self) -> &'static str;

    async fn create(&self, session: Session) -> Result<(), SessionError>;

    /// Live session by id. Expired sessions are dropped and reported as absent.
    async fn get(&self, id: Uuid) -> Result<Option<Session>, SessionError>;

    /// Push the expiry out. Returns false if the session is gone.
    async fn extend(&self, id: Uuid, expires_at: DateTime<Utc>) -> Result<bool, SessionError>;

    /// Remove the session. Returns false if it was already gone.
    async fn invalidate(&self, id: Uuid) -> Result<bool, SessionError>;

    async fn ping(&self) -> Result<(), SessionError>;
}

/// Process-local sessions; lost on restart.
#[derive(Debug, Default)]
pub struct MemorySessionStore {
    sessions: RwLock<HashMap<Uuid, Session>>,
}

impl MemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Drop every expired session, returning how many were removed.
    pub async fn prune_expired(&self) -> usize {
        let now = Utc::now();
        let mut sessions = self.sessions.write().await;
        let before = sessions.len();
        sessions.retain(|_, s| !s.is_expired(now));
        before - sessions.len()
    }
}

#[async_trait]
impl SessionStore for MemorySessionStore {
    fn backend(&self) -> &'static str {
        "memory"
    }

    async fn create(&self, session: Session) -> Result<(), SessionError> {
        self.sessions.write().await.insert(session.id, session);
        Ok(())
    }

    async fn get(&self, id: Uuid) -> Result<Option<Session>, SessionError> {
        let found = self.sessions.read().await.get(&id).cloned();
        match found {
            Some(session) if session.is_expired(Utc::now()) => {
                self.sessions.write().await.remove(&id);
                tracing::debug!(session_id = %id, "Session expired");
                Ok(None)
            }
            other => Ok(other),
        }
    }

    async fn extend(&self, id: Uuid, expires_at: DateTime<Utc>) -> Result<bool, SessionError> {
        let mut sessions = self.sessions.write().await;
        match sessions.get_mut(&id) {
            Some(session) if !session.is_expired(Utc::now()) => {
                session.expires_at = expires_at;
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn invalidate(&self, id: Uuid) -> Result<bool, SessionError> {
        Ok(self.sessions.write().await.remove(&id).is_some())
    }

    async fn ping(&self) -> Result<(), SessionError> {
        Ok(())
    }
}

/// Sessions stored in Redis as JSON with a TTL matching the expiry.
#[derive(Clone)]
pub struct RedisSessionStore {
    conn: MultiplexedConnection,
}

impl RedisSessionStore {
    pub async fn connect(url: &str) -> Result<Self, SessionError> {
        let client = redis::Client::open(url)?;
        let conn = client.get_multiplexed_async_connection().await?;
        Ok(Self { conn })
    }

    fn key(id: Uuid) -> String {
        format!("{REDIS_KEY_PREFIX}{id}")
    }

    async fn put(&self, session: &Session) -> Result<(), SessionError> {
        let ttl = (session.expires_at - Utc::now()).num_seconds().max(1);
        let mut conn = self.conn.clone();
        redis::cmd("SET")
            .arg(Self::key(session.id))
            .arg(serde_json::to_string(session)?)
            .arg("EX")
            .arg(ttl)
            .query_async::<()>(&mut conn)
            .await?;
        Ok(())
    }
}

#[async_trait]
impl SessionStore for RedisSessionStore {
    fn backend(&self) -> &'static str {
        "redis"
    }

    async fn create(&self, session: Session) -> Result<(), SessionError> {
        self.put(&session).await
    }

    async fn get(&self, id: Uuid) -> Result<Option<Session>, SessionError> {
        let mut conn = self.conn.clone();
        let raw: Option<String> = redis::cmd("GET")
            .arg(Self::key(id))
            .query_async(&mut conn)
            .await?;
        match raw {
            Some(json) => {
                let session: Session = serde_json::from_str(&json)?;
                Ok((!session.is_expired(Utc::now())).then_some(session))
            }
            None => Ok(None),
        }
    }

    async fn extend(&self, id: Uuid, expires_at: DateTime<Utc>) -> Result<bool, SessionError> {
        match self.get(id).await? {
            Some(mut session) => {
                session.expires_at = expires_at;
                self.put(&session).await?;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn invalidate(&self, id: Uuid) -> Result<bool, SessionError> {
        let mut conn = self.conn.clone();
        let removed: i64 = redis::cmd("DEL")
            .arg(Self::key(id))
            .query_async(&mut conn)
            .await?;
        Ok(removed > 0)
    }

    async fn ping(&self) -> Result<(), SessionError> {
        let mut conn = self.conn.clone();
        redis::cmd("PING").query_async::<String>(&mut conn).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio_test::assert_ok;

    fn user() -> User {
        User {
            id: Uuid::new_v4(),
            email: "ops@growthhub.test".to_string(),
            password_hash: "h".to_string(),
            display_name: "Ops".to_string(),
            role: UserRole::Marketer,
            is_active: true,
            failed_login_attempts: 0,
            locked_until: None,
            last_login: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn create_then_get() {
        let store = MemorySessionStore::new();
        let session = Session::new(&user(), 3600);
        assert_ok!(store.create(session.clone()).await);

        let found = store.get(session.id).await.unwrap();
        assert_eq!(found, Some(session));
    }

    #[tokio::test]
    async fn invalidate_is_final() {
        let store = MemorySessionStore::new();
        let session = Session::new(&user(), 3600);
        store.create(session.clone()).await.unwrap();

        assert!(store.invalidate(session.id).await.unwrap());
        assert!(!store.invalidate(session.id).await.unwrap());
        assert_eq!(store.get(session.id).await.unwrap(), None);
        assert!(!store.extend(session.id, Utc::now()).await.unwrap());
    }

    #[tokio::test]
    async fn expired_sessions_are_absent() {
        let store = MemorySessionStore::new();
        let session = Session::new(&user(), -1);
        store.create(session.clone()).await.unwrap();

        assert_eq!(store.get(session.id).await.unwrap(), None);
        assert_eq!(store.prune_expired().await, 0);
    }

    #[tokio::test]
    async fn extend_moves_expiry() {
        let store = MemorySessionStore::new();
        let session = Session::new(&user(), 60);
        store.create(session.clone()).await.unwrap();

        let later = Utc::now() + Duration::hours(2);
        assert!(store.extend(session.id, later).await.unwrap());
        let found = store.get(session.id).await.unwrap().unwrap();
        assert_eq!(found.expires_at, later);
    }

    #[tokio::test]
    async fn prune_removes_only_expired() {
        let store = MemorySessionStore::new();
        store.create(Session::new(&user(), -10)).await.unwrap();
        store.create(Session::new(&user(), -10)).await.unwrap();
        let live = Session::new(&user(), 3600);
        store.create(live.clone()).await.unwrap();

        assert_eq!(store.prune_expired().await, 2);
        assert!(store.get(live.id).await.unwrap().is_some());
    }
}
