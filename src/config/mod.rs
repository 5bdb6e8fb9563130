use std::env;
use std::str::FromStr;

/// Configuration loading failure.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing environment variable {0}")]
    Missing(&'static str),

    #[error("Invalid value for {name}: {value}")]
    Invalid { name: &'static str, value: String },
}

/// Where dashboard counts are read from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StatsBackend {
    /// Count directly against the service's own PostgreSQL database.
    Postgres,
    /// Count through a hosted PostgREST endpoint (e.g. a Supabase project).
    Postgrest { url: String, api_key: String },
}

/// Where authenticated sessions are kept.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionBackend {
    Memory,
    Redis { url: String },
}

/// Application configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub database_url: String,
    pub database_max_connections: u32,
    pub host: String,
    pub port: u16,
    pub jwt_secret: String,
    pub jwt_access_token_expiry_secs: i64,
    pub jwt_refresh_token_expiry_secs: i64,
    pub frontend_url: String,
    pub login_path: String,
    pub stats_backend: StatsBackend,
    pub store_request_timeout_ms: u64,
    pub session_backend: SessionBackend,
}

impl AppConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        let stats_backend = match or_default("STATS_BACKEND", "postgres").as_str() {
            "postgres" => StatsBackend::Postgres,
            "postgrest" => StatsBackend::Postgrest {
                url: required("POSTGREST_URL")?,
                api_key: required("POSTGREST_API_KEY")?,
            },
            other => {
                return Err(ConfigError::Invalid {
                    name: "STATS_BACKEND",
                    value: other.to_string(),
                })
            }
        };

        let session_backend = match or_default("SESSION_BACKEND", "memory").as_str() {
            "memory" => SessionBackend::Memory,
            "redis" => SessionBackend::Redis {
                url: or_default("REDIS_URL", "redis://localhost:6379"),
            },
            other => {
                return Err(ConfigError::Invalid {
                    name: "SESSION_BACKEND",
                    value: other.to_string(),
                })
            }
        };

        Ok(Self {
            database_url: required("DATABASE_URL")?,
            database_max_connections: parsed("DATABASE_MAX_CONNECTIONS", 10),
            host: or_default("BACKEND_HOST", "0.0.0.0"),
            port: parsed("BACKEND_PORT", 3000),
            jwt_secret: required("JWT_SECRET")?,
            jwt_access_token_expiry_secs: parsed("JWT_ACCESS_TOKEN_EXPIRY_SECS", 900),
            jwt_refresh_token_expiry_secs: parsed("JWT_REFRESH_TOKEN_EXPIRY_SECS", 604800),
            frontend_url: or_default("FRONTEND_URL", "https://localhost:5173"),
            login_path: or_default("LOGIN_PATH", "/auth"),
            stats_backend,
            store_request_timeout_ms: parsed("STORE_REQUEST_TIMEOUT_MS", 5000),
            session_backend,
        })
    }

    /// Secrets and lifetimes used to mint and check JWTs.
    pub fn token_settings(&self) -> TokenSettings {
        TokenSettings {
            secret: self.jwt_secret.clone(),
            access_expiry_secs: self.jwt_access_token_expiry_secs,
            refresh_expiry_secs: self.jwt_refresh_token_expiry_secs,
        }
    }
}

/// JWT signing settings derived from [`AppConfig`].
#[derive(Debug, Clone)]
pub struct TokenSettings {
    pub secret: String,
    pub access_expiry_secs: i64,
    pub refresh_expiry_secs: i64,
}

fn required(name: &'static str) -> Result<String, ConfigError> {
    env::var(name).map_err(|_| ConfigError::Missing(name))
}

fn or_default(name: &str, default: &str) -> String {
    env::var(name).unwrap_or_else(|_| default.to_string())
}

/// Unparseable values fall back to the default, same as unset ones.
fn parsed<T: FromStr>(name: &str, default: T) -> T {
    env::var(name)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parsed_falls_back_on_garbage() {
        std::env::set_var("GROWTH_HUB_TEST_PORT", "not-a-port");
        assert_eq!(parsed::<u16>("GROWTH_HUB_TEST_PORT", 3000), 3000);
        std::env::set_var("GROWTH_HUB_TEST_PORT", "8080");
        assert_eq!(parsed::<u16>("GROWTH_HUB_TEST_PORT", 3000), 8080);
    }

    #[test]
    fn missing_required_names_the_variable() {
        let err = required("GROWTH_HUB_TEST_DEFINITELY_UNSET").unwrap_err();
        assert_eq!(
            err.to_string(),
            "Missing environment variable GROWTH_HUB_TEST_DEFINITELY_UNSET"
        );
    }

    #[test]
    fn token_settings_mirror_config() {
        let config = AppConfig {
            database_url: "postgres://localhost/growth_hub".to_string(),
            database_max_connections: 5,
            host: "127.0.0.1".to_string(),
            port: 3000,
            jwt_secret: "secret".to_string(),
            jwt_access_token_expiry_secs: 60,
            jwt_refresh_token_expiry_secs: 120,
            frontend_url: "http://localhost:5173".to_string(),
            login_path: "/auth".to_string(),
            stats_backend: StatsBackend::Postgres,
            store_request_timeout_ms: 1000,
            session_backend: SessionBackend::Memory,
        };
        let settings = config.token_settings();
        assert_eq!(settings.secret, "secret");
        assert_eq!(settings.access_expiry_secs, 60);
        assert_eq!(settings.refresh_expiry_secs, 120);
    }
}
