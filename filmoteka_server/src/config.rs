//! Server configuration management.
//!
//! Consolidates all environment variable reads and provides validated configuration.

use filmoteka::{CookieSettings, ExpireOffset, db::DatabaseConfig};
use std::{net::SocketAddr, str::FromStr};

const DEFAULT_BIND: &str = "127.0.0.1:8080";
const MIN_PEPPER_LEN: usize = 16;

/// Complete server configuration loaded from environment variables
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Server bind address
    pub bind: SocketAddr,
    /// Where users and sessions live
    pub store: StoreBackend,
    /// Database configuration, used by [`StoreBackend::Postgres`]
    pub database: DatabaseConfig,
    /// Security configuration
    pub security: SecurityConfig,
    /// Session cookie attributes and lifetime
    pub cookie: CookieSettings,
    /// Prometheus exporter address; metrics are disabled when unset
    pub metrics_bind: Option<SocketAddr>,
    /// Seconds between expired-session purges; 0 disables the task
    pub session_purge_interval_secs: u64,
}

/// Security-related configuration
#[derive(Debug, Clone)]
pub struct SecurityConfig {
    /// Password hashing pepper (required)
    pub password_pepper: String,
}

/// User and session store selection
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreBackend {
    Postgres,
    /// Process-local store; everything is lost on restart
    Memory,
}

impl FromStr for StoreBackend {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "postgres" => Ok(Self::Postgres),
            "memory" => Ok(Self::Memory),
            other => Err(ConfigError::Invalid {
                var: "STORE_BACKEND".to_string(),
                reason: format!("expected 'postgres' or 'memory', got '{other}'"),
            }),
        }
    }
}

impl ServerConfig {
    /// Load configuration from environment variables
    ///
    /// # Arguments
    ///
    /// * `bind_override` - Optional bind address override (from CLI args)
    /// * `database_url_override` - Optional database URL override (from CLI args)
    ///
    /// # Errors
    ///
    /// Returns error if required variables are missing or invalid
    pub fn from_env(
        bind_override: Option<SocketAddr>,
        database_url_override: Option<String>,
    ) -> Result<Self, ConfigError> {
        Self::from_lookup(
            |key| std::env::var(key).ok(),
            bind_override,
            database_url_override,
        )
    }

    /// Load configuration through an arbitrary variable lookup
    pub fn from_lookup<F>(
        lookup: F,
        bind_override: Option<SocketAddr>,
        database_url_override: Option<String>,
    ) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let bind = match bind_override {
            Some(bind) => bind,
            None => parse_required_or(&lookup, "SERVER_BIND", DEFAULT_BIND)?,
        };

        let store = match lookup("STORE_BACKEND") {
            Some(value) => value.parse()?,
            None => StoreBackend::Postgres,
        };

        let db_defaults = DatabaseConfig::development();
        let database = DatabaseConfig {
            database_url: database_url_override
                .or_else(|| lookup("DATABASE_URL"))
                .unwrap_or(db_defaults.database_url),
            max_connections: parse_env_or(&lookup, "DB_MAX_CONNECTIONS", db_defaults.max_connections),
            min_connections: parse_env_or(&lookup, "DB_MIN_CONNECTIONS", db_defaults.min_connections),
            connection_timeout_secs: parse_env_or(
                &lookup,
                "DB_CONNECTION_TIMEOUT_SECS",
                db_defaults.connection_timeout_secs,
            ),
            idle_timeout_secs: parse_env_or(&lookup, "DB_IDLE_TIMEOUT_SECS", db_defaults.idle_timeout_secs),
            max_lifetime_secs: parse_env_or(&lookup, "DB_MAX_LIFETIME_SECS", db_defaults.max_lifetime_secs),
            query_timeout_secs: parse_env_or(&lookup, "DB_QUERY_TIMEOUT_SECS", db_defaults.query_timeout_secs),
        };

        // Security configuration (REQUIRED)
        let password_pepper =
            lookup("PASSWORD_PEPPER").ok_or_else(|| ConfigError::MissingRequired {
                var: "PASSWORD_PEPPER".to_string(),
                hint: "Generate with: openssl rand -hex 16".to_string(),
            })?;

        let cookie = CookieSettings {
            http_only: parse_env_or(&lookup, "COOKIE_HTTP_ONLY", true),
            secure: parse_env_or(&lookup, "COOKIE_SECURE", true),
            expire_offset: ExpireOffset {
                years: parse_env_or(&lookup, "SESSION_EXPIRE_YEARS", 0),
                months: parse_env_or(&lookup, "SESSION_EXPIRE_MONTHS", 0),
                days: parse_env_or(&lookup, "SESSION_EXPIRE_DAYS", 7),
            },
        };

        let metrics_bind = match lookup("METRICS_BIND") {
            Some(value) if !value.is_empty() => {
                Some(value.parse().map_err(|_| ConfigError::Invalid {
                    var: "METRICS_BIND".to_string(),
                    reason: format!("'{value}' is not an IP:PORT address"),
                })?)
            }
            _ => None,
        };

        Ok(ServerConfig {
            bind,
            store,
            database,
            security: SecurityConfig { password_pepper },
            cookie,
            metrics_bind,
            session_purge_interval_secs: parse_env_or(&lookup, "SESSION_PURGE_INTERVAL_SECS", 3600),
        })
    }

    /// Validate configuration after loading
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.security.password_pepper.len() < MIN_PEPPER_LEN {
            return Err(ConfigError::Invalid {
                var: "PASSWORD_PEPPER".to_string(),
                reason: format!("Must be at least {MIN_PEPPER_LEN} characters (64-bit security)"),
            });
        }

        if self.cookie.expire_offset.is_zero() {
            return Err(ConfigError::Invalid {
                var: "SESSION_EXPIRE_DAYS".to_string(),
                reason: "Session lifetime must be positive; years, months and days are all 0"
                    .to_string(),
            });
        }

        if self.database.min_connections > self.database.max_connections {
            return Err(ConfigError::Invalid {
                var: "DB_MIN_CONNECTIONS".to_string(),
                reason: format!(
                    "Cannot exceed DB_MAX_CONNECTIONS ({})",
                    self.database.max_connections
                ),
            });
        }

        if self.database.query_timeout_secs == 0 {
            return Err(ConfigError::Invalid {
                var: "DB_QUERY_TIMEOUT_SECS".to_string(),
                reason: "Must be greater than 0".to_string(),
            });
        }

        if self.metrics_bind == Some(self.bind) {
            return Err(ConfigError::Invalid {
                var: "METRICS_BIND".to_string(),
                reason: format!("Must differ from the server bind address ({})", self.bind),
            });
        }

        Ok(())
    }
}

/// Configuration error types
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {var}\nHint: {hint}")]
    MissingRequired { var: String, hint: String },

    #[error("Invalid configuration for {var}: {reason}")]
    Invalid { var: String, reason: String },
}

/// Helper to parse environment variable with default fallback
fn parse_env_or<F, T>(lookup: &F, key: &str, default: T) -> T
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
{
    lookup(key)
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

/// Like [`parse_env_or`], but a present and unparseable value is an error
fn parse_required_or<F, T>(lookup: &F, key: &str, default: &str) -> Result<T, ConfigError>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
{
    let raw = lookup(key).unwrap_or_else(|| default.to_string());
    raw.parse().map_err(|_| ConfigError::Invalid {
        var: key.to_string(),
        reason: format!("cannot parse '{raw}'"),
    })
}
