//! Centralized configuration (environment variables + defaults).
//!
//! The configuration is read once at process start and handed to the components that need
//! it; nothing in the crate reads the environment on its own.

use std::net::SocketAddr;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{0} must be set")]
    Missing(&'static str),

    #[error("{key} has an invalid value '{value}': {reason}")]
    Invalid {
        key: &'static str,
        value: String,
        reason: String,
    },
}

/// Which repository implementation backs the service.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageBackend {
    Postgres,
    /// Single-file database, created on first start.
    Sqlite,
    /// Process-local storage; data is lost on restart.
    Memory,
}

impl FromStr for StorageBackend {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "postgres" | "postgresql" => Ok(StorageBackend::Postgres),
            "sqlite" => Ok(StorageBackend::Sqlite),
            "memory" => Ok(StorageBackend::Memory),
            other => Err(format!(
                "expected 'postgres', 'sqlite' or 'memory', got '{}'",
                other
            )),
        }
    }
}

/// Connection pool settings for Postgres.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
    pub acquire_timeout: Duration,
    /// Connections older than this are closed and replaced.
    pub max_lifetime: Duration,
    /// Ping each connection when it is checked out of the pool.
    pub test_before_acquire: bool,
    pub log_statements: bool,
}

/// Settings for the SQLite backend.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SqliteConfig {
    /// Database file; missing parent directories are created.
    pub path: PathBuf,
    pub max_connections: u32,
    /// Also used as the busy timeout for locked writes.
    pub acquire_timeout: Duration,
    pub log_statements: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppConfig {
    pub app_name: String,
    pub bind_addr: SocketAddr,
    pub storage: StorageBackend,
    /// Present whenever `storage` is `Postgres`.
    pub database: Option<DatabaseConfig>,
    /// Present whenever `storage` is `Sqlite`.
    pub sqlite: Option<SqliteConfig>,
    /// Create the `dishes` table and its indexes at startup.
    pub auto_migrate: bool,
    /// `tracing_subscriber::EnvFilter` directive.
    pub log_filter: String,
}

impl AppConfig {
    /// Reads the configuration from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the configuration from an arbitrary key lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let app_name = get("APP_NAME").unwrap_or_else(|| "What to Eat".to_string());
        let bind_addr = parse_or(&get, "BIND_ADDR", SocketAddr::from(([0, 0, 0, 0], 3000)))?;
        let storage = parse_or(&get, "STORAGE_BACKEND", StorageBackend::Postgres)?;
        let auto_migrate = bool_or(&get, "AUTO_MIGRATE", true)?;
        let log_filter = get("RUST_LOG")
            .or_else(|| get("LOG_FILTER"))
            .unwrap_or_else(|| "info".to_string());

        let max_connections = parse_or(&get, "DB_MAX_CONNECTIONS", 20u32)?.max(1);
        let acquire_timeout =
            Duration::from_secs(parse_or(&get, "DB_ACQUIRE_TIMEOUT_SECS", 30u64)?);
        let log_statements = bool_or(&get, "DB_LOG_STATEMENTS", false)?;

        let database = match storage {
            StorageBackend::Postgres => Some(DatabaseConfig {
                url: get("DATABASE_URL").ok_or(ConfigError::Missing("DATABASE_URL"))?,
                max_connections,
                acquire_timeout,
                max_lifetime: Duration::from_secs(parse_or(&get, "DB_MAX_LIFETIME_SECS", 3600u64)?),
                test_before_acquire: bool_or(&get, "DB_TEST_BEFORE_ACQUIRE", true)?,
                log_statements,
            }),
            StorageBackend::Sqlite | StorageBackend::Memory => None,
        };

        let sqlite = match storage {
            StorageBackend::Sqlite => Some(SqliteConfig {
                path: get("SQLITE_DB_PATH")
                    .map(PathBuf::from)
                    .unwrap_or_else(|| PathBuf::from("data/what2eat.db")),
                max_connections,
                acquire_timeout,
                log_statements,
            }),
            StorageBackend::Postgres | StorageBackend::Memory => None,
        };

        Ok(Self {
            app_name,
            bind_addr,
            storage,
            database,
            sqlite,
            auto_migrate,
            log_filter,
        })
    }
}

fn parse_or<G, T>(get: &G, key: &'static str, default: T) -> Result<T, ConfigError>
where
    G: Fn(&str) -> Option<String>,
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match get(key) {
        None => Ok(default),
        Some(value) => {
            let parsed = value.trim().parse::<T>();
            parsed.map_err(|e| ConfigError::Invalid {
                key,
                reason: e.to_string(),
                value,
            })
        }
    }
}

fn bool_or<G>(get: &G, key: &'static str, default: bool) -> Result<bool, ConfigError>
where
    G: Fn(&str) -> Option<String>,
{
    match get(key) {
        None => Ok(default),
        Some(value) => match value.trim().to_lowercase().as_str() {
            "true" | "1" | "yes" => Ok(true),
            "false" | "0" | "no" => Ok(false),
            _ => Err(ConfigError::Invalid {
                key,
                value,
                reason: "expected a boolean".to_string(),
            }),
        },
    }
}
