/// Configuration management for Comment Service
///
/// Loaded from environment variables. The storage backend is chosen here,
/// once, and never re-evaluated at runtime.
use crate::storage::StorageBackend;
use crate::subscription::DEFAULT_MAILBOX_CAPACITY;
use db_pool::env_utils::{parse_env_flag, parse_env_with_default};
use serde::{Deserialize, Serialize};

/// Service name used for pool sizing and log/metric labels
pub const SERVICE_NAME: &str = "comment-service";

/// Main application configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Application settings
    pub app: AppConfig,
    /// Storage backend selection
    pub storage: StorageConfig,
    /// Database configuration (postgres backend only)
    pub database: DatabaseConfig,
    /// Live comment subscription settings
    pub subscriptions: SubscriptionConfig,
}

/// Application settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Application environment (development, staging, production)
    pub env: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    pub backend: StorageBackend,
}

/// Database configuration
#[derive(Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    /// Database URL
    pub url: Option<String>,
    /// Deadline applied to every store operation
    pub query_timeout_ms: u64,
    /// Apply embedded migrations on startup
    pub run_migrations: bool,
}

impl std::fmt::Debug for DatabaseConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DatabaseConfig")
            .field("url", &self.url.as_ref().map(|_| "[REDACTED]"))
            .field("query_timeout_ms", &self.query_timeout_ms)
            .field("run_migrations", &self.run_migrations)
            .finish()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubscriptionConfig {
    /// Bound of each subscriber mailbox
    pub mailbox_capacity: usize,
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self, String> {
        let app_env = std::env::var("APP_ENV").unwrap_or_else(|_| "development".to_string());
        let database_url = std::env::var("DATABASE_URL")
            .ok()
            .filter(|url| !url.trim().is_empty());

        let backend = match std::env::var("STORAGE_TYPE") {
            Ok(value) => value.parse::<StorageBackend>()?,
            Err(_) if database_url.is_some() => StorageBackend::Postgres,
            Err(_) => StorageBackend::Memory,
        };

        if backend == StorageBackend::Postgres && database_url.is_none() {
            return Err("DATABASE_URL must be set for postgres storage".to_string());
        }

        let mailbox_capacity =
            parse_env_with_default("SUBSCRIPTION_MAILBOX_CAPACITY", DEFAULT_MAILBOX_CAPACITY);
        if mailbox_capacity == 0 {
            return Err("SUBSCRIPTION_MAILBOX_CAPACITY must be at least 1".to_string());
        }

        Ok(Config {
            app: AppConfig { env: app_env },
            storage: StorageConfig { backend },
            database: DatabaseConfig {
                url: database_url,
                query_timeout_ms: parse_env_with_default("DB_QUERY_TIMEOUT_MS", 5_000),
                run_migrations: parse_env_flag("DB_RUN_MIGRATIONS", true),
            },
            subscriptions: SubscriptionConfig { mailbox_capacity },
        })
    }

    pub fn is_production(&self) -> bool {
        self.app.env.eq_ignore_ascii_case("production")
    }
}
