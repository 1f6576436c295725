//! Application configuration structures.

use clockwork_core::telemetry::LoggingConfig;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Root application configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// Application name and metadata.
    #[serde(default)]
    pub app: AppMetadata,

    /// Persisted connection descriptor, exactly as stored.
    ///
    /// Kept untyped: it is untrusted input and goes through the normalizer
    /// before use.
    #[serde(default)]
    pub database: Option<serde_json::Value>,

    /// Connection pool settings for networked engines.
    #[serde(default)]
    pub pool: PoolConfig,

    /// Logging configuration.
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Identifies the running instance in logs.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppMetadata {
    pub name: String,
    pub version: String,
    /// Matches `CLOCKWORK_ENVIRONMENT` unless overridden.
    pub environment: String,
}

impl Default for AppMetadata {
    fn default() -> Self {
        Self {
            name: "clockwork".to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
            environment: "development".to_string(),
        }
    }
}

/// Pool sizing for the networked engines.
///
/// The embedded engine always uses a single connection; only the timeouts
/// apply to it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PoolConfig {
    /// Connections kept open while idle. Zero lets an unused pool drain.
    #[serde(default = "default_min_connections")]
    pub min_connections: u32,
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
    /// Bound on connecting and on waiting for a pooled connection.
    #[serde(default = "default_connect_timeout")]
    pub connect_timeout_secs: u64,
    #[serde(default = "default_idle_timeout")]
    pub idle_timeout_secs: u64,
}

fn default_min_connections() -> u32 {
    0
}

fn default_max_connections() -> u32 {
    5
}

fn default_connect_timeout() -> u64 {
    10
}

fn default_idle_timeout() -> u64 {
    300
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self {
            min_connections: default_min_connections(),
            max_connections: default_max_connections(),
            connect_timeout_secs: default_connect_timeout(),
            idle_timeout_secs: default_idle_timeout(),
        }
    }
}

impl PoolConfig {
    #[must_use]
    pub const fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout_secs)
    }

    #[must_use]
    pub const fn idle_timeout(&self) -> Duration {
        Duration::from_secs(self.idle_timeout_secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pool_defaults() {
        let pool = PoolConfig::default();
        assert_eq!(pool.max_connections, 5);
        assert_eq!(pool.connect_timeout(), Duration::from_secs(10));
        assert_eq!(pool.idle_timeout(), Duration::from_secs(300));
    }

    #[test]
    fn test_partial_deserialize() {
        let config: AppConfig = serde_json::from_value(serde_json::json!({
            "pool": { "max_connections": 12 },
            "database": { "engine": "pg", "host": "db" }
        }))
        .unwrap();
        assert_eq!(config.pool.max_connections, 12);
        assert_eq!(config.pool.min_connections, 0);
        assert_eq!(config.app.name, "clockwork");
        assert!(config.database.is_some());
    }
}
