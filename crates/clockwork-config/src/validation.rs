//! Configuration validation.
//!
//! Collects every problem in one pass instead of failing on the first.

use crate::{AppConfig, PoolConfig};
use clockwork_core::telemetry::LoggingConfig;
use thiserror::Error;

/// Largest pool a single engine connection may open.
pub const MAX_POOL_CONNECTIONS: u32 = 100;

/// A single problem found in the loaded configuration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigValidationError {
    #[error("pool.min_connections ({min}) exceeds pool.max_connections ({max})")]
    PoolBounds { min: u32, max: u32 },

    #[error("pool.max_connections is {value}; at most {MAX_POOL_CONNECTIONS} are allowed")]
    PoolTooLarge { value: u32 },

    #[error("{field} must be at least one second")]
    ZeroTimeout { field: &'static str },

    #[error("logging.level is empty")]
    EmptyLogLevel,

    #[error("[database] must be a table of connection fields")]
    DatabaseNotATable,
}

/// Configuration validator.
pub struct ConfigValidator;

impl ConfigValidator {
    /// Checks pool, logging and persisted-connection settings.
    pub fn validate(config: &AppConfig) -> Result<(), Vec<ConfigValidationError>> {
        let mut errors = Vec::new();

        Self::validate_pool(&config.pool, &mut errors);
        Self::validate_logging(&config.logging, &mut errors);
        if config.database.as_ref().is_some_and(|raw| !raw.is_object()) {
            errors.push(ConfigValidationError::DatabaseNotATable);
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }

    fn validate_pool(pool: &PoolConfig, errors: &mut Vec<ConfigValidationError>) {
        if pool.min_connections > pool.max_connections {
            errors.push(ConfigValidationError::PoolBounds {
                min: pool.min_connections,
                max: pool.max_connections,
            });
        }
        if pool.max_connections > MAX_POOL_CONNECTIONS {
            errors.push(ConfigValidationError::PoolTooLarge {
                value: pool.max_connections,
            });
        }
        if pool.connect_timeout_secs == 0 {
            errors.push(ConfigValidationError::ZeroTimeout {
                field: "pool.connect_timeout_secs",
            });
        }
    }

    fn validate_logging(logging: &LoggingConfig, errors: &mut Vec<ConfigValidationError>) {
        if logging.level.trim().is_empty() {
            errors.push(ConfigValidationError::EmptyLogLevel);
        }
    }
}
