//! Configuration loader with layered sources.

use crate::{descriptor_from_env, normalize_descriptor, AppConfig, ConfigValidator, ConnectionDescriptor, PoolConfig};
use clockwork_core::ClockworkError;
use config::{Config, ConfigError, Environment, File};
use std::path::Path;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{debug, info};

/// Configuration loader with runtime refresh support.
#[derive(Debug, Clone)]
pub struct ConfigLoader {
    config: Arc<RwLock<AppConfig>>,
    config_dir: String,
}

impl ConfigLoader {
    /// Creates a new configuration loader.
    ///
    /// Configuration is loaded from multiple sources in order:
    /// 1. `config/default.toml` - Default values
    /// 2. `config/{environment}.toml` - Environment-specific overrides
    /// 3. `config/local.toml` - Local overrides
    /// 4. Environment variables with `CLOCKWORK__` prefix
    pub fn new(config_dir: impl Into<String>) -> Result<Self, ClockworkError> {
        let config_dir = config_dir.into();
        let config = Self::load_config(&config_dir)?;

        Ok(Self {
            config: Arc::new(RwLock::new(config)),
            config_dir,
        })
    }

    /// Loads configuration from the default location (`./config`).
    pub fn from_default_location() -> Result<Self, ClockworkError> {
        Self::new("./config")
    }

    /// Wraps an already-built configuration. Reload reads `./config`.
    #[must_use]
    pub fn from_config(config: AppConfig) -> Self {
        Self {
            config: Arc::new(RwLock::new(config)),
            config_dir: "./config".to_string(),
        }
    }

    /// Returns the current configuration.
    pub async fn get(&self) -> AppConfig {
        self.config.read().await.clone()
    }

    /// Returns the pool settings.
    pub async fn pool(&self) -> PoolConfig {
        self.config.read().await.pool.clone()
    }

    /// Descriptor to connect with at startup.
    ///
    /// The persisted `[database]` entry wins when it normalizes; otherwise the
    /// `DB_*` environment variables are consulted.
    pub async fn connection_descriptor(&self) -> Option<ConnectionDescriptor> {
        let persisted = self
            .config
            .read()
            .await
            .database
            .as_ref()
            .and_then(normalize_descriptor);

        match persisted {
            Some(descriptor) => {
                debug!(engine = %descriptor.engine, "Using persisted connection descriptor");
                Some(descriptor)
            }
            None => {
                let fallback = descriptor_from_env();
                if let Some(descriptor) = &fallback {
                    debug!(engine = %descriptor.engine, "Using environment connection descriptor");
                }
                fallback
            }
        }
    }

    /// Reloads the configuration from disk.
    pub async fn reload(&self) -> Result<(), ClockworkError> {
        let new_config = Self::load_config(&self.config_dir)?;
        let mut config = self.config.write().await;
        *config = new_config;
        info!("Configuration reloaded successfully");
        Ok(())
    }

    /// Loads configuration from the specified directory.
    fn load_config(config_dir: &str) -> Result<AppConfig, ClockworkError> {
        if let Err(e) = dotenvy::dotenv() {
            debug!("No .env file found or error loading it: {}", e);
        }

        let environment =
            std::env::var("CLOCKWORK_ENVIRONMENT").unwrap_or_else(|_| "development".to_string());

        info!("Loading configuration for environment: {}", environment);

        let mut builder = Config::builder();

        for name in ["default", environment.as_str(), "local"] {
            let path = format!("{config_dir}/{name}.toml");
            if Path::new(&path).exists() {
                debug!("Loading config from: {}", path);
                builder = builder.add_source(File::with_name(&path).required(false));
            }
        }

        builder = builder.add_source(
            Environment::with_prefix("CLOCKWORK")
                .prefix_separator("__")
                .separator("__")
                .try_parsing(true),
        );

        let config = builder.build().map_err(config_error_to_clockwork_error)?;

        let app_config: AppConfig = config
            .try_deserialize()
            .map_err(config_error_to_clockwork_error)?;

        ConfigValidator::validate(&app_config).map_err(|errors| {
            let messages: Vec<String> = errors.iter().map(ToString::to_string).collect();
            ClockworkError::Configuration(messages.join("; "))
        })?;

        Ok(app_config)
    }
}

fn config_error_to_clockwork_error(err: ConfigError) -> ClockworkError {
    ClockworkError::Configuration(err.to_string())
}
