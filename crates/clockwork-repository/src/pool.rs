//! Database connection pool construction.
//!
//! One builder per engine family. Networked pools take their sizing and
//! timeouts from [`PoolConfig`]; the embedded pool always holds a single
//! connection because SQLite serialises writers anyway.

use clockwork_config::{ConnectionDescriptor, PoolConfig};
use sqlx::mysql::{MySqlConnectOptions, MySqlPool, MySqlPoolOptions, MySqlSslMode};
use sqlx::postgres::{PgConnectOptions, PgPool, PgPoolOptions, PgSslMode};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};
use tracing::{debug, info};

/// Opens a MySQL or MariaDB pool.
pub async fn connect_mysql(descriptor: &ConnectionDescriptor, config: &PoolConfig) -> Result<MySqlPool, sqlx::Error> {
    info!(engine = %descriptor.engine, address = %descriptor.address(), "Connecting to MySQL-family database...");

    let options = MySqlConnectOptions::new()
        .host(&descriptor.host)
        .port(descriptor.port)
        .username(&descriptor.user)
        .password(&descriptor.password)
        .database(&descriptor.database)
        .ssl_mode(if descriptor.ssl {
            MySqlSslMode::Required
        } else {
            MySqlSslMode::Preferred
        });

    MySqlPoolOptions::new()
        .min_connections(config.min_connections)
        .max_connections(config.max_connections)
        .acquire_timeout(config.connect_timeout())
        .idle_timeout(Some(config.idle_timeout()))
        .connect_with(options)
        .await
}

/// Opens a PostgreSQL pool.
pub async fn connect_postgres(descriptor: &ConnectionDescriptor, config: &PoolConfig) -> Result<PgPool, sqlx::Error> {
    info!(address = %descriptor.address(), "Connecting to PostgreSQL database...");

    let options = PgConnectOptions::new()
        .host(&descriptor.host)
        .port(descriptor.port)
        .username(&descriptor.user)
        .password(&descriptor.password)
        .database(&descriptor.database)
        .ssl_mode(if descriptor.ssl {
            PgSslMode::Require
        } else {
            PgSslMode::Prefer
        });

    PgPoolOptions::new()
        .min_connections(config.min_connections)
        .max_connections(config.max_connections)
        .acquire_timeout(config.connect_timeout())
        .idle_timeout(Some(config.idle_timeout()))
        .connect_with(options)
        .await
}

/// Opens the embedded database, creating the file and its parent
/// directories if they are missing.
pub async fn connect_sqlite(descriptor: &ConnectionDescriptor, config: &PoolConfig) -> Result<SqlitePool, sqlx::Error> {
    let path = descriptor
        .file_path
        .clone()
        .ok_or_else(|| sqlx::Error::Configuration("SQLite file path is required".into()))?;
    info!(path = %path.display(), "Opening SQLite database...");

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        debug!(dir = %parent.display(), "Ensuring database directory exists");
        tokio::fs::create_dir_all(parent).await?;
    }

    let options = SqliteConnectOptions::new()
        .filename(&path)
        .create_if_missing(true)
        .busy_timeout(config.connect_timeout());

    SqlitePoolOptions::new()
        .max_connections(1)
        .acquire_timeout(config.connect_timeout())
        .connect_with(options)
        .await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_sqlite_creates_parent_directories() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("nested").join("deeper").join("hr.sqlite");
        let descriptor = ConnectionDescriptor::embedded(&file);

        let pool = connect_sqlite(&descriptor, &PoolConfig::default()).await.unwrap();
        sqlx::query("SELECT 1").execute(&pool).await.unwrap();
        pool.close().await;

        assert!(file.exists());
    }

    #[tokio::test]
    async fn test_sqlite_requires_path() {
        let mut descriptor = ConnectionDescriptor::embedded("unused.sqlite");
        descriptor.file_path = None;
        let err = connect_sqlite(&descriptor, &PoolConfig::default()).await.unwrap_err();
        assert!(matches!(err, sqlx::Error::Configuration(_)));
    }
}
