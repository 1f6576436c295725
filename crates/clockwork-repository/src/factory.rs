//! Adapter factory.

use crate::adapters::{MySqlAdapter, PostgresAdapter, SqliteAdapter};
use crate::traits::{AdapterFactory, AttendanceStore};
use async_trait::async_trait;
use clockwork_config::{ConnectionDescriptor, Engine, PoolConfig};
use clockwork_core::ClockworkResult;
use shaku::Component;
use std::sync::Arc;
use tracing::debug;

/// Builds the sqlx-backed adapter matching a descriptor's engine.
#[derive(Component)]
#[shaku(interface = AdapterFactory)]
pub struct SqlxAdapterFactory {
    pool: PoolConfig,
}

impl SqlxAdapterFactory {
    /// Creates a factory with the given pool settings.
    #[must_use]
    pub fn new(pool: PoolConfig) -> Self {
        Self { pool }
    }
}

impl Default for SqlxAdapterFactory {
    fn default() -> Self {
        Self::new(PoolConfig::default())
    }
}

#[async_trait]
impl AdapterFactory for SqlxAdapterFactory {
    async fn connect(&self, descriptor: &ConnectionDescriptor) -> ClockworkResult<Arc<dyn AttendanceStore>> {
        debug!(engine = %descriptor.engine, target = %descriptor.target(), "Building adapter");
        let store: Arc<dyn AttendanceStore> = match descriptor.engine {
            Engine::MySql | Engine::MariaDb => Arc::new(MySqlAdapter::connect(descriptor, &self.pool).await?),
            Engine::Postgres => Arc::new(PostgresAdapter::connect(descriptor, &self.pool).await?),
            Engine::Sqlite => Arc::new(SqliteAdapter::connect(descriptor, &self.pool).await?),
        };
        Ok(store)
    }
}
