//! Dependency injection module using Shaku.

use crate::factory::{SqlxAdapterFactory, SqlxAdapterFactoryParameters};
use crate::router::EngineRouter;
use crate::traits::AttendanceGateway;
use clockwork_config::{ConfigLoader, PoolConfig};
use shaku::{module, HasComponent};
use std::sync::Arc;
use tracing::info;

// Attendance module: the sqlx adapter factory and the engine router that
// owns the current connection.
module! {
    pub AttendanceModule {
        components = [
            SqlxAdapterFactory,
            EngineRouter,
        ],
        providers = [],
    }
}

/// Builds a disconnected module with the given pool settings.
#[must_use]
pub fn build_attendance_module_with(pool: PoolConfig) -> AttendanceModule {
    AttendanceModule::builder()
        .with_component_parameters::<SqlxAdapterFactory>(SqlxAdapterFactoryParameters { pool })
        .build()
}

/// Builds the module from configuration and runs the startup connection.
///
/// A failed startup connection is logged and leaves the gateway disconnected.
pub async fn build_attendance_module(loader: &ConfigLoader) -> Arc<AttendanceModule> {
    let config = loader.get().await;
    info!(
        app = %config.app.name,
        version = %config.app.version,
        environment = %config.app.environment,
        "Building attendance module"
    );
    let module = build_attendance_module_with(config.pool);

    let gateway: Arc<dyn AttendanceGateway> = module.resolve();
    gateway.initialize(loader.connection_descriptor().await).await;

    Arc::new(module)
}
