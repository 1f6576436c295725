//! Per-engine adapters.
//!
//! Each adapter owns one pool, knows how to bind parameters and classify
//! driver errors for its engine, and delegates everything else to
//! [`crate::operations`].

mod mysql;
mod postgres;
mod sqlite;

pub use mysql::MySqlAdapter;
pub use postgres::PostgresAdapter;
pub use sqlite::SqliteAdapter;

use clockwork_config::{ConnectionDescriptor, Engine};
use clockwork_core::{ClockworkError, ClockworkResult};

/// Rejects descriptors meant for another adapter.
pub(crate) fn ensure_engine(descriptor: &ConnectionDescriptor, accepts: &[Engine]) -> ClockworkResult<()> {
    if accepts.contains(&descriptor.engine) {
        descriptor.ensure_valid()
    } else {
        Err(ClockworkError::validation(format!(
            "descriptor for {} cannot be used with this adapter",
            descriptor.engine
        )))
    }
}

/// Maps transport-level failures that look the same on every engine.
///
/// Messages name the target instead of echoing the driver text.
pub(crate) fn transport_error(error: sqlx::Error, target: &str) -> ClockworkError {
    match &error {
        sqlx::Error::Io(io) if io.kind() == std::io::ErrorKind::ConnectionRefused => {
            ClockworkError::ConnectionRefused(format!("{target} refused the connection"))
        }
        sqlx::Error::PoolTimedOut => ClockworkError::Timeout(format!("timed out connecting to {target}")),
        sqlx::Error::Io(io) if io.kind() == std::io::ErrorKind::TimedOut => {
            ClockworkError::Timeout(format!("timed out connecting to {target}"))
        }
        _ => ClockworkError::from(error),
    }
}

/// Local wall-clock time, used as "now" for presence.
pub(crate) fn local_now() -> chrono::NaiveDateTime {
    chrono::Local::now().naive_local()
}
