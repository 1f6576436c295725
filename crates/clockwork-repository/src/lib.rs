//! # Clockwork Repository
//!
//! Read-only attendance access over whichever engine the HR database runs on.
//!
//! ```text
//! caller
//!   ↓  Arc<dyn AttendanceGateway>   (engine-agnostic contract)
//! EngineRouter                      (owns the current store, swaps atomically)
//!   ↓  Arc<dyn AttendanceStore>
//! MySqlAdapter | PostgresAdapter | SqliteAdapter
//!   ↓  run_cascade(attempts from the catalog)
//! MySQL / MariaDB / PostgreSQL / SQLite
//! ```
//!
//! The schema of the target database is not known ahead of time. Every
//! operation is a cascade: an ordered list of candidate queries, each written
//! for one known schema shape, tried until one succeeds. Only "this shape is
//! not here" errors advance the cascade; anything else aborts it.

pub mod adapters;
pub mod attempt;
pub mod cascade;
pub mod catalog;
pub mod di;
pub mod dialect;
pub mod factory;
pub mod operations;
pub mod pool;
pub mod router;
pub mod rows;
pub mod traits;

pub use adapters::{MySqlAdapter, PostgresAdapter, SqliteAdapter};
pub use attempt::{QueryAttempt, QueryParam};
pub use cascade::{run_cascade, AttemptExecutor, AttemptFailure, CascadeOutcome, SchemaErrorRecord};
pub use di::{build_attendance_module, build_attendance_module_with, AttendanceModule};
pub use dialect::{dialect_for, SqlDialect};
pub use factory::SqlxAdapterFactory;
pub use router::EngineRouter;
pub use traits::{AdapterFactory, AttendanceGateway, AttendanceStore, ConnectionInfo};
