//! PostgreSQL adapter.

use super::{ensure_engine, local_now, transport_error};
use crate::attempt::{QueryAttempt, QueryParam};
use crate::cascade::{AttemptExecutor, AttemptFailure};
use crate::dialect::dialect_for;
use crate::operations;
use crate::pool::connect_postgres;
use crate::rows::{decode_first, RawRow};
use crate::traits::AttendanceStore;
use async_trait::async_trait;
use chrono::{Local, NaiveDate, NaiveDateTime, NaiveTime};
use clockwork_config::{ConnectionDescriptor, Engine, PoolConfig};
use clockwork_core::{
    ClockworkError, ClockworkResult, ListUsersRequest, PresenceAggregate, ReportAggregate, ReportRequest, UserRecord,
};
use sqlx::postgres::{PgArguments, PgDatabaseError, PgPool, PgRow, Postgres};
use sqlx::query::Query;
use tracing::{info, warn};

/// SQLSTATEs meaning "this table/column/function shape is not here".
const SCHEMA_STATES: [&str; 4] = [
    "42P01", // undefined_table
    "42703", // undefined_column
    "42601", // syntax_error
    "42883", // undefined_function
];

/// Adapter for PostgreSQL, using the ANSI dialect.
pub struct PostgresAdapter {
    pool: PgPool,
    descriptor: ConnectionDescriptor,
}

impl PostgresAdapter {
    /// Opens a pool and runs the liveness query.
    pub async fn connect(descriptor: &ConnectionDescriptor, config: &PoolConfig) -> ClockworkResult<Self> {
        ensure_engine(descriptor, &[Engine::Postgres])?;

        let pool = connect_postgres(descriptor, config).await.map_err(|e| {
            warn!("Failed to connect to PostgreSQL: {}", e);
            map_error(e, descriptor)
        })?;

        let adapter = Self {
            pool,
            descriptor: descriptor.clone(),
        };
        if let Err(e) = adapter.ping().await {
            adapter.pool.close().await;
            return Err(e);
        }

        info!(database = %descriptor.database, "PostgreSQL connection pool established");
        Ok(adapter)
    }
}

fn map_error(error: sqlx::Error, descriptor: &ConnectionDescriptor) -> ClockworkError {
    if let sqlx::Error::Database(db) = &error {
        if let Some(pg) = db.try_downcast_ref::<PgDatabaseError>() {
            let state = pg.code();
            if state == "28P01" || state == "28000" {
                return ClockworkError::InvalidCredentials(format!(
                    "authentication failed for user '{}'",
                    descriptor.user
                ));
            }
            if state == "3D000" {
                return ClockworkError::UnknownDatabase(descriptor.database.clone());
            }
            if state.starts_with("08") {
                return ClockworkError::Connection(format!("{}: {}", descriptor.address(), pg.message()));
            }
        }
    }
    transport_error(error, &descriptor.address())
}

fn bind_params<'q>(
    mut query: Query<'q, Postgres, PgArguments>,
    params: &'q [QueryParam],
) -> Query<'q, Postgres, PgArguments> {
    for param in params {
        query = match param {
            QueryParam::Text(value) => query.bind(value.as_str()),
            QueryParam::Int(value) => query.bind(*value),
            QueryParam::Date(value) => query.bind(*value),
        };
    }
    query
}

#[async_trait]
impl AttemptExecutor for PostgresAdapter {
    type Row = PgRow;

    async fn execute(&self, attempt: &QueryAttempt) -> Result<Vec<PgRow>, AttemptFailure> {
        bind_params(sqlx::query(&attempt.sql), &attempt.params)
            .fetch_all(&self.pool)
            .await
            .map_err(|error| {
                if let sqlx::Error::Database(db) = &error {
                    if let Some(pg) = db.try_downcast_ref::<PgDatabaseError>() {
                        if SCHEMA_STATES.contains(&pg.code()) {
                            return AttemptFailure::Schema(pg.message().to_string());
                        }
                    }
                }
                AttemptFailure::Fatal(map_error(error, &self.descriptor))
            })
    }
}

impl RawRow for PgRow {
    fn text(&self, column: &str) -> Option<String> {
        decode_first!(self, column,
            String => Some,
            i64 => |v: i64| Some(v.to_string()),
            i32 => |v: i32| Some(v.to_string()),
            i16 => |v: i16| Some(v.to_string()),
            NaiveDateTime => |v: NaiveDateTime| Some(v.format("%Y-%m-%d %H:%M:%S").to_string()),
            NaiveDate => |v: NaiveDate| Some(v.to_string()),
            NaiveTime => |v: NaiveTime| Some(v.format("%H:%M:%S").to_string()),
            f64 => |v: f64| Some(v.to_string()),
            Vec<u8> => |v: Vec<u8>| Some(String::from_utf8_lossy(&v).into_owned()),
        )
    }

    fn integer(&self, column: &str) -> Option<i64> {
        decode_first!(self, column,
            i64 => Some,
            i32 => |v: i32| Some(i64::from(v)),
            i16 => |v: i16| Some(i64::from(v)),
            f64 => |v: f64| Some(v.round() as i64),
            String => |v: String| v.trim().parse::<i64>().ok(),
        )
    }
}

#[async_trait]
impl AttendanceStore for PostgresAdapter {
    fn engine(&self) -> Engine {
        Engine::Postgres
    }

    fn descriptor(&self) -> &ConnectionDescriptor {
        &self.descriptor
    }

    async fn ping(&self) -> ClockworkResult<()> {
        let sql = format!("SELECT {}", dialect_for(Engine::Postgres).current_timestamp());
        sqlx::query(&sql)
            .execute(&self.pool)
            .await
            .map_err(|e| map_error(e, &self.descriptor))?;
        Ok(())
    }

    async fn list_users(&self, request: &ListUsersRequest) -> ClockworkResult<Vec<UserRecord>> {
        operations::list_users(self, Engine::Postgres, request).await
    }

    async fn build_report(&self, request: &ReportRequest) -> ClockworkResult<ReportAggregate> {
        operations::build_report(self, Engine::Postgres, request, Local::now().date_naive()).await
    }

    async fn get_daily_presence(&self, date: NaiveDate) -> ClockworkResult<PresenceAggregate> {
        operations::get_daily_presence(self, Engine::Postgres, date, local_now()).await
    }

    async fn close(&self) {
        info!("Closing PostgreSQL connection pool...");
        self.pool.close().await;
    }
}
