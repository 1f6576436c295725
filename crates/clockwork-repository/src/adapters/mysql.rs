//! MySQL and MariaDB adapter.

use super::{ensure_engine, local_now, transport_error};
use crate::attempt::{QueryAttempt, QueryParam};
use crate::cascade::{AttemptExecutor, AttemptFailure};
use crate::dialect::dialect_for;
use crate::operations;
use crate::pool::connect_mysql;
use crate::rows::{decode_first, RawRow};
use crate::traits::AttendanceStore;
use async_trait::async_trait;
use chrono::{Local, NaiveDate, NaiveDateTime, NaiveTime};
use clockwork_config::{ConnectionDescriptor, Engine, PoolConfig};
use clockwork_core::{
    ClockworkError, ClockworkResult, ListUsersRequest, PresenceAggregate, ReportAggregate, ReportRequest, UserRecord,
};
use sqlx::mysql::{MySql, MySqlArguments, MySqlDatabaseError, MySqlPool, MySqlRow};
use sqlx::query::Query;
use tracing::{info, warn};

/// Error numbers meaning "this table/column/function shape is not here".
const SCHEMA_ERRORS: [u16; 5] = [
    1146, // ER_NO_SUCH_TABLE
    1054, // ER_BAD_FIELD_ERROR
    1064, // ER_PARSE_ERROR
    1305, // ER_SP_DOES_NOT_EXIST
    1109, // ER_UNKNOWN_TABLE
];

/// Adapter for the MySQL family, parameterised by sub-engine.
pub struct MySqlAdapter {
    engine: Engine,
    pool: MySqlPool,
    descriptor: ConnectionDescriptor,
}

impl MySqlAdapter {
    /// Opens a pool and runs the liveness query.
    pub async fn connect(descriptor: &ConnectionDescriptor, config: &PoolConfig) -> ClockworkResult<Self> {
        ensure_engine(descriptor, &[Engine::MySql, Engine::MariaDb])?;

        let pool = connect_mysql(descriptor, config).await.map_err(|e| {
            warn!(engine = %descriptor.engine, "Failed to connect: {}", e);
            map_error(e, descriptor)
        })?;

        let adapter = Self {
            engine: descriptor.engine,
            pool,
            descriptor: descriptor.clone(),
        };
        if let Err(e) = adapter.ping().await {
            adapter.pool.close().await;
            return Err(e);
        }

        info!(engine = %adapter.engine, database = %descriptor.database, "MySQL-family connection pool established");
        Ok(adapter)
    }
}

/// Maps driver errors, recognising the MySQL-specific numbers first.
fn map_error(error: sqlx::Error, descriptor: &ConnectionDescriptor) -> ClockworkError {
    if let sqlx::Error::Database(db) = &error {
        if let Some(mysql) = db.try_downcast_ref::<MySqlDatabaseError>() {
            match mysql.number() {
                1045 | 1044 => {
                    return ClockworkError::InvalidCredentials(format!(
                        "access denied for user '{}'",
                        descriptor.user
                    ))
                }
                1049 => return ClockworkError::UnknownDatabase(descriptor.database.clone()),
                2003 => {
                    return ClockworkError::ConnectionRefused(format!(
                        "{} refused the connection",
                        descriptor.address()
                    ))
                }
                _ => {}
            }
        }
    }
    transport_error(error, &descriptor.address())
}

fn bind_params<'q>(
    mut query: Query<'q, MySql, MySqlArguments>,
    params: &'q [QueryParam],
) -> Query<'q, MySql, MySqlArguments> {
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
impl AttemptExecutor for MySqlAdapter {
    type Row = MySqlRow;

    async fn execute(&self, attempt: &QueryAttempt) -> Result<Vec<MySqlRow>, AttemptFailure> {
        bind_params(sqlx::query(&attempt.sql), &attempt.params)
            .fetch_all(&self.pool)
            .await
            .map_err(|error| {
                if let sqlx::Error::Database(db) = &error {
                    if let Some(mysql) = db.try_downcast_ref::<MySqlDatabaseError>() {
                        if SCHEMA_ERRORS.contains(&mysql.number()) {
                            return AttemptFailure::Schema(mysql.message().to_string());
                        }
                    }
                }
                AttemptFailure::Fatal(map_error(error, &self.descriptor))
            })
    }
}

impl RawRow for MySqlRow {
    fn text(&self, column: &str) -> Option<String> {
        decode_first!(self, column,
            String => Some,
            i64 => |v: i64| Some(v.to_string()),
            u64 => |v: u64| Some(v.to_string()),
            i32 => |v: i32| Some(v.to_string()),
            u32 => |v: u32| Some(v.to_string()),
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
            u64 => |v: u64| i64::try_from(v).ok(),
            i32 => |v: i32| Some(i64::from(v)),
            u32 => |v: u32| Some(i64::from(v)),
            f64 => |v: f64| Some(v.round() as i64),
            String => |v: String| v.trim().parse::<i64>().ok(),
            Vec<u8> => |v: Vec<u8>| String::from_utf8_lossy(&v).trim().parse::<i64>().ok(),
        )
    }
}

#[async_trait]
impl AttendanceStore for MySqlAdapter {
    fn engine(&self) -> Engine {
        self.engine
    }

    fn descriptor(&self) -> &ConnectionDescriptor {
        &self.descriptor
    }

    async fn ping(&self) -> ClockworkResult<()> {
        let sql = format!("SELECT {}", dialect_for(self.engine).current_timestamp());
        sqlx::query(&sql)
            .execute(&self.pool)
            .await
            .map_err(|e| map_error(e, &self.descriptor))?;
        Ok(())
    }

    async fn list_users(&self, request: &ListUsersRequest) -> ClockworkResult<Vec<UserRecord>> {
        operations::list_users(self, self.engine, request).await
    }

    async fn build_report(&self, request: &ReportRequest) -> ClockworkResult<ReportAggregate> {
        operations::build_report(self, self.engine, request, Local::now().date_naive()).await
    }

    async fn get_daily_presence(&self, date: NaiveDate) -> ClockworkResult<PresenceAggregate> {
        operations::get_daily_presence(self, self.engine, date, local_now()).await
    }

    async fn close(&self) {
        info!(engine = %self.engine, "Closing database connection pool...");
        self.pool.close().await;
    }
}
