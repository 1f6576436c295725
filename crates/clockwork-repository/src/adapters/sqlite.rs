//! Embedded SQLite adapter.

use super::{ensure_engine, local_now, transport_error};
use crate::attempt::{QueryAttempt, QueryParam};
use crate::cascade::{AttemptExecutor, AttemptFailure};
use crate::dialect::dialect_for;
use crate::operations;
use crate::pool::connect_sqlite;
use crate::rows::{decode_first, RawRow};
use crate::traits::AttendanceStore;
use async_trait::async_trait;
use chrono::{Local, NaiveDate, NaiveDateTime};
use clockwork_config::{ConnectionDescriptor, Engine, PoolConfig};
use clockwork_core::{
    ClockworkError, ClockworkResult, ListUsersRequest, PresenceAggregate, ReportAggregate, ReportRequest, UserRecord,
};
use sqlx::query::Query;
use sqlx::sqlite::{Sqlite, SqliteArguments, SqlitePool, SqliteRow};
use tracing::{info, warn};

/// Message fragments meaning "this table/column/function shape is not here".
const SCHEMA_MESSAGES: [&str; 4] = ["no such table", "no such column", "syntax error", "no such function"];

const SQLITE_BUSY: i32 = 5;
const SQLITE_CANTOPEN: i32 = 14;

/// Adapter for a local SQLite file.
pub struct SqliteAdapter {
    pool: SqlitePool,
    descriptor: ConnectionDescriptor,
}

impl SqliteAdapter {
    /// Opens (creating if needed) the database file and runs the liveness query.
    pub async fn connect(descriptor: &ConnectionDescriptor, config: &PoolConfig) -> ClockworkResult<Self> {
        ensure_engine(descriptor, &[Engine::Sqlite])?;

        let pool = connect_sqlite(descriptor, config).await.map_err(|e| {
            warn!("Failed to open SQLite database: {}", e);
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

        info!(path = %descriptor.target(), "SQLite database opened");
        Ok(adapter)
    }
}

/// Primary result code of an SQLite error. Extended codes keep it in the low byte.
fn primary_code(db: &dyn sqlx::error::DatabaseError) -> Option<i32> {
    db.code()
        .and_then(|code| code.parse::<i32>().ok())
        .map(|code| code & 0xff)
}

fn map_error(error: sqlx::Error, descriptor: &ConnectionDescriptor) -> ClockworkError {
    if let sqlx::Error::Database(db) = &error {
        match primary_code(db.as_ref()) {
            Some(SQLITE_CANTOPEN) => return ClockworkError::UnknownDatabase(descriptor.target()),
            Some(SQLITE_BUSY) => {
                return ClockworkError::Timeout(format!("database {} is busy", descriptor.target()));
            }
            _ => {}
        }
    }
    match error {
        sqlx::Error::Io(io) if io.kind() == std::io::ErrorKind::NotFound || io.kind() == std::io::ErrorKind::PermissionDenied => {
            ClockworkError::UnknownDatabase(format!("{} ({io})", descriptor.target()))
        }
        other => transport_error(other, &descriptor.target()),
    }
}

fn is_schema_message(message: &str) -> bool {
    let message = message.to_ascii_lowercase();
    SCHEMA_MESSAGES.iter().any(|fragment| message.contains(fragment))
}

fn bind_params<'q>(
    mut query: Query<'q, Sqlite, SqliteArguments<'q>>,
    params: &'q [QueryParam],
) -> Query<'q, Sqlite, SqliteArguments<'q>> {
    for param in params {
        query = match param {
            QueryParam::Text(value) => query.bind(value.as_str()),
            QueryParam::Int(value) => query.bind(*value),
            QueryParam::Date(value) => query.bind(value.format("%Y-%m-%d").to_string()),
        };
    }
    query
}

#[async_trait]
impl AttemptExecutor for SqliteAdapter {
    type Row = SqliteRow;

    async fn execute(&self, attempt: &QueryAttempt) -> Result<Vec<SqliteRow>, AttemptFailure> {
        bind_params(sqlx::query(&attempt.sql), &attempt.params)
            .fetch_all(&self.pool)
            .await
            .map_err(|error| {
                if let sqlx::Error::Database(db) = &error {
                    if is_schema_message(db.message()) {
                        return AttemptFailure::Schema(db.message().to_string());
                    }
                }
                AttemptFailure::Fatal(map_error(error, &self.descriptor))
            })
    }
}

impl RawRow for SqliteRow {
    fn text(&self, column: &str) -> Option<String> {
        decode_first!(self, column,
            String => Some,
            i64 => |v: i64| Some(v.to_string()),
            f64 => |v: f64| Some(v.to_string()),
            NaiveDateTime => |v: NaiveDateTime| Some(v.format("%Y-%m-%d %H:%M:%S").to_string()),
            Vec<u8> => |v: Vec<u8>| Some(String::from_utf8_lossy(&v).into_owned()),
        )
    }

    fn integer(&self, column: &str) -> Option<i64> {
        decode_first!(self, column,
            i64 => Some,
            f64 => |v: f64| Some(v.round() as i64),
            String => |v: String| v.trim().parse::<i64>().ok(),
        )
    }
}

#[async_trait]
impl AttendanceStore for SqliteAdapter {
    fn engine(&self) -> Engine {
        Engine::Sqlite
    }

    fn descriptor(&self) -> &ConnectionDescriptor {
        &self.descriptor
    }

    async fn ping(&self) -> ClockworkResult<()> {
        let sql = format!("SELECT {}", dialect_for(Engine::Sqlite).current_timestamp());
        sqlx::query(&sql)
            .execute(&self.pool)
            .await
            .map_err(|e| map_error(e, &self.descriptor))?;
        Ok(())
    }

    async fn list_users(&self, request: &ListUsersRequest) -> ClockworkResult<Vec<UserRecord>> {
        operations::list_users(self, Engine::Sqlite, request).await
    }

    async fn build_report(&self, request: &ReportRequest) -> ClockworkResult<ReportAggregate> {
        operations::build_report(self, Engine::Sqlite, request, Local::now().date_naive()).await
    }

    async fn get_daily_presence(&self, date: NaiveDate) -> ClockworkResult<PresenceAggregate> {
        operations::get_daily_presence(self, Engine::Sqlite, date, local_now()).await
    }

    async fn close(&self) {
        info!("Closing SQLite database...");
        self.pool.close().await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_schema_messages() {
        assert!(is_schema_message("no such table: ohrm_attendance_record"));
        assert!(is_schema_message("no such column: a.punch_in_user_time"));
        assert!(is_schema_message("near \"FETCH\": syntax error"));
        assert!(!is_schema_message("database is locked"));
    }

    #[tokio::test]
    async fn test_rejects_foreign_descriptor() {
        let descriptor = ConnectionDescriptor::networked(Engine::MySql, "db", 3306, "hr", "pw", "hr");
        let err = SqliteAdapter::connect(&descriptor, &PoolConfig::default())
            .await
            .err()
            .unwrap();
        assert!(matches!(err, ClockworkError::Validation(_)));
    }

    #[tokio::test]
    async fn test_missing_schema_exhausts_cascade() {
        let dir = tempfile::tempdir().unwrap();
        let descriptor = ConnectionDescriptor::embedded(dir.path().join("empty.sqlite"));
        let adapter = SqliteAdapter::connect(&descriptor, &PoolConfig::default())
            .await
            .unwrap();

        let err = adapter
            .list_users(&ListUsersRequest::default())
            .await
            .unwrap_err();
        assert!(err.is_unsupported_schema());
        let message = err.to_string();
        assert!(message.contains("modern_employee"));
        assert!(message.contains("username_only"));
        assert!(message.contains("no such table"));

        adapter.close().await;
    }
}
