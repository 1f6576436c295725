//! SQL dialect helpers.
//!
//! Pure text builders for the handful of fragments whose syntax differs
//! between engines. Every builder takes column expressions as plain strings
//! and never validates them; callers pass trusted identifiers only.
//!
//! Dates and times are always rendered to text in SQL so that every driver
//! hands back the same `YYYY-MM-DD` / `HH:MM:SS` shapes regardless of the
//! column's declared type.

use clockwork_config::Engine;

/// SQL dialect for engine-specific fragment generation.
pub trait SqlDialect: Send + Sync {
    /// Dialect name, for diagnostics.
    fn name(&self) -> &'static str;

    /// Placeholder for the parameter at 1-based `index`.
    fn placeholder(&self, index: usize) -> String;

    /// Current local timestamp expression.
    fn current_timestamp(&self) -> &'static str;

    /// Truncates a timestamp expression to its calendar date.
    fn date_trunc(&self, col: &str) -> String;

    /// Calendar date of a timestamp as `YYYY-MM-DD` text.
    fn date_text(&self, col: &str) -> String;

    /// Time of day of a timestamp as `HH:MM:SS` text.
    fn time_of_day(&self, col: &str) -> String;

    /// Full timestamp as `YYYY-MM-DD HH:MM:SS` text.
    fn timestamp_text(&self, col: &str) -> String;

    /// Whole seconds from `start` to `end`; NULL when either side is NULL.
    fn seconds_between(&self, start: &str, end: &str) -> String;

    /// Joins parts with single spaces, skipping NULL parts.
    fn concat_ws(&self, parts: &[&str]) -> String;

    /// Renders a column as text, for comparison against text parameters.
    fn text_cast(&self, col: &str) -> String;

    /// Case-insensitive substring match of `col` against the bound `placeholder`.
    fn contains_ci(&self, col: &str, placeholder: &str) -> String;

    /// Pagination clause, with a leading space.
    fn limit_offset_sql(&self, limit: u32, offset: u32) -> String;
}

/// MySQL and MariaDB.
#[derive(Debug, Clone, Copy, Default)]
pub struct MySqlDialect;

impl SqlDialect for MySqlDialect {
    fn name(&self) -> &'static str {
        "MySQL"
    }

    fn placeholder(&self, _index: usize) -> String {
        "?".to_string()
    }

    fn current_timestamp(&self) -> &'static str {
        "NOW()"
    }

    fn date_trunc(&self, col: &str) -> String {
        format!("DATE({col})")
    }

    fn date_text(&self, col: &str) -> String {
        format!("DATE_FORMAT({col}, '%Y-%m-%d')")
    }

    fn time_of_day(&self, col: &str) -> String {
        format!("DATE_FORMAT({col}, '%H:%i:%s')")
    }

    fn timestamp_text(&self, col: &str) -> String {
        format!("DATE_FORMAT({col}, '%Y-%m-%d %H:%i:%s')")
    }

    fn seconds_between(&self, start: &str, end: &str) -> String {
        format!("TIMESTAMPDIFF(SECOND, {start}, {end})")
    }

    fn concat_ws(&self, parts: &[&str]) -> String {
        // CONCAT_WS already skips NULL arguments
        format!("CONCAT_WS(' ', {})", parts.join(", "))
    }

    fn text_cast(&self, col: &str) -> String {
        format!("CAST({col} AS CHAR)")
    }

    fn contains_ci(&self, col: &str, placeholder: &str) -> String {
        format!("LOWER(CAST({col} AS CHAR)) LIKE CONCAT('%', LOWER({placeholder}), '%')")
    }

    fn limit_offset_sql(&self, limit: u32, offset: u32) -> String {
        format!(" LIMIT {limit} OFFSET {offset}")
    }
}

/// ANSI-style dialect used for PostgreSQL.
#[derive(Debug, Clone, Copy, Default)]
pub struct AnsiDialect;

impl SqlDialect for AnsiDialect {
    fn name(&self) -> &'static str {
        "ANSI"
    }

    fn placeholder(&self, index: usize) -> String {
        format!("${index}")
    }

    fn current_timestamp(&self) -> &'static str {
        "LOCALTIMESTAMP"
    }

    fn date_trunc(&self, col: &str) -> String {
        format!("CAST({col} AS DATE)")
    }

    fn date_text(&self, col: &str) -> String {
        format!("TO_CHAR({col}, 'YYYY-MM-DD')")
    }

    fn time_of_day(&self, col: &str) -> String {
        format!("TO_CHAR({col}, 'HH24:MI:SS')")
    }

    fn timestamp_text(&self, col: &str) -> String {
        format!("TO_CHAR({col}, 'YYYY-MM-DD HH24:MI:SS')")
    }

    fn seconds_between(&self, start: &str, end: &str) -> String {
        format!("CAST(EXTRACT(EPOCH FROM ({end} - {start})) AS BIGINT)")
    }

    fn concat_ws(&self, parts: &[&str]) -> String {
        let joined = parts
            .iter()
            .map(|part| format!("COALESCE(CAST({part} AS VARCHAR(255)) || ' ', '')"))
            .collect::<Vec<_>>()
            .join(" || ");
        format!("TRIM({joined})")
    }

    fn text_cast(&self, col: &str) -> String {
        format!("CAST({col} AS VARCHAR(255))")
    }

    fn contains_ci(&self, col: &str, placeholder: &str) -> String {
        format!("LOWER(CAST({col} AS VARCHAR(255))) LIKE '%' || LOWER({placeholder}) || '%'")
    }

    fn limit_offset_sql(&self, limit: u32, offset: u32) -> String {
        format!(" OFFSET {offset} ROWS FETCH NEXT {limit} ROWS ONLY")
    }
}

/// Embedded SQLite.
#[derive(Debug, Clone, Copy, Default)]
pub struct SqliteDialect;

impl SqlDialect for SqliteDialect {
    fn name(&self) -> &'static str {
        "SQLite"
    }

    fn placeholder(&self, _index: usize) -> String {
        "?".to_string()
    }

    fn current_timestamp(&self) -> &'static str {
        "datetime('now', 'localtime')"
    }

    fn date_trunc(&self, col: &str) -> String {
        format!("date({col})")
    }

    fn date_text(&self, col: &str) -> String {
        format!("date({col})")
    }

    fn time_of_day(&self, col: &str) -> String {
        format!("strftime('%H:%M:%S', {col})")
    }

    fn timestamp_text(&self, col: &str) -> String {
        format!("strftime('%Y-%m-%d %H:%M:%S', {col})")
    }

    fn seconds_between(&self, start: &str, end: &str) -> String {
        format!("CAST(ROUND((julianday({end}) - julianday({start})) * 86400) AS INTEGER)")
    }

    fn concat_ws(&self, parts: &[&str]) -> String {
        let joined = parts
            .iter()
            .map(|part| format!("COALESCE({part} || ' ', '')"))
            .collect::<Vec<_>>()
            .join(" || ");
        format!("TRIM({joined})")
    }

    fn text_cast(&self, col: &str) -> String {
        format!("CAST({col} AS TEXT)")
    }

    fn contains_ci(&self, col: &str, placeholder: &str) -> String {
        format!("LOWER({col}) LIKE '%' || LOWER({placeholder}) || '%'")
    }

    fn limit_offset_sql(&self, limit: u32, offset: u32) -> String {
        format!(" LIMIT {limit} OFFSET {offset}")
    }
}

static MYSQL: MySqlDialect = MySqlDialect;
static ANSI: AnsiDialect = AnsiDialect;
static SQLITE: SqliteDialect = SqliteDialect;

/// Dialect spoken by an engine. Both MySQL-family engines share one.
#[must_use]
pub fn dialect_for(engine: Engine) -> &'static dyn SqlDialect {
    match engine {
        Engine::MySql | Engine::MariaDb => &MYSQL,
        Engine::Postgres => &ANSI,
        Engine::Sqlite => &SQLITE,
    }
}
