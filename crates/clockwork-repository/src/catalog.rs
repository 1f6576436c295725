//! Schema catalog.
//!
//! The HR schema shows up in several incompatible shapes. This module knows
//! each shape and turns a logical operation into the ordered attempt list for
//! an engine: modern shapes first, legacy last.
//!
//! Every attempt aliases its output columns to the same names so that row
//! mapping never needs to know which attempt won:
//!
//! | operation  | columns |
//! |------------|---------|
//! | users      | `user_id`, `username`, `full_name`, `email`, `employee_id` |
//! | attendance | `user_id`, `username`, `full_name`, `work_date`, `check_in`, `check_out`, `check_in_at`, `check_out_at`, `worked_seconds` |

use crate::attempt::{ParamList, QueryAttempt, QueryParam};
use crate::dialect::SqlDialect;
use chrono::NaiveDate;
use clockwork_config::Engine;
use clockwork_core::ListWindow;

/// A user table layout.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UserShape {
    /// `ohrm_user` joined to `hs_hr_employee` with middle name and work email.
    ModernEmployee,
    /// Same join, first and last name only.
    ModernEmployeeBasic,
    /// Pre-`ohrm_` installs: `hs_hr_users` carries names and email itself.
    LegacyUsers,
    /// `ohrm_user` alone.
    UsernameOnly,
}

impl UserShape {
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::ModernEmployee => "modern_employee",
            Self::ModernEmployeeBasic => "modern_employee_basic",
            Self::LegacyUsers => "legacy_users",
            Self::UsernameOnly => "username_only",
        }
    }
}

/// Check-in and check-out column pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PunchColumns {
    pub name: &'static str,
    pub check_in: &'static str,
    pub check_out: &'static str,
}

pub const USER_TIME: PunchColumns = PunchColumns {
    name: "user_time",
    check_in: "punch_in_user_time",
    check_out: "punch_out_user_time",
};

pub const UTC_TIME: PunchColumns = PunchColumns {
    name: "utc_time",
    check_in: "punch_in_utc_time",
    check_out: "punch_out_utc_time",
};

pub const PLAIN_TIME: PunchColumns = PunchColumns {
    name: "time",
    check_in: "punch_in_time",
    check_out: "punch_out_time",
};

pub const ATTENDANCE_RECORD: &str = "ohrm_attendance_record";
pub const ATTENDANCE: &str = "ohrm_attendance";

/// How attendance rows resolve to a user and display name.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NameStrategy {
    EmployeeJoin,
    LegacyUsers,
    UsernameOnly,
}

impl NameStrategy {
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::EmployeeJoin => "employee_join",
            Self::LegacyUsers => "legacy_users",
            Self::UsernameOnly => "username_only",
        }
    }
}

/// Which shapes an engine's adapter tries, in order.
#[derive(Debug)]
pub struct EngineProfile {
    pub user_shapes: &'static [UserShape],
    pub tables: &'static [&'static str],
    pub punches: &'static [PunchColumns],
    pub strategies: &'static [NameStrategy],
}

static MYSQL_PROFILE: EngineProfile = EngineProfile {
    user_shapes: &[
        UserShape::ModernEmployee,
        UserShape::ModernEmployeeBasic,
        UserShape::LegacyUsers,
        UserShape::UsernameOnly,
    ],
    tables: &[ATTENDANCE_RECORD, ATTENDANCE],
    punches: &[USER_TIME, UTC_TIME, PLAIN_TIME],
    strategies: &[
        NameStrategy::EmployeeJoin,
        NameStrategy::LegacyUsers,
        NameStrategy::UsernameOnly,
    ],
};

static POSTGRES_PROFILE: EngineProfile = EngineProfile {
    user_shapes: &[
        UserShape::ModernEmployee,
        UserShape::ModernEmployeeBasic,
        UserShape::UsernameOnly,
    ],
    tables: &[ATTENDANCE_RECORD, ATTENDANCE],
    punches: &[USER_TIME, UTC_TIME],
    strategies: &[NameStrategy::EmployeeJoin, NameStrategy::UsernameOnly],
};

static SQLITE_PROFILE: EngineProfile = EngineProfile {
    user_shapes: &[UserShape::ModernEmployee, UserShape::UsernameOnly],
    tables: &[ATTENDANCE_RECORD],
    punches: &[USER_TIME, UTC_TIME],
    strategies: &[NameStrategy::EmployeeJoin],
};

/// Shape profile for an engine.
#[must_use]
pub fn profile_for(engine: Engine) -> &'static EngineProfile {
    match engine {
        Engine::MySql | Engine::MariaDb => &MYSQL_PROFILE,
        Engine::Postgres => &POSTGRES_PROFILE,
        Engine::Sqlite => &SQLITE_PROFILE,
    }
}

/// Date restriction for attendance attempts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DateFilter {
    /// Inclusive range of check-in dates.
    Range(NaiveDate, NaiveDate),
    /// A single check-in date.
    Day(NaiveDate),
}

impl EngineProfile {
    /// Number of attendance attempts per operation.
    #[must_use]
    pub fn attendance_attempt_count(&self) -> usize {
        self.tables.len() * self.punches.len() * self.strategies.len()
    }

    /// Directory lookup attempts.
    #[must_use]
    pub fn user_attempts(
        &self,
        dialect: &dyn SqlDialect,
        filter: Option<&str>,
        window: ListWindow,
    ) -> Vec<QueryAttempt> {
        self.user_shapes
            .iter()
            .map(|shape| user_attempt(dialect, *shape, filter, window))
            .collect()
    }

    /// Attendance attempts restricted to `user_ids` and `dates`.
    ///
    /// Order: table, then punch columns, then name strategy.
    #[must_use]
    pub fn attendance_attempts(
        &self,
        dialect: &dyn SqlDialect,
        user_ids: &[String],
        dates: DateFilter,
    ) -> Vec<QueryAttempt> {
        let mut attempts = Vec::with_capacity(self.attendance_attempt_count());
        for table in self.tables {
            for punch in self.punches {
                for strategy in self.strategies {
                    attempts.push(attendance_attempt(dialect, table, *punch, *strategy, user_ids, dates));
                }
            }
        }
        attempts
    }
}

struct UserColumns {
    from: &'static str,
    id: &'static str,
    username: &'static str,
    first: Option<&'static str>,
    middle: Option<&'static str>,
    last: Option<&'static str>,
    email: Option<&'static str>,
    employee_id: Option<&'static str>,
}

impl UserShape {
    const fn columns(self) -> UserColumns {
        match self {
            Self::ModernEmployee => UserColumns {
                from: "ohrm_user u LEFT JOIN hs_hr_employee e ON e.emp_number = u.emp_number",
                id: "u.id",
                username: "u.user_name",
                first: Some("e.emp_firstname"),
                middle: Some("e.emp_middle_name"),
                last: Some("e.emp_lastname"),
                email: Some("e.emp_work_email"),
                employee_id: Some("e.employee_id"),
            },
            Self::ModernEmployeeBasic => UserColumns {
                from: "ohrm_user u LEFT JOIN hs_hr_employee e ON e.emp_number = u.emp_number",
                id: "u.id",
                username: "u.user_name",
                first: Some("e.emp_firstname"),
                middle: None,
                last: Some("e.emp_lastname"),
                email: None,
                employee_id: Some("e.employee_id"),
            },
            Self::LegacyUsers => UserColumns {
                from: "hs_hr_users u",
                id: "u.id",
                username: "u.user_name",
                first: Some("u.first_name"),
                middle: None,
                last: Some("u.last_name"),
                email: Some("u.email1"),
                employee_id: Some("u.emp_number"),
            },
            Self::UsernameOnly => UserColumns {
                from: "ohrm_user u",
                id: "u.id",
                username: "u.user_name",
                first: None,
                middle: None,
                last: None,
                email: None,
                employee_id: None,
            },
        }
    }
}

fn user_attempt(
    dialect: &dyn SqlDialect,
    shape: UserShape,
    filter: Option<&str>,
    window: ListWindow,
) -> QueryAttempt {
    let columns = shape.columns();
    let name_parts: Vec<&str> = [columns.first, columns.middle, columns.last]
        .into_iter()
        .flatten()
        .collect();
    let full_name = if name_parts.is_empty() {
        None
    } else {
        Some(dialect.concat_ws(&name_parts))
    };

    let mut sql = format!(
        "SELECT {id} AS user_id, {username} AS username, {full_name} AS full_name, \
         {email} AS email, {employee_id} AS employee_id FROM {from}",
        id = columns.id,
        username = columns.username,
        full_name = full_name.as_deref().unwrap_or("NULL"),
        email = columns.email.unwrap_or("NULL"),
        employee_id = columns.employee_id.unwrap_or("NULL"),
        from = columns.from,
    );

    let mut params = ParamList::new(dialect);
    if let Some(term) = filter {
        let searchable: Vec<&str> = [Some(columns.username), full_name.as_deref(), columns.email, columns.employee_id]
            .into_iter()
            .flatten()
            .collect();
        let predicates: Vec<String> = searchable
            .iter()
            .map(|col| {
                let placeholder = params.push(QueryParam::Text(term.to_string()));
                dialect.contains_ci(col, &placeholder)
            })
            .collect();
        sql.push_str(" WHERE (");
        sql.push_str(&predicates.join(" OR "));
        sql.push(')');
    }

    sql.push_str(&format!(" ORDER BY {}", columns.username));
    sql.push_str(&dialect.limit_offset_sql(window.limit, window.offset));

    QueryAttempt::new(shape.name(), sql, params.into_params())
}

fn attendance_attempt(
    dialect: &dyn SqlDialect,
    table: &str,
    punch: PunchColumns,
    strategy: NameStrategy,
    user_ids: &[String],
    dates: DateFilter,
) -> QueryAttempt {
    let check_in = format!("a.{}", punch.check_in);
    let check_out = format!("a.{}", punch.check_out);

    let (joins, full_name) = match strategy {
        NameStrategy::EmployeeJoin => (
            "JOIN ohrm_user u ON u.emp_number = a.employee_id \
             LEFT JOIN hs_hr_employee e ON e.emp_number = a.employee_id",
            dialect.concat_ws(&["e.emp_firstname", "e.emp_lastname"]),
        ),
        NameStrategy::LegacyUsers => (
            "JOIN hs_hr_users u ON u.emp_number = a.employee_id",
            dialect.concat_ws(&["u.first_name", "u.last_name"]),
        ),
        NameStrategy::UsernameOnly => ("JOIN ohrm_user u ON u.emp_number = a.employee_id", "NULL".to_string()),
    };

    // Placeholders are pushed in the order they appear in the text.
    let mut params = ParamList::new(dialect);
    let date_predicate = match dates {
        DateFilter::Range(from, to) => {
            let from = params.push(QueryParam::Date(from));
            let to = params.push(QueryParam::Date(to));
            format!("{} BETWEEN {from} AND {to}", dialect.date_trunc(&check_in))
        }
        DateFilter::Day(day) => {
            let day = params.push(QueryParam::Date(day));
            format!("{} = {day}", dialect.date_trunc(&check_in))
        }
    };
    let id_params = QueryParam::user_ids(user_ids);
    let user_predicate = if id_params.is_empty() {
        String::new()
    } else {
        let id_column = if id_params.iter().any(QueryParam::is_text) {
            dialect.text_cast("u.id")
        } else {
            "u.id".to_string()
        };
        format!(" AND {id_column} IN ({})", params.push_all(id_params))
    };

    let sql = format!(
        "SELECT u.id AS user_id, u.user_name AS username, {full_name} AS full_name, \
         {work_date} AS work_date, {in_time} AS check_in, {out_time} AS check_out, \
         {in_at} AS check_in_at, {out_at} AS check_out_at, {seconds} AS worked_seconds \
         FROM {table} a {joins} \
         WHERE {date_predicate}{user_predicate} \
         ORDER BY work_date, username, check_in_at",
        work_date = dialect.date_text(&check_in),
        in_time = dialect.time_of_day(&check_in),
        out_time = dialect.time_of_day(&check_out),
        in_at = dialect.timestamp_text(&check_in),
        out_at = dialect.timestamp_text(&check_out),
        seconds = dialect.seconds_between(&check_in, &check_out),
    );

    let name = format!("{table}:{}:{}", punch.name, strategy.name());
    QueryAttempt::new(name, sql, params.into_params())
}
