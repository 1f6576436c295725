//! Operations shared by every adapter.
//!
//! Adapters only know how to run one attempt and read a row; everything
//! between (attempt lists, cascade, mapping, aggregation) lives here.

use crate::cascade::{run_cascade, AttemptExecutor};
use crate::catalog::{profile_for, DateFilter};
use crate::dialect::dialect_for;
use crate::rows::{map_attendance, map_punch, map_user, RawRow};
use chrono::{NaiveDate, NaiveDateTime};
use clockwork_config::Engine;
use clockwork_core::{
    ClockworkResult, ListUsersRequest, PresenceAggregate, Punch, ReportAggregate, ReportRequest, UserRecord,
};
use tracing::debug;

/// Directory lookup.
pub async fn list_users<E>(executor: &E, engine: Engine, request: &ListUsersRequest) -> ClockworkResult<Vec<UserRecord>>
where
    E: AttemptExecutor + ?Sized,
    E::Row: RawRow,
{
    request.validated()?;

    let attempts = profile_for(engine).user_attempts(dialect_for(engine), request.filter(), request.window());
    let outcome = run_cascade(executor, "list users", &attempts).await?;
    debug!(%engine, attempt = %outcome.attempt, rows = outcome.rows.len(), "Listed users");

    Ok(outcome.rows.iter().filter_map(map_user).collect())
}

/// Historical report. `today` anchors the relative presets.
///
/// The range is resolved first so a malformed range fails even when no ids
/// are given. No ids means no query.
pub async fn build_report<E>(
    executor: &E,
    engine: Engine,
    request: &ReportRequest,
    today: NaiveDate,
) -> ClockworkResult<ReportAggregate>
where
    E: AttemptExecutor + ?Sized,
    E::Row: RawRow,
{
    let range = request.date_range.resolve(today)?;
    let user_ids = request.normalized_user_ids();
    if user_ids.is_empty() {
        return Ok(ReportAggregate::empty());
    }

    let attempts = profile_for(engine).attendance_attempts(
        dialect_for(engine),
        &user_ids,
        DateFilter::Range(range.from, range.to),
    );
    let outcome = run_cascade(executor, "attendance report", &attempts).await?;
    debug!(%engine, attempt = %outcome.attempt, rows = outcome.rows.len(), "Built attendance report");

    Ok(ReportAggregate::from_rows(
        outcome.rows.iter().filter_map(map_attendance).collect(),
    ))
}

/// Single-day presence snapshot evaluated at `now`.
pub async fn get_daily_presence<E>(
    executor: &E,
    engine: Engine,
    date: NaiveDate,
    now: NaiveDateTime,
) -> ClockworkResult<PresenceAggregate>
where
    E: AttemptExecutor + ?Sized,
    E::Row: RawRow,
{
    let attempts = profile_for(engine).attendance_attempts(dialect_for(engine), &[], DateFilter::Day(date));
    let outcome = run_cascade(executor, "daily presence", &attempts).await?;
    debug!(%engine, attempt = %outcome.attempt, rows = outcome.rows.len(), "Loaded daily presence");

    let punches: Vec<Punch> = outcome.rows.iter().filter_map(map_punch).collect();
    Ok(PresenceAggregate::from_punches(date, &punches, now))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::attempt::QueryAttempt;
    use crate::cascade::AttemptFailure;
    use crate::rows::fake::MapRow;
    use async_trait::async_trait;
    use clockwork_core::{ClockworkError, DateRangeRequest, PresenceStatus};
    use std::sync::Mutex;

    /// Answers attempts whose SQL mentions `marker` with `rows`; everything
    /// else is a missing table.
    struct ShapeExecutor {
        marker: &'static str,
        rows: Vec<MapRow>,
        calls: Mutex<Vec<String>>,
    }

    impl ShapeExecutor {
        fn new(marker: &'static str, rows: Vec<MapRow>) -> Self {
            Self {
                marker,
                rows,
                calls: Mutex::new(Vec::new()),
            }
        }

        fn calls(&self) -> Vec<String> {
            self.calls.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl AttemptExecutor for ShapeExecutor {
        type Row = MapRow;

        async fn execute(&self, attempt: &QueryAttempt) -> Result<Vec<MapRow>, AttemptFailure> {
            self.calls.lock().unwrap().push(attempt.name.clone());
            if attempt.sql.contains(self.marker) {
                Ok(self.rows.clone())
            } else {
                Err(AttemptFailure::Schema(format!("Table for {} doesn't exist", attempt.name)))
            }
        }
    }

    fn date(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    fn at(s: &str) -> NaiveDateTime {
        NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S").unwrap()
    }

    #[tokio::test]
    async fn test_list_users_against_legacy_schema() {
        let executor = ShapeExecutor::new(
            "FROM hs_hr_users",
            vec![MapRow::new(&[
                ("user_id", "USR001"),
                ("username", "john.smith"),
                ("full_name", "John Smith"),
                ("email", "john@example.com"),
                ("employee_id", "12"),
            ])],
        );

        let request = ListUsersRequest::search("john", 10, 0);
        let users = list_users(&executor, Engine::MySql, &request).await.unwrap();

        assert_eq!(users.len(), 1);
        assert_eq!(users[0].id, "USR001");
        assert_eq!(users[0].full_name, "John Smith");
        assert_eq!(
            executor.calls(),
            vec!["modern_employee", "modern_employee_basic", "legacy_users"]
        );
    }

    #[tokio::test]
    async fn test_list_users_rejects_long_query() {
        let executor = ShapeExecutor::new("ohrm_user", Vec::new());
        let request = ListUsersRequest::search("x".repeat(101), 10, 0);
        let err = list_users(&executor, Engine::MySql, &request).await.unwrap_err();
        assert!(matches!(err, ClockworkError::Validation(_)));
        assert!(executor.calls().is_empty());
    }

    #[tokio::test]
    async fn test_empty_report_issues_no_query() {
        let executor = ShapeExecutor::new("ohrm_attendance_record", Vec::new());
        let request = ReportRequest::new(Vec::new(), DateRangeRequest::Last);

        let report = build_report(&executor, Engine::MySql, &request, date("2026-10-18"))
            .await
            .unwrap();

        assert_eq!(report, ReportAggregate::empty());
        assert_eq!(report.totals.records, 0);
        assert!(executor.calls().is_empty());
    }

    #[tokio::test]
    async fn test_report_rejects_inverted_custom_range() {
        let executor = ShapeExecutor::new("ohrm_attendance_record", Vec::new());
        let request = ReportRequest::new(
            vec!["1".to_string()],
            DateRangeRequest::Custom {
                from: "2026-10-10".to_string(),
                to: "2026-10-01".to_string(),
            },
        );
        let err = build_report(&executor, Engine::Postgres, &request, date("2026-10-18"))
            .await
            .unwrap_err();
        assert!(matches!(err, ClockworkError::Validation(_)));
        assert!(executor.calls().is_empty());
    }

    #[tokio::test]
    async fn test_report_totals() {
        let rows = vec![
            MapRow::new(&[
                ("user_id", "1"),
                ("username", "amy"),
                ("work_date", "2026-10-01"),
                ("check_in", "09:00:00"),
                ("check_out", "17:30:00"),
                ("worked_seconds", "30600"),
            ]),
            MapRow::new(&[
                ("user_id", "2"),
                ("username", "bob"),
                ("work_date", "2026-10-01"),
                ("check_in", "10:00:00"),
            ]),
            MapRow::new(&[
                ("user_id", "1"),
                ("username", "amy"),
                ("work_date", "2026-10-02"),
                ("check_in", "09:00:00"),
                ("check_out", "12:20:00"),
                ("worked_seconds", "12000"),
            ]),
        ];
        let executor = ShapeExecutor::new("FROM ohrm_attendance a", rows);
        let request = ReportRequest::new(vec!["1".into(), "2".into()], DateRangeRequest::Current);

        let report = build_report(&executor, Engine::MySql, &request, date("2026-10-18"))
            .await
            .unwrap();

        assert_eq!(report.totals.records, 3);
        assert_eq!(report.totals.users, 2);
        assert_eq!(report.totals.hours, 11.83);
        // every ohrm_attendance_record combination fails before the first ohrm_attendance attempt
        assert_eq!(executor.calls().len(), 10);
        assert_eq!(executor.calls()[9], "ohrm_attendance:user_time:employee_join");
    }

    #[tokio::test]
    async fn test_report_exhaustion_names_every_attempt() {
        let executor = ShapeExecutor::new("no_such_marker", Vec::new());
        let request = ReportRequest::new(vec!["1".into()], DateRangeRequest::Current);

        let err = build_report(&executor, Engine::Postgres, &request, date("2026-10-18"))
            .await
            .unwrap_err();

        assert!(err.is_unsupported_schema());
        let message = err.to_string();
        for name in executor.calls() {
            assert!(message.contains(&name), "{name} missing from {message}");
        }
        assert_eq!(executor.calls().len(), 8);
    }

    #[tokio::test]
    async fn test_presence_open_punch() {
        let rows = vec![
            MapRow::new(&[
                ("user_id", "1"),
                ("username", "amy"),
                ("check_in_at", "2026-10-18 09:00:00"),
            ]),
            MapRow::new(&[
                ("user_id", "2"),
                ("username", "bob"),
                ("check_in_at", "2026-10-18 08:00:00"),
                ("check_out_at", "2026-10-18 10:00:00"),
                ("worked_seconds", "7200"),
            ]),
        ];
        let executor = ShapeExecutor::new("ohrm_attendance_record", rows);
        let now = at("2026-10-18 11:30:00");

        let presence = get_daily_presence(&executor, Engine::Sqlite, date("2026-10-18"), now)
            .await
            .unwrap();

        assert_eq!(presence.rows.len(), 2);
        assert_eq!(presence.rows[0].status, PresenceStatus::Inside);
        assert_eq!(presence.rows[0].since_check_in_minutes, Some(150));
        assert_eq!(presence.rows[1].status, PresenceStatus::Out);
        assert_eq!(presence.rows[1].hours, 2.0);

        let again = get_daily_presence(&executor, Engine::Sqlite, date("2026-10-18"), now)
            .await
            .unwrap();
        assert_eq!(presence, again);
    }
}
