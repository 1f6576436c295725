//! Attempt cascade executor.
//!
//! Runs an ordered list of [`QueryAttempt`]s against one connection. The
//! first attempt that succeeds wins, even with zero rows. A schema mismatch
//! is recorded and the next attempt runs; any other failure aborts the
//! cascade. When only schema mismatches remain, the error lists every
//! attempt that was tried.

use crate::attempt::QueryAttempt;
use async_trait::async_trait;
use clockwork_core::{ClockworkError, ClockworkResult};
use tracing::{debug, warn};

/// Longest reason kept per attempt in the exhaustion message.
pub const MAX_REASON_CHARS: usize = 160;

/// Longest attempt list kept in the exhaustion message.
pub const MAX_ATTEMPTS_CHARS: usize = 2000;

/// Why a single attempt failed.
#[derive(Debug)]
pub enum AttemptFailure {
    /// The attempted table or column shape does not exist here.
    Schema(String),
    /// Connectivity, auth, timeout or any other non-schema error.
    Fatal(ClockworkError),
}

/// A recorded schema mismatch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SchemaErrorRecord {
    pub attempt: String,
    pub reason: String,
}

/// Executes one attempt against a live connection.
#[async_trait]
pub trait AttemptExecutor: Send + Sync {
    /// Row type produced by the driver.
    type Row: Send;

    /// Runs the attempt and classifies any failure.
    async fn execute(&self, attempt: &QueryAttempt) -> Result<Vec<Self::Row>, AttemptFailure>;
}

/// Result of a successful cascade.
#[derive(Debug)]
pub struct CascadeOutcome<R> {
    pub rows: Vec<R>,
    /// Name of the winning attempt; empty when there were no attempts.
    pub attempt: String,
    /// Mismatches recorded before the winner ran.
    pub schema_errors: Vec<SchemaErrorRecord>,
}

/// Runs `attempts` strictly in order.
pub async fn run_cascade<E>(
    executor: &E,
    operation: &str,
    attempts: &[QueryAttempt],
) -> ClockworkResult<CascadeOutcome<E::Row>>
where
    E: AttemptExecutor + ?Sized,
{
    let mut schema_errors = Vec::new();

    if attempts.is_empty() {
        return Ok(CascadeOutcome {
            rows: Vec::new(),
            attempt: String::new(),
            schema_errors,
        });
    }

    for attempt in attempts {
        debug!(operation, attempt = %attempt.name, "Running query attempt");
        match executor.execute(attempt).await {
            Ok(rows) => {
                debug!(operation, attempt = %attempt.name, rows = rows.len(), "Query attempt succeeded");
                return Ok(CascadeOutcome {
                    rows,
                    attempt: attempt.name.clone(),
                    schema_errors,
                });
            }
            Err(AttemptFailure::Schema(reason)) => {
                warn!(operation, attempt = %attempt.name, %reason, "Schema mismatch, trying next variant");
                schema_errors.push(SchemaErrorRecord {
                    attempt: attempt.name.clone(),
                    reason,
                });
            }
            Err(AttemptFailure::Fatal(error)) => {
                debug!(operation, attempt = %attempt.name, %error, "Query attempt failed fatally");
                return Err(error);
            }
        }
    }

    Err(ClockworkError::UnsupportedSchema {
        operation: operation.to_string(),
        attempts: describe_attempts(&schema_errors),
    })
}

/// Renders `name (reason); ...`, bounded in length.
///
/// When the full rendering is too long the reasons are dropped so that the
/// attempt names still fit; a name list past the cap is cut as well.
fn describe_attempts(records: &[SchemaErrorRecord]) -> String {
    let full = records
        .iter()
        .map(|record| format!("{} ({})", record.attempt, truncate(&record.reason, MAX_REASON_CHARS)))
        .collect::<Vec<_>>()
        .join("; ");

    if full.chars().count() <= MAX_ATTEMPTS_CHARS {
        return full;
    }

    let names = records
        .iter()
        .map(|record| record.attempt.as_str())
        .collect::<Vec<_>>()
        .join("; ");
    // The ellipsis counts towards the cap.
    truncate(&names, MAX_ATTEMPTS_CHARS - 1)
}

fn truncate(text: &str, max: usize) -> String {
    let single_line = text.split_whitespace().collect::<Vec<_>>().join(" ");
    if single_line.chars().count() <= max {
        single_line
    } else {
        let mut cut: String = single_line.chars().take(max).collect();
        cut.push('…');
        cut
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::sync::Mutex;

    enum Scripted {
        Rows(usize),
        Schema(&'static str),
        Fatal,
    }

    /// Fake executor that answers by attempt name and records call order.
    struct ScriptedExecutor {
        script: HashMap<&'static str, Scripted>,
        calls: Mutex<Vec<String>>,
    }

    impl ScriptedExecutor {
        fn new(script: Vec<(&'static str, Scripted)>) -> Self {
            Self {
                script: script.into_iter().collect(),
                calls: Mutex::new(Vec::new()),
            }
        }

        fn calls(&self) -> Vec<String> {
            self.calls.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl AttemptExecutor for ScriptedExecutor {
        type Row = u32;

        async fn execute(&self, attempt: &QueryAttempt) -> Result<Vec<u32>, AttemptFailure> {
            self.calls.lock().unwrap().push(attempt.name.clone());
            match self.script.get(attempt.name.as_str()) {
                Some(Scripted::Rows(n)) => Ok((0..*n as u32).collect()),
                Some(Scripted::Schema(reason)) => Err(AttemptFailure::Schema((*reason).to_string())),
                Some(Scripted::Fatal) | None => Err(AttemptFailure::Fatal(ClockworkError::ConnectionRefused(
                    "db:3306".to_string(),
                ))),
            }
        }
    }

    fn attempts(names: &[&str]) -> Vec<QueryAttempt> {
        names
            .iter()
            .map(|name| QueryAttempt::new(*name, "SELECT 1", Vec::new()))
            .collect()
    }

    #[tokio::test]
    async fn test_first_success_stops_cascade() {
        let executor = ScriptedExecutor::new(vec![
            ("modern", Scripted::Schema("Table 'ohrm_user' doesn't exist")),
            ("legacy", Scripted::Rows(2)),
            ("minimal", Scripted::Rows(5)),
        ]);

        let outcome = run_cascade(&executor, "list users", &attempts(&["modern", "legacy", "minimal"]))
            .await
            .unwrap();

        assert_eq!(outcome.rows, vec![0, 1]);
        assert_eq!(outcome.attempt, "legacy");
        assert_eq!(outcome.schema_errors.len(), 1);
        assert_eq!(outcome.schema_errors[0].attempt, "modern");
        assert_eq!(executor.calls(), vec!["modern", "legacy"]);
    }

    #[tokio::test]
    async fn test_zero_rows_is_success() {
        let executor = ScriptedExecutor::new(vec![("modern", Scripted::Rows(0)), ("legacy", Scripted::Rows(3))]);

        let outcome = run_cascade(&executor, "report", &attempts(&["modern", "legacy"]))
            .await
            .unwrap();

        assert!(outcome.rows.is_empty());
        assert_eq!(executor.calls(), vec!["modern"]);
    }

    #[tokio::test]
    async fn test_exhaustion_lists_every_attempt() {
        let executor = ScriptedExecutor::new(vec![
            ("a", Scripted::Schema("no such table: a")),
            ("b", Scripted::Schema("no such column: b")),
            ("c", Scripted::Schema("syntax error")),
        ]);

        let err = run_cascade(&executor, "presence", &attempts(&["a", "b", "c"]))
            .await
            .unwrap_err();

        assert!(err.is_unsupported_schema());
        let message = err.to_string();
        assert!(message.starts_with("No supported schema found for presence"));
        for name in ["a (no such table: a)", "b (no such column: b)", "c (syntax error)"] {
            assert!(message.contains(name), "{message}");
        }
        assert_eq!(executor.calls().len(), 3);
    }

    #[tokio::test]
    async fn test_fatal_error_aborts() {
        let executor = ScriptedExecutor::new(vec![
            ("a", Scripted::Schema("no such table: a")),
            ("b", Scripted::Fatal),
            ("c", Scripted::Rows(1)),
        ]);

        let err = run_cascade(&executor, "report", &attempts(&["a", "b", "c"]))
            .await
            .unwrap_err();

        assert!(matches!(err, ClockworkError::ConnectionRefused(_)));
        assert!(!err.is_unsupported_schema());
        assert_eq!(executor.calls(), vec!["a", "b"]);
    }

    #[tokio::test]
    async fn test_empty_attempt_list() {
        let executor = ScriptedExecutor::new(Vec::new());
        let outcome = run_cascade(&executor, "report", &[]).await.unwrap();
        assert!(outcome.rows.is_empty());
        assert!(executor.calls().is_empty());
    }

    #[test]
    fn test_long_reasons_are_bounded() {
        let records: Vec<SchemaErrorRecord> = (0..40)
            .map(|i| SchemaErrorRecord {
                attempt: format!("attempt_{i}"),
                reason: "x".repeat(500),
            })
            .collect();

        let message = describe_attempts(&records);
        assert!(message.chars().count() <= MAX_ATTEMPTS_CHARS);
        for i in 0..40 {
            assert!(message.contains(&format!("attempt_{i}")));
        }
    }

    #[test]
    fn test_name_list_is_bounded() {
        let records: Vec<SchemaErrorRecord> = (0..200)
            .map(|i| SchemaErrorRecord {
                attempt: format!("ohrm_attendance_record:user_time:employee_join_{i}"),
                reason: "no such table".to_string(),
            })
            .collect();

        let message = describe_attempts(&records);
        assert_eq!(message.chars().count(), MAX_ATTEMPTS_CHARS);
        assert!(message.starts_with("ohrm_attendance_record:user_time:employee_join_0; "));
        assert!(message.ends_with('…'));
        assert!(!message.contains("no such table"));
    }

    #[test]
    fn test_reason_truncation() {
        let cut = truncate(&"y".repeat(300), MAX_REASON_CHARS);
        assert_eq!(cut.chars().count(), MAX_REASON_CHARS + 1);
        assert_eq!(truncate("multi\n  line", 50), "multi line");
    }
}
