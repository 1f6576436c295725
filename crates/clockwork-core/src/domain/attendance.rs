//! Historical attendance report rows and their aggregate.

use super::{hours_from_seconds, round_hours};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// One punch pair in a historical report.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AttendanceRow {
    pub user_id: String,
    pub username: String,
    pub full_name: String,
    /// Calendar day of the check-in.
    pub date: NaiveDate,
    /// Check-in time of day (`HH:MM:SS`).
    pub check_in: Option<String>,
    /// Check-out time of day (`HH:MM:SS`); `None` while the punch is open.
    pub check_out: Option<String>,
    /// Worked hours, rounded to two decimals.
    pub hours: f64,
}

impl AttendanceRow {
    /// Worked hours for a punch. Open punches count as zero.
    #[must_use]
    pub fn hours_for(worked_seconds: Option<i64>, check_out: Option<&str>) -> f64 {
        match (worked_seconds, check_out) {
            (Some(seconds), Some(_)) => hours_from_seconds(seconds),
            _ => 0.0,
        }
    }
}

/// Totals shared by reports.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct ReportTotals {
    pub hours: f64,
    pub records: usize,
    pub users: usize,
}

/// A historical report: rows ordered by date then username, plus totals.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ReportAggregate {
    pub rows: Vec<AttendanceRow>,
    pub totals: ReportTotals,
}

impl ReportAggregate {
    /// Report with no rows and zero totals.
    #[must_use]
    pub fn empty() -> Self {
        Self::default()
    }

    /// Aggregates totals over already-ordered rows.
    #[must_use]
    pub fn from_rows(rows: Vec<AttendanceRow>) -> Self {
        let users: HashSet<&str> = rows.iter().map(|r| r.user_id.as_str()).collect();
        let totals = ReportTotals {
            hours: round_hours(rows.iter().map(|r| r.hours).sum()),
            records: rows.len(),
            users: users.len(),
        };
        Self { rows, totals }
    }

    /// Rows whose worked hours reach `threshold` (12 hours flags a likely missed punch-out).
    pub fn long_shifts(&self, threshold: f64) -> impl Iterator<Item = &AttendanceRow> {
        self.rows.iter().filter(move |row| row.hours >= threshold)
    }
}
