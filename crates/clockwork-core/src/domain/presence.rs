//! Single-day presence snapshot.

use super::{hours_from_seconds, round_hours};
use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Derived presence state of a user on one day.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PresenceStatus {
    /// At least one punch is still open.
    Inside,
    /// All punches are closed and at least one is complete.
    Out,
    /// Punches exist but none is usable.
    Unknown,
}

/// One raw punch, as read from whichever attendance table matched.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Punch {
    pub user_id: String,
    pub username: String,
    pub full_name: String,
    pub check_in: Option<NaiveDateTime>,
    pub check_out: Option<NaiveDateTime>,
    /// Seconds between check-in and check-out as computed by the engine.
    pub worked_seconds: Option<i64>,
}

impl Punch {
    fn is_open(&self) -> bool {
        self.check_in.is_some() && self.check_out.is_none()
    }

    fn completed_seconds(&self) -> Option<i64> {
        match (self.check_in, self.check_out) {
            (Some(check_in), Some(check_out)) => Some(
                self.worked_seconds
                    .unwrap_or_else(|| (check_out - check_in).num_seconds())
                    .max(0),
            ),
            _ => None,
        }
    }
}

/// Per-user presence for one day.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PresenceRow {
    pub user_id: String,
    pub username: String,
    pub full_name: String,
    pub first_check_in: Option<NaiveDateTime>,
    pub last_check_out: Option<NaiveDateTime>,
    pub status: PresenceStatus,
    /// Hours from completed punches, rounded to two decimals.
    pub hours: f64,
    /// Whole minutes since the latest open check-in; only set while inside.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub since_check_in_minutes: Option<i64>,
}

/// Totals for a presence snapshot.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct PresenceTotals {
    pub hours: f64,
    pub records: usize,
    pub users: usize,
    pub inside: usize,
    pub out: usize,
    pub unknown: usize,
}

/// Presence snapshot for one calendar day.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PresenceAggregate {
    pub date: NaiveDate,
    pub rows: Vec<PresenceRow>,
    pub totals: PresenceTotals,
}

#[derive(Default)]
struct Accumulator {
    first_check_in: Option<NaiveDateTime>,
    last_check_out: Option<NaiveDateTime>,
    latest_open_check_in: Option<NaiveDateTime>,
    worked_seconds: i64,
    has_open_punch: bool,
    has_completed_punch: bool,
}

impl PresenceAggregate {
    /// Folds raw punches into one row per user.
    ///
    /// Rows keep the order in which users first appear in `punches`.
    #[must_use]
    pub fn from_punches(date: NaiveDate, punches: &[Punch], now: NaiveDateTime) -> Self {
        let mut order: Vec<&Punch> = Vec::new();
        let mut accumulators: HashMap<&str, Accumulator> = HashMap::new();

        for punch in punches {
            let acc = accumulators.entry(punch.user_id.as_str()).or_insert_with(|| {
                order.push(punch);
                Accumulator::default()
            });

            acc.first_check_in = min_opt(acc.first_check_in, punch.check_in);
            acc.last_check_out = max_opt(acc.last_check_out, punch.check_out);

            if punch.is_open() {
                acc.has_open_punch = true;
                acc.latest_open_check_in = max_opt(acc.latest_open_check_in, punch.check_in);
            }
            if let Some(seconds) = punch.completed_seconds() {
                acc.has_completed_punch = true;
                acc.worked_seconds += seconds;
            }
        }

        let rows: Vec<PresenceRow> = order
            .into_iter()
            .filter_map(|first| {
                let acc = accumulators.get(first.user_id.as_str())?;
                let status = if acc.has_open_punch {
                    PresenceStatus::Inside
                } else if acc.has_completed_punch {
                    PresenceStatus::Out
                } else {
                    PresenceStatus::Unknown
                };
                let since_check_in_minutes = match (status, acc.latest_open_check_in) {
                    (PresenceStatus::Inside, Some(check_in)) => {
                        Some((now - check_in).num_minutes().max(0))
                    }
                    _ => None,
                };
                Some(PresenceRow {
                    user_id: first.user_id.clone(),
                    username: first.username.clone(),
                    full_name: first.full_name.clone(),
                    first_check_in: acc.first_check_in,
                    last_check_out: acc.last_check_out,
                    status,
                    hours: hours_from_seconds(acc.worked_seconds),
                    since_check_in_minutes,
                })
            })
            .collect();

        let count = |status: PresenceStatus| rows.iter().filter(|r| r.status == status).count();
        let totals = PresenceTotals {
            hours: round_hours(rows.iter().map(|r| r.hours).sum()),
            records: rows.len(),
            users: rows.len(),
            inside: count(PresenceStatus::Inside),
            out: count(PresenceStatus::Out),
            unknown: count(PresenceStatus::Unknown),
        };

        Self { date, rows, totals }
    }
}

fn min_opt(current: Option<NaiveDateTime>, candidate: Option<NaiveDateTime>) -> Option<NaiveDateTime> {
    match (current, candidate) {
        (Some(a), Some(b)) => Some(a.min(b)),
        (a, b) => a.or(b),
    }
}

fn max_opt(current: Option<NaiveDateTime>, candidate: Option<NaiveDateTime>) -> Option<NaiveDateTime> {
    match (current, candidate) {
        (Some(a), Some(b)) => Some(a.max(b)),
        (a, b) => a.or(b),
    }
}
