//! Report date-range presets and their resolution to calendar dates.

use crate::solar::SolarDate;
use crate::{parse_iso_date, ClockworkError, ClockworkResult};
use chrono::{Datelike, Duration, Local, NaiveDate};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Day of the solar month on which a payroll cycle closes.
pub const PAYROLL_CLOSING_DAY: u32 = 25;

/// A requested reporting period.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "preset", rename_all = "kebab-case")]
pub enum DateRangeRequest {
    /// First day of the current month through today.
    Current,
    /// The whole previous calendar month.
    Last,
    /// Caller-supplied inclusive bounds in `YYYY-MM-DD` form.
    Custom { from: String, to: String },
    /// 26th of one solar month through the 25th of the next.
    PayrollCycle,
}

/// Inclusive, date-only bounds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolvedRange {
    pub from: NaiveDate,
    pub to: NaiveDate,
}

impl fmt::Display for ResolvedRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}..={}", self.from, self.to)
    }
}

impl DateRangeRequest {
    /// Builds a request from a preset name plus optional custom bounds.
    pub fn parse(preset: &str, from: Option<&str>, to: Option<&str>) -> ClockworkResult<Self> {
        match preset.trim().to_ascii_lowercase().as_str() {
            "current" | "this-month" => Ok(Self::Current),
            "last" | "last-month" => Ok(Self::Last),
            "payroll" | "payroll-cycle" | "payroll_cycle" => Ok(Self::PayrollCycle),
            "custom" => match (from, to) {
                (Some(from), Some(to)) => Ok(Self::Custom {
                    from: from.to_string(),
                    to: to.to_string(),
                }),
                _ => Err(ClockworkError::validation(
                    "custom date range requires both from and to",
                )),
            },
            other => Err(ClockworkError::validation(format!(
                "unknown date range preset '{other}'"
            ))),
        }
    }

    /// Resolves against today's local date.
    pub fn resolve_now(&self) -> ClockworkResult<ResolvedRange> {
        self.resolve(Local::now().date_naive())
    }

    /// Resolves against an explicit reference date.
    pub fn resolve(&self, today: NaiveDate) -> ClockworkResult<ResolvedRange> {
        match self {
            Self::Current => Ok(ResolvedRange {
                from: first_of_month(today)?,
                to: today,
            }),
            Self::Last => {
                let to = first_of_month(today)? - Duration::days(1);
                Ok(ResolvedRange {
                    from: first_of_month(to)?,
                    to,
                })
            }
            Self::Custom { from, to } => {
                let from = parse_iso_date("from", from)?;
                let to = parse_iso_date("to", to)?;
                if from > to {
                    return Err(ClockworkError::validation(format!(
                        "date range start {from} is after end {to}"
                    )));
                }
                Ok(ResolvedRange { from, to })
            }
            Self::PayrollCycle => payroll_cycle(today),
        }
    }
}

fn first_of_month(date: NaiveDate) -> ClockworkResult<NaiveDate> {
    date.with_day(1)
        .ok_or_else(|| ClockworkError::internal(format!("no first day for month of {date}")))
}

/// The payroll cycle containing `today`.
///
/// On or before the closing day the cycle opened on the 26th of the previous
/// solar month; after it, the cycle opened on the 26th of the current one.
pub fn payroll_cycle(today: NaiveDate) -> ClockworkResult<ResolvedRange> {
    let out_of_range = || ClockworkError::validation(format!("{today} is outside the supported solar calendar range"));
    let solar = SolarDate::from_gregorian(today).ok_or_else(out_of_range)?;
    let opening_day = PAYROLL_CLOSING_DAY + 1;

    let (start, end) = if solar.day <= PAYROLL_CLOSING_DAY {
        (
            solar.previous_month(opening_day),
            solar.with_day(PAYROLL_CLOSING_DAY),
        )
    } else {
        (
            solar.with_day(opening_day),
            solar.next_month(PAYROLL_CLOSING_DAY),
        )
    };

    let from = start.and_then(|d| d.to_gregorian()).ok_or_else(out_of_range)?;
    let to = end.and_then(|d| d.to_gregorian()).ok_or_else(out_of_range)?;
    Ok(ResolvedRange { from, to })
}
