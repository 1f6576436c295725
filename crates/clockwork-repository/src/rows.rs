//! Raw row normalisation.
//!
//! Drivers disagree on how a column comes back: the same `user_id` can be an
//! `INT`, an unsigned `BIGINT` or a `VARCHAR`, and text renderings may arrive
//! as binary strings. [`RawRow`] hides that behind two lookups; the mapping
//! functions here turn rows into the shared model.

use chrono::{NaiveDate, NaiveDateTime};
use clockwork_core::{AttendanceRow, Punch, UserRecord, display_name};

/// Column access that tolerates per-driver type differences.
///
/// Missing columns and NULLs both read as `None`.
pub trait RawRow: Send {
    /// Column rendered as text.
    fn text(&self, column: &str) -> Option<String>;

    /// Column read as a whole number.
    fn integer(&self, column: &str) -> Option<i64>;
}

/// Decodes a column with the first type in the list that accepts it.
///
/// NULL decodes successfully as the first type, so it reads as `None`
/// without trying the rest.
macro_rules! decode_first {
    ($row:expr, $column:expr, $($ty:ty => $convert:expr),+ $(,)?) => {{
        use sqlx::Row as _;
        let mut decoded = None;
        $(
            if decoded.is_none() {
                if let Ok(value) = $row.try_get::<Option<$ty>, _>($column) {
                    decoded = Some(value.and_then($convert));
                }
            }
        )+
        decoded.flatten()
    }};
}

pub(crate) use decode_first;

/// Parses the timestamp renderings produced by the dialects.
#[must_use]
pub fn parse_timestamp(value: &str) -> Option<NaiveDateTime> {
    let value = value.trim();
    ["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S", "%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M:%S%.f"]
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(value, format).ok())
}

/// Parses a `YYYY-MM-DD` date, tolerating a trailing time part.
#[must_use]
pub fn parse_date(value: &str) -> Option<NaiveDate> {
    let value = value.trim();
    let date_part = value.get(..10).unwrap_or(value);
    NaiveDate::parse_from_str(date_part, "%Y-%m-%d").ok()
}

fn non_blank(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

/// Maps a directory row. Rows without an id are dropped.
pub fn map_user<R: RawRow>(row: &R) -> Option<UserRecord> {
    let id = non_blank(row.text("user_id"))?;
    let username = non_blank(row.text("username")).unwrap_or_else(|| id.clone());
    Some(UserRecord::new(
        id,
        username,
        row.text("full_name").as_deref(),
        row.text("email"),
        row.text("employee_id"),
    ))
}

/// Maps a report row. Rows without a parseable check-in date are dropped.
pub fn map_attendance<R: RawRow>(row: &R) -> Option<AttendanceRow> {
    let user_id = non_blank(row.text("user_id"))?;
    let date = row.text("work_date").as_deref().and_then(parse_date)?;
    let username = non_blank(row.text("username")).unwrap_or_else(|| user_id.clone());
    let check_in = non_blank(row.text("check_in"));
    let check_out = non_blank(row.text("check_out"));
    let hours = AttendanceRow::hours_for(row.integer("worked_seconds"), check_out.as_deref());

    Some(AttendanceRow {
        full_name: display_name(row.text("full_name").as_deref(), &username),
        user_id,
        username,
        date,
        check_in,
        check_out,
        hours,
    })
}

/// Maps a presence row into a punch.
pub fn map_punch<R: RawRow>(row: &R) -> Option<Punch> {
    let user_id = non_blank(row.text("user_id"))?;
    let username = non_blank(row.text("username")).unwrap_or_else(|| user_id.clone());

    Some(Punch {
        full_name: display_name(row.text("full_name").as_deref(), &username),
        user_id,
        username,
        check_in: row.text("check_in_at").as_deref().and_then(parse_timestamp),
        check_out: row.text("check_out_at").as_deref().and_then(parse_timestamp),
        worked_seconds: row.integer("worked_seconds"),
    })
}
