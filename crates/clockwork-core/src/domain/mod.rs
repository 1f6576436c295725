//! Domain model shared by every engine adapter.

mod attendance;
mod presence;
mod requests;
mod user;

pub use attendance::*;
pub use presence::*;
pub use requests::*;
pub use user::*;

/// Rounds an hour value to two decimals.
#[must_use]
pub fn round_hours(hours: f64) -> f64 {
    (hours * 100.0).round() / 100.0
}

/// Converts a worked-seconds value into rounded hours. Negative spans count as zero.
#[must_use]
pub fn hours_from_seconds(seconds: i64) -> f64 {
    #[allow(clippy::cast_precision_loss)]
    let seconds = seconds.max(0) as f64;
    round_hours(seconds / 3600.0)
}
