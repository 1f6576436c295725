//! Solar Hijri (Jalali) calendar conversion.
//!
//! Uses the 33-year break table of the astronomical calendar, valid for solar
//! years -61 through 3177.

use chrono::{Datelike, Duration, NaiveDate};
use std::fmt;

const BREAKS: [i32; 20] = [
    -61, 9, 38, 199, 426, 686, 756, 818, 1111, 1181, 1210, 1635, 2060, 2097, 2192, 2262, 2324,
    2394, 2456, 3178,
];

/// A date on the solar calendar.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SolarDate {
    pub year: i32,
    pub month: u32,
    pub day: u32,
}

struct YearInfo {
    /// Years elapsed since the last leap year (0 means this year is leap).
    since_leap: i32,
    gregorian_year: i32,
    /// Day in March on which the solar year starts.
    march_day: i32,
}

fn year_info(year: i32) -> Option<YearInfo> {
    if year < BREAKS[0] || year >= BREAKS[BREAKS.len() - 1] {
        return None;
    }

    let gregorian_year = year + 621;
    let mut leap_j = -14;
    let mut jp = BREAKS[0];
    let mut jump = 0;
    for &jm in &BREAKS[1..] {
        jump = jm - jp;
        if year < jm {
            break;
        }
        leap_j += jump / 33 * 8 + (jump % 33) / 4;
        jp = jm;
    }

    let mut n = year - jp;
    leap_j += n / 33 * 8 + (n % 33 + 3) / 4;
    if jump % 33 == 4 && jump - n == 4 {
        leap_j += 1;
    }

    let leap_g = gregorian_year / 4 - (gregorian_year / 100 + 1) * 3 / 4 - 150;
    let march_day = 20 + leap_j - leap_g;

    if jump - n < 6 {
        n = n - jump + (jump + 4) / 33 * 33;
    }
    let mut since_leap = ((n + 1) % 33 - 1) % 4;
    if since_leap == -1 {
        since_leap = 4;
    }

    Some(YearInfo {
        since_leap,
        gregorian_year,
        march_day,
    })
}

impl SolarDate {
    /// Creates a solar date, checking month and day bounds.
    #[must_use]
    pub fn new(year: i32, month: u32, day: u32) -> Option<Self> {
        if !(1..=12).contains(&month) || day == 0 || day > Self::days_in_month(year, month)? {
            return None;
        }
        Some(Self { year, month, day })
    }

    /// Whether `year` has a 30-day Esfand.
    #[must_use]
    pub fn is_leap_year(year: i32) -> Option<bool> {
        year_info(year).map(|info| info.since_leap == 0)
    }

    /// Length of a solar month.
    #[must_use]
    pub fn days_in_month(year: i32, month: u32) -> Option<u32> {
        match month {
            1..=6 => Some(31),
            7..=11 => Some(30),
            12 => Self::is_leap_year(year).map(|leap| if leap { 30 } else { 29 }),
            _ => None,
        }
    }

    /// Converts a Gregorian date.
    #[must_use]
    pub fn from_gregorian(date: NaiveDate) -> Option<Self> {
        let gregorian_year = date.year();
        let mut year = gregorian_year - 621;
        let info = year_info(year)?;
        let nowruz = NaiveDate::from_ymd_opt(gregorian_year, 3, u32::try_from(info.march_day).ok()?)?;

        let mut k = i32::try_from((date - nowruz).num_days()).ok()?;
        if k >= 0 {
            if k <= 185 {
                return Some(Self {
                    year,
                    month: u32::try_from(1 + k / 31).ok()?,
                    day: u32::try_from(k % 31 + 1).ok()?,
                });
            }
            k -= 186;
        } else {
            year -= 1;
            k += 179;
            if info.since_leap == 1 {
                k += 1;
            }
        }

        Some(Self {
            year,
            month: u32::try_from(7 + k / 30).ok()?,
            day: u32::try_from(k % 30 + 1).ok()?,
        })
    }

    /// Converts back to a Gregorian date.
    #[must_use]
    pub fn to_gregorian(&self) -> Option<NaiveDate> {
        let info = year_info(self.year)?;
        let nowruz = NaiveDate::from_ymd_opt(
            info.gregorian_year,
            3,
            u32::try_from(info.march_day).ok()?,
        )?;
        let month = i64::from(self.month);
        let offset = (month - 1) * 31 - (month / 7) * (month - 7) + i64::from(self.day) - 1;
        nowruz.checked_add_signed(Duration::days(offset))
    }

    /// The same day number one month earlier.
    #[must_use]
    pub fn previous_month(&self, day: u32) -> Option<Self> {
        if self.month == 1 {
            Self::new(self.year - 1, 12, day)
        } else {
            Self::new(self.year, self.month - 1, day)
        }
    }

    /// The same day number one month later.
    #[must_use]
    pub fn next_month(&self, day: u32) -> Option<Self> {
        if self.month == 12 {
            Self::new(self.year + 1, 1, day)
        } else {
            Self::new(self.year, self.month + 1, day)
        }
    }

    /// Replaces the day of month.
    #[must_use]
    pub fn with_day(&self, day: u32) -> Option<Self> {
        Self::new(self.year, self.month, day)
    }
}

impl fmt::Display for SolarDate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04}/{:02}/{:02}", self.year, self.month, self.day)
    }
}
