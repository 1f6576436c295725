//! Pagination window for directory listings.

use serde::{Deserialize, Serialize};

/// A clamped limit/offset pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ListWindow {
    pub limit: u32,
    pub offset: u32,
}

impl ListWindow {
    /// Default number of users per listing.
    pub const DEFAULT_LIMIT: u32 = 50;
    /// Largest accepted limit.
    pub const MAX_LIMIT: u32 = 500;
    /// Largest accepted offset.
    pub const MAX_OFFSET: u32 = 100_000;

    /// Clamps raw values: limit into `[1, 500]`, offset into `[0, 100000]`.
    #[must_use]
    pub fn clamped(limit: Option<i64>, offset: Option<i64>) -> Self {
        let limit = limit.map_or(Self::DEFAULT_LIMIT, |l| {
            u32::try_from(l.clamp(1, i64::from(Self::MAX_LIMIT))).unwrap_or(Self::DEFAULT_LIMIT)
        });
        let offset = offset.map_or(0, |o| {
            u32::try_from(o.clamp(0, i64::from(Self::MAX_OFFSET))).unwrap_or(0)
        });
        Self { limit, offset }
    }
}

impl Default for ListWindow {
    fn default() -> Self {
        Self::clamped(None, None)
    }
}
