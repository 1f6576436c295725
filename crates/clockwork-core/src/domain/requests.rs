//! Operation inputs accepted by the attendance contract.

use crate::{ClockworkError, ClockworkResult, DateRangeRequest, ListWindow, ValidateExt};
use serde::{Deserialize, Serialize};
use validator::Validate;

/// Directory lookup request.
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct ListUsersRequest {
    /// Case-insensitive substring filter over username, full name, email and employee id.
    #[validate(length(max = 100, message = "search query must be at most 100 characters"))]
    pub query: Option<String>,
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

impl ListUsersRequest {
    /// Creates a filtered request.
    #[must_use]
    pub fn search(query: impl Into<String>, limit: i64, offset: i64) -> Self {
        Self {
            query: Some(query.into()),
            limit: Some(limit),
            offset: Some(offset),
        }
    }

    /// Trimmed filter; blank filters count as no filter.
    #[must_use]
    pub fn filter(&self) -> Option<&str> {
        self.query
            .as_deref()
            .map(str::trim)
            .filter(|q| !q.is_empty())
    }

    /// Clamped pagination window.
    #[must_use]
    pub fn window(&self) -> ListWindow {
        ListWindow::clamped(self.limit, self.offset)
    }

    /// Validates the request.
    pub fn validated(&self) -> ClockworkResult<()> {
        self.validate_request()
    }
}

/// Historical report request.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportRequest {
    pub user_ids: Vec<String>,
    pub date_range: DateRangeRequest,
}

impl ReportRequest {
    #[must_use]
    pub fn new(user_ids: Vec<String>, date_range: DateRangeRequest) -> Self {
        Self { user_ids, date_range }
    }

    /// Distinct, trimmed, non-empty ids in request order.
    #[must_use]
    pub fn normalized_user_ids(&self) -> Vec<String> {
        let mut seen = std::collections::HashSet::new();
        self.user_ids
            .iter()
            .map(|id| id.trim())
            .filter(|id| !id.is_empty())
            .filter(|id| seen.insert(id.to_string()))
            .map(str::to_string)
            .collect()
    }
}

/// Parses an ISO `YYYY-MM-DD` date, reporting a validation error otherwise.
pub fn parse_iso_date(field: &str, value: &str) -> ClockworkResult<chrono::NaiveDate> {
    chrono::NaiveDate::parse_from_str(value.trim(), "%Y-%m-%d").map_err(|_| {
        ClockworkError::validation(format!("{field} must be a date in YYYY-MM-DD format, got '{value}'"))
    })
}
