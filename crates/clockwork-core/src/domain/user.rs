//! Directory entries.

use serde::{Deserialize, Serialize};

/// A user as returned by a directory lookup.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserRecord {
    /// Normalized id. Numeric ids are rendered in decimal, legacy ids verbatim.
    pub id: String,
    /// Login name.
    pub username: String,
    /// Display name; falls back to the username.
    pub full_name: String,
    /// Work email, when the schema exposes one.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    /// HR employee id, when the schema exposes one.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub employee_id: Option<String>,
}

impl UserRecord {
    /// Builds a record, deriving the display name from the raw concatenation.
    #[must_use]
    pub fn new(
        id: impl Into<String>,
        username: impl Into<String>,
        raw_full_name: Option<&str>,
        email: Option<String>,
        employee_id: Option<String>,
    ) -> Self {
        let username = username.into();
        Self {
            id: id.into(),
            full_name: display_name(raw_full_name, &username),
            username,
            email: non_blank(email),
            employee_id: non_blank(employee_id),
        }
    }
}

/// Collapses whitespace in a concatenated name and falls back to the username.
#[must_use]
pub fn display_name(raw: Option<&str>, username: &str) -> String {
    let collapsed = raw
        .map(|name| name.split_whitespace().collect::<Vec<_>>().join(" "))
        .unwrap_or_default();
    if collapsed.is_empty() {
        username.trim().to_string()
    } else {
        collapsed
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}
