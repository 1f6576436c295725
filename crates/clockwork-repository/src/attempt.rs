//! Query attempts and positional parameters.

use crate::dialect::SqlDialect;
use chrono::NaiveDate;

/// A positional query parameter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QueryParam {
    Text(String),
    Int(i64),
    Date(NaiveDate),
}

impl QueryParam {
    /// Binds a list of user ids with one type for the whole list.
    ///
    /// Integers when every id is numeric; otherwise every id binds as text,
    /// since some engines reject an `IN` list that mixes types.
    #[must_use]
    pub fn user_ids(ids: &[String]) -> Vec<Self> {
        let numeric: Option<Vec<i64>> = ids.iter().map(|id| id.parse::<i64>().ok()).collect();
        match numeric {
            Some(values) => values.into_iter().map(Self::Int).collect(),
            None => ids.iter().cloned().map(Self::Text).collect(),
        }
    }

    #[must_use]
    pub const fn is_text(&self) -> bool {
        matches!(self, Self::Text(_))
    }
}

/// One candidate query for a logical operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueryAttempt {
    /// Diagnostic name, reported on exhaustion.
    pub name: String,
    pub sql: String,
    pub params: Vec<QueryParam>,
}

impl QueryAttempt {
    #[must_use]
    pub fn new(name: impl Into<String>, sql: impl Into<String>, params: Vec<QueryParam>) -> Self {
        Self {
            name: name.into(),
            sql: sql.into(),
            params,
        }
    }
}

/// Collects parameters while handing out dialect placeholders.
///
/// A value used twice in a query is pushed twice: `?`-style dialects have no
/// way to refer back to an earlier parameter.
pub struct ParamList<'d> {
    dialect: &'d dyn SqlDialect,
    params: Vec<QueryParam>,
}

impl<'d> ParamList<'d> {
    #[must_use]
    pub fn new(dialect: &'d dyn SqlDialect) -> Self {
        Self {
            dialect,
            params: Vec::new(),
        }
    }

    /// Adds a parameter and returns its placeholder.
    pub fn push(&mut self, param: QueryParam) -> String {
        self.params.push(param);
        self.dialect.placeholder(self.params.len())
    }

    /// Comma-separated placeholders for a list of values.
    pub fn push_all(&mut self, params: impl IntoIterator<Item = QueryParam>) -> String {
        params
            .into_iter()
            .map(|param| self.push(param))
            .collect::<Vec<_>>()
            .join(", ")
    }

    #[must_use]
    pub fn into_params(self) -> Vec<QueryParam> {
        self.params
    }
}
