//! Unified error types for the attendance data-access layer.

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Broad error categories that callers can branch on.
///
/// The transport layer translates these into wire statuses; this crate only
/// guarantees that each failure lands in exactly one category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCategory {
    /// Malformed input. Never retried.
    Validation,
    /// No connection has been configured yet.
    NotConfigured,
    /// Refused connection, bad credentials, missing database, timeout.
    Connectivity,
    /// Every schema variant was tried and none matched.
    Exhaustion,
    /// Configuration or internal failure.
    Internal,
}

impl fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Validation => write!(f, "validation"),
            Self::NotConfigured => write!(f, "not_configured"),
            Self::Connectivity => write!(f, "connectivity"),
            Self::Exhaustion => write!(f, "exhaustion"),
            Self::Internal => write!(f, "internal"),
        }
    }
}

/// Unified error type for Clockwork.
#[derive(Error, Debug)]
pub enum ClockworkError {
    // ============ Validation Errors ============
    /// Malformed descriptor, date range or request.
    #[error("Validation error: {0}")]
    Validation(String),

    /// An operation ran before any connection was configured.
    #[error("Database connection is not configured")]
    NotConfigured,

    // ============ Connectivity Errors ============
    /// The server actively refused the connection.
    #[error("Connection refused: {0}")]
    ConnectionRefused(String),

    /// The server rejected the supplied credentials.
    #[error("Invalid credentials: {0}")]
    InvalidCredentials(String),

    /// The database (or database file) does not exist.
    #[error("Unknown database: {0}")]
    UnknownDatabase(String),

    /// Connecting or acquiring a connection timed out.
    #[error("Operation timed out: {0}")]
    Timeout(String),

    /// Any other failure while establishing a connection.
    #[error("Connection error: {0}")]
    Connection(String),

    /// A non-schema failure while executing a query.
    #[error("Database error: {0}")]
    Database(String),

    // ============ Exhaustion ============
    /// Every schema variant for an operation failed with a schema mismatch.
    #[error("No supported schema found for {operation}. Tried: {attempts}")]
    UnsupportedSchema { operation: String, attempts: String },

    // ============ Internal Errors ============
    /// Configuration error
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Internal error
    #[error("Internal error: {0}")]
    Internal(String),

    /// Generic error wrapper
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl ClockworkError {
    /// Returns a machine-readable error code.
    #[must_use]
    pub const fn error_code(&self) -> &'static str {
        match self {
            Self::Validation(_) => "VALIDATION_ERROR",
            Self::NotConfigured => "NOT_CONFIGURED",
            Self::ConnectionRefused(_) => "CONNECTION_REFUSED",
            Self::InvalidCredentials(_) => "INVALID_CREDENTIALS",
            Self::UnknownDatabase(_) => "UNKNOWN_DATABASE",
            Self::Timeout(_) => "TIMEOUT",
            Self::Connection(_) => "CONNECTION_ERROR",
            Self::Database(_) => "DATABASE_ERROR",
            Self::UnsupportedSchema { .. } => "UNSUPPORTED_SCHEMA",
            Self::Configuration(_) => "CONFIGURATION_ERROR",
            Self::Internal(_) | Self::Other(_) => "INTERNAL_ERROR",
        }
    }

    /// Returns the category this error belongs to.
    #[must_use]
    pub const fn category(&self) -> ErrorCategory {
        match self {
            Self::Validation(_) => ErrorCategory::Validation,
            Self::NotConfigured => ErrorCategory::NotConfigured,
            Self::ConnectionRefused(_)
            | Self::InvalidCredentials(_)
            | Self::UnknownDatabase(_)
            | Self::Timeout(_)
            | Self::Connection(_)
            | Self::Database(_) => ErrorCategory::Connectivity,
            Self::UnsupportedSchema { .. } => ErrorCategory::Exhaustion,
            Self::Configuration(_) | Self::Internal(_) | Self::Other(_) => ErrorCategory::Internal,
        }
    }

    /// Creates a validation error.
    #[must_use]
    pub fn validation<T: Into<String>>(message: T) -> Self {
        Self::Validation(message.into())
    }

    /// Creates a fatal database error.
    #[must_use]
    pub fn database<T: Into<String>>(message: T) -> Self {
        Self::Database(message.into())
    }

    /// Creates an internal error.
    #[must_use]
    pub fn internal<T: Into<String>>(message: T) -> Self {
        Self::Internal(message.into())
    }

    /// Checks if this error is the "no supported schema" exhaustion form.
    #[must_use]
    pub const fn is_unsupported_schema(&self) -> bool {
        matches!(self, Self::UnsupportedSchema { .. })
    }
}

#[cfg(feature = "sqlx")]
impl From<sqlx::Error> for ClockworkError {
    fn from(err: sqlx::Error) -> Self {
        match &err {
            sqlx::Error::PoolTimedOut => Self::Timeout(err.to_string()),
            sqlx::Error::Io(io) if io.kind() == std::io::ErrorKind::ConnectionRefused => {
                Self::ConnectionRefused(io.to_string())
            }
            sqlx::Error::Io(io) if io.kind() == std::io::ErrorKind::TimedOut => {
                Self::Timeout(io.to_string())
            }
            sqlx::Error::Io(_) | sqlx::Error::Tls(_) | sqlx::Error::PoolClosed => {
                Self::Connection(err.to_string())
            }
            sqlx::Error::Configuration(_) => Self::Configuration(err.to_string()),
            _ => Self::Database(err.to_string()),
        }
    }
}

impl From<serde_json::Error> for ClockworkError {
    fn from(err: serde_json::Error) -> Self {
        Self::Internal(format!("JSON serialization error: {}", err))
    }
}

/// Serializable error body handed to whatever transport sits on top.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    /// Machine-readable error code
    pub code: String,
    /// Error category
    pub category: ErrorCategory,
    /// Human-readable error message
    pub message: String,
}

impl ErrorResponse {
    /// Creates a new error response from a `ClockworkError`.
    #[must_use]
    pub fn from_error(error: &ClockworkError) -> Self {
        Self {
            code: error.error_code().to_string(),
            category: error.category(),
            message: error.to_string(),
        }
    }
}

impl From<&ClockworkError> for ErrorResponse {
    fn from(error: &ClockworkError) -> Self {
        Self::from_error(error)
    }
}
