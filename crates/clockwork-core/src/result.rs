//! Result type aliases for Clockwork.

use crate::ClockworkError;

/// A specialized `Result` type for Clockwork operations.
pub type ClockworkResult<T> = Result<T, ClockworkError>;
