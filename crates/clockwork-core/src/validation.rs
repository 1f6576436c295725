//! Validation utilities.

use crate::ClockworkError;
use validator::{Validate, ValidationErrors};

/// Extension trait for validation.
pub trait ValidateExt: Validate {
    /// Validates the struct and returns a `ClockworkError` on failure.
    fn validate_request(&self) -> Result<(), ClockworkError> {
        self.validate().map_err(validation_errors_to_clockwork_error)
    }
}

impl<T: Validate> ValidateExt for T {}

/// Converts `validator::ValidationErrors` to `ClockworkError`.
#[must_use]
pub fn validation_errors_to_clockwork_error(errors: ValidationErrors) -> ClockworkError {
    let mut messages: Vec<String> = errors
        .field_errors()
        .iter()
        .flat_map(|(field, errors)| {
            errors.iter().map(move |error| {
                let message = error
                    .message
                    .as_ref()
                    .map_or_else(|| error.code.to_string(), ToString::to_string);
                if *field == "__all__" {
                    message
                } else {
                    format!("{field}: {message}")
                }
            })
        })
        .collect();
    messages.sort();

    ClockworkError::Validation(messages.join("; "))
}
