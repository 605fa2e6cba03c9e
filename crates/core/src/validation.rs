//! Input validation helpers shared by the repositories.

use validator::{Validate, ValidationErrors};

use crate::error::CoreError;

/// Run `validator` rules on `input`, folding failures into [`CoreError::Validation`].
pub fn validate_input<T: Validate>(input: &T) -> Result<(), CoreError> {
    input.validate().map_err(|errors| CoreError::Validation(describe(&errors)))
}

/// Flatten field errors into `field: code` pairs, sorted for stable messages.
fn describe(errors: &ValidationErrors) -> String {
    let mut parts: Vec<String> = errors
        .field_errors()
        .iter()
        .flat_map(|(field, errs)| {
            errs.iter().map(move |e| format!("{field}: {}", e.code))
        })
        .collect();
    parts.sort();
    parts.join(", ")
}

/// Reject an empty or whitespace-only string.
pub fn require_non_blank(field: &str, value: &str) -> Result<(), CoreError> {
    if value.trim().is_empty() {
        Err(CoreError::Validation(format!("{field} must not be empty")))
    } else {
        Ok(())
    }
}
