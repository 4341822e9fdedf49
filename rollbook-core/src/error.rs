/// Validation errors for rollbook domain types.
///
/// Every constrained value (course codes, student ids, names, grades) is
/// checked when it is constructed. Invalid input returns a `ValidationError`,
/// never a panic, so storage code only ever sees well-formed values.

use thiserror::Error;

/// Reason a domain value was rejected at construction
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// Field is empty when it shouldn't be
    #[error("{field} cannot be empty")]
    Empty { field: &'static str },

    /// Field exceeds maximum length
    #[error("{field} exceeds maximum length of {max} characters")]
    TooLong { field: &'static str, max: usize },

    /// String doesn't match the required format
    #[error("{field}: {reason}")]
    InvalidFormat {
        field: &'static str,
        reason: &'static str,
    },

    /// Numeric value outside its allowed range
    #[error("{field} must be within {range}, got {value}")]
    OutOfRange {
        field: &'static str,
        range: &'static str,
        value: String,
    },
}

/// Result type alias for rollbook-core validation
pub type Result<T> = std::result::Result<T, ValidationError>;

impl ValidationError {
    /// Create an empty-field error
    pub fn empty(field: &'static str) -> Self {
        Self::Empty { field }
    }

    /// Create a too-long error
    pub fn too_long(field: &'static str, max: usize) -> Self {
        Self::TooLong { field, max }
    }

    /// Create an invalid format error
    pub fn invalid_format(field: &'static str, reason: &'static str) -> Self {
        Self::InvalidFormat { field, reason }
    }

    /// Create an out-of-range error
    pub fn out_of_range(field: &'static str, range: &'static str, value: impl ToString) -> Self {
        Self::OutOfRange {
            field,
            range,
            value: value.to_string(),
        }
    }
}

/// Trim `value` and enforce non-empty plus a maximum character count.
pub(crate) fn required_text(field: &'static str, value: &str, max: usize) -> Result<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(ValidationError::empty(field));
    }
    if trimmed.chars().count() > max {
        return Err(ValidationError::too_long(field, max));
    }
    Ok(trimmed.to_owned())
}
