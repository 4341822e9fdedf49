//! Course code validation
//!
//! Course codes are case-insensitive on input and stored uppercase, so
//! `bsit` and `BSIT` land in the same identifier bucket.

use std::fmt;
use std::str::FromStr;

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::error::{Result, ValidationError};

/// Maximum length for course codes
pub const MAX_COURSE_CODE_LEN: usize = 16;

/// Uppercase ASCII alphanumerics only. Keeps the code free of `LIKE`
/// wildcards and of the `-` separator used in student ids.
static COURSE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Z0-9]{1,16}$").expect("invalid course regex"));

/// Validated, normalized course code (e.g. `BSIT`)
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct CourseCode(String);

impl CourseCode {
    /// Create a course code, trimming and uppercasing the input.
    ///
    /// # Example
    /// ```
    /// use rollbook_core::CourseCode;
    ///
    /// assert_eq!(CourseCode::new(" bsit ").unwrap().as_str(), "BSIT");
    /// assert!(CourseCode::new("BS-IT").is_err());
    /// assert!(CourseCode::new("").is_err());
    /// ```
    pub fn new(s: &str) -> Result<Self> {
        let normalized = s.trim().to_ascii_uppercase();

        if normalized.is_empty() {
            return Err(ValidationError::empty("course"));
        }

        if normalized.len() > MAX_COURSE_CODE_LEN {
            return Err(ValidationError::too_long("course", MAX_COURSE_CODE_LEN));
        }

        if !COURSE_RE.is_match(&normalized) {
            return Err(ValidationError::invalid_format(
                "course",
                "must contain only ASCII letters and digits",
            ));
        }

        Ok(Self(normalized))
    }

    /// Get the course code as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Consume and return the inner string.
    pub fn into_string(self) -> String {
        self.0
    }
}

impl fmt::Display for CourseCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for CourseCode {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl FromStr for CourseCode {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self> {
        Self::new(s)
    }
}

impl TryFrom<String> for CourseCode {
    type Error = ValidationError;

    fn try_from(value: String) -> Result<Self> {
        Self::new(&value)
    }
}

impl From<CourseCode> for String {
    fn from(code: CourseCode) -> Self {
        code.0
    }
}
