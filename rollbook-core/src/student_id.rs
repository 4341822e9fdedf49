//! Student identifiers and the bucket-based assignment rule
//!
//! A student id looks like `25BSIT-0007`: two-digit calendar year, uppercase
//! course code, a `-` separator, and a sequence number zero-padded to four
//! digits. Ids sharing year and course form a bucket; the next id in a
//! bucket is the highest existing sequence plus one (not the count plus
//! one, so gaps left by deletions are never refilled).
//!
//! Sequences past 9999 widen to five or more digits. Ordering is always
//! numeric on the parsed sequence, so a widened suffix still counts as the
//! highest in its bucket.

use std::fmt;
use std::str::FromStr;

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::clock::Clock;
use crate::course::CourseCode;
use crate::error::{Result, ValidationError};

/// Minimum width of the zero-padded sequence suffix
pub const SEQUENCE_WIDTH: usize = 4;

/// Separator between bucket prefix and sequence
pub const SEPARATOR: char = '-';

static STUDENT_ID_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(\d{2})([A-Z0-9]{1,16})-(\d{4,})$").expect("invalid student id regex")
});

/// Last two digits of a calendar year
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct YearPrefix(u8);

impl YearPrefix {
    /// Derive the prefix from a full calendar year (`2025` -> `25`).
    pub fn from_year(year: i32) -> Self {
        // rem_euclid keeps the value in 0..100 even for negative years
        Self(year.rem_euclid(100) as u8)
    }

    /// Prefix for the clock's current year.
    pub fn current(clock: &dyn Clock) -> Self {
        Self::from_year(clock.current_year())
    }

    pub fn value(self) -> u8 {
        self.0
    }
}

impl fmt::Display for YearPrefix {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:02}", self.0)
    }
}

/// A (year, course) group of student ids that share one sequence
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct IdBucket {
    year: YearPrefix,
    course: CourseCode,
}

impl IdBucket {
    pub fn new(year: YearPrefix, course: CourseCode) -> Self {
        Self { year, course }
    }

    /// Bucket for `course` in the clock's current year.
    pub fn current(clock: &dyn Clock, course: CourseCode) -> Self {
        Self::new(YearPrefix::current(clock), course)
    }

    pub fn year(&self) -> YearPrefix {
        self.year
    }

    pub fn course(&self) -> &CourseCode {
        &self.course
    }

    /// Everything before the sequence digits, separator included (`25BSIT-`).
    pub fn prefix(&self) -> String {
        format!("{}{}{}", self.year, self.course, SEPARATOR)
    }

    /// SQL `LIKE` pattern matching every id in this bucket.
    ///
    /// Safe to bind without escaping: course codes cannot contain `%` or `_`.
    pub fn like_pattern(&self) -> String {
        format!("{}%", self.prefix())
    }

    /// Build the id with the given sequence number in this bucket.
    pub fn id_for(&self, sequence: u32) -> StudentId {
        StudentId {
            year: self.year,
            course: self.course.clone(),
            sequence,
        }
    }

    /// The id that follows `last_sequence` (0 means the bucket is empty).
    pub fn next_after(&self, last_sequence: u32) -> Result<StudentId> {
        let next = last_sequence
            .checked_add(1)
            .ok_or_else(|| ValidationError::out_of_range("student id sequence", "1..=4294967295", "overflow"))?;
        Ok(self.id_for(next))
    }

    /// Whether `id` belongs to this bucket.
    pub fn contains(&self, id: &StudentId) -> bool {
        id.year == self.year && id.course == self.course
    }

    /// Highest sequence among `ids` that belong to this bucket, or 0.
    ///
    /// Values that are not well-formed student ids are ignored.
    pub fn last_sequence<'a, I>(&self, ids: I) -> u32
    where
        I: IntoIterator<Item = &'a str>,
    {
        ids.into_iter()
            .filter_map(|raw| StudentId::parse(raw).ok())
            .filter(|id| self.contains(id))
            .map(|id| id.sequence)
            .max()
            .unwrap_or(0)
    }

    /// Same as [`last_sequence`](Self::last_sequence) over already-parsed ids.
    pub fn last_sequence_in<'a, I>(&self, ids: I) -> u32
    where
        I: IntoIterator<Item = &'a StudentId>,
    {
        ids.into_iter()
            .filter(|id| self.contains(id))
            .map(|id| id.sequence)
            .max()
            .unwrap_or(0)
    }

    /// Next id given the ids currently stored (max sequence + 1).
    pub fn next_id<'a, I>(&self, existing: I) -> Result<StudentId>
    where
        I: IntoIterator<Item = &'a str>,
    {
        self.next_after(self.last_sequence(existing))
    }
}

impl fmt::Display for IdBucket {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.year, self.course)
    }
}

/// Business identifier of a student (`<YY><COURSE>-<NNNN>`)
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct StudentId {
    year: YearPrefix,
    course: CourseCode,
    sequence: u32,
}

impl StudentId {
    /// Parse a canonical student id.
    ///
    /// The suffix must be zero-padded to exactly four digits, or be wider
    /// without leading zeros once it passes 9999.
    ///
    /// # Example
    /// ```
    /// use rollbook_core::StudentId;
    ///
    /// let id = StudentId::parse("25BSIT-0042").unwrap();
    /// assert_eq!(id.sequence(), 42);
    /// assert_eq!(id.course().as_str(), "BSIT");
    /// assert!(StudentId::parse("25bsit-0042").is_err());
    /// assert!(StudentId::parse("25BSIT-42").is_err());
    /// ```
    pub fn parse(s: &str) -> Result<Self> {
        let caps = STUDENT_ID_RE.captures(s).ok_or_else(|| {
            ValidationError::invalid_format(
                "student id",
                "expected <YY><COURSE>-<NNNN>, e.g. 25BSIT-0001",
            )
        })?;

        let year: u8 = caps[1]
            .parse()
            .map_err(|_| ValidationError::invalid_format("student id", "invalid year prefix"))?;
        let course = CourseCode::new(&caps[2])?;
        let digits = &caps[3];
        let sequence: u32 = digits.parse().map_err(|_| {
            ValidationError::out_of_range("student id sequence", "1..=4294967295", digits)
        })?;

        if sequence == 0 {
            return Err(ValidationError::out_of_range(
                "student id sequence",
                "1..=4294967295",
                digits,
            ));
        }

        if format!("{:0width$}", sequence, width = SEQUENCE_WIDTH) != digits {
            return Err(ValidationError::invalid_format(
                "student id",
                "sequence must be zero-padded to four digits",
            ));
        }

        Ok(Self {
            year: YearPrefix(year),
            course,
            sequence,
        })
    }

    pub fn year(&self) -> YearPrefix {
        self.year
    }

    pub fn course(&self) -> &CourseCode {
        &self.course
    }

    pub fn sequence(&self) -> u32 {
        self.sequence
    }

    pub fn bucket(&self) -> IdBucket {
        IdBucket::new(self.year, self.course.clone())
    }
}

impl fmt::Display for StudentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}{}{}{:0width$}",
            self.year,
            self.course,
            SEPARATOR,
            self.sequence,
            width = SEQUENCE_WIDTH
        )
    }
}

impl FromStr for StudentId {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl TryFrom<String> for StudentId {
    type Error = ValidationError;

    fn try_from(value: String) -> Result<Self> {
        Self::parse(&value)
    }
}

impl From<StudentId> for String {
    fn from(id: StudentId) -> Self {
        id.to_string()
    }
}
