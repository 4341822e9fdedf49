//! Student records and validated inputs for create/update

use serde::{Deserialize, Serialize};

use crate::course::CourseCode;
use crate::error::{required_text, Result, ValidationError};
use crate::student_id::StudentId;

/// Maximum length for student names
pub const MAX_NAME_LEN: usize = 128;

/// Maximum length for section labels
pub const MAX_SECTION_LEN: usize = 32;

/// Allowed year levels
pub const YEAR_LEVELS: std::ops::RangeInclusive<i32> = 1..=12;

/// A stored student
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StudentRecord {
    /// Surrogate key assigned by storage
    pub id: i64,
    pub student_id: StudentId,
    pub name: String,
    pub course: CourseCode,
    /// Year level (1st year, 2nd year, ...), not the calendar year
    pub year: i32,
    pub section: String,
}

/// Validated input for creating a student. The student id is assigned by
/// the store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewStudent {
    name: String,
    course: CourseCode,
    year: i32,
    section: String,
}

impl NewStudent {
    pub fn new(name: &str, course: &str, year: i32, section: &str) -> Result<Self> {
        Ok(Self {
            name: required_text("name", name, MAX_NAME_LEN)?,
            course: CourseCode::new(course)?,
            year: validate_year(year)?,
            section: required_text("section", section, MAX_SECTION_LEN)?,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn course(&self) -> &CourseCode {
        &self.course
    }

    pub fn year(&self) -> i32 {
        self.year
    }

    pub fn section(&self) -> &str {
        &self.section
    }

    /// Materialize the record once storage has assigned both keys.
    pub fn into_record(self, id: i64, student_id: StudentId) -> StudentRecord {
        StudentRecord {
            id,
            student_id,
            name: self.name,
            course: self.course,
            year: self.year,
            section: self.section,
        }
    }
}

/// Validated full replacement of a student's mutable fields.
///
/// `student_id` is kept as given unless `course` differs from the stored
/// course, in which case the store assigns a fresh id in the new bucket.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StudentUpdate {
    student_id: StudentId,
    name: String,
    course: CourseCode,
    year: i32,
    section: String,
}

impl StudentUpdate {
    pub fn new(
        student_id: StudentId,
        name: &str,
        course: &str,
        year: i32,
        section: &str,
    ) -> Result<Self> {
        Ok(Self {
            student_id,
            name: required_text("name", name, MAX_NAME_LEN)?,
            course: CourseCode::new(course)?,
            year: validate_year(year)?,
            section: required_text("section", section, MAX_SECTION_LEN)?,
        })
    }

    /// Update that keeps the current id, replacing the descriptive fields.
    pub fn from_record(current: &StudentRecord) -> Self {
        Self {
            student_id: current.student_id.clone(),
            name: current.name.clone(),
            course: current.course.clone(),
            year: current.year,
            section: current.section.clone(),
        }
    }

    pub fn student_id(&self) -> &StudentId {
        &self.student_id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn course(&self) -> &CourseCode {
        &self.course
    }

    pub fn year(&self) -> i32 {
        self.year
    }

    pub fn section(&self) -> &str {
        &self.section
    }

    /// Whether applying this update to `current` moves the student to a
    /// different course bucket.
    pub fn changes_course(&self, current: &StudentRecord) -> bool {
        self.course != current.course
    }

    /// The id to keep when the course is unchanged.
    ///
    /// Student ids only move with the course, so a differing id here is
    /// rejected rather than written.
    pub fn kept_student_id(&self, current: &StudentRecord) -> Result<StudentId> {
        if self.student_id != current.student_id {
            return Err(ValidationError::invalid_format(
                "student id",
                "can only change together with the course",
            ));
        }
        Ok(current.student_id.clone())
    }

    /// Builder-style course change.
    pub fn with_course(mut self, course: &str) -> Result<Self> {
        self.course = CourseCode::new(course)?;
        Ok(self)
    }

    /// Builder-style name change.
    pub fn with_name(mut self, name: &str) -> Result<Self> {
        self.name = required_text("name", name, MAX_NAME_LEN)?;
        Ok(self)
    }

    /// Builder-style section change.
    pub fn with_section(mut self, section: &str) -> Result<Self> {
        self.section = required_text("section", section, MAX_SECTION_LEN)?;
        Ok(self)
    }

    /// Builder-style year level change.
    pub fn with_year(mut self, year: i32) -> Result<Self> {
        self.year = validate_year(year)?;
        Ok(self)
    }

    /// Materialize the updated record under the id the store settled on.
    pub fn apply(self, id: i64, student_id: StudentId) -> StudentRecord {
        StudentRecord {
            id,
            student_id,
            name: self.name,
            course: self.course,
            year: self.year,
            section: self.section,
        }
    }
}

fn validate_year(year: i32) -> Result<i32> {
    if YEAR_LEVELS.contains(&year) {
        Ok(year)
    } else {
        Err(ValidationError::out_of_range("year", "1..=12", year))
    }
}
