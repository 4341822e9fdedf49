//! Grade records keyed by student id

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{required_text, Result, ValidationError};
use crate::student_id::StudentId;

/// Maximum length for subject names
pub const MAX_SUBJECT_LEN: usize = 64;

/// A stored grade
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GradeRecord {
    pub id: i64,
    pub student_id: StudentId,
    pub subject: String,
    pub score: f64,
    pub recorded_at: DateTime<Utc>,
}

/// Validated input for recording a grade
#[derive(Debug, Clone, PartialEq)]
pub struct NewGrade {
    student_id: StudentId,
    subject: String,
    score: f64,
}

impl NewGrade {
    pub fn new(student_id: StudentId, subject: &str, score: f64) -> Result<Self> {
        if !score.is_finite() || !(0.0..=100.0).contains(&score) {
            return Err(ValidationError::out_of_range("score", "0..=100", score));
        }

        Ok(Self {
            student_id,
            subject: required_text("subject", subject, MAX_SUBJECT_LEN)?,
            score,
        })
    }

    pub fn student_id(&self) -> &StudentId {
        &self.student_id
    }

    pub fn subject(&self) -> &str {
        &self.subject
    }

    pub fn score(&self) -> f64 {
        self.score
    }

    pub fn into_record(self, id: i64, recorded_at: DateTime<Utc>) -> GradeRecord {
        GradeRecord {
            id,
            student_id: self.student_id,
            subject: self.subject,
            score: self.score,
            recorded_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sid() -> StudentId {
        StudentId::parse("25BSIT-0001").unwrap()
    }

    #[test]
    fn score_bounds() {
        assert!(NewGrade::new(sid(), "Math", 0.0).is_ok());
        assert!(NewGrade::new(sid(), "Math", 100.0).is_ok());
        assert!(NewGrade::new(sid(), "Math", 100.5).is_err());
        assert!(NewGrade::new(sid(), "Math", f64::NAN).is_err());
    }

    #[test]
    fn subject_required() {
        let err = NewGrade::new(sid(), "  ", 90.0).unwrap_err();
        assert_eq!(err, ValidationError::empty("subject"));
    }
}
