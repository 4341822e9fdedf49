//! rollbook-core: domain types for the student-records data layer
//!
//! Everything here is pure and storage-agnostic: validated inputs, the
//! student id format, and the rule that picks the next id in a
//! (year, course) bucket. The `rollbook-db` crate supplies atomicity.

pub mod clock;
pub mod course;
pub mod error;
pub mod grade;
pub mod student;
pub mod student_id;

pub use clock::{Clock, FixedClock, SystemClock};
pub use course::CourseCode;
pub use error::{Result, ValidationError};
pub use grade::{GradeRecord, NewGrade};
pub use student::{NewStudent, StudentRecord, StudentUpdate};
pub use student_id::{IdBucket, StudentId, YearPrefix};
