//! Storage traits
//!
//! Callers depend on these traits so they can run against Postgres
//! ([`StudentRepo`](crate::StudentRepo), [`GradeRepo`](crate::GradeRepo)) or
//! the in-memory [`MemoryStore`](crate::MemoryStore).

use async_trait::async_trait;
use rollbook_core::{
    CourseCode, GradeRecord, NewGrade, NewStudent, StudentId, StudentRecord, StudentUpdate,
};

use crate::error::DbResult;

/// Student CRUD plus id assignment
#[async_trait]
pub trait StudentStore: Send + Sync {
    /// Look a student up by business id. Absence is `Ok(None)`.
    async fn find_by_student_id(&self, student_id: &StudentId) -> DbResult<Option<StudentRecord>>;

    /// Look a student up by surrogate key. Absence is `Ok(None)`.
    async fn get(&self, id: i64) -> DbResult<Option<StudentRecord>>;

    /// Every student, ordered by surrogate key.
    async fn get_all(&self) -> DbResult<Vec<StudentRecord>>;

    /// Insert a student under the next id of its (current year, course)
    /// bucket. Assignment and insert are one atomic step: concurrent
    /// creates in the same bucket never share an id.
    async fn create(&self, student: NewStudent) -> DbResult<StudentRecord>;

    /// Replace a student's fields.
    ///
    /// A course change assigns a fresh id in the new bucket, and grades
    /// referencing the old id move with it in the same atomic step. Without a
    /// course change the id is kept; a different supplied id fails with
    /// `Validation`. Fails with `NotFound` for an unknown `id`.
    async fn update(&self, id: i64, update: StudentUpdate) -> DbResult<StudentRecord>;

    /// Remove a student. Unknown ids are not an error. Grades are kept, and
    /// their id stays reserved in its bucket.
    async fn delete(&self, id: i64) -> DbResult<()>;

    /// The id the next create for `course` would receive right now.
    /// Nothing is reserved.
    async fn next_student_id(&self, course: &CourseCode) -> DbResult<StudentId>;
}

/// Grades referencing students by business id
#[async_trait]
pub trait GradeStore: Send + Sync {
    /// Record a grade for an existing student (`NotFound` otherwise).
    async fn record_grade(&self, grade: NewGrade) -> DbResult<GradeRecord>;

    /// Grades for `student_id`, oldest first.
    async fn grades_for(&self, student_id: &StudentId) -> DbResult<Vec<GradeRecord>>;
}
