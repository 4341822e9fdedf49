//! In-memory student and grade store
//!
//! Same contract as the Postgres repositories, backed by maps behind one
//! async mutex. Holding the lock across read-assign-insert is what makes id
//! assignment atomic here.

use std::collections::BTreeMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use rollbook_core::{
    Clock, CourseCode, GradeRecord, IdBucket, NewGrade, NewStudent, StudentId, StudentRecord,
    StudentUpdate, SystemClock,
};
use tokio::sync::Mutex;
use tracing::debug;

use crate::error::{DbError, DbResult};
use crate::store::{GradeStore, StudentStore};

#[derive(Default)]
struct State {
    last_student_key: i64,
    students: BTreeMap<i64, StudentRecord>,
    last_grade_key: i64,
    grades: Vec<GradeRecord>,
}

impl State {
    /// Next id in `bucket`. Ids still referenced by retained grades count
    /// as used.
    fn next_in(&self, bucket: &IdBucket) -> DbResult<StudentId> {
        let used = self
            .students
            .values()
            .map(|s| &s.student_id)
            .chain(self.grades.iter().map(|g| &g.student_id));
        let last = bucket.last_sequence_in(used);
        Ok(bucket.next_after(last)?)
    }

    fn is_taken(&self, student_id: &StudentId) -> bool {
        self.students.values().any(|s| &s.student_id == student_id)
    }
}

/// In-memory store for tests and local tooling
pub struct MemoryStore {
    state: Mutex<State>,
    clock: Arc<dyn Clock>,
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::with_clock(Arc::new(SystemClock))
    }

    pub fn with_clock(clock: Arc<dyn Clock>) -> Self {
        Self {
            state: Mutex::new(State::default()),
            clock,
        }
    }

    /// Insert a record with a caller-chosen student id, bypassing
    /// assignment. Lets tests seed gaps and legacy buckets.
    pub async fn insert_with_id(
        &self,
        student: NewStudent,
        student_id: StudentId,
    ) -> DbResult<StudentRecord> {
        let mut state = self.state.lock().await;
        if state.is_taken(&student_id) {
            return Err(DbError::IdentifierConflict {
                student_id: student_id.to_string(),
            });
        }
        state.last_student_key += 1;
        let record = student.into_record(state.last_student_key, student_id);
        state.students.insert(record.id, record.clone());
        Ok(record)
    }

    fn bucket_for(&self, course: &CourseCode) -> IdBucket {
        IdBucket::current(self.clock.as_ref(), course.clone())
    }
}

#[async_trait]
impl StudentStore for MemoryStore {
    async fn find_by_student_id(&self, student_id: &StudentId) -> DbResult<Option<StudentRecord>> {
        let state = self.state.lock().await;
        Ok(state
            .students
            .values()
            .find(|s| &s.student_id == student_id)
            .cloned())
    }

    async fn get(&self, id: i64) -> DbResult<Option<StudentRecord>> {
        Ok(self.state.lock().await.students.get(&id).cloned())
    }

    async fn get_all(&self) -> DbResult<Vec<StudentRecord>> {
        Ok(self.state.lock().await.students.values().cloned().collect())
    }

    async fn create(&self, student: NewStudent) -> DbResult<StudentRecord> {
        let bucket = self.bucket_for(student.course());
        let mut state = self.state.lock().await;

        let student_id = state.next_in(&bucket)?;
        state.last_student_key += 1;
        let record = student.into_record(state.last_student_key, student_id);
        state.students.insert(record.id, record.clone());

        debug!(student_id = %record.student_id, id = record.id, "student created");
        Ok(record)
    }

    async fn update(&self, id: i64, update: StudentUpdate) -> DbResult<StudentRecord> {
        let mut state = self.state.lock().await;
        let current = state
            .students
            .get(&id)
            .cloned()
            .ok_or_else(|| DbError::not_found("student", id))?;

        let new_id = if update.changes_course(&current) {
            state.next_in(&self.bucket_for(update.course()))?
        } else {
            update.kept_student_id(&current)?
        };

        if new_id != current.student_id {
            let mut moved = 0usize;
            for grade in state
                .grades
                .iter_mut()
                .filter(|g| g.student_id == current.student_id)
            {
                grade.student_id = new_id.clone();
                moved += 1;
            }
            debug!(from = %current.student_id, to = %new_id, grades = moved, "student id reassigned");
        }

        let record = update.apply(id, new_id);
        state.students.insert(id, record.clone());
        Ok(record)
    }

    async fn delete(&self, id: i64) -> DbResult<()> {
        let removed = self.state.lock().await.students.remove(&id);
        debug!(id, rows = u64::from(removed.is_some()), "student deleted");
        Ok(())
    }

    async fn next_student_id(&self, course: &CourseCode) -> DbResult<StudentId> {
        let bucket = self.bucket_for(course);
        self.state.lock().await.next_in(&bucket)
    }
}

#[async_trait]
impl GradeStore for MemoryStore {
    async fn record_grade(&self, grade: NewGrade) -> DbResult<GradeRecord> {
        let mut state = self.state.lock().await;
        let enrolled = state
            .students
            .values()
            .any(|s| &s.student_id == grade.student_id());
        if !enrolled {
            return Err(DbError::not_found("student", grade.student_id()));
        }

        state.last_grade_key += 1;
        let record = grade.into_record(state.last_grade_key, Utc::now());
        state.grades.push(record.clone());
        Ok(record)
    }

    async fn grades_for(&self, student_id: &StudentId) -> DbResult<Vec<GradeRecord>> {
        let state = self.state.lock().await;
        Ok(state
            .grades
            .iter()
            .filter(|g| &g.student_id == student_id)
            .cloned()
            .collect())
    }
}
