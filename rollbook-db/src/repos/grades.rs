//! Grade repository
//!
//! Grades reference students by business id. Recording takes a share lock on
//! the student row so it cannot interleave with an id reassignment.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rollbook_core::{GradeRecord, NewGrade, StudentId};
use sqlx::{FromRow, PgPool};

use crate::error::{DbError, DbResult, QueryContext};
use crate::store::GradeStore;

#[derive(Debug, FromRow)]
struct GradeRow {
    id: i64,
    student_id: String,
    subject: String,
    score: f64,
    recorded_at: DateTime<Utc>,
}

impl GradeRow {
    fn into_record(self) -> DbResult<GradeRecord> {
        let student_id = StudentId::parse(&self.student_id).map_err(|source| DbError::InvalidRow {
            table: "grades",
            id: self.id,
            source,
        })?;

        Ok(GradeRecord {
            id: self.id,
            student_id,
            subject: self.subject,
            score: self.score,
            recorded_at: self.recorded_at,
        })
    }
}

/// Grade repository
pub struct GradeRepo {
    pool: PgPool,
}

impl GradeRepo {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl GradeStore for GradeRepo {
    async fn record_grade(&self, grade: NewGrade) -> DbResult<GradeRecord> {
        let student_id = grade.student_id().to_string();
        let mut tx = self
            .pool
            .begin()
            .await
            .during("begin record grade", || format!("student_id={student_id}"))?;

        let student: Option<(i64,)> =
            sqlx::query_as("SELECT id FROM students WHERE student_id = $1 FOR SHARE")
                .bind(student_id.as_str())
                .fetch_optional(&mut *tx)
                .await
                .during("lock student for grade", || format!("student_id={student_id}"))?;

        if student.is_none() {
            return Err(DbError::not_found("student", &student_id));
        }

        let (id, recorded_at): (i64, DateTime<Utc>) = sqlx::query_as(
            r#"
            INSERT INTO grades (student_id, subject, score)
            VALUES ($1, $2, $3)
            RETURNING id, recorded_at
            "#,
        )
        .bind(student_id.as_str())
        .bind(grade.subject())
        .bind(grade.score())
        .fetch_one(&mut *tx)
        .await
        .during("insert grade", || {
            format!("student_id={student_id} subject={}", grade.subject())
        })?;

        tx.commit()
            .await
            .during("commit record grade", || format!("student_id={student_id}"))?;

        Ok(grade.into_record(id, recorded_at))
    }

    async fn grades_for(&self, student_id: &StudentId) -> DbResult<Vec<GradeRecord>> {
        sqlx::query_as::<_, GradeRow>(
            r#"
            SELECT id, student_id, subject, score, recorded_at
            FROM grades
            WHERE student_id = $1
            ORDER BY recorded_at, id
            "#,
        )
        .bind(student_id.to_string())
        .fetch_all(&self.pool)
        .await
        .during("list grades", || format!("student_id={student_id}"))?
        .into_iter()
        .map(GradeRow::into_record)
        .collect()
    }
}
