//! Student repository
//!
//! Handles student CRUD with:
//! - id assignment under a per-bucket advisory lock (read max + insert is atomic)
//! - course changes cascading the new id to grades in the same transaction
//! - ids change only with the course

use std::sync::Arc;

use async_trait::async_trait;
use rollbook_core::{
    Clock, CourseCode, IdBucket, NewStudent, StudentId, StudentRecord, StudentUpdate, SystemClock,
    ValidationError,
};
use sqlx::{FromRow, PgConnection, PgExecutor, PgPool};
use tracing::debug;

use crate::error::{is_unique_violation, DbError, DbResult, QueryContext};
use crate::store::StudentStore;

const SELECT_BY_STUDENT_ID: &str = r#"
    SELECT id, student_id, name, course, year, section
    FROM students
    WHERE student_id = $1
"#;

const SELECT_BY_ID: &str = r#"
    SELECT id, student_id, name, course, year, section
    FROM students
    WHERE id = $1
"#;

const SELECT_BY_ID_FOR_UPDATE: &str = r#"
    SELECT id, student_id, name, course, year, section
    FROM students
    WHERE id = $1
    FOR UPDATE
"#;

const SELECT_ALL: &str = r#"
    SELECT id, student_id, name, course, year, section
    FROM students
    ORDER BY id
"#;

/// Student row as stored; validated into a `StudentRecord` on the way out
#[derive(Debug, FromRow)]
struct StudentRow {
    id: i64,
    student_id: String,
    name: String,
    course: String,
    year: i32,
    section: String,
}

impl StudentRow {
    fn into_record(self) -> DbResult<StudentRecord> {
        let id = self.id;
        let invalid = move |source| DbError::InvalidRow {
            table: "students",
            id,
            source,
        };

        Ok(StudentRecord {
            id,
            student_id: StudentId::parse(&self.student_id).map_err(invalid)?,
            course: CourseCode::new(&self.course).map_err(invalid)?,
            name: self.name,
            year: self.year,
            section: self.section,
        })
    }
}

/// Student repository
pub struct StudentRepo {
    pool: PgPool,
    clock: Arc<dyn Clock>,
}

impl StudentRepo {
    pub fn new(pool: PgPool) -> Self {
        Self::with_clock(pool, Arc::new(SystemClock))
    }

    /// Use `clock` to decide the year prefix of newly assigned ids.
    pub fn with_clock(pool: PgPool, clock: Arc<dyn Clock>) -> Self {
        Self { pool, clock }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    fn bucket_for(&self, course: &CourseCode) -> IdBucket {
        IdBucket::current(self.clock.as_ref(), course.clone())
    }
}

/// Serialize id assignment within one bucket until the transaction ends.
///
/// Transaction-scoped advisory locks are released on commit or rollback, so
/// a dropped transaction can never leave a bucket locked.
async fn lock_bucket(conn: &mut PgConnection, bucket: &IdBucket) -> DbResult<()> {
    sqlx::query("SELECT pg_advisory_xact_lock(hashtext($1))")
        .bind(format!("students:{bucket}"))
        .execute(conn)
        .await
        .during("lock id bucket", || format!("bucket={bucket}"))?;
    Ok(())
}

/// Highest numeric suffix used in `bucket`, or 0.
///
/// Grades kept from deleted students count as used, so a deleted student's
/// id is never reissued to someone who would inherit those grades.
/// Compares numerically so a suffix widened past 9999 still counts.
async fn last_sequence<'e, E>(executor: E, bucket: &IdBucket) -> DbResult<u32>
where
    E: PgExecutor<'e>,
{
    let suffix_start = bucket.prefix().len() as i32 + 1;

    let (last,): (i64,) = sqlx::query_as(
        r#"
        SELECT COALESCE(MAX(
            CASE WHEN SUBSTRING(student_id FROM $2) ~ '^[0-9]{1,18}$'
                 THEN CAST(SUBSTRING(student_id FROM $2) AS BIGINT)
            END
        ), 0)
        FROM (
            SELECT student_id FROM students WHERE student_id LIKE $1
            UNION ALL
            SELECT student_id FROM grades WHERE student_id LIKE $1
        ) AS used
        "#,
    )
    .bind(bucket.like_pattern())
    .bind(suffix_start)
    .fetch_one(executor)
    .await
    .during("find last student id", || format!("bucket={bucket}"))?;

    u32::try_from(last).map_err(|_| {
        DbError::from(ValidationError::out_of_range(
            "student id sequence",
            "1..=4294967295",
            last,
        ))
    })
}

/// Lock `bucket` and compute its next id. Call inside the transaction that
/// will write the id.
async fn assign_next(conn: &mut PgConnection, bucket: &IdBucket) -> DbResult<StudentId> {
    lock_bucket(&mut *conn, bucket).await?;
    let last = last_sequence(&mut *conn, bucket).await?;
    Ok(bucket.next_after(last)?)
}

fn write_error(source: sqlx::Error, operation: &'static str, student_id: &StudentId) -> DbError {
    if is_unique_violation(&source) {
        DbError::IdentifierConflict {
            student_id: student_id.to_string(),
        }
    } else {
        DbError::storage(operation, format!("student_id={student_id}"), source)
    }
}

#[async_trait]
impl StudentStore for StudentRepo {
    async fn find_by_student_id(&self, student_id: &StudentId) -> DbResult<Option<StudentRecord>> {
        sqlx::query_as::<_, StudentRow>(SELECT_BY_STUDENT_ID)
            .bind(student_id.to_string())
            .fetch_optional(&self.pool)
            .await
            .during("find student", || format!("student_id={student_id}"))?
            .map(StudentRow::into_record)
            .transpose()
    }

    async fn get(&self, id: i64) -> DbResult<Option<StudentRecord>> {
        sqlx::query_as::<_, StudentRow>(SELECT_BY_ID)
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .during("get student", || format!("id={id}"))?
            .map(StudentRow::into_record)
            .transpose()
    }

    async fn get_all(&self) -> DbResult<Vec<StudentRecord>> {
        sqlx::query_as::<_, StudentRow>(SELECT_ALL)
            .fetch_all(&self.pool)
            .await
            .during("list students", String::new)?
            .into_iter()
            .map(StudentRow::into_record)
            .collect()
    }

    async fn create(&self, student: NewStudent) -> DbResult<StudentRecord> {
        let bucket = self.bucket_for(student.course());
        let mut tx = self
            .pool
            .begin()
            .await
            .during("begin create student", || format!("bucket={bucket}"))?;

        let student_id = assign_next(&mut *tx, &bucket).await?;

        let (id,): (i64,) = sqlx::query_as(
            r#"
            INSERT INTO students (student_id, name, course, year, section)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING id
            "#,
        )
        .bind(student_id.to_string())
        .bind(student.name())
        .bind(student.course().as_str())
        .bind(student.year())
        .bind(student.section())
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| write_error(e, "insert student", &student_id))?;

        tx.commit()
            .await
            .during("commit create student", || format!("student_id={student_id}"))?;

        debug!(%student_id, id, "student created");
        Ok(student.into_record(id, student_id))
    }

    async fn update(&self, id: i64, update: StudentUpdate) -> DbResult<StudentRecord> {
        let mut tx = self
            .pool
            .begin()
            .await
            .during("begin update student", || format!("id={id}"))?;

        let current = sqlx::query_as::<_, StudentRow>(SELECT_BY_ID_FOR_UPDATE)
            .bind(id)
            .fetch_optional(&mut *tx)
            .await
            .during("load student for update", || format!("id={id}"))?
            .ok_or_else(|| DbError::not_found("student", id))?
            .into_record()?;

        let new_id = if update.changes_course(&current) {
            let bucket = self.bucket_for(update.course());
            assign_next(&mut *tx, &bucket).await?
        } else {
            update.kept_student_id(&current)?
        };

        sqlx::query(
            r#"
            UPDATE students
            SET student_id = $1, name = $2, course = $3, year = $4, section = $5
            WHERE id = $6
            "#,
        )
        .bind(new_id.to_string())
        .bind(update.name())
        .bind(update.course().as_str())
        .bind(update.year())
        .bind(update.section())
        .bind(id)
        .execute(&mut *tx)
        .await
        .map_err(|e| write_error(e, "update student", &new_id))?;

        if new_id != current.student_id {
            let moved = sqlx::query("UPDATE grades SET student_id = $1 WHERE student_id = $2")
                .bind(new_id.to_string())
                .bind(current.student_id.to_string())
                .execute(&mut *tx)
                .await
                .during("cascade student id to grades", || {
                    format!("from={} to={}", current.student_id, new_id)
                })?
                .rows_affected();

            debug!(from = %current.student_id, to = %new_id, grades = moved, "student id reassigned");
        }

        tx.commit()
            .await
            .during("commit update student", || format!("id={id}"))?;

        Ok(update.apply(id, new_id))
    }

    async fn delete(&self, id: i64) -> DbResult<()> {
        let result = sqlx::query("DELETE FROM students WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .during("delete student", || format!("id={id}"))?;

        debug!(id, rows = result.rows_affected(), "student deleted");
        Ok(())
    }

    async fn next_student_id(&self, course: &CourseCode) -> DbResult<StudentId> {
        let bucket = self.bucket_for(course);
        let last = last_sequence(&self.pool, &bucket).await?;
        Ok(bucket.next_after(last)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn row_with_legacy_id_is_reported() {
        let row = StudentRow {
            id: 4,
            student_id: "25BSIT-1".to_string(),
            name: "Ada".to_string(),
            course: "BSIT".to_string(),
            year: 1,
            section: "A".to_string(),
        };
        let err = row.into_record().unwrap_err();
        assert!(matches!(err, DbError::InvalidRow { table: "students", id: 4, .. }));
    }

    #[test]
    fn row_converts_to_record() {
        let row = StudentRow {
            id: 1,
            student_id: "25BSIT-0001".to_string(),
            name: "Ada".to_string(),
            course: "BSIT".to_string(),
            year: 2,
            section: "A".to_string(),
        };
        let record = row.into_record().unwrap();
        assert_eq!(record.student_id.sequence(), 1);
        assert_eq!(record.course.as_str(), "BSIT");
    }
}
