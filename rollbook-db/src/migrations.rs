//! Schema bootstrap for the students and grades tables
//!
//! Every statement is idempotent, so running on each startup is safe.

use sqlx::PgPool;

use crate::error::{DbResult, QueryContext};

const STATEMENTS: &[(&str, &str)] = &[
    (
        "create students table",
        r#"
        CREATE TABLE IF NOT EXISTS students (
            id BIGSERIAL PRIMARY KEY,
            student_id TEXT NOT NULL UNIQUE,
            name TEXT NOT NULL,
            course TEXT NOT NULL,
            year INTEGER NOT NULL CHECK (year BETWEEN 1 AND 12),
            section TEXT NOT NULL,
            created_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
        )
        "#,
    ),
    // No foreign key to students: deleting a student keeps its grades.
    (
        "create grades table",
        r#"
        CREATE TABLE IF NOT EXISTS grades (
            id BIGSERIAL PRIMARY KEY,
            student_id TEXT NOT NULL,
            subject TEXT NOT NULL,
            score DOUBLE PRECISION NOT NULL CHECK (score >= 0 AND score <= 100),
            recorded_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
        )
        "#,
    ),
    (
        "create grades index",
        "CREATE INDEX IF NOT EXISTS idx_grades_student_id ON grades(student_id)",
    ),
];

/// Run all schema migrations
pub async fn run(pool: &PgPool) -> DbResult<()> {
    tracing::info!("Running rollbook migrations...");

    for (name, sql) in STATEMENTS {
        sqlx::query(sql)
            .execute(pool)
            .await
            .during("migrate", || (*name).to_string())?;
        tracing::debug!(step = *name, "migration applied");
    }

    tracing::info!("rollbook migrations complete");
    Ok(())
}
