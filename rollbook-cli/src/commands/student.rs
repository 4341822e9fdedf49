//! Student record commands: create, list, get, find, update, delete, next-id
//!
//! ```bash
//! rollbook student create --name "Ada Lovelace" --course bsit --year 1 --section A
//! rollbook student list --json | jq '.[].student_id'
//! rollbook student update 42 --course bscs   # assigns a new student id
//! ```

use std::io::Write;

use anyhow::{anyhow, Context, Result};
use clap::{Parser, Subcommand};
use rollbook_core::{CourseCode, NewStudent, StudentId, StudentRecord, StudentUpdate};
use rollbook_db::StudentStore;
use serde_json::json;
use tracing::info;

use super::{emit, OutputFormat};

#[derive(Parser, Debug)]
pub struct StudentArgs {
    /// Output format
    #[arg(long, short, value_enum, default_value = "human", global = true)]
    pub output: OutputFormat,

    /// Shorthand for --output json
    #[arg(long, global = true)]
    pub json: bool,

    #[command(subcommand)]
    pub command: StudentCommands,
}

#[derive(Subcommand, Debug)]
pub enum StudentCommands {
    /// Enrol a student and assign the next student id for their course
    Create(CreateArgs),
    /// List every student, oldest first
    List,
    /// Show a student by record key
    Get {
        /// Record key (the numeric id, not the student id)
        id: i64,
    },
    /// Show a student by student id (e.g. 25BSIT-0001)
    Find {
        /// Student id
        student_id: StudentId,
    },
    /// Change a student's details; a new course assigns a new student id
    Update(UpdateArgs),
    /// Remove a student record (recorded grades are kept)
    Delete {
        /// Record key
        id: i64,
    },
    /// Preview the next student id for a course without assigning it
    NextId {
        /// Course code (case-insensitive)
        course: CourseCode,
    },
}

#[derive(Parser, Debug)]
pub struct CreateArgs {
    /// Full name
    #[arg(long)]
    pub name: String,

    /// Course code (case-insensitive, stored uppercase)
    #[arg(long)]
    pub course: String,

    /// Year level
    #[arg(long)]
    pub year: i32,

    /// Section label
    #[arg(long)]
    pub section: String,
}

#[derive(Parser, Debug)]
pub struct UpdateArgs {
    /// Record key
    pub id: i64,

    /// New full name
    #[arg(long)]
    pub name: Option<String>,

    /// New course code; reassigns the student id when it differs
    #[arg(long)]
    pub course: Option<String>,

    /// New year level
    #[arg(long)]
    pub year: Option<i32>,

    /// New section label
    #[arg(long)]
    pub section: Option<String>,
}

pub async fn run_student<W: Write>(
    store: &dyn StudentStore,
    args: StudentArgs,
    out: &mut W,
) -> Result<()> {
    let format = OutputFormat::resolve(args.output, args.json);

    match args.command {
        StudentCommands::Create(args) => {
            let student = NewStudent::new(&args.name, &args.course, args.year, &args.section)?;
            let created = store
                .create(student)
                .await
                .context("Failed to create student")?;
            info!(student_id = %created.student_id, "student enrolled");
            emit(out, format, &created, |out| write_student(out, &created))
        }
        StudentCommands::List => {
            let students = store.get_all().await.context("Failed to list students")?;
            emit(out, format, &students, |out| {
                if students.is_empty() {
                    return writeln!(out, "No students");
                }
                for student in &students {
                    write_student(out, student)?;
                }
                Ok(())
            })
        }
        StudentCommands::Get { id } => {
            let student = store
                .get(id)
                .await
                .context("Failed to load student")?
                .ok_or_else(|| anyhow!("No student with record key {id}"))?;
            emit(out, format, &student, |out| write_student(out, &student))
        }
        StudentCommands::Find { student_id } => {
            let student = store
                .find_by_student_id(&student_id)
                .await
                .context("Failed to look up student")?
                .ok_or_else(|| anyhow!("No student with id {student_id}"))?;
            emit(out, format, &student, |out| write_student(out, &student))
        }
        StudentCommands::Update(args) => run_update(store, args, format, out).await,
        StudentCommands::Delete { id } => {
            let existed = store
                .get(id)
                .await
                .context("Failed to load student")?
                .is_some();
            store.delete(id).await.context("Failed to delete student")?;
            emit(out, format, &json!({ "id": id, "deleted": existed }), |out| {
                if existed {
                    writeln!(out, "Deleted student #{id}")
                } else {
                    writeln!(out, "No student #{id}; nothing to delete")
                }
            })
        }
        StudentCommands::NextId { course } => {
            let next = store
                .next_student_id(&course)
                .await
                .context("Failed to compute next student id")?;
            emit(out, format, &json!({ "student_id": next }), |out| {
                writeln!(out, "{next}")
            })
        }
    }
}

async fn run_update<W: Write>(
    store: &dyn StudentStore,
    args: UpdateArgs,
    format: OutputFormat,
    out: &mut W,
) -> Result<()> {
    let current = store
        .get(args.id)
        .await
        .context("Failed to load student")?
        .ok_or_else(|| anyhow!("No student with record key {}", args.id))?;

    let update = StudentUpdate::new(
        current.student_id.clone(),
        args.name.as_deref().unwrap_or(&current.name),
        args.course.as_deref().unwrap_or(current.course.as_str()),
        args.year.unwrap_or(current.year),
        args.section.as_deref().unwrap_or(&current.section),
    )?;

    let updated = store
        .update(args.id, update)
        .await
        .with_context(|| format!("Failed to update student #{}", args.id))?;

    if updated.student_id != current.student_id {
        info!(from = %current.student_id, to = %updated.student_id, "student id changed");
    }

    emit(out, format, &updated, |out| {
        if updated.student_id != current.student_id {
            writeln!(out, "Student id changed: {} -> {}", current.student_id, updated.student_id)?;
        }
        write_student(out, &updated)
    })
}

fn write_student<W: Write>(out: &mut W, student: &StudentRecord) -> std::io::Result<()> {
    writeln!(
        out,
        "{:<16} {:<32} {} {}-{}  #{}",
        student.student_id, student.name, student.course, student.year, student.section, student.id
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use rollbook_core::FixedClock;
    use rollbook_db::MemoryStore;
    use std::sync::Arc;

    fn store() -> MemoryStore {
        MemoryStore::with_clock(Arc::new(FixedClock::new(2025)))
    }

    async fn run(store: &MemoryStore, argv: &[&str]) -> Result<String> {
        let args = StudentArgs::try_parse_from(std::iter::once("student").chain(argv.iter().copied()))?;
        let mut out = Vec::new();
        run_student(store, args, &mut out).await?;
        Ok(String::from_utf8(out)?)
    }

    const ADA: &[&str] = &["create", "--name", "Ada", "--course", "bsit", "--year", "1", "--section", "A"];

    #[tokio::test]
    async fn test_create_prints_assigned_id() {
        let store = store();
        let out = run(&store, ADA).await.unwrap();
        assert!(out.contains("25BSIT-0001"), "{out}");
        assert!(out.contains("Ada"));
    }

    #[tokio::test]
    async fn test_create_json() {
        let store = store();
        let mut argv = ADA.to_vec();
        argv.push("--json");
        let out = run(&store, &argv).await.unwrap();

        let record: StudentRecord = serde_json::from_str(&out).unwrap();
        assert_eq!(record.student_id.to_string(), "25BSIT-0001");
        assert_eq!(record.course.as_str(), "BSIT");
    }

    #[tokio::test]
    async fn test_create_rejects_invalid_year() {
        let store = store();
        let err = run(
            &store,
            &["create", "--name", "Ada", "--course", "bsit", "--year", "0", "--section", "A"],
        )
        .await
        .unwrap_err();
        assert!(err.to_string().contains("year"), "{err}");
    }

    #[tokio::test]
    async fn test_update_course_reports_new_id() {
        let store = store();
        run(&store, ADA).await.unwrap();

        let out = run(&store, &["update", "1", "--course", "bscs"]).await.unwrap();
        assert!(out.contains("25BSIT-0001 -> 25BSCS-0001"), "{out}");

        let found = run(&store, &["find", "25BSCS-0001"]).await.unwrap();
        assert!(found.contains("Ada"));
    }

    #[tokio::test]
    async fn test_update_has_no_student_id_flag() {
        let store = store();
        run(&store, ADA).await.unwrap();

        assert!(run(&store, &["update", "1", "--student-id", "25BSCS-0009"]).await.is_err());
        let found = run(&store, &["find", "25BSIT-0001"]).await.unwrap();
        assert!(found.contains("Ada"));
    }

    #[tokio::test]
    async fn test_update_missing_student_fails() {
        let store = store();
        let err = run(&store, &["update", "7", "--name", "Nobody"]).await.unwrap_err();
        assert!(err.to_string().contains("No student"));
    }

    #[tokio::test]
    async fn test_delete_is_idempotent() {
        let store = store();
        run(&store, ADA).await.unwrap();

        let first = run(&store, &["delete", "1"]).await.unwrap();
        assert!(first.contains("Deleted student #1"));
        let second = run(&store, &["delete", "1"]).await.unwrap();
        assert!(second.contains("nothing to delete"));
    }

    #[tokio::test]
    async fn test_next_id_and_list() {
        let store = store();
        run(&store, ADA).await.unwrap();

        let next = run(&store, &["next-id", "BSIT"]).await.unwrap();
        assert_eq!(next.trim(), "25BSIT-0002");

        let list = run(&store, &["list", "--json"]).await.unwrap();
        let records: Vec<StudentRecord> = serde_json::from_str(&list).unwrap();
        assert_eq!(records.len(), 1);
    }

    #[tokio::test]
    async fn test_find_rejects_malformed_id() {
        let store = store();
        assert!(run(&store, &["find", "not-an-id"]).await.is_err());
    }
}
