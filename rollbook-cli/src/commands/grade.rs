//! Grade commands: add, list

use std::io::Write;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use rollbook_core::{GradeRecord, NewGrade, StudentId};
use rollbook_db::GradeStore;
use tracing::info;

use super::{emit, OutputFormat};

#[derive(Parser, Debug)]
pub struct GradeArgs {
    /// Output format
    #[arg(long, short, value_enum, default_value = "human", global = true)]
    pub output: OutputFormat,

    /// Shorthand for --output json
    #[arg(long, global = true)]
    pub json: bool,

    #[command(subcommand)]
    pub command: GradeCommands,
}

#[derive(Subcommand, Debug)]
pub enum GradeCommands {
    /// Record a grade for an enrolled student
    Add {
        /// Student id (e.g. 25BSIT-0001)
        student_id: StudentId,

        /// Subject name
        #[arg(long)]
        subject: String,

        /// Score from 0 to 100
        #[arg(long)]
        score: f64,
    },
    /// List grades recorded under a student id
    List {
        /// Student id
        student_id: StudentId,
    },
}

pub async fn run_grade<W: Write>(store: &dyn GradeStore, args: GradeArgs, out: &mut W) -> Result<()> {
    let format = OutputFormat::resolve(args.output, args.json);

    match args.command {
        GradeCommands::Add {
            student_id,
            subject,
            score,
        } => {
            let grade = NewGrade::new(student_id, &subject, score)?;
            let recorded = store
                .record_grade(grade)
                .await
                .context("Failed to record grade")?;
            info!(student_id = %recorded.student_id, subject = %recorded.subject, "grade recorded");
            emit(out, format, &recorded, |out| write_grade(out, &recorded))
        }
        GradeCommands::List { student_id } => {
            let grades = store
                .grades_for(&student_id)
                .await
                .with_context(|| format!("Failed to load grades for {student_id}"))?;
            emit(out, format, &grades, |out| {
                if grades.is_empty() {
                    return writeln!(out, "No grades for {student_id}");
                }
                for grade in &grades {
                    write_grade(out, grade)?;
                }
                Ok(())
            })
        }
    }
}

fn write_grade<W: Write>(out: &mut W, grade: &GradeRecord) -> std::io::Result<()> {
    writeln!(
        out,
        "{:<16} {:<24} {:>6.2}  {}",
        grade.student_id,
        grade.subject,
        grade.score,
        grade.recorded_at.format("%Y-%m-%d %H:%M")
    )
}
