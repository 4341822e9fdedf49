//! Command implementations for the rollbook CLI
//!
//! Commands take a store trait object rather than a pool, so the same code
//! runs against Postgres in the binary and the in-memory store in tests.

pub mod grade;
pub mod student;

use std::io::Write;

use anyhow::Result;
use clap::ValueEnum;
use serde::Serialize;

pub use grade::{run_grade, GradeArgs};
pub use student::{run_student, StudentArgs};

#[derive(ValueEnum, Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum OutputFormat {
    /// Human-readable output (default)
    #[default]
    Human,
    /// JSON output (for piping to jq)
    Json,
}

impl OutputFormat {
    /// Resolve `--output` together with the `--json` shorthand.
    pub fn resolve(output: OutputFormat, json: bool) -> Self {
        if json {
            OutputFormat::Json
        } else {
            output
        }
    }
}

/// Write `value` as pretty JSON or through `human`.
pub(crate) fn emit<W, T, F>(out: &mut W, format: OutputFormat, value: &T, human: F) -> Result<()>
where
    W: Write,
    T: Serialize + ?Sized,
    F: FnOnce(&mut W) -> std::io::Result<()>,
{
    match format {
        OutputFormat::Json => {
            serde_json::to_writer_pretty(&mut *out, value)?;
            writeln!(out)?;
        }
        OutputFormat::Human => human(out)?,
    }
    Ok(())
}
