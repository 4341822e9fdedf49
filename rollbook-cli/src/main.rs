//! rollbook CLI - student records and grades maintenance
//!
//! Provides:
//! - Connectivity check and schema bootstrap (`ping`, `migrate`)
//! - Student enrolment with per-course, per-year student ids (`student`)
//! - Grade recording and lookup (`grade`)
//! - Shell completions (`completions`)

use std::io;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use rollbook_db::{check_connection, create_pool, migrations, GradeRepo, PgPool, StudentRepo};
use tracing::info;

mod commands;
mod config;
mod tracing_setup;

use tracing_setup::{init_tracing, TracingConfig};

#[derive(Parser, Debug)]
#[command(
    name = "rollbook",
    author,
    version,
    about = "Student records and grades over Postgres",
    long_about = "Enrol students, assign per-course student ids (e.g. 25BSIT-0001), \
                  and record grades. Student ids follow course changes, grades included."
)]
struct Cli {
    /// Enable debug logging
    #[arg(long, global = true)]
    debug: bool,

    /// Connection string; overrides DATABASE_URL, DB_* and the config file
    #[arg(long, global = true, value_name = "URL")]
    database_url: Option<String>,

    /// Config file (default: ~/.rollbook/config.toml)
    #[arg(long, global = true, env = "ROLLBOOK_CONFIG", value_name = "PATH")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Check that the database is reachable
    Ping,
    /// Create tables and indexes if they do not exist
    Migrate,
    /// Student records (create, list, get, find, update, delete, next-id)
    Student(commands::StudentArgs),
    /// Grades (add, list)
    Grade(commands::GradeArgs),
    /// Generate shell completion scripts
    Completions(CompletionsArgs),
}

#[derive(Parser, Debug)]
struct CompletionsArgs {
    /// Shell to generate completions for
    #[arg(value_enum)]
    shell: Shell,
}

#[derive(ValueEnum, Debug, Clone, Copy)]
#[allow(clippy::enum_variant_names)] // PowerShell is a proper noun, not a suffix
enum Shell {
    Bash,
    Zsh,
    Fish,
    PowerShell,
    Elvish,
}

#[tokio::main]
async fn main() -> Result<()> {
    let Cli {
        debug,
        database_url,
        config,
        command,
    } = Cli::parse();
    init_tracing(&TracingConfig { debug }).ok();

    let target = Target {
        config: config.as_deref(),
        database_url: database_url.as_deref(),
    };

    match command {
        Commands::Ping => {
            let pool = target.connect().await?;
            check_connection(&pool).await.context("Database ping failed")?;
            println!("ok");
        }
        Commands::Migrate => {
            let pool = target.connect().await?;
            migrations::run(&pool).await.context("Migration failed")?;
            println!("Schema is up to date");
        }
        Commands::Student(args) => {
            let repo = StudentRepo::new(target.connect().await?);
            commands::run_student(&repo, args, &mut io::stdout()).await?;
        }
        Commands::Grade(args) => {
            let repo = GradeRepo::new(target.connect().await?);
            commands::run_grade(&repo, args, &mut io::stdout()).await?;
        }
        Commands::Completions(args) => run_completions(args)?,
    }
    Ok(())
}

/// Where to connect, as given on the command line
struct Target<'a> {
    config: Option<&'a Path>,
    database_url: Option<&'a str>,
}

impl Target<'_> {
    async fn connect(&self) -> Result<PgPool> {
        config::load_dotenv();
        let settings =
            config::resolve_settings(self.config, self.database_url, |key| std::env::var(key).ok())?;

        let pool = create_pool(&settings)
            .await
            .with_context(|| format!("Could not connect to {}", settings.redacted()))?;
        info!(max_connections = settings.max_connections, "connected");
        Ok(pool)
    }
}

fn run_completions(args: CompletionsArgs) -> Result<()> {
    use clap::CommandFactory;
    use clap_complete::{generate, Shell as CompletionShell};

    let mut cmd = Cli::command();
    let bin_name = cmd.get_name().to_string();

    let shell = match args.shell {
        Shell::Bash => CompletionShell::Bash,
        Shell::Zsh => CompletionShell::Zsh,
        Shell::Fish => CompletionShell::Fish,
        Shell::PowerShell => CompletionShell::PowerShell,
        Shell::Elvish => CompletionShell::Elvish,
    };

    generate(shell, &mut cmd, bin_name, &mut io::stdout());

    Ok(())
}
