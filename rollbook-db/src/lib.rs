//! rollbook-db: storage for student records
//!
//! # Design Principles
//!
//! - Pool handle is built by the caller and injected; no process-wide state
//! - Id assignment and insert happen under one per-bucket lock (no check-then-insert)
//! - Multi-step writes (course change + grade cascade) run in one transaction
//! - Errors are returned with context, never logged here

pub mod config;
pub mod error;
pub mod memory;
pub mod migrations;
pub mod pool;
pub mod repos;
pub mod store;

pub use config::DbSettings;
pub use error::{DbError, DbResult};
pub use memory::MemoryStore;
pub use pool::{check_connection, create_pool};
pub use repos::{GradeRepo, StudentRepo};
pub use store::{GradeStore, StudentStore};

/// Pool handle type, re-exported so callers need not depend on sqlx.
pub use sqlx::PgPool;
