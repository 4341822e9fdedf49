//! Postgres repository implementations
//!
//! Each repository follows these patterns:
//! - Owns a cloned `PgPool` handle; no global connection state
//! - Uses transactions for multi-step writes
//! - Returns `DbError` with operation context instead of logging

pub mod grades;
pub mod students;

pub use grades::GradeRepo;
pub use students::StudentRepo;
