//! Error types for rollbook-db
//!
//! Storage code returns these values and never logs them; the caller decides
//! whether a failure is worth reporting.

use rollbook_core::ValidationError;
use thiserror::Error;

pub type DbResult<T> = Result<T, DbError>;

#[derive(Error, Debug)]
pub enum DbError {
    /// Any failure reported by the database driver
    #[error("{operation} failed [{params}]: {source}")]
    Storage {
        operation: &'static str,
        params: String,
        #[source]
        source: sqlx::Error,
    },

    /// The operation needs a row that does not exist
    #[error("not found: {resource} '{id}'")]
    NotFound { resource: &'static str, id: String },

    /// Another student already holds this id
    #[error("student id '{student_id}' is already assigned")]
    IdentifierConflict { student_id: String },

    #[error("invalid input: {0}")]
    Validation(#[from] ValidationError),

    /// A stored row no longer satisfies domain validation
    #[error("invalid {table} row {id}: {source}")]
    InvalidRow {
        table: &'static str,
        id: i64,
        #[source]
        source: ValidationError,
    },

    #[error("configuration error: {reason}")]
    Config { reason: String },
}

impl DbError {
    pub fn storage(operation: &'static str, params: impl Into<String>, source: sqlx::Error) -> Self {
        Self::Storage {
            operation,
            params: params.into(),
            source,
        }
    }

    pub fn not_found(resource: &'static str, id: impl ToString) -> Self {
        Self::NotFound {
            resource,
            id: id.to_string(),
        }
    }

    pub fn config(reason: impl Into<String>) -> Self {
        Self::Config {
            reason: reason.into(),
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }

    pub fn is_conflict(&self) -> bool {
        matches!(self, Self::IdentifierConflict { .. })
    }
}

/// Attach operation context to driver errors.
pub(crate) trait QueryContext<T> {
    fn during<F>(self, operation: &'static str, params: F) -> DbResult<T>
    where
        F: FnOnce() -> String;
}

impl<T> QueryContext<T> for Result<T, sqlx::Error> {
    fn during<F>(self, operation: &'static str, params: F) -> DbResult<T>
    where
        F: FnOnce() -> String,
    {
        self.map_err(|source| DbError::storage(operation, params(), source))
    }
}

/// Whether the driver rejected a write because of a unique constraint.
pub(crate) fn is_unique_violation(err: &sqlx::Error) -> bool {
    matches!(err, sqlx::Error::Database(db_err) if db_err.is_unique_violation())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn storage_error_carries_context() {
        let err = DbError::storage(
            "find student",
            "student_id=25BSIT-0001",
            sqlx::Error::PoolTimedOut,
        );
        let msg = err.to_string();
        assert!(msg.starts_with("find student failed [student_id=25BSIT-0001]"));
        assert!(std::error::Error::source(&err).is_some());
    }

    #[test]
    fn during_maps_driver_errors() {
        let result: Result<(), sqlx::Error> = Err(sqlx::Error::PoolClosed);
        let err = result.during("delete student", || "id=3".to_string()).unwrap_err();
        assert!(matches!(err, DbError::Storage { operation: "delete student", .. }));
    }

    #[test]
    fn classification_helpers() {
        assert!(DbError::not_found("student", 9).is_not_found());
        assert!(DbError::IdentifierConflict {
            student_id: "25BSIT-0001".into()
        }
        .is_conflict());
        assert!(!is_unique_violation(&sqlx::Error::RowNotFound));
    }
}
