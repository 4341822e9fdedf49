//! Database connection pool management
//!
//! The pool is built once by the caller and handed to each repository.
//! Connections go back to the pool when their guard or transaction drops,
//! including on error paths.

use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;

use crate::config::DbSettings;
use crate::error::{DbResult, QueryContext};

/// Create a PostgreSQL connection pool from settings.
///
/// Connects eagerly, so an unreachable server fails here rather than on the
/// first query.
///
/// # Example
///
/// ```ignore
/// let pool = create_pool(&DbSettings::from_env()?).await?;
/// ```
pub async fn create_pool(settings: &DbSettings) -> DbResult<PgPool> {
    settings.validate()?;
    let options = settings.connect_options()?;

    PgPoolOptions::new()
        .max_connections(settings.max_connections)
        .acquire_timeout(settings.acquire_timeout)
        .connect_with(options)
        .await
        .during("connect", || settings.redacted())
}

/// Round-trip a trivial query to prove the pool can reach the server.
pub async fn check_connection(pool: &PgPool) -> DbResult<()> {
    let _: (i32,) = sqlx::query_as("SELECT 1")
        .fetch_one(pool)
        .await
        .during("connectivity check", String::new)?;
    Ok(())
}
