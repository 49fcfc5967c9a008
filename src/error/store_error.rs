use thiserror::Error;

/// Failures of the persistence layer. Always treated as infrastructure
/// problems: logged in full, surfaced to clients as a generic 500.
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
    #[error("Migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),
    #[error("Unique constraint violated: {0}")]
    Conflict(String),
    #[error("Storage unavailable: {0}")]
    Unavailable(String),
}
