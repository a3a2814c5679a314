//! Error types for database operations
//!
//! Repositories return [`Error`]; converting it into [`rota_core::Error`] is
//! the one place where raw store failures are classified.

use rota_core::ConflictReason;
use thiserror::Error;

/// Database error types
#[derive(Error, Debug)]
pub enum Error {
    /// SQLx database error
    #[error("Database error: {0}")]
    Sqlx(#[from] sqlx::Error),

    /// Migration error
    #[error("Migration error: {0}")]
    Migration(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Business rule violation detected inside a transaction
    #[error(transparent)]
    Domain(#[from] rota_core::Error),
}

/// Result type alias for database operations
pub type Result<T> = std::result::Result<T, Error>;

impl From<Error> for rota_core::Error {
    fn from(err: Error) -> Self {
        match err {
            Error::Sqlx(e) => classify(e),
            Error::Migration(msg) => rota_core::Error::Internal(format!("migration failed: {}", msg)),
            Error::Io(e) => rota_core::Error::Io(e),
            Error::Domain(e) => e,
        }
    }
}

/// Translate a store failure into the service taxonomy
///
/// Unique violations on pull request ids and team names become conflicts,
/// foreign key violations and missing rows become `NotFound`. Anything else is
/// `Internal`.
pub fn classify(err: sqlx::Error) -> rota_core::Error {
    match &err {
        sqlx::Error::RowNotFound => {
            return rota_core::Error::NotFound("no matching rows".to_string());
        }
        sqlx::Error::Database(db_err) => {
            let message = db_err.message();

            if db_err.is_unique_violation() || message.starts_with("UNIQUE constraint failed") {
                if message.contains("pull_requests.id") {
                    return rota_core::Error::Conflict(ConflictReason::PrExists);
                }
                if message.contains("teams.name") {
                    return rota_core::Error::Conflict(ConflictReason::TeamExists);
                }
            } else if db_err.is_foreign_key_violation()
                || message.starts_with("FOREIGN KEY constraint failed")
            {
                return rota_core::Error::NotFound(message.to_string());
            }
        }
        _ => {}
    }

    rota_core::Error::Internal(err.to_string())
}
