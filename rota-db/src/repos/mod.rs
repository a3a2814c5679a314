//! Repository modules for database operations

pub mod pull_requests;
pub mod stats;
pub mod teams;
pub mod users;

pub use pull_requests::PullRequestRepository;
pub use stats::StatsRepository;
pub use teams::TeamRepository;
pub use users::UserRepository;

use sqlx::{Sqlite, SqlitePool, Transaction};

use crate::Result;

/// Start a transaction that takes the write lock up front
///
/// A deferred transaction that reads before writing cannot be retried by the
/// busy handler once another writer commits, so every read-then-write
/// procedure waits for the lock here instead.
pub(crate) async fn begin_write(pool: &SqlitePool) -> Result<Transaction<'static, Sqlite>> {
    Ok(pool.begin_with("BEGIN IMMEDIATE").await?)
}
