//! Database layer for rota
//!
//! Persists teams, users, pull requests and reviewer links in SQLite and runs
//! every multi-step assignment decision inside a single transaction.

pub mod error;
pub mod repos;

use std::str::FromStr;
use std::time::Duration;

use rota_core::config::{DatabaseConfig, TieBreak};
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePool, SqlitePoolOptions};
use tracing::{info, warn};

pub use error::{classify, Error, Result};
pub use repos::{PullRequestRepository, StatsRepository, TeamRepository, UserRepository};

/// How long a connection waits on a locked database before giving up
const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

/// Database connection pool
#[derive(Clone)]
pub struct Database {
    pool: SqlitePool,
}

impl Database {
    /// Connect to the database with the given configuration and run migrations
    ///
    /// The initial connection is retried `connect_attempts` times.
    pub async fn connect(config: &DatabaseConfig) -> Result<Self> {
        // Ensure parent directory exists
        if let Some(parent) = config.path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let options = SqliteConnectOptions::from_str(&format!("sqlite://{}", config.path.display()))?
            .create_if_missing(true)
            .foreign_keys(true)
            .journal_mode(SqliteJournalMode::Wal)
            .busy_timeout(BUSY_TIMEOUT);

        let attempts = config.connect_attempts.max(1);
        let mut attempt = 0;
        let pool = loop {
            attempt += 1;
            match SqlitePoolOptions::new()
                .max_connections(config.max_connections)
                .connect_with(options.clone())
                .await
            {
                Ok(pool) => break pool,
                Err(e) if attempt < attempts => {
                    warn!(
                        attempt,
                        attempts_left = attempts - attempt,
                        error = %e,
                        "Database connection failed, retrying"
                    );
                    tokio::time::sleep(config.connect_retry_delay).await;
                }
                Err(e) => return Err(e.into()),
            }
        };

        let db = Self { pool };
        db.migrate().await?;

        info!(path = %config.path.display(), "Database ready");
        Ok(db)
    }

    /// Create an in-memory database for testing
    ///
    /// Uses a single connection that never expires, since every new SQLite
    /// memory connection starts empty.
    pub async fn in_memory() -> Result<Self> {
        let options = SqliteConnectOptions::from_str("sqlite::memory:")?.foreign_keys(true);

        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
            .connect_with(options)
            .await?;

        let db = Self { pool };
        db.migrate().await?;
        Ok(db)
    }

    /// Run database migrations
    pub async fn migrate(&self) -> Result<()> {
        sqlx::migrate!("./migrations")
            .run(&self.pool)
            .await
            .map_err(|e| Error::Migration(e.to_string()))
    }

    /// Get a reference to the connection pool
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Close the database connection
    pub async fn close(self) {
        self.pool.close().await;
    }

    /// Team directory
    pub fn teams(&self) -> TeamRepository {
        TeamRepository::new(self.pool.clone())
    }

    /// User registry
    pub fn users(&self) -> UserRepository {
        UserRepository::new(self.pool.clone())
    }

    /// Pull request lifecycle and reviewer assignment
    pub fn pull_requests(&self, tie_break: TieBreak) -> PullRequestRepository {
        PullRequestRepository::new(self.pool.clone(), tie_break)
    }

    /// Review statistics
    pub fn stats(&self) -> StatsRepository {
        StatsRepository::new(self.pool.clone())
    }
}
