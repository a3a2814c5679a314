//! Error types for rota

use std::fmt;

use thiserror::Error;

/// Result type alias for rota operations
pub type Result<T> = std::result::Result<T, Error>;

/// Business rule that rejected an operation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConflictReason {
    /// A team with this name is already on record
    TeamExists,
    /// A pull request with this id is already on record
    PrExists,
    /// Reviewers cannot change once a pull request is merged
    PrMerged,
    /// The user is not a reviewer of this pull request
    NotAssigned,
    /// Nobody in the author's team can take over the review
    NoCandidate,
}

impl ConflictReason {
    /// Stable machine-readable code
    pub fn code(&self) -> &'static str {
        match self {
            ConflictReason::TeamExists => "TEAM_EXISTS",
            ConflictReason::PrExists => "PR_EXISTS",
            ConflictReason::PrMerged => "PR_MERGED",
            ConflictReason::NotAssigned => "NOT_ASSIGNED",
            ConflictReason::NoCandidate => "NO_CANDIDATE",
        }
    }

    /// Human readable description
    pub fn message(&self) -> &'static str {
        match self {
            ConflictReason::TeamExists => "team_name already exists",
            ConflictReason::PrExists => "PR id already exists",
            ConflictReason::PrMerged => "cannot reassign on merged PR",
            ConflictReason::NotAssigned => "reviewer is not assigned to this PR",
            ConflictReason::NoCandidate => "no active replacement candidate in team",
        }
    }
}

impl fmt::Display for ConflictReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.message())
    }
}

/// Error type for rota operations
#[derive(Error, Debug)]
pub enum Error {
    /// Referenced entity does not exist
    #[error("Not found: {0}")]
    NotFound(String),

    /// Operation rejected by a business rule
    #[error("Conflict: {0}")]
    Conflict(ConflictReason),

    /// Request failed validation before reaching the store
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Store or transport failure that has no business meaning
    #[error("Internal error: {0}")]
    Internal(String),
}

impl Error {
    /// The conflict reason, if this is a business rule rejection
    pub fn conflict_reason(&self) -> Option<ConflictReason> {
        match self {
            Error::Conflict(reason) => Some(*reason),
            _ => None,
        }
    }

    /// Whether a referenced entity was missing
    pub fn is_not_found(&self) -> bool {
        matches!(self, Error::NotFound(_))
    }
}
