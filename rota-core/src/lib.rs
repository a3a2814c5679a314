//! Rota Core - domain model for review assignment
//!
//! Entities, the error taxonomy, configuration and the component traits
//! shared by the store and the HTTP server.

pub mod config;
pub mod error;
pub mod models;
pub mod service;
pub mod stats;

pub use config::{Config, TieBreak};
pub use error::{ConflictReason, Error, Result};
pub use models::{
    NewPullRequest, PullRequest, PullRequestShort, PullRequestStatus, Reassignment, Team,
    TeamMember, TeamStat, User, UserStat,
};
pub use service::{ReviewEngine, ReviewStatistics, TeamDirectory, UserRegistry};
