//! Operations the delivery layer calls
//!
//! Each trait is one component of the service. The database crate implements
//! them; the HTTP server only sees these traits.

use async_trait::async_trait;

use crate::models::{
    NewPullRequest, PullRequest, PullRequestShort, Reassignment, Team, TeamStat, User, UserStat,
};
use crate::Result;

/// Team existence and membership
#[async_trait]
pub trait TeamDirectory: Send + Sync {
    /// Create a team together with its members
    async fn create_team(&self, team: &Team) -> Result<Team>;

    /// Fetch a team and its members
    async fn get_team(&self, team_name: &str) -> Result<Team>;
}

/// Per-user active flag
#[async_trait]
pub trait UserRegistry: Send + Sync {
    async fn set_is_active(&self, user_id: &str, is_active: bool) -> Result<User>;
}

/// Pull request lifecycle and reviewer assignment
#[async_trait]
pub trait ReviewEngine: Send + Sync {
    /// Open a pull request and assign up to two reviewers
    async fn create_pull_request(&self, new_pr: &NewPullRequest) -> Result<PullRequest>;

    /// Mark a pull request as merged
    async fn merge_pull_request(&self, pull_request_id: &str) -> Result<PullRequest>;

    /// Swap one reviewer for the least loaded eligible teammate
    async fn reassign_reviewer(
        &self,
        pull_request_id: &str,
        old_user_id: &str,
    ) -> Result<Reassignment>;

    /// Pull requests the user is a reviewer of
    async fn review_queue(&self, user_id: &str) -> Result<Vec<PullRequestShort>>;
}

/// Review load statistics
#[async_trait]
pub trait ReviewStatistics: Send + Sync {
    async fn user_statistics(&self, user_id: &str) -> Result<UserStat>;

    async fn team_statistics(&self, team_name: &str) -> Result<TeamStat>;
}
