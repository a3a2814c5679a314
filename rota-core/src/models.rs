//! Domain entities shared by the store and the HTTP layer
//!
//! Field names follow the public JSON contract, so these types are serialized
//! as-is by the server.

use std::collections::HashSet;
use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{Error, Result};

/// Most reviewers a pull request gets on creation
pub const MAX_REVIEWERS: usize = 2;

/// Pull request lifecycle status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum PullRequestStatus {
    Open,
    Merged,
}

impl PullRequestStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            PullRequestStatus::Open => "OPEN",
            PullRequestStatus::Merged => "MERGED",
        }
    }
}

impl fmt::Display for PullRequestStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PullRequestStatus {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "OPEN" => Ok(PullRequestStatus::Open),
            "MERGED" => Ok(PullRequestStatus::Merged),
            other => Err(Error::Internal(format!(
                "unknown pull request status: {}",
                other
            ))),
        }
    }
}

/// Member entry inside a team
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TeamMember {
    pub user_id: String,
    pub username: String,
    pub is_active: bool,
}

impl TeamMember {
    pub fn new(user_id: impl Into<String>, username: impl Into<String>, is_active: bool) -> Self {
        Self {
            user_id: user_id.into(),
            username: username.into(),
            is_active,
        }
    }
}

/// A team and its members, in the order they were added
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Team {
    pub team_name: String,
    pub members: Vec<TeamMember>,
}

impl Team {
    pub fn new(team_name: impl Into<String>, members: Vec<TeamMember>) -> Self {
        Self {
            team_name: team_name.into(),
            members,
        }
    }

    /// Reject blank names and duplicate member ids
    pub fn validate(&self) -> Result<()> {
        require_non_empty("team_name", &self.team_name)?;

        let mut seen = HashSet::new();
        for member in &self.members {
            require_non_empty("user_id", &member.user_id)?;
            if !seen.insert(member.user_id.as_str()) {
                return Err(Error::InvalidInput(format!(
                    "duplicate member {} in team {}",
                    member.user_id, self.team_name
                )));
            }
        }

        Ok(())
    }
}

/// A user as seen by the registry
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub user_id: String,
    pub username: String,
    pub team_name: String,
    pub is_active: bool,
}

/// Request to open a pull request
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewPullRequest {
    pub pull_request_id: String,
    pub pull_request_name: String,
    pub author_id: String,
}

impl NewPullRequest {
    pub fn new(
        pull_request_id: impl Into<String>,
        pull_request_name: impl Into<String>,
        author_id: impl Into<String>,
    ) -> Self {
        Self {
            pull_request_id: pull_request_id.into(),
            pull_request_name: pull_request_name.into(),
            author_id: author_id.into(),
        }
    }

    pub fn validate(&self) -> Result<()> {
        require_non_empty("pull_request_id", &self.pull_request_id)?;
        require_non_empty("pull_request_name", &self.pull_request_name)?;
        require_non_empty("author_id", &self.author_id)
    }
}

/// Full pull request with its current reviewers
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PullRequest {
    pub pull_request_id: String,
    pub pull_request_name: String,
    pub author_id: String,
    pub status: PullRequestStatus,
    /// Reviewer ids in assignment order
    pub assigned_reviewers: Vec<String>,
    #[serde(rename = "createdAt")]
    pub created_at: DateTime<Utc>,
    #[serde(rename = "mergedAt")]
    pub merged_at: Option<DateTime<Utc>>,
}

impl PullRequest {
    pub fn is_merged(&self) -> bool {
        self.status == PullRequestStatus::Merged
    }
}

/// Pull request summary used in review queues
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PullRequestShort {
    pub pull_request_id: String,
    pub pull_request_name: String,
    pub author_id: String,
    pub status: PullRequestStatus,
}

/// Outcome of replacing one reviewer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Reassignment {
    pub pr: PullRequest,
    pub replaced_by: String,
}

/// Review load of a single user
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserStat {
    pub user_id: String,
    /// Reviewer links ever held, merged pull requests included
    pub count_pr: i64,
    /// Mean hours from creation to merge over merged reviews
    pub avg_duration: Option<f64>,
    pub is_active: bool,
}

/// Review load of every member of a team
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TeamStat {
    pub team_name: String,
    pub users_stat: Vec<UserStat>,
    /// Mean of member averages, `-1` when nobody has a merged review
    pub avg_duration: f64,
}

fn require_non_empty(field: &str, value: &str) -> Result<()> {
    if value.trim().is_empty() {
        return Err(Error::InvalidInput(format!("{} must not be empty", field)));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_round_trips_through_str() {
        assert_eq!("OPEN".parse::<PullRequestStatus>().unwrap(), PullRequestStatus::Open);
        assert_eq!(PullRequestStatus::Merged.as_str(), "MERGED");
        assert!("CLOSED".parse::<PullRequestStatus>().is_err());
    }

    #[test]
    fn test_pull_request_json_field_names() {
        let pr = PullRequest {
            pull_request_id: "pr-1".to_string(),
            pull_request_name: "Add search".to_string(),
            author_id: "u1".to_string(),
            status: PullRequestStatus::Open,
            assigned_reviewers: vec!["u2".to_string()],
            created_at: Utc::now(),
            merged_at: None,
        };

        let value = serde_json::to_value(&pr).unwrap();
        assert_eq!(value["status"], "OPEN");
        assert_eq!(value["assigned_reviewers"][0], "u2");
        assert!(value["mergedAt"].is_null());
        assert!(value.get("createdAt").is_some());
    }

    #[test]
    fn test_team_validation() {
        let team = Team::new(
            "backend",
            vec![
                TeamMember::new("u1", "Alice", true),
                TeamMember::new("u2", "Bob", false),
            ],
        );
        assert!(team.validate().is_ok());

        let blank = Team::new("  ", vec![]);
        assert!(matches!(blank.validate(), Err(Error::InvalidInput(_))));

        let duplicate = Team::new(
            "backend",
            vec![
                TeamMember::new("u1", "Alice", true),
                TeamMember::new("u1", "Alice again", true),
            ],
        );
        assert!(matches!(duplicate.validate(), Err(Error::InvalidInput(_))));
    }

    #[test]
    fn test_new_pull_request_validation() {
        assert!(NewPullRequest::new("pr-1", "Fix", "u1").validate().is_ok());
        assert!(NewPullRequest::new("", "Fix", "u1").validate().is_err());
        assert!(NewPullRequest::new("pr-1", "Fix", "").validate().is_err());
    }

    #[test]
    fn test_user_stat_serializes_missing_average_as_null() {
        let stat = UserStat {
            user_id: "u1".to_string(),
            count_pr: 0,
            avg_duration: None,
            is_active: true,
        };
        let value = serde_json::to_value(&stat).unwrap();
        assert!(value["avg_duration"].is_null());
        assert_eq!(value["count_pr"], 0);
    }
}
