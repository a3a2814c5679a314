//! Review load statistics
//!
//! Read-only. Team statistics are assembled from one query per member, so a
//! membership change racing with the request may or may not be reflected.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rota_core::stats::{self, ReviewSample};
use rota_core::{ReviewStatistics, TeamStat, UserStat};
use sqlx::SqlitePool;

use crate::Result;

/// Repository computing review statistics
#[derive(Clone)]
pub struct StatsRepository {
    pool: SqlitePool,
}

impl StatsRepository {
    /// Create a new statistics repository
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Statistics over every reviewer link the user ever held
    ///
    /// Users that never reviewed anything still resolve, with a zero count
    /// and no average.
    pub async fn user(&self, user_id: &str) -> Result<UserStat> {
        let is_active: bool = sqlx::query_scalar("SELECT is_active FROM users WHERE id = ?")
            .bind(user_id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| rota_core::Error::NotFound(format!("user {}", user_id)))?;

        let samples: Vec<ReviewSample> = sqlx::query_as::<_, (DateTime<Utc>, Option<DateTime<Utc>>)>(
            r#"
            SELECT pr.created_at, pr.merged_at
            FROM reviewers AS r
            INNER JOIN pull_requests AS pr ON pr.id = r.pull_request_id
            WHERE r.reviewer_id = ?
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?
        .into_iter()
        .map(|(created_at, merged_at)| ReviewSample {
            created_at,
            merged_at,
        })
        .collect();

        Ok(stats::user_stat(user_id, is_active, &samples))
    }

    /// Statistics for every member of a team plus the team-wide average
    pub async fn team(&self, team_name: &str) -> Result<TeamStat> {
        let members: Vec<String> =
            sqlx::query_scalar("SELECT id FROM users WHERE team_name = ? ORDER BY rowid")
                .bind(team_name)
                .fetch_all(&self.pool)
                .await?;

        if members.is_empty() {
            return Err(rota_core::Error::NotFound(format!("team {}", team_name)).into());
        }

        let mut users_stat = Vec::with_capacity(members.len());
        for user_id in &members {
            users_stat.push(self.user(user_id).await?);
        }

        Ok(TeamStat {
            team_name: team_name.to_string(),
            avg_duration: stats::team_average(&users_stat),
            users_stat,
        })
    }
}

#[async_trait]
impl ReviewStatistics for StatsRepository {
    async fn user_statistics(&self, user_id: &str) -> rota_core::Result<UserStat> {
        Ok(self.user(user_id).await?)
    }

    async fn team_statistics(&self, team_name: &str) -> rota_core::Result<TeamStat> {
        Ok(self.team(team_name).await?)
    }
}
