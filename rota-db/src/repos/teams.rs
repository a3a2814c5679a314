//! Team directory: team creation and membership lookups

use async_trait::async_trait;
use chrono::Utc;
use rota_core::{Team, TeamDirectory, TeamMember};
use sqlx::SqlitePool;
use tracing::info;

use super::begin_write;
use crate::Result;

#[derive(sqlx::FromRow)]
struct MemberRow {
    id: String,
    username: String,
    is_active: bool,
}

impl From<MemberRow> for TeamMember {
    fn from(row: MemberRow) -> Self {
        TeamMember::new(row.id, row.username, row.is_active)
    }
}

/// Repository for teams and their members
#[derive(Clone)]
pub struct TeamRepository {
    pool: SqlitePool,
}

impl TeamRepository {
    /// Create a new team repository
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Create a team and all of its members atomically
    ///
    /// A name collision surfaces as `Conflict(TeamExists)`.
    pub async fn create(&self, team: &Team) -> Result<Team> {
        team.validate()?;

        let now = Utc::now();
        let mut tx = begin_write(&self.pool).await?;

        sqlx::query("INSERT INTO teams (name, created_at) VALUES (?, ?)")
            .bind(&team.team_name)
            .bind(now)
            .execute(&mut *tx)
            .await?;

        for member in &team.members {
            sqlx::query(
                r#"
                INSERT INTO users (id, username, team_name, is_active, created_at)
                VALUES (?, ?, ?, ?, ?)
                "#,
            )
            .bind(&member.user_id)
            .bind(&member.username)
            .bind(&team.team_name)
            .bind(member.is_active)
            .bind(now)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;

        info!(
            team_name = %team.team_name,
            members = team.members.len(),
            "Team created"
        );
        Ok(team.clone())
    }

    /// Get a team with its members in the order they were added
    ///
    /// A team with no members on record is reported as not found.
    pub async fn get(&self, team_name: &str) -> Result<Team> {
        let members = sqlx::query_as::<_, MemberRow>(
            "SELECT id, username, is_active FROM users WHERE team_name = ? ORDER BY rowid",
        )
        .bind(team_name)
        .fetch_all(&self.pool)
        .await?;

        if members.is_empty() {
            return Err(rota_core::Error::NotFound(format!("team {}", team_name)).into());
        }

        Ok(Team::new(
            team_name,
            members.into_iter().map(TeamMember::from).collect(),
        ))
    }
}

#[async_trait]
impl TeamDirectory for TeamRepository {
    async fn create_team(&self, team: &Team) -> rota_core::Result<Team> {
        Ok(self.create(team).await?)
    }

    async fn get_team(&self, team_name: &str) -> rota_core::Result<Team> {
        Ok(self.get(team_name).await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repos::test_support::seed_team;
    use crate::Database;
    use rota_core::ConflictReason;

    #[tokio::test]
    async fn test_create_and_get() {
        let db = Database::in_memory().await.unwrap();
        seed_team(&db, "backend", &[("u1", true), ("u2", false), ("u3", true)]).await;

        let team = db.teams().get("backend").await.unwrap();
        assert_eq!(team.team_name, "backend");
        let ids: Vec<_> = team.members.iter().map(|m| m.user_id.as_str()).collect();
        assert_eq!(ids, vec!["u1", "u2", "u3"]);
        assert!(!team.members[1].is_active);
    }

    #[tokio::test]
    async fn test_duplicate_team_name() {
        let db = Database::in_memory().await.unwrap();
        seed_team(&db, "backend", &[("u1", true)]).await;

        let again = Team::new("backend", vec![TeamMember::new("u9", "Zed", true)]);
        let err: rota_core::Error = db.teams().create(&again).await.unwrap_err().into();
        assert_eq!(err.conflict_reason(), Some(ConflictReason::TeamExists));

        // The failed attempt left nothing behind
        let team = db.teams().get("backend").await.unwrap();
        assert_eq!(team.members.len(), 1);
    }

    #[tokio::test]
    async fn test_member_collision_rolls_back_whole_team() {
        let db = Database::in_memory().await.unwrap();
        seed_team(&db, "backend", &[("u1", true)]).await;

        let other = Team::new(
            "frontend",
            vec![
                TeamMember::new("u2", "Bob", true),
                TeamMember::new("u1", "Alice", true),
            ],
        );
        let err: rota_core::Error = db.teams().create(&other).await.unwrap_err().into();
        assert!(matches!(err, rota_core::Error::Internal(_)));

        let err: rota_core::Error = db.teams().get("frontend").await.unwrap_err().into();
        assert!(err.is_not_found());
    }

    #[tokio::test]
    async fn test_unknown_team() {
        let db = Database::in_memory().await.unwrap();
        let err: rota_core::Error = db.teams().get("nobody").await.unwrap_err().into();
        assert!(err.is_not_found());
    }

    #[tokio::test]
    async fn test_invalid_team_is_rejected_before_store() {
        let db = Database::in_memory().await.unwrap();
        let err = db.teams().create_team(&Team::new("", vec![])).await.unwrap_err();
        assert!(matches!(err, rota_core::Error::InvalidInput(_)));
    }
}
