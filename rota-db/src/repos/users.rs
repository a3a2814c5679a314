//! User registry: active flag and identity lookups

use async_trait::async_trait;
use rota_core::{User, UserRegistry};
use sqlx::SqlitePool;
use tracing::info;

use super::begin_write;
use crate::Result;

#[derive(sqlx::FromRow)]
struct UserRow {
    id: String,
    username: String,
    team_name: String,
    is_active: bool,
}

impl From<UserRow> for User {
    fn from(row: UserRow) -> Self {
        User {
            user_id: row.id,
            username: row.username,
            team_name: row.team_name,
            is_active: row.is_active,
        }
    }
}

/// Repository for users
#[derive(Clone)]
pub struct UserRepository {
    pool: SqlitePool,
}

impl UserRepository {
    /// Create a new user repository
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Find a user by id
    pub async fn get(&self, user_id: &str) -> Result<User> {
        sqlx::query_as::<_, UserRow>(
            "SELECT id, username, team_name, is_active FROM users WHERE id = ?",
        )
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?
        .map(User::from)
        .ok_or_else(|| rota_core::Error::NotFound(format!("user {}", user_id)).into())
    }

    /// Set a user's active flag and return the updated user
    ///
    /// Existing reviewer links are left alone; the flag only affects future
    /// candidate selection.
    pub async fn set_is_active(&self, user_id: &str, is_active: bool) -> Result<User> {
        let mut tx = begin_write(&self.pool).await?;

        let updated = sqlx::query("UPDATE users SET is_active = ? WHERE id = ?")
            .bind(is_active)
            .bind(user_id)
            .execute(&mut *tx)
            .await?
            .rows_affected();

        if updated == 0 {
            return Err(rota_core::Error::NotFound(format!("user {}", user_id)).into());
        }

        let user = sqlx::query_as::<_, UserRow>(
            "SELECT id, username, team_name, is_active FROM users WHERE id = ?",
        )
        .bind(user_id)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;

        info!(user_id, is_active, "User active flag updated");
        Ok(user.into())
    }
}

#[async_trait]
impl UserRegistry for UserRepository {
    async fn set_is_active(&self, user_id: &str, is_active: bool) -> rota_core::Result<User> {
        Ok(UserRepository::set_is_active(self, user_id, is_active).await?)
    }
}
