//! Pull request lifecycle and reviewer assignment
//!
//! Every operation that reads eligibility data and then writes runs in one
//! transaction, so the load snapshot used for ranking is the one the write
//! is applied against. Returning early drops the transaction, which rolls it
//! back.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rota_core::models::MAX_REVIEWERS;
use rota_core::{
    ConflictReason, NewPullRequest, PullRequest, PullRequestShort, PullRequestStatus,
    Reassignment, ReviewEngine, TieBreak,
};
use sqlx::{SqliteConnection, SqlitePool};
use tracing::{debug, info};

use super::begin_write;
use crate::Result;

#[derive(sqlx::FromRow)]
struct PullRequestRow {
    id: String,
    name: String,
    author_id: String,
    status: String,
    created_at: DateTime<Utc>,
    merged_at: Option<DateTime<Utc>>,
}

impl PullRequestRow {
    fn into_model(self, assigned_reviewers: Vec<String>) -> Result<PullRequest> {
        Ok(PullRequest {
            pull_request_id: self.id,
            pull_request_name: self.name,
            author_id: self.author_id,
            status: self.status.parse()?,
            assigned_reviewers,
            created_at: self.created_at,
            merged_at: self.merged_at,
        })
    }
}

#[derive(sqlx::FromRow)]
struct ShortRow {
    id: String,
    name: String,
    author_id: String,
    status: String,
}

impl ShortRow {
    fn into_model(self) -> Result<PullRequestShort> {
        Ok(PullRequestShort {
            pull_request_id: self.id,
            pull_request_name: self.name,
            author_id: self.author_id,
            status: self.status.parse()?,
        })
    }
}

/// Repository for pull requests and their reviewer links
#[derive(Clone)]
pub struct PullRequestRepository {
    pool: SqlitePool,
    tie_break: TieBreak,
}

impl PullRequestRepository {
    /// Create a new pull request repository
    ///
    /// `tie_break` orders candidates that carry the same open review load.
    pub fn new(pool: SqlitePool, tie_break: TieBreak) -> Self {
        Self { pool, tie_break }
    }

    /// Open a pull request and assign up to two of the author's teammates
    ///
    /// Candidates are the author's active teammates ranked by open review
    /// load, least loaded first.
    pub async fn create(&self, new_pr: &NewPullRequest) -> Result<PullRequest> {
        new_pr.validate()?;

        let created_at = Utc::now();
        let mut tx = begin_write(&self.pool).await?;

        let team_name: String = sqlx::query_scalar("SELECT team_name FROM users WHERE id = ?")
            .bind(&new_pr.author_id)
            .fetch_optional(&mut *tx)
            .await?
            .ok_or_else(|| {
                rota_core::Error::NotFound(format!("author {}", new_pr.author_id))
            })?;

        // Written before ranking so the transaction holds the write lock
        // while it reads reviewer load.
        sqlx::query(
            r#"
            INSERT INTO pull_requests (id, name, author_id, status, created_at)
            VALUES (?, ?, ?, ?, ?)
            "#,
        )
        .bind(&new_pr.pull_request_id)
        .bind(&new_pr.pull_request_name)
        .bind(&new_pr.author_id)
        .bind(PullRequestStatus::Open.as_str())
        .bind(created_at)
        .execute(&mut *tx)
        .await?;

        let reviewers = rank_candidates(
            &mut tx,
            self.tie_break,
            &team_name,
            &[new_pr.author_id.as_str()],
            MAX_REVIEWERS,
        )
        .await?;

        for (position, reviewer_id) in reviewers.iter().enumerate() {
            sqlx::query(
                "INSERT INTO reviewers (pull_request_id, reviewer_id, position) VALUES (?, ?, ?)",
            )
            .bind(&new_pr.pull_request_id)
            .bind(reviewer_id)
            .bind(position as i64)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;

        info!(
            pr_id = %new_pr.pull_request_id,
            author_id = %new_pr.author_id,
            reviewers = ?reviewers,
            "Pull request created"
        );

        Ok(PullRequest {
            pull_request_id: new_pr.pull_request_id.clone(),
            pull_request_name: new_pr.pull_request_name.clone(),
            author_id: new_pr.author_id.clone(),
            status: PullRequestStatus::Open,
            assigned_reviewers: reviewers,
            created_at,
            merged_at: None,
        })
    }

    /// Find a pull request by id, with its reviewers
    pub async fn get(&self, pull_request_id: &str) -> Result<PullRequest> {
        let mut conn = self.pool.acquire().await?;
        let row = fetch_pull_request(&mut conn, pull_request_id).await?;
        let reviewers = fetch_reviewers(&mut conn, pull_request_id).await?;
        row.into_model(reviewers)
    }

    /// Mark a pull request as merged
    ///
    /// Merging is idempotent: an already merged pull request is returned as
    /// is and keeps its first merge timestamp. Reviewer links stay in place
    /// and stop counting toward open load.
    pub async fn merge(&self, pull_request_id: &str) -> Result<PullRequest> {
        let mut tx = begin_write(&self.pool).await?;

        let mut row = fetch_pull_request(&mut tx, pull_request_id).await?;

        if row.merged_at.is_none() {
            let merged_at = Utc::now();
            sqlx::query(
                "UPDATE pull_requests SET status = ?, merged_at = ? WHERE id = ? AND merged_at IS NULL",
            )
            .bind(PullRequestStatus::Merged.as_str())
            .bind(merged_at)
            .bind(pull_request_id)
            .execute(&mut *tx)
            .await?;

            row.status = PullRequestStatus::Merged.as_str().to_string();
            row.merged_at = Some(merged_at);
            info!(pr_id = %pull_request_id, "Pull request merged");
        } else {
            debug!(pr_id = %pull_request_id, "Pull request already merged");
        }

        let reviewers = fetch_reviewers(&mut tx, pull_request_id).await?;
        tx.commit().await?;

        row.into_model(reviewers)
    }

    /// Replace one reviewer with the least loaded eligible teammate
    ///
    /// The author, the reviewer being replaced and any other current reviewer
    /// are never picked. The other reviewer keeps their link.
    pub async fn reassign(&self, pull_request_id: &str, old_user_id: &str) -> Result<Reassignment> {
        let mut tx = begin_write(&self.pool).await?;

        let old_user: Option<String> = sqlx::query_scalar("SELECT id FROM users WHERE id = ?")
            .bind(old_user_id)
            .fetch_optional(&mut *tx)
            .await?;
        if old_user.is_none() {
            return Err(rota_core::Error::NotFound(format!("user {}", old_user_id)).into());
        }

        let row = fetch_pull_request(&mut tx, pull_request_id).await?;
        if row.merged_at.is_some() {
            return Err(rota_core::Error::Conflict(ConflictReason::PrMerged).into());
        }

        let mut reviewers = fetch_reviewers(&mut tx, pull_request_id).await?;
        if !reviewers.iter().any(|r| r == old_user_id) {
            return Err(rota_core::Error::Conflict(ConflictReason::NotAssigned).into());
        }

        let team_name: String = sqlx::query_scalar("SELECT team_name FROM users WHERE id = ?")
            .bind(&row.author_id)
            .fetch_one(&mut *tx)
            .await?;

        let mut protected: Vec<&str> = vec![row.author_id.as_str(), old_user_id];
        protected.extend(
            reviewers
                .iter()
                .map(String::as_str)
                .filter(|r| *r != old_user_id && *r != row.author_id),
        );

        let new_reviewer = rank_candidates(&mut tx, self.tie_break, &team_name, &protected, 1)
            .await?
            .pop()
            .ok_or(rota_core::Error::Conflict(ConflictReason::NoCandidate))?;

        sqlx::query(
            "UPDATE reviewers SET reviewer_id = ? WHERE pull_request_id = ? AND reviewer_id = ?",
        )
        .bind(&new_reviewer)
        .bind(pull_request_id)
        .bind(old_user_id)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;

        for reviewer in reviewers.iter_mut().filter(|r| *r == old_user_id) {
            *reviewer = new_reviewer.clone();
        }

        info!(
            pr_id = %pull_request_id,
            old_reviewer = %old_user_id,
            new_reviewer = %new_reviewer,
            "Reviewer reassigned"
        );

        Ok(Reassignment {
            pr: row.into_model(reviewers)?,
            replaced_by: new_reviewer,
        })
    }

    /// Pull requests the user reviews, open and merged alike
    pub async fn review_queue(&self, user_id: &str) -> Result<Vec<PullRequestShort>> {
        let mut conn = self.pool.acquire().await?;

        let user: Option<String> = sqlx::query_scalar("SELECT id FROM users WHERE id = ?")
            .bind(user_id)
            .fetch_optional(&mut *conn)
            .await?;
        if user.is_none() {
            return Err(rota_core::Error::NotFound(format!("user {}", user_id)).into());
        }

        sqlx::query_as::<_, ShortRow>(
            r#"
            SELECT pr.id, pr.name, pr.author_id, pr.status
            FROM pull_requests AS pr
            INNER JOIN reviewers AS r ON r.pull_request_id = pr.id
            WHERE r.reviewer_id = ?
            ORDER BY pr.created_at, pr.id
            "#,
        )
        .bind(user_id)
        .fetch_all(&mut *conn)
        .await?
        .into_iter()
        .map(ShortRow::into_model)
        .collect()
    }
}

#[async_trait]
impl ReviewEngine for PullRequestRepository {
    async fn create_pull_request(&self, new_pr: &NewPullRequest) -> rota_core::Result<PullRequest> {
        Ok(self.create(new_pr).await?)
    }

    async fn merge_pull_request(&self, pull_request_id: &str) -> rota_core::Result<PullRequest> {
        Ok(self.merge(pull_request_id).await?)
    }

    async fn reassign_reviewer(
        &self,
        pull_request_id: &str,
        old_user_id: &str,
    ) -> rota_core::Result<Reassignment> {
        Ok(self.reassign(pull_request_id, old_user_id).await?)
    }

    async fn review_queue(&self, user_id: &str) -> rota_core::Result<Vec<PullRequestShort>> {
        Ok(PullRequestRepository::review_queue(self, user_id).await?)
    }
}

async fn fetch_pull_request(
    conn: &mut SqliteConnection,
    pull_request_id: &str,
) -> Result<PullRequestRow> {
    sqlx::query_as::<_, PullRequestRow>(
        "SELECT id, name, author_id, status, created_at, merged_at FROM pull_requests WHERE id = ?",
    )
    .bind(pull_request_id)
    .fetch_optional(&mut *conn)
    .await?
    .ok_or_else(|| rota_core::Error::NotFound(format!("pull request {}", pull_request_id)).into())
}

async fn fetch_reviewers(conn: &mut SqliteConnection, pull_request_id: &str) -> Result<Vec<String>> {
    Ok(sqlx::query_scalar(
        "SELECT reviewer_id FROM reviewers WHERE pull_request_id = ? ORDER BY position",
    )
    .bind(pull_request_id)
    .fetch_all(&mut *conn)
    .await?)
}

/// Active members of `team_name`, least open review load first
///
/// Load is the number of reviewer links on OPEN pull requests. Counting,
/// ordering and limiting happen in a single statement on the caller's
/// connection so the ranking shares the caller's transaction.
async fn rank_candidates(
    conn: &mut SqliteConnection,
    tie_break: TieBreak,
    team_name: &str,
    excluded: &[&str],
    limit: usize,
) -> Result<Vec<String>> {
    let sql = ranking_query(excluded.len(), tie_break);

    let mut query = sqlx::query_scalar::<_, String>(&sql).bind(team_name);
    for user_id in excluded {
        query = query.bind(*user_id);
    }

    Ok(query.bind(limit as i64).fetch_all(&mut *conn).await?)
}

fn ranking_query(excluded: usize, tie_break: TieBreak) -> String {
    let placeholders = vec!["?"; excluded.max(1)].join(", ");
    let secondary = match tie_break {
        TieBreak::Natural => "",
        TieBreak::UserId => ", u.id ASC",
        TieBreak::UserIdDesc => ", u.id DESC",
    };

    format!(
        r#"
        SELECT u.id
        FROM users AS u
        LEFT JOIN reviewers AS r ON r.reviewer_id = u.id
        LEFT JOIN pull_requests AS pr ON pr.id = r.pull_request_id AND pr.status = 'OPEN'
        WHERE u.team_name = ? AND u.is_active = 1 AND u.id NOT IN ({placeholders})
        GROUP BY u.id
        ORDER BY COUNT(pr.id) ASC{secondary}
        LIMIT ?
        "#
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repos::test_support::seed_team;
    use crate::Database;

    async fn setup(members: &[(&str, bool)]) -> Database {
        let db = Database::in_memory().await.unwrap();
        seed_team(&db, "alpha", members).await;
        db
    }

    fn engine(db: &Database) -> PullRequestRepository {
        db.pull_requests(TieBreak::UserId)
    }

    fn conflict(result: Result<impl std::fmt::Debug>) -> Option<ConflictReason> {
        let err: rota_core::Error = result.unwrap_err().into();
        err.conflict_reason()
    }

    #[test]
    fn test_ranking_query_placeholders() {
        let sql = ranking_query(3, TieBreak::UserIdDesc);
        assert!(sql.contains("NOT IN (?, ?, ?)"));
        assert!(sql.contains("ORDER BY COUNT(pr.id) ASC, u.id DESC"));

        let sql = ranking_query(1, TieBreak::Natural);
        assert!(sql.contains("NOT IN (?)"));
        assert!(sql.contains("ORDER BY COUNT(pr.id) ASC\n"));
    }

    #[tokio::test]
    async fn test_create_assigns_two_least_loaded() {
        let db = setup(&[("a", true), ("b", true), ("c", true), ("d", true)]).await;
        let repo = engine(&db);

        let pr1 = repo.create(&NewPullRequest::new("p1", "First", "a")).await.unwrap();
        assert_eq!(pr1.assigned_reviewers, vec!["b", "c"]);
        assert_eq!(pr1.status, PullRequestStatus::Open);
        assert!(pr1.merged_at.is_none());

        // b and c now carry one open review each, d carries none
        let pr2 = repo.create(&NewPullRequest::new("p2", "Second", "a")).await.unwrap();
        assert_eq!(pr2.assigned_reviewers[0], "d");
        assert_eq!(pr2.assigned_reviewers.len(), 2);
    }

    #[tokio::test]
    async fn test_create_skips_inactive_and_author() {
        let db = setup(&[("a", true), ("b", false), ("c", true)]).await;

        let pr = engine(&db)
            .create(&NewPullRequest::new("p1", "Only one", "a"))
            .await
            .unwrap();
        assert_eq!(pr.assigned_reviewers, vec!["c"]);
    }

    #[tokio::test]
    async fn test_create_sole_member_gets_no_reviewers() {
        let db = setup(&[("a", true)]).await;

        let pr = engine(&db)
            .create(&NewPullRequest::new("p1", "Solo", "a"))
            .await
            .unwrap();
        assert!(pr.assigned_reviewers.is_empty());
    }

    #[tokio::test]
    async fn test_create_unknown_author() {
        let db = setup(&[("a", true)]).await;

        let err: rota_core::Error = engine(&db)
            .create(&NewPullRequest::new("p1", "Ghost", "zz"))
            .await
            .unwrap_err()
            .into();
        assert!(err.is_not_found());
    }

    #[tokio::test]
    async fn test_create_duplicate_id_keeps_first() {
        let db = setup(&[("a", true), ("b", true), ("c", true), ("d", true)]).await;
        let repo = engine(&db);

        let first = repo.create(&NewPullRequest::new("p1", "First", "a")).await.unwrap();

        let again = repo.create(&NewPullRequest::new("p1", "Again", "b")).await;
        assert_eq!(conflict(again), Some(ConflictReason::PrExists));

        let stored = repo.get("p1").await.unwrap();
        assert_eq!(stored.pull_request_name, "First");
        assert_eq!(stored.assigned_reviewers, first.assigned_reviewers);
    }

    #[tokio::test]
    async fn test_merged_reviews_do_not_count_as_load() {
        let db = setup(&[("a", true), ("b", true), ("c", true), ("d", true)]).await;
        let repo = engine(&db);

        repo.create(&NewPullRequest::new("p1", "First", "a")).await.unwrap();
        repo.merge("p1").await.unwrap();

        // b and c are free again, so the lowest ids win the tie
        let pr = repo.create(&NewPullRequest::new("p2", "Second", "a")).await.unwrap();
        assert_eq!(pr.assigned_reviewers, vec!["b", "c"]);
    }

    #[tokio::test]
    async fn test_tie_break_desc() {
        let db = setup(&[("a", true), ("b", true), ("c", true), ("d", true)]).await;

        let pr = db
            .pull_requests(TieBreak::UserIdDesc)
            .create(&NewPullRequest::new("p1", "First", "a"))
            .await
            .unwrap();
        assert_eq!(pr.assigned_reviewers, vec!["d", "c"]);
    }

    #[tokio::test]
    async fn test_merge_sets_timestamp_once() {
        let db = setup(&[("a", true), ("b", true)]).await;
        let repo = engine(&db);
        repo.create(&NewPullRequest::new("p1", "First", "a")).await.unwrap();

        let merged = repo.merge("p1").await.unwrap();
        assert!(merged.is_merged());
        assert_eq!(merged.assigned_reviewers, vec!["b"]);
        assert!(merged.merged_at.unwrap() >= merged.created_at);

        let stored = repo.get("p1").await.unwrap().merged_at;
        assert!(stored.is_some());

        let again = repo.merge("p1").await.unwrap();
        assert_eq!(again.merged_at, stored);
        assert_eq!(again.status, PullRequestStatus::Merged);
    }

    #[tokio::test]
    async fn test_merge_unknown() {
        let db = setup(&[("a", true)]).await;
        let err: rota_core::Error = engine(&db).merge("nope").await.unwrap_err().into();
        assert!(err.is_not_found());
    }

    #[tokio::test]
    async fn test_reassign_picks_least_loaded_outsider() {
        let db = setup(&[("a", true), ("b", true), ("c", true), ("d", true), ("e", true)]).await;
        let repo = engine(&db);

        // p0 loads a and c, leaving e as the lightest outsider for p1
        let p0 = repo.create(&NewPullRequest::new("p0", "Zero", "b")).await.unwrap();
        assert_eq!(p0.assigned_reviewers, vec!["a", "c"]);
        let p1 = repo.create(&NewPullRequest::new("p1", "One", "a")).await.unwrap();
        assert_eq!(p1.assigned_reviewers, vec!["b", "d"]);

        let result = repo.reassign("p1", "b").await.unwrap();
        assert_eq!(result.replaced_by, "e");
        assert_eq!(result.pr.assigned_reviewers, vec!["e", "d"]);
        assert_eq!(result.pr.status, PullRequestStatus::Open);

        let stored = repo.get("p1").await.unwrap();
        assert_eq!(stored.assigned_reviewers, vec!["e", "d"]);
    }

    #[tokio::test]
    async fn test_reassign_single_reviewer_excludes_only_author_and_old() {
        let db = setup(&[("a", true), ("b", true), ("c", false)]).await;
        let repo = engine(&db);

        let pr = repo.create(&NewPullRequest::new("p1", "One", "a")).await.unwrap();
        assert_eq!(pr.assigned_reviewers, vec!["b"]);

        db.users().set_is_active("c", true).await.unwrap();
        let result = repo.reassign("p1", "b").await.unwrap();
        assert_eq!(result.replaced_by, "c");
        assert_eq!(result.pr.assigned_reviewers, vec!["c"]);
    }

    #[tokio::test]
    async fn test_reassign_rejections() {
        let db = setup(&[("a", true), ("b", true), ("c", true)]).await;
        let repo = engine(&db);
        repo.create(&NewPullRequest::new("p1", "One", "a")).await.unwrap();

        let err: rota_core::Error = repo.reassign("p1", "ghost").await.unwrap_err().into();
        assert!(err.is_not_found());

        let err: rota_core::Error = repo.reassign("nope", "b").await.unwrap_err().into();
        assert!(err.is_not_found());

        assert_eq!(
            conflict(repo.reassign("p1", "a").await),
            Some(ConflictReason::NotAssigned)
        );
        assert_eq!(
            conflict(repo.reassign("p1", "b").await),
            Some(ConflictReason::NoCandidate)
        );

        repo.merge("p1").await.unwrap();
        assert_eq!(
            conflict(repo.reassign("p1", "b").await),
            Some(ConflictReason::PrMerged)
        );

        let stored = repo.get("p1").await.unwrap();
        assert_eq!(stored.assigned_reviewers, vec!["b", "c"]);
    }

    #[tokio::test]
    async fn test_review_queue() {
        let db = setup(&[("a", true), ("b", true), ("c", true)]).await;
        let repo = engine(&db);

        repo.create(&NewPullRequest::new("p1", "One", "a")).await.unwrap();
        repo.create(&NewPullRequest::new("p2", "Two", "c")).await.unwrap();
        repo.merge("p1").await.unwrap();

        let queue = repo.review_queue("b").await.unwrap();
        let ids: Vec<_> = queue.iter().map(|p| p.pull_request_id.as_str()).collect();
        assert_eq!(ids, vec!["p1", "p2"]);
        assert_eq!(queue[0].status, PullRequestStatus::Merged);
        assert_eq!(queue[1].status, PullRequestStatus::Open);

        assert!(repo.review_queue("a").await.unwrap().len() == 1);

        let err: rota_core::Error = repo.review_queue("ghost").await.unwrap_err().into();
        assert!(err.is_not_found());
    }
}
