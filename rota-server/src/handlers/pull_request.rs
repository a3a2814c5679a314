//! Pull request lifecycle routes

use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use rota_core::{NewPullRequest, PullRequest, Reassignment};
use serde::{Deserialize, Serialize};

use crate::error::{require, ApiError};
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct MergeRequest {
    pub pull_request_id: String,
}

#[derive(Debug, Deserialize)]
pub struct ReassignRequest {
    pub pull_request_id: String,
    pub old_user_id: String,
}

#[derive(Debug, Serialize)]
pub struct PullRequestResponse {
    pub pr: PullRequest,
}

/// `POST /pullRequest/create`
pub async fn create(
    State(state): State<AppState>,
    payload: Result<Json<NewPullRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<PullRequestResponse>), ApiError> {
    let Json(new_pr) = payload?;
    let pr = state.engine.create_pull_request(&new_pr).await?;
    Ok((StatusCode::CREATED, Json(PullRequestResponse { pr })))
}

/// `POST /pullRequest/merge`
pub async fn merge(
    State(state): State<AppState>,
    payload: Result<Json<MergeRequest>, JsonRejection>,
) -> Result<Json<PullRequestResponse>, ApiError> {
    let Json(request) = payload?;
    require("pull_request_id", &request.pull_request_id)?;

    let pr = state
        .engine
        .merge_pull_request(&request.pull_request_id)
        .await?;
    Ok(Json(PullRequestResponse { pr }))
}

/// `POST /pullRequest/reassign`
pub async fn reassign(
    State(state): State<AppState>,
    payload: Result<Json<ReassignRequest>, JsonRejection>,
) -> Result<Json<Reassignment>, ApiError> {
    let Json(request) = payload?;
    require("pull_request_id", &request.pull_request_id)?;
    require("old_user_id", &request.old_user_id)?;

    let result = state
        .engine
        .reassign_reviewer(&request.pull_request_id, &request.old_user_id)
        .await?;
    Ok(Json(result))
}
