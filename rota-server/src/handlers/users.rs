//! User routes: active flag and review queue

use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::extract::{Query, State};
use axum::Json;
use rota_core::{PullRequestShort, User};
use serde::{Deserialize, Serialize};

use crate::error::{require, ApiError};
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct UserQuery {
    pub user_id: String,
}

#[derive(Debug, Deserialize)]
pub struct SetIsActiveRequest {
    pub user_id: String,
    pub is_active: bool,
}

#[derive(Debug, Serialize)]
pub struct UserResponse {
    pub user: User,
}

#[derive(Debug, Serialize)]
pub struct ReviewQueueResponse {
    pub user_id: String,
    pub pull_requests: Vec<PullRequestShort>,
}

/// `POST /users/setIsActive`
pub async fn set_is_active(
    State(state): State<AppState>,
    payload: Result<Json<SetIsActiveRequest>, JsonRejection>,
) -> Result<Json<UserResponse>, ApiError> {
    let Json(request) = payload?;
    require("user_id", &request.user_id)?;

    let user = state
        .users
        .set_is_active(&request.user_id, request.is_active)
        .await?;
    Ok(Json(UserResponse { user }))
}

/// `GET /users/getReview?user_id=`
pub async fn get_review(
    State(state): State<AppState>,
    query: Result<Query<UserQuery>, QueryRejection>,
) -> Result<Json<ReviewQueueResponse>, ApiError> {
    let Query(query) = query?;
    require("user_id", &query.user_id)?;

    let pull_requests = state.engine.review_queue(&query.user_id).await?;
    Ok(Json(ReviewQueueResponse {
        user_id: query.user_id,
        pull_requests,
    }))
}
