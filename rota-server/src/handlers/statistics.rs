//! Review statistics routes

use axum::extract::rejection::QueryRejection;
use axum::extract::{Query, State};
use axum::Json;
use rota_core::{TeamStat, UserStat};

use super::team::TeamQuery;
use super::users::UserQuery;
use crate::error::{require, ApiError};
use crate::AppState;

/// `GET /statistics/user?user_id=`
pub async fn user(
    State(state): State<AppState>,
    query: Result<Query<UserQuery>, QueryRejection>,
) -> Result<Json<UserStat>, ApiError> {
    let Query(query) = query?;
    require("user_id", &query.user_id)?;
    Ok(Json(state.stats.user_statistics(&query.user_id).await?))
}

/// `GET /statistics/team?team_name=`
pub async fn team(
    State(state): State<AppState>,
    query: Result<Query<TeamQuery>, QueryRejection>,
) -> Result<Json<TeamStat>, ApiError> {
    let Query(query) = query?;
    require("team_name", &query.team_name)?;
    Ok(Json(state.stats.team_statistics(&query.team_name).await?))
}
