//! Team routes

use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::Json;
use rota_core::Team;
use serde::{Deserialize, Serialize};

use crate::error::{require, ApiError};
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct TeamQuery {
    pub team_name: String,
}

#[derive(Debug, Serialize)]
pub struct TeamResponse {
    pub team: Team,
}

/// `POST /team/add`
pub async fn add_team(
    State(state): State<AppState>,
    payload: Result<Json<Team>, JsonRejection>,
) -> Result<(StatusCode, Json<TeamResponse>), ApiError> {
    let Json(team) = payload?;
    let team = state.teams.create_team(&team).await?;
    Ok((StatusCode::CREATED, Json(TeamResponse { team })))
}

/// `GET /team/get?team_name=`
pub async fn get_team(
    State(state): State<AppState>,
    query: Result<Query<TeamQuery>, QueryRejection>,
) -> Result<Json<Team>, ApiError> {
    let Query(query) = query?;
    require("team_name", &query.team_name)?;
    Ok(Json(state.teams.get_team(&query.team_name).await?))
}
