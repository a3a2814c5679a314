//! Rota Server - HTTP delivery layer
//!
//! Maps JSON requests onto the component traits from `rota-core` and the
//! error taxonomy onto HTTP status codes.

pub mod error;
pub mod handlers;

use std::sync::Arc;

use axum::routing::{get, post};
use axum::Router;
use rota_core::config::AssignmentConfig;
use rota_core::{ReviewEngine, ReviewStatistics, TeamDirectory, UserRegistry};
use rota_db::Database;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

pub use error::ApiError;

/// Components shared by every handler
#[derive(Clone)]
pub struct AppState {
    pub teams: Arc<dyn TeamDirectory>,
    pub users: Arc<dyn UserRegistry>,
    pub engine: Arc<dyn ReviewEngine>,
    pub stats: Arc<dyn ReviewStatistics>,
}

impl AppState {
    /// Wire every component to the same database pool
    pub fn from_database(db: &Database, assignment: &AssignmentConfig) -> Self {
        Self {
            teams: Arc::new(db.teams()),
            users: Arc::new(db.users()),
            engine: Arc::new(db.pull_requests(assignment.tie_break)),
            stats: Arc::new(db.stats()),
        }
    }
}

/// Build the application router
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(handlers::health_check))
        .route("/team/add", post(handlers::team::add_team))
        .route("/team/get", get(handlers::team::get_team))
        .route("/users/setIsActive", post(handlers::users::set_is_active))
        .route("/users/getReview", get(handlers::users::get_review))
        .route("/pullRequest/create", post(handlers::pull_request::create))
        .route("/pullRequest/merge", post(handlers::pull_request::merge))
        .route("/pullRequest/reassign", post(handlers::pull_request::reassign))
        .route("/statistics/user", get(handlers::statistics::user))
        .route("/statistics/team", get(handlers::statistics::team))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}
