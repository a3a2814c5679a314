//! Request handlers, one module per route group

pub mod pull_request;
pub mod statistics;
pub mod team;
pub mod users;

use axum::Json;

/// Liveness probe
pub async fn health_check() -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "status": "healthy",
        "service": "rota",
    }))
}
