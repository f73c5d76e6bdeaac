//! Health short-circuit: a liveness handler collapsed to the single
//! endpoint Moose's internal orchestrator polls.

use axum::response::IntoResponse;
use axum::Json;
use chrono::Utc;
use serde_json::json;

pub const HEALTH_PATH: &str = "/_moose_internal/health";

pub async fn health_handler() -> impl IntoResponse {
    Json(json!({
        "status": "healthy",
        "timestamp": Utc::now().to_rfc3339(),
    }))
}
