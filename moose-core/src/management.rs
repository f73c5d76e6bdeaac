//! The management channel: a tiny HTTP surface the CLI/outer
//! orchestrator polls, shared by the gateway and streaming binaries since
//! both need to phone home.

use axum::routing::post;
use axum::{Json, Router};
use serde::{Deserialize, Serialize};

/// `POST /logs` body: one CLI-bound log entry.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CliLogEntry {
    pub message_type: String,
    pub action: String,
    pub message: String,
}

/// `POST /metrics-logs` body: one worker's per-second throughput sample,
/// sent only when at least one counter is non-zero.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MetricsLogEntry {
    pub count_in: u64,
    pub count_out: u64,
    pub bytes: u64,
    pub function_name: String,
    pub timestamp: i64,
}

async fn receive_log(Json(entry): Json<CliLogEntry>) {
    tracing::info!(
        message_type = %entry.message_type,
        action = %entry.action,
        "{}",
        entry.message
    );
}

async fn receive_metrics(Json(entry): Json<MetricsLogEntry>) {
    tracing::info!(
        count_in = entry.count_in,
        count_out = entry.count_out,
        bytes = entry.bytes,
        function_name = %entry.function_name,
        timestamp = entry.timestamp,
        "metrics sample"
    );
}

/// Build the management router, to be bound on `127.0.0.1:<MOOSE_MANAGEMENT_PORT>`.
pub fn management_router() -> Router {
    Router::new()
        .route("/logs", post(receive_log))
        .route("/metrics-logs", post(receive_metrics))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use tower::ServiceExt;

    #[tokio::test]
    async fn posts_a_log_entry() {
        let app = management_router();
        let body = serde_json::to_vec(&CliLogEntry {
            message_type: "info".into(),
            action: "start".into(),
            message: "worker started".into(),
        })
        .unwrap();
        let response = app
            .oneshot(
                Request::post("/logs")
                    .header("content-type", "application/json")
                    .body(Body::from(body))
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn posts_a_metrics_entry() {
        let app = management_router();
        let body = serde_json::to_vec(&MetricsLogEntry {
            count_in: 10,
            count_out: 9,
            bytes: 1024,
            function_name: "orders_transform".into(),
            timestamp: 1_700_000_000_000,
        })
        .unwrap();
        let response = app
            .oneshot(
                Request::post("/metrics-logs")
                    .header("content-type", "application/json")
                    .body(Body::from(body))
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }
}
