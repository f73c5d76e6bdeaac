//! Response shaping.
//!
//! The original distinguishes "result set" vs plain object by constructor
//! name string; Rust has no such runtime type tag, so handlers return this
//! tagged union directly instead of an untyped value.

use axum::response::{IntoResponse, Response};
use axum::Json;
use http::StatusCode;

/// What a user query/consumption handler hands back to the gateway.
pub enum HandlerResult {
    /// A materialized OLAP result set — serialized as a JSON array, status 200.
    Stream(Vec<serde_json::Value>),
    /// An explicit `{ status, body }` pair from the handler.
    Shaped { status: StatusCode, body: serde_json::Value },
    /// Any other value — serialized as JSON, status 200.
    Bare(serde_json::Value),
}

impl IntoResponse for HandlerResult {
    fn into_response(self) -> Response {
        match self {
            HandlerResult::Stream(rows) => (StatusCode::OK, Json(rows)).into_response(),
            HandlerResult::Shaped { status, body } => (status, Json(body)).into_response(),
            HandlerResult::Bare(value) => (StatusCode::OK, Json(value)).into_response(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use http_body_util::BodyExt;

    async fn status_and_body(result: HandlerResult) -> (StatusCode, serde_json::Value) {
        let resp = result.into_response();
        let status = resp.status();
        let body = resp.into_body().collect().await.unwrap().to_bytes();
        (status, serde_json::from_slice(&body).unwrap())
    }

    #[tokio::test]
    async fn stream_result_serializes_as_array_with_200() {
        let (status, body) =
            status_and_body(HandlerResult::Stream(vec![serde_json::json!({"id": 1})])).await;
        assert_eq!(status, StatusCode::OK);
        assert!(body.is_array());
    }

    #[tokio::test]
    async fn shaped_result_uses_its_own_status() {
        let (status, body) = status_and_body(HandlerResult::Shaped {
            status: StatusCode::CREATED,
            body: serde_json::json!({"id": 1}),
        })
        .await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(body["id"], 1);
    }

    #[tokio::test]
    async fn bare_result_defaults_to_200() {
        let (status, body) = status_and_body(HandlerResult::Bare(serde_json::json!({"ok": true}))).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["ok"], true);
    }
}
