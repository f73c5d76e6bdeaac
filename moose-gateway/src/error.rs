//! Gateway error type and its HTTP rendering: a `{status, message}` shape,
//! with `Unauthorized` and the resolution-failure message list as
//! Moose-specific additions.

use axum::response::{IntoResponse, Response};
use axum::Json;
use http::StatusCode;

#[derive(Debug)]
pub enum GatewayError {
    /// Input validation (query-param type guard) — 400, never retried.
    BadRequest(String),
    /// JWT verification failed and `enforceAuth` is set — 401.
    Unauthorized(String),
    /// No API matched any lookup strategy — 404 with the set of registered keys.
    ApiNotFound { message: String },
    /// A user handler threw — 500, message surfaced and logged.
    HandlerError(String),
    /// Non-`Error` throw from user code — 500, empty body.
    OpaqueHandlerError,
}

impl std::fmt::Display for GatewayError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            GatewayError::BadRequest(msg) => write!(f, "bad request: {msg}"),
            GatewayError::Unauthorized(msg) => write!(f, "unauthorized: {msg}"),
            GatewayError::ApiNotFound { message } => write!(f, "not found: {message}"),
            GatewayError::HandlerError(msg) => write!(f, "handler error: {msg}"),
            GatewayError::OpaqueHandlerError => write!(f, "handler error"),
        }
    }
}

impl std::error::Error for GatewayError {}

impl IntoResponse for GatewayError {
    fn into_response(self) -> Response {
        match self {
            GatewayError::BadRequest(msg) => {
                (StatusCode::BAD_REQUEST, Json(serde_json::json!({ "error": msg }))).into_response()
            }
            GatewayError::Unauthorized(_) => (
                StatusCode::UNAUTHORIZED,
                Json(serde_json::json!({ "error": "Unauthorized" })),
            )
                .into_response(),
            GatewayError::ApiNotFound { message } => {
                (StatusCode::NOT_FOUND, Json(serde_json::json!({ "error": message }))).into_response()
            }
            GatewayError::HandlerError(msg) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(serde_json::json!({ "error": msg })),
            )
                .into_response(),
            GatewayError::OpaqueHandlerError => {
                (StatusCode::INTERNAL_SERVER_ERROR, ()).into_response()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use http_body_util::BodyExt;

    async fn status_and_body(err: GatewayError) -> (StatusCode, serde_json::Value) {
        let resp = err.into_response();
        let status = resp.status();
        let body = resp.into_body().collect().await.unwrap().to_bytes();
        let json = if body.is_empty() {
            serde_json::Value::Null
        } else {
            serde_json::from_slice(&body).unwrap()
        };
        (status, json)
    }

    #[tokio::test]
    async fn unauthorized_hides_underlying_reason() {
        let (status, body) = status_and_body(GatewayError::Unauthorized("bad signature".into())).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["error"], "Unauthorized");
    }

    #[tokio::test]
    async fn api_not_found_surfaces_message() {
        let (status, body) = status_and_body(GatewayError::ApiNotFound {
            message: "no API found; available: [foo, bar]".into(),
        })
        .await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["error"], "no API found; available: [foo, bar]");
    }

    #[tokio::test]
    async fn opaque_handler_error_has_empty_body() {
        let (status, body) = status_and_body(GatewayError::OpaqueHandlerError).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body, serde_json::Value::Null);
    }
}
