//! Consumption API gateway: health, auth, routing, dispatch,
//! and BYOF integration assembled into one `axum::Router`.

pub mod auth;
pub mod byof;
pub mod dispatch;
pub mod error;
pub mod health;
pub mod query;
pub mod response;
pub mod routing;

use std::sync::Arc;

use axum::extract::{Request, State};
use axum::middleware;
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::Router;
use moose_core::registry::ResourceRegistry;
use moose_core::OlapClient;

use auth::{auth_middleware, Jwt, JwtVerifier};
use byof::SharedByofAdapter;
use dispatch::{dispatch, resolve, HandlerContext, SharedApiHandler};
use error::GatewayError;
use health::{health_handler, HEALTH_PATH};
use query::parse_query;
use routing::{route, RouteTarget};

/// Shared worker-scoped gateway state.
#[derive(Clone)]
pub struct GatewayState {
    pub registry: Arc<ResourceRegistry>,
    pub olap: Arc<OlapClient>,
    pub handlers: Arc<HandlerMap>,
    pub byof: Option<SharedByofAdapter>,
}

/// Handlers are bound once at startup and never removed, so the map
/// is immutable for the life of the worker.
pub struct HandlerMap(std::collections::HashMap<String, SharedApiHandler>);

impl HandlerMap {
    pub fn new(entries: std::collections::HashMap<String, SharedApiHandler>) -> Self {
        Self(entries)
    }

    pub fn get(&self, key: &str) -> Option<&SharedApiHandler> {
        self.0.get(key)
    }
}

async fn dispatch_request(
    State(state): State<GatewayState>,
    request: Request,
) -> Response {
    let jwt = request.extensions().get::<Jwt>().cloned();
    let path = request.uri().path().to_string();
    let query_version = request
        .uri()
        .query()
        .and_then(|q| form_urlencoded::parse(q.as_bytes()).find(|(k, _)| k == "version"))
        .map(|(_, v)| v.into_owned());

    let webapps = state.registry.webapps_by_specificity();
    match route(&path, &webapps) {
        RouteTarget::WebApp { .. } => match &state.byof {
            Some(adapter) => match adapter.handle(request).await {
                Some(response) => response,
                None => GatewayError::ApiNotFound {
                    message: format!("no WebApp route for {path:?}"),
                }
                .into_response(),
            },
            None => GatewayError::ApiNotFound {
                message: format!("no WebApp registered for {path:?}"),
            }
            .into_response(),
        },
        RouteTarget::Api { lookup_path } => {
            let params = parse_query(request.uri().query());
            match resolve(&state.registry, &lookup_path, query_version.as_deref()) {
                Ok((_, entry)) => match state.handlers.get(&entry.name) {
                    Some(handler) => {
                        let ctx = HandlerContext {
                            client: state.olap.clone(),
                            jwt,
                        };
                        match dispatch(&entry.name, handler.as_ref(), params, ctx).await {
                            Ok(result) => result.into_response(),
                            Err(err) => err.into_response(),
                        }
                    }
                    None => GatewayError::ApiNotFound {
                        message: format!("API {:?} registered but has no bound handler", entry.name),
                    }
                    .into_response(),
                },
                Err(err) => err.into_response(),
            }
        }
        RouteTarget::Unmatched => match &state.byof {
            Some(adapter) => match adapter.handle(request).await {
                Some(response) => response,
                None => GatewayError::ApiNotFound {
                    message: format!("no route for {path:?}"),
                }
                .into_response(),
            },
            None => GatewayError::ApiNotFound {
                message: format!("no route for {path:?}"),
            }
            .into_response(),
        },
    }
}

/// Assemble the gateway's router: health short-circuit first, then the
/// auth middleware, then the catch-all dispatcher.
pub fn gateway_router(state: GatewayState, verifier: Arc<JwtVerifier>) -> Router {
    Router::new()
        .route(HEALTH_PATH, get(health_handler))
        .fallback(dispatch_request)
        .layer(middleware::from_fn_with_state(verifier, auth_middleware))
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use moose_core::config::AuthConfig;
    use std::collections::HashMap;
    use tower::ServiceExt;

    fn empty_state() -> GatewayState {
        GatewayState {
            registry: Arc::new(ResourceRegistry::new()),
            olap: Arc::new(
                OlapClient::new(&moose_core::config::ClickhouseConfig::default()).unwrap(),
            ),
            handlers: Arc::new(HandlerMap::new(HashMap::new())),
            byof: None,
        }
    }

    #[tokio::test]
    async fn health_path_bypasses_everything() {
        let verifier = Arc::new(JwtVerifier::from_config(&AuthConfig::default()).unwrap());
        let app = gateway_router(empty_state(), verifier);
        let response = app
            .oneshot(axum::http::Request::get(HEALTH_PATH).body(axum::body::Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), axum::http::StatusCode::OK);
    }

    #[tokio::test]
    async fn unmatched_api_path_returns_404_with_available_list() {
        let verifier = Arc::new(JwtVerifier::from_config(&AuthConfig::default()).unwrap());
        let app = gateway_router(empty_state(), verifier);
        let response = app
            .oneshot(
                axum::http::Request::get("/api/orders")
                    .body(axum::body::Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), axum::http::StatusCode::NOT_FOUND);
    }
}
