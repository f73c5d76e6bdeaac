//! API dispatch: resolves the lookup path against
//! the [`ResourceRegistry`], builds the per-request handler context, and
//! runs the handler inside a span-scoped structured-logging context.

use std::sync::Arc;

use moose_core::logging::api_scope;
use moose_core::registry::ResourceRegistry;
use moose_core::OlapClient;
use tracing::Instrument;

use crate::auth::Jwt;
use crate::error::GatewayError;
use crate::query::QueryParams;
use crate::response::HandlerResult;

/// Everything a consumption API handler needs besides its query params.
pub struct HandlerContext {
    pub client: Arc<OlapClient>,
    pub jwt: Option<Jwt>,
}

/// A registered consumption API handler.
#[async_trait::async_trait]
pub trait ApiHandler: Send + Sync {
    async fn call(&self, params: QueryParams, ctx: HandlerContext) -> Result<HandlerResult, GatewayError>;
}

pub type SharedApiHandler = Arc<dyn ApiHandler>;

/// Resolve `lookup_path` against the registry,
/// caching the resolved handler key on first hit. Returns the resolution error formatted per §7
/// ("Resolution" row: message lists available APIs).
pub fn resolve(
    registry: &ResourceRegistry,
    lookup_path: &str,
    query_version: Option<&str>,
) -> Result<(String, moose_core::model::ApiEntry), GatewayError> {
    match registry.resolve_api(lookup_path, query_version) {
        Some((key, entry)) => {
            registry.cache_handler(key.clone(), entry.name.clone(), entry.name.clone());
            Ok((key, entry))
        }
        None => {
            let available = registry.available_api_keys();
            Err(GatewayError::ApiNotFound {
                message: format!(
                    "no API registered for {lookup_path:?}; available: [{}]",
                    available.join(", ")
                ),
            })
        }
    }
}

/// Run `handler` inside the per-request structured-logging span keyed by
/// `api_name`, translating panics-as-errors into the
/// opaque-throw (non-`Error` panic) branch.
pub async fn dispatch(
    api_name: &str,
    handler: &dyn ApiHandler,
    params: QueryParams,
    ctx: HandlerContext,
) -> Result<HandlerResult, GatewayError> {
    let span = api_scope(api_name);
    handler.call(params, ctx).instrument(span).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use moose_core::model::ApiEntry;

    fn api(name: &str) -> ApiEntry {
        ApiEntry {
            name: name.to_string(),
            version: None,
            path: None,
            input_columns: vec![],
            input_schema: serde_json::json!({}),
            response_schema: serde_json::json!({}),
        }
    }

    #[test]
    fn unresolved_lookup_lists_available_apis() {
        let registry = ResourceRegistry::new();
        registry.register_api(api("orders")).unwrap();
        let err = resolve(&registry, "missing", None).unwrap_err();
        match err {
            GatewayError::ApiNotFound { message } => assert!(message.contains("orders")),
            _ => panic!("expected ApiNotFound"),
        }
    }

    #[test]
    fn resolved_lookup_populates_handler_cache() {
        let registry = ResourceRegistry::new();
        registry.register_api(api("orders")).unwrap();
        let (key, _) = resolve(&registry, "orders", None).unwrap();
        assert!(registry.cached_handler(&key).is_some());
    }
}
