//! BYOF ("bring your own framework") integration. At most one externally-supplied app may be registered
//! per process; its routes are checked for collisions against Moose APIs
//! at startup (API wins), and anything left over falls through to it.

use std::sync::Arc;

use axum::extract::Request;
use axum::response::Response;

/// Adapter a BYOF application implements to plug into the gateway.
///
/// `handle` signals handled/unhandled by returning `Some`/`None` rather
/// than writing to the response directly and flagging via a side channel —
/// Rust's ownership rules make response-write interception awkward, and a
/// plain `Option` return says the same thing.
#[async_trait::async_trait]
pub trait ByofAdapter: Send + Sync {
    /// Path prefixes this app claims, for startup collision reporting.
    fn routes(&self) -> Vec<String>;

    /// Attempt to handle `request`. Returns `None` if this app has no
    /// route for it, in which case the gateway responds 404 itself.
    async fn handle(&self, request: Request) -> Option<Response>;
}

/// Routes from `byof_routes` that are already claimed by a registered
/// Moose API (`api_keys`) — reported at startup; API takes precedence at
/// request time, so these are warnings, not errors.
pub fn detect_collisions(byof_routes: &[String], api_keys: &[String]) -> Vec<String> {
    byof_routes
        .iter()
        .filter(|route| api_keys.iter().any(|key| key == *route))
        .cloned()
        .collect()
}

pub type SharedByofAdapter = Arc<dyn ByofAdapter>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reports_routes_claimed_by_both_byof_and_an_api() {
        let collisions = detect_collisions(
            &["orders".to_string(), "admin".to_string()],
            &["orders".to_string(), "customers".to_string()],
        );
        assert_eq!(collisions, vec!["orders".to_string()]);
    }

    #[test]
    fn no_collisions_when_routes_are_disjoint() {
        let collisions = detect_collisions(&["admin".to_string()], &["orders".to_string()]);
        assert!(collisions.is_empty());
    }
}
