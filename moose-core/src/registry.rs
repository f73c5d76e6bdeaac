//! The in-process Resource Registry: the exclusive owner of catalog
//! entries for the life of the process. A worker receives a read-only
//! view after fork/spawn and never mutates registry state across worker
//! boundaries — so every lookup method here takes `&self`, and mutation
//! only happens during startup registration.

use std::collections::HashMap;
use std::sync::{Mutex, RwLock};

use crate::error::{CoreError, CoreResult};
use crate::model::{
    ApiEntry, DlqRecord, HandlerCache, ResourceEntry, TransformBindingKey, TransformHandlerOptions,
};

/// Information about the single externally-supplied BYOF application, if
/// one has been registered.
#[derive(Debug, Clone)]
pub struct WebAppInfo {
    pub mount_path: String,
}

struct ApiSlot {
    entry: ApiEntry,
}

/// The process-wide resource catalog.
///
/// `register_*` methods are intended to be called once, during startup,
/// before any worker is spawned; `resolve_*`/`get_*` methods are the
/// read-only surface workers use at request time.
#[derive(Default)]
pub struct ResourceRegistry {
    apis: RwLock<HashMap<String, ApiSlot>>,
    resources: RwLock<HashMap<String, ResourceEntry>>,
    transform_bindings:
        RwLock<HashMap<TransformBindingKey, Vec<(String, TransformHandlerOptions)>>>,
    webapps: RwLock<Vec<WebAppInfo>>,
    byof: Mutex<Option<WebAppInfo>>,
    handler_cache: Mutex<HandlerCache>,
}

fn api_key(name: &str, version: Option<&str>) -> String {
    crate::model::handler_cache_key(name, version)
}

impl ResourceRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an API handler entry. Fails if `(name, version)` is already
    /// registered.
    pub fn register_api(&self, entry: ApiEntry) -> CoreResult<()> {
        let key = api_key(&entry.name, entry.version.as_deref());
        let mut apis = self.apis.write().expect("registry lock poisoned");
        if apis.contains_key(&key) {
            return Err(CoreError::Validation(format!(
                "API {key:?} is already registered"
            )));
        }
        apis.insert(key, ApiSlot { entry });
        Ok(())
    }

    pub fn register_resource(&self, entry: ResourceEntry) {
        let key = match &entry.version {
            Some(v) => format!("{}@{v}", entry.name),
            None => entry.name.clone(),
        };
        self.resources
            .write()
            .expect("registry lock poisoned")
            .insert(key, entry);
    }

    pub fn register_transform_binding(
        &self,
        key: TransformBindingKey,
        handler_id: impl Into<String>,
        options: TransformHandlerOptions,
    ) {
        self.transform_bindings
            .write()
            .expect("registry lock poisoned")
            .entry(key)
            .or_default()
            .push((handler_id.into(), options));
    }

    pub fn transform_handlers(
        &self,
        key: &TransformBindingKey,
    ) -> Vec<(String, TransformHandlerOptions)> {
        self.transform_bindings
            .read()
            .expect("registry lock poisoned")
            .get(key)
            .cloned()
            .unwrap_or_default()
    }

    pub fn register_webapp(&self, info: WebAppInfo) {
        self.webapps.write().expect("registry lock poisoned").push(info);
    }

    /// WebApps sorted by mount path length descending (longest-prefix-wins
    /// routing).
    pub fn webapps_by_specificity(&self) -> Vec<WebAppInfo> {
        let mut apps = self.webapps.read().expect("registry lock poisoned").clone();
        apps.sort_by(|a, b| b.mount_path.len().cmp(&a.mount_path.len()));
        apps
    }

    /// Register the single externally-supplied framework app. A second call
    /// on the same registry fails.
    pub fn register_byof(&self, info: WebAppInfo) -> CoreResult<()> {
        let mut slot = self.byof.lock().expect("registry lock poisoned");
        if slot.is_some() {
            return Err(CoreError::Validation(
                "a BYOF application is already registered for this process".to_string(),
            ));
        }
        *slot = Some(info);
        Ok(())
    }

    pub fn byof(&self) -> Option<WebAppInfo> {
        self.byof.lock().expect("registry lock poisoned").clone()
    }

    /// Resolve an API by the lookup strategies, in order: custom-path match, then
    /// path-embedded version, then query-version, then bare name.
    ///
    /// `lookup_path` is the already-prefix-stripped API path (see
    /// `moose-gateway::router`). Returns the cache key used and a clone of
    /// the resolved entry.
    pub fn resolve_api(
        &self,
        lookup_path: &str,
        query_version: Option<&str>,
    ) -> Option<(String, ApiEntry)> {
        let apis = self.apis.read().expect("registry lock poisoned");

        // (a) full path as registered custom path
        if let Some(slot) = apis
            .values()
            .find(|s| s.entry.path.as_deref() == Some(lookup_path))
        {
            return Some((lookup_path.to_string(), slot.entry.clone()));
        }

        // (b) path-embedded version: "name/version"
        if let Some((name, version)) = lookup_path.split_once('/') {
            let key = api_key(name, Some(version));
            if let Some(slot) = apis.get(&key) {
                return Some((key, slot.entry.clone()));
            }
        }

        // (c) query-parameter version combined with the bare name
        if let Some(version) = query_version {
            let key = api_key(lookup_path, Some(version));
            if let Some(slot) = apis.get(&key) {
                return Some((key, slot.entry.clone()));
            }
        }

        // (d) bare name
        let key = api_key(lookup_path, None);
        apis.get(&key).map(|slot| (key, slot.entry.clone()))
    }

    /// Every registered `(name, version)` key, for 404 diagnostics.
    pub fn available_api_keys(&self) -> Vec<String> {
        let mut keys: Vec<String> = self
            .apis
            .read()
            .expect("registry lock poisoned")
            .keys()
            .cloned()
            .collect();
        keys.sort();
        keys
    }

    /// Populate the handler cache for a lookup key the first time it's
    /// resolved. Never
    /// evicted within a worker's lifetime.
    pub fn cache_handler(&self, cache_key: String, handler_name: String, api_name: String) {
        self.handler_cache
            .lock()
            .expect("registry lock poisoned")
            .entry(cache_key)
            .or_insert((handler_name, api_name));
    }

    pub fn cached_handler(&self, cache_key: &str) -> Option<(String, String)> {
        self.handler_cache
            .lock()
            .expect("registry lock poisoned")
            .get(cache_key)
            .cloned()
    }
}

/// Build a [`crate::model::DlqRecord`] from a failed record.
pub fn build_dlq_record(
    original_record: serde_json::Value,
    error_message: impl Into<String>,
    error_type: impl Into<String>,
    source: impl Into<String>,
) -> DlqRecord {
    DlqRecord {
        original_record,
        error_message: error_message.into(),
        error_type: error_type.into(),
        failed_at: chrono::Utc::now(),
        source: source.into(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::ApiEntry;

    fn api(name: &str, version: Option<&str>, path: Option<&str>) -> ApiEntry {
        ApiEntry {
            name: name.to_string(),
            version: version.map(str::to_string),
            path: path.map(str::to_string),
            input_columns: vec![],
            input_schema: serde_json::json!({}),
            response_schema: serde_json::json!({}),
        }
    }

    #[test]
    fn duplicate_name_version_registration_fails() {
        let reg = ResourceRegistry::new();
        reg.register_api(api("orders", Some("1"), None)).unwrap();
        assert!(reg.register_api(api("orders", Some("1"), None)).is_err());
    }

    #[test]
    fn byof_second_registration_fails() {
        let reg = ResourceRegistry::new();
        reg.register_byof(WebAppInfo {
            mount_path: "/admin".into(),
        })
        .unwrap();
        let err = reg.register_byof(WebAppInfo {
            mount_path: "/other".into(),
        });
        assert!(err.is_err());
    }

    #[test]
    fn resolution_order_prefers_custom_path() {
        let reg = ResourceRegistry::new();
        reg.register_api(api("orders", Some("2"), Some("orders-v2"))).unwrap();
        reg.register_api(api("orders", Some("1"), None)).unwrap();
        let (key, entry) = reg.resolve_api("orders-v2", None).unwrap();
        assert_eq!(key, "orders-v2");
        assert_eq!(entry.version.as_deref(), Some("2"));
    }

    #[test]
    fn resolution_order_path_embedded_version() {
        let reg = ResourceRegistry::new();
        reg.register_api(api("orders", Some("1"), None)).unwrap();
        reg.register_api(api("orders", Some("2"), None)).unwrap();
        let (_, entry) = reg.resolve_api("orders/2", None).unwrap();
        assert_eq!(entry.version.as_deref(), Some("2"));
    }

    #[test]
    fn resolution_order_query_version_then_bare_name() {
        let reg = ResourceRegistry::new();
        reg.register_api(api("orders", Some("2"), None)).unwrap();
        let (_, entry) = reg.resolve_api("orders", Some("2")).unwrap();
        assert_eq!(entry.version.as_deref(), Some("2"));

        reg.register_api(api("customers", None, None)).unwrap();
        let (_, entry) = reg.resolve_api("customers", None).unwrap();
        assert_eq!(entry.name, "customers");
    }

    #[test]
    fn webapps_sorted_longest_prefix_first() {
        let reg = ResourceRegistry::new();
        reg.register_webapp(WebAppInfo { mount_path: "/a".into() });
        reg.register_webapp(WebAppInfo {
            mount_path: "/admin/users".into(),
        });
        reg.register_webapp(WebAppInfo { mount_path: "/admin".into() });
        let sorted = reg.webapps_by_specificity();
        assert_eq!(sorted[0].mount_path, "/admin/users");
        assert_eq!(sorted[1].mount_path, "/admin");
        assert_eq!(sorted[2].mount_path, "/a");
    }
}
