use std::collections::HashMap;

/// Collect all environment variables under a `PREFIX__FIELD` namespace into
/// a `{ field_lowercase: value }` map.
///
/// A flattening loader, but
/// walks `std::env::vars()` instead of a YAML tree, since Moose's own
/// environment contract is the double-underscore
/// `MOOSE_CLICKHOUSE_CONFIG__HOST` shape rather than a config file.
pub(crate) fn env_section(prefix: &str) -> HashMap<String, String> {
    let marker = format!("{prefix}__");
    let mut out = HashMap::new();
    for (key, value) in std::env::vars() {
        if let Some(field) = key.strip_prefix(&marker) {
            out.insert(field.to_ascii_lowercase(), value);
        }
    }
    out
}

/// Read a single scalar env var, falling back to a default.
pub(crate) fn env_or(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

/// Load `.env` into the process environment without overwriting variables
/// that are already set, same override order as the
/// `R2eConfig::load_with_resolver`.
pub(crate) fn load_dotenv() {
    let _ = dotenvy::dotenv();
}
