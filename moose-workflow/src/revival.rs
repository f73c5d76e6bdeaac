//! Input date revival. Unlike the
//! column-descriptor-driven mutation tree in `moose_core::model::mutation`
//! (which only touches fields known in advance to be date-typed), workflow
//! input has no schema, so every string leaf is checked against the regex.

use moose_core::model::mutation::looks_like_iso_8601;
use serde_json::Value;

/// Walk `value` in place, tagging every ISO-8601-looking string leaf the
/// same way `moose_core::model::mutation` tags a revived column.
pub fn revive_dates(value: &mut Value) {
    match value {
        Value::String(s) if looks_like_iso_8601(s) => {
            *value = serde_json::json!({ "__moose_timestamp__": s });
        }
        Value::Array(items) => {
            for item in items.iter_mut() {
                revive_dates(item);
            }
        }
        Value::Object(map) => {
            for (_, v) in map.iter_mut() {
                revive_dates(v);
            }
        }
        _ => {}
    }
}
