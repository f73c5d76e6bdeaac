//! Transform handler trait and output normalization.

use std::sync::Arc;

use serde_json::Value;

/// A user transform function bound to one `source -> target` pair.
#[async_trait::async_trait]
pub trait TransformHandler: Send + Sync {
    async fn call(&self, record: Value) -> Result<Value, String>;
}

pub type SharedTransformHandler = Arc<dyn TransformHandler>;

/// Normalize one handler's return value into zero or more outgoing
/// messages: a single object becomes one message; an
/// array is flattened exactly one level (an element that is itself an
/// array is spread into the result, not kept nested); `null` elements
/// (and the bare `null`/`undefined`-equivalent root) are dropped.
pub fn normalize_output(value: Value) -> Vec<Value> {
    match value {
        Value::Null => vec![],
        Value::Array(items) => items
            .into_iter()
            .flat_map(|item| match item {
                Value::Null => vec![],
                Value::Array(nested) => nested.into_iter().filter(|v| !v.is_null()).collect(),
                other => vec![other],
            })
            .collect(),
        other => vec![other],
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn single_object_becomes_one_message() {
        assert_eq!(normalize_output(json!({"a": 1})), vec![json!({"a": 1})]);
    }

    #[test]
    fn array_is_flattened_one_level() {
        let out = normalize_output(json!([{"a": 1}, {"a": 2}]));
        assert_eq!(out, vec![json!({"a": 1}), json!({"a": 2})]);
    }

    #[test]
    fn null_elements_in_array_are_dropped() {
        let out = normalize_output(json!([{"a": 1}, null, {"a": 2}]));
        assert_eq!(out, vec![json!({"a": 1}), json!({"a": 2})]);
    }

    #[test]
    fn bare_null_produces_no_messages() {
        assert_eq!(normalize_output(Value::Null), Vec::<Value>::new());
    }

    #[test]
    fn nested_arrays_flatten_exactly_one_level_in_order() {
        let out = normalize_output(json!([["a"], "b", null, ["c", "d"]]));
        assert_eq!(out, vec![json!("a"), json!("b"), json!("c"), json!("d")]);
    }
}
