use std::collections::HashMap;

use serde_json::Value;

use super::column::ColumnDescriptor;

/// What kind of resource a [`ResourceEntry`] describes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ResourceKind {
    Table,
    Topic,
    Stream,
    IngestApi,
    Api,
    MaterializedView,
    View,
    SqlResource,
    IngestPipeline,
    Workflow,
    Task,
    WebApp,
    DeadLetterQueue,
}

/// A declared resource: table, stream, API, workflow, materialized view,
/// web-app, or transform binding. Keyed by name (and optionally version) in
/// the [`crate::registry::ResourceRegistry`].
#[derive(Debug, Clone)]
pub struct ResourceEntry {
    pub name: String,
    pub version: Option<String>,
    pub kind: ResourceKind,
    pub source_location: String,
    pub columns: Vec<ColumnDescriptor>,
}

/// A registered consumption API handler.
///
/// Invariant: the `(name, version)` pair is unique within one
/// [`crate::registry::ResourceRegistry`].
#[derive(Clone)]
pub struct ApiEntry {
    pub name: String,
    pub version: Option<String>,
    /// An explicit custom path, if the API was registered with one. Tried
    /// first during resolution.
    pub path: Option<String>,
    pub input_columns: Vec<ColumnDescriptor>,
    pub input_schema: Value,
    pub response_schema: Value,
}

impl std::fmt::Debug for ApiEntry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApiEntry")
            .field("name", &self.name)
            .field("version", &self.version)
            .field("path", &self.path)
            .finish()
    }
}

/// Per-binding options for one handler bound to a `(source, target)` pair.
#[derive(Debug, Clone, Default)]
pub struct TransformHandlerOptions {
    pub dead_letter_queue: Option<String>,
}

/// Key identifying one transform binding: `source -> target`, either side
/// optional (consumer-only bindings omit the target).
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TransformBindingKey {
    pub source: Option<String>,
    pub target: Option<String>,
}

/// A DLQ record payload. `original_record` additionally
/// carries the `__source*` coordinates (partition, offset, timestamp).
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DlqRecord {
    pub original_record: Value,
    pub error_message: String,
    pub error_type: String,
    pub failed_at: chrono::DateTime<chrono::Utc>,
    pub source: String,
}

/// Coordinates stitched onto `original_record` before it's sent to a DLQ.
pub const FIELD_SOURCE_PARTITION: &str = "__sourcePartition";
pub const FIELD_SOURCE_OFFSET: &str = "__sourceOffset";
pub const FIELD_SOURCE_TIMESTAMP: &str = "__sourceTimestamp";

/// Build the `originalRecord` value with source coordinates attached, per
/// the DLQ record shape.
pub fn annotate_original_record(
    mut record: Value,
    partition: i32,
    offset: i64,
    timestamp_ms: i64,
) -> Value {
    if let Some(obj) = record.as_object_mut() {
        obj.insert(FIELD_SOURCE_PARTITION.to_string(), Value::from(partition));
        obj.insert(FIELD_SOURCE_OFFSET.to_string(), Value::from(offset));
        obj.insert(
            FIELD_SOURCE_TIMESTAMP.to_string(),
            Value::from(timestamp_ms),
        );
    }
    record
}

/// Map `(path_key [+ version]) -> (handler_name, api_name)`, populated on
/// first request and never evicted within a worker lifetime.
pub type HandlerCache = HashMap<String, (String, String)>;

pub fn handler_cache_key(path_name: &str, version: Option<&str>) -> String {
    match version {
        Some(v) => format!("{path_name}:{v}"),
        None => path_name.to_string(),
    }
}
