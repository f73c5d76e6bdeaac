//! The field-mutation tree: built once per stream/workflow-input shape from
//! its column descriptors, then applied to every parsed JSON record to
//! revive typed scalars.
//!
//! The exact ISO-8601 regex is preserved on purpose
//! used for date revival rather than reach for a stricter parser, to avoid
//! breaking round-trips with producers emitting variant shapes — so
//! [`ISO_8601_RE`] is kept intentionally permissive.

use std::sync::OnceLock;

use regex::Regex;
use serde_json::Value;

use super::column::ColumnDescriptor;

/// An operation applied to a scalar leaf value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Mutation {
    /// Parse an ISO-8601-looking string into a timestamp. A no-op if the
    /// value is not a string, or is a string that doesn't match
    /// [`ISO_8601_RE`] — this makes the operation idempotent (Testable
    /// Property 6: applying it twice is the same as applying it once).
    ParseDate,
}

/// One node of the mutation tree.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldMutation {
    /// A scalar leaf: apply every listed operation, in order.
    Leaf {
        field: String,
        ops: Vec<Mutation>,
    },
    /// A nested entry: recurse into each element of an array, or into the
    /// object itself if it is not an array.
    Nested {
        field: String,
        children: Vec<FieldMutation>,
    },
}

fn iso_8601_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(
            r"^\d{4}-\d{2}-\d{2}(T\d{2}:\d{2}:\d{2}(\.\d+)?(Z|[+-]\d{2}:?\d{2})?)?$",
        )
        .expect("static ISO-8601 regex is valid")
    })
}

/// Public accessor so other crates (streaming/workflow revival) can reuse
/// the exact same regex outside of a mutation tree — workflow task input revives
/// workflow-input dates "via the same ISO-8601 regex used for message
/// revival".
pub fn looks_like_iso_8601(s: &str) -> bool {
    iso_8601_regex().is_match(s)
}

fn data_type_nested_fields(data_type: &super::column::DataType) -> Option<&[super::column::NestedField]> {
    use super::column::DataType;
    match data_type {
        DataType::NamedTuple(fields) | DataType::Nested(fields) => Some(fields),
        _ => None,
    }
}

fn build_for_type(name: &str, data_type: &super::column::DataType, needs_revival: bool) -> Option<FieldMutation> {
    use super::column::DataType;
    match data_type {
        DataType::Array(inner) => build_for_type(name, inner, needs_revival).map(|child| FieldMutation::Nested {
            field: name.to_string(),
            children: vec![strip_name(child)],
        }),
        DataType::Nullable(inner) => build_for_type(name, inner, needs_revival),
        DataType::NamedTuple(_) | DataType::Nested(_) => {
            let fields = data_type_nested_fields(data_type)?;
            let children: Vec<FieldMutation> = fields
                .iter()
                .filter_map(|f| build_for_type(&f.name, &f.data_type, false))
                .collect();
            if children.is_empty() {
                None
            } else {
                Some(FieldMutation::Nested {
                    field: name.to_string(),
                    children,
                })
            }
        }
        DataType::DateTime { .. } | DataType::Date | DataType::Date16 if needs_revival => {
            Some(FieldMutation::Leaf {
                field: name.to_string(),
                ops: vec![Mutation::ParseDate],
            })
        }
        _ => None,
    }
}

/// A nested `FieldMutation`'s inner-children form re-uses `field` as the
/// element placeholder; this just clears the outer wrapper name since the
/// array-element mutation applies to the element itself, not a further
/// named field.
fn strip_name(mutation: FieldMutation) -> FieldMutation {
    match mutation {
        FieldMutation::Leaf { ops, .. } => FieldMutation::Leaf {
            field: String::new(),
            ops,
        },
        FieldMutation::Nested { children, .. } => FieldMutation::Nested {
            field: String::new(),
            children,
        },
    }
}

/// Build the field-mutation tree for a stream from its column descriptors.
/// Bindings under the same `(source, target)` key share column descriptors,
/// so callers build this once per binding and reuse it across every batch.
pub fn build_mutation_tree(columns: &[ColumnDescriptor]) -> Vec<FieldMutation> {
    columns
        .iter()
        .filter_map(|col| build_for_type(&col.name, &col.data_type, col.needs_date_revival()))
        .collect()
}

/// Apply the mutation tree to a parsed JSON object in place.
pub fn apply_mutations(tree: &[FieldMutation], record: &mut Value) {
    let Some(obj) = record.as_object_mut() else {
        return;
    };
    for mutation in tree {
        match mutation {
            FieldMutation::Leaf { field, ops } => {
                if let Some(value) = obj.get_mut(field) {
                    apply_ops(ops, value);
                }
            }
            FieldMutation::Nested { field, children } => {
                if let Some(value) = obj.get_mut(field) {
                    apply_nested(children, value);
                }
            }
        }
    }
}

fn apply_nested(children: &[FieldMutation], value: &mut Value) {
    match value {
        Value::Array(items) => {
            for item in items.iter_mut() {
                apply_nested(children, item);
            }
        }
        Value::Object(_) => {
            apply_mutations_inner(children, value);
        }
        // A leaf array element (e.g. `Array(DateTime)`): children is a
        // single unnamed leaf whose ops apply directly to `value`.
        _ => {
            for child in children {
                if let FieldMutation::Leaf { ops, .. } = child {
                    apply_ops(ops, value);
                }
            }
        }
    }
}

fn apply_mutations_inner(tree: &[FieldMutation], record: &mut Value) {
    let Some(obj) = record.as_object_mut() else {
        return;
    };
    for mutation in tree {
        match mutation {
            FieldMutation::Leaf { field, ops } => {
                if let Some(value) = obj.get_mut(field) {
                    apply_ops(ops, value);
                }
            }
            FieldMutation::Nested { field, children } => {
                if let Some(value) = obj.get_mut(field) {
                    apply_nested(children, value);
                }
            }
        }
    }
}

fn apply_ops(ops: &[Mutation], value: &mut Value) {
    for op in ops {
        match op {
            Mutation::ParseDate => {
                if let Value::String(s) = value {
                    if looks_like_iso_8601(s) {
                        // Revival marks the value so a second application is
                        // a no-op: once converted, the value is no longer a
                        // bare ISO string but a tagged timestamp object.
                        *value = serde_json::json!({ "__moose_timestamp__": s });
                    }
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::column::{Annotation, ColumnDescriptor, DataType, ANNOTATION_STRING_DATE};

    fn date_column(name: &str, string_date: bool) -> ColumnDescriptor {
        ColumnDescriptor {
            name: name.to_string(),
            data_type: DataType::DateTime { precision: 3 },
            primary_key: false,
            required: true,
            unique: false,
            default: None,
            ttl: None,
            codec: None,
            annotations: if string_date {
                vec![Annotation {
                    key: ANNOTATION_STRING_DATE.to_string(),
                    value: Value::Bool(true),
                }]
            } else {
                vec![]
            },
        }
    }

    #[test]
    fn revives_top_level_date_column() {
        let tree = build_mutation_tree(&[date_column("created_at", false)]);
        let mut record = serde_json::json!({ "created_at": "2024-01-01T00:00:00Z" });
        apply_mutations(&tree, &mut record);
        assert_eq!(
            record["created_at"],
            serde_json::json!({ "__moose_timestamp__": "2024-01-01T00:00:00Z" })
        );
    }

    #[test]
    fn string_date_annotation_skips_revival() {
        let tree = build_mutation_tree(&[date_column("created_at", true)]);
        assert!(tree.is_empty());
        let mut record = serde_json::json!({ "created_at": "2024-01-01T00:00:00Z" });
        let before = record.clone();
        apply_mutations(&tree, &mut record);
        assert_eq!(record, before);
    }

    #[test]
    fn applying_twice_is_idempotent() {
        let tree = build_mutation_tree(&[date_column("created_at", false)]);
        let mut record = serde_json::json!({ "created_at": "2024-01-01T00:00:00Z" });
        apply_mutations(&tree, &mut record);
        let once = record.clone();
        apply_mutations(&tree, &mut record);
        assert_eq!(record, once);
    }

    #[test]
    fn non_matching_string_is_left_untouched() {
        let tree = build_mutation_tree(&[date_column("created_at", false)]);
        let mut record = serde_json::json!({ "created_at": "not-a-date" });
        apply_mutations(&tree, &mut record);
        assert_eq!(record["created_at"], serde_json::json!("not-a-date"));
    }
}
