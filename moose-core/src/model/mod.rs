//! The Moose data model: topic/column descriptors, the
//! field-mutation tree, and the shapes of everything the Resource Registry
//! catalogs.

pub mod column;
pub mod mutation;
pub mod registry_types;
pub mod topic;

pub use column::{
    Annotation, ColumnDescriptor, DataType, EnumMember, GeometryShape, NestedField,
    ANNOTATION_LOW_CARDINALITY, ANNOTATION_STRING_DATE,
};
pub use mutation::{apply_mutations, build_mutation_tree, looks_like_iso_8601, FieldMutation, Mutation};
pub use registry_types::{
    annotate_original_record, handler_cache_key, ApiEntry, DlqRecord, HandlerCache, ResourceEntry,
    ResourceKind, TransformBindingKey, TransformHandlerOptions,
};
pub use topic::TopicDescriptor;
