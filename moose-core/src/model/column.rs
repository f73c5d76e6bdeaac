use serde_json::Value;

/// Geometry shapes available on a `DataType::Geometry` column.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GeometryShape {
    Point,
    Ring,
    LineString,
    MultiLineString,
    Polygon,
    MultiPolygon,
}

/// An enum variant: a name plus either an explicit integer value or
/// positional assignment.
#[derive(Debug, Clone, PartialEq)]
pub struct EnumMember {
    pub name: String,
    pub value: i32,
}

/// A named field inside a `DataType::NamedTuple` or `DataType::Nested`.
#[derive(Debug, Clone, PartialEq)]
pub struct NestedField {
    pub name: String,
    pub data_type: DataType,
}

/// Sum of every column shape the runtime needs to reason about.
/// The compile-time annotation vocabulary that *produces* these descriptors
/// is out of scope — this type is the already-normalized
/// output the core consumes.
#[derive(Debug, Clone, PartialEq)]
pub enum DataType {
    String,
    Boolean,
    Int8,
    Int16,
    Int32,
    Int64,
    UInt8,
    UInt16,
    UInt32,
    UInt64,
    Float32,
    Float64,
    /// Timestamp with the given fractional-second precision (0-9).
    DateTime { precision: u8 },
    Decimal { precision: u8, scale: u8 },
    FixedString(u32),
    Date,
    Date16,
    Uuid,
    Ipv4,
    Ipv6,
    Geometry(GeometryShape),
    Enum(Vec<EnumMember>),
    Nullable(Box<DataType>),
    Array(Box<DataType>),
    Map {
        key: Box<DataType>,
        value: Box<DataType>,
    },
    NamedTuple(Vec<NestedField>),
    Nested(Vec<NestedField>),
    /// JSON, optionally constrained by typed paths and a cap on the number
    /// of distinct dynamic paths ClickHouse will track.
    Json {
        typed_paths: Vec<NestedField>,
        max_dynamic_paths: Option<u32>,
    },
}

/// An ordered `(key, value)` annotation pair. Order matters: later
/// annotations with the same key are treated as shadowing earlier ones by
/// consumers that care about precedence (e.g. lineage tooling), so this is
/// a `Vec`, not a map.
#[derive(Debug, Clone, PartialEq)]
pub struct Annotation {
    pub key: String,
    pub value: Value,
}

pub const ANNOTATION_STRING_DATE: &str = "stringDate";
pub const ANNOTATION_LOW_CARDINALITY: &str = "LowCardinality";

/// A fully resolved column descriptor.
#[derive(Debug, Clone, PartialEq)]
pub struct ColumnDescriptor {
    pub name: String,
    pub data_type: DataType,
    pub primary_key: bool,
    pub required: bool,
    pub unique: bool,
    pub default: Option<Value>,
    pub ttl: Option<String>,
    pub codec: Option<String>,
    pub annotations: Vec<Annotation>,
}

impl ColumnDescriptor {
    /// A date-typed column is a `DateTime`/`Date`/`Date16` column that does
    /// not carry the `stringDate` annotation — these are the columns whose
    /// runtime value gets revived into a timestamp.
    pub fn is_date_typed(&self) -> bool {
        matches!(
            self.data_type,
            DataType::DateTime { .. } | DataType::Date | DataType::Date16
        )
    }

    /// `true` when this column carries the `stringDate` annotation — its
    /// runtime value stays a string even though its logical type is a date.
    pub fn is_string_date(&self) -> bool {
        self.annotations
            .iter()
            .any(|a| a.key == ANNOTATION_STRING_DATE)
    }

    /// A column the field-mutation tree should revive: date-typed but not
    /// annotated `stringDate`.
    pub fn needs_date_revival(&self) -> bool {
        self.is_date_typed() && !self.is_string_date()
    }
}
