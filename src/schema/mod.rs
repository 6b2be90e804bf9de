//! Avro schema model: the type hierarchy, JSON parsing, named-type
//! resolution, and writer/reader schema evolution.

pub mod evolution;
pub mod parser;
pub mod resolve;
pub mod types;

pub use evolution::{project, Resolution};
pub use parser::{parse_schema, parse_schema_with_options, SchemaParser};
pub use resolve::NamedTypes;
pub use types::{
    EnumSchema, FieldSchema, FixedSchema, LogicalKind, LogicalSchema, RecordSchema, Schema,
};
