//! Avro binary codec for schemaful generic records.
//!
//! This library provides four operations on Avro-encoded data: parsing a
//! schema from its JSON text, rendering a record to human-readable text,
//! looking up a nested field by a dotted path, and converting records to
//! and from their binary wire encoding. Decoding supports schema evolution
//! (separate writer and reader schemas) and byte-range slicing.
//!
//! Encoded bytes carry no schema metadata: this is a raw binary codec, not
//! a self-describing container format. The schema used to encode must be
//! supplied on decode.
//!
//! # Example
//! ```
//! use avrolite::{decode, encode, parse_schema, render, Record, Value};
//!
//! let schema = parse_schema(
//!     r#"{"type": "record", "name": "User", "fields": [
//!         {"name": "id", "type": "long"},
//!         {"name": "name", "type": "string"}
//!     ]}"#,
//! )?;
//!
//! let mut user = Record::with_name("User");
//! user.set("id", Value::Long(1));
//! user.set("name", Value::String("ada".to_string()));
//!
//! let bytes = encode(&schema, Some(&user))?;
//! let decoded = decode(&schema, &bytes)?;
//! assert_eq!(decoded, user);
//! assert_eq!(render(&decoded), r#"{"id": 1, "name": "ada"}"#);
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

pub mod codec;
pub mod error;
pub mod path;
pub mod schema;
pub mod value;

// Re-export main types
pub use codec::{
    decode, decode_range, decode_range_with_reader, decode_with_reader, encode, is_absent,
};
pub use codec::de::{read_value, skip_value};
pub use codec::ser::write_value;
pub use codec::zigzag::{decode_varint, decode_zigzag, encode_varint, encode_zigzag};
pub use error::{DecodeError, EncodeError, PathError, SchemaError};
pub use path::select_field;
pub use schema::{
    parse_schema, parse_schema_with_options, EnumSchema, FieldSchema, FixedSchema, LogicalKind,
    LogicalSchema, NamedTypes, RecordSchema, Resolution, Schema, SchemaParser,
};
pub use value::{render, Record, Value};
