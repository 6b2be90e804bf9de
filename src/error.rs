//! Error types for schema handling and the binary codec

use thiserror::Error;

/// Errors that can occur during schema operations
#[derive(Debug, Error)]
pub enum SchemaError {
    /// Invalid schema format
    #[error("Invalid schema: {0}")]
    InvalidSchema(String),
    /// Unsupported schema type
    #[error("Unsupported type: {0}")]
    UnsupportedType(String),
    /// Schema parsing error
    #[error("Parse error: {0}")]
    ParseError(String),
    /// Incompatible schema evolution
    #[error("Incompatible schemas: {0}")]
    IncompatibleSchemas(String),
}

/// Errors that can occur during encoding
#[derive(Debug, Error)]
pub enum EncodeError {
    /// Value does not match the schema
    #[error("Type mismatch: {0}")]
    TypeMismatch(String),
    /// Value violates a schema constraint (enum symbol, fixed size, union index)
    #[error("Invalid value: {0}")]
    InvalidValue(String),
    /// Field has no value and no default to fall back to
    #[error("Missing value for field '{field}' of record '{record}' and no default declared")]
    MissingValue {
        /// The record being encoded
        record: String,
        /// The field with no value
        field: String,
    },
    /// Schema error
    #[error("Schema error: {0}")]
    Schema(#[from] SchemaError),
}

/// Errors that can occur during decoding
#[derive(Debug, Error)]
pub enum DecodeError {
    /// Invalid Avro data
    #[error("Invalid data: {0}")]
    InvalidData(String),
    /// Unexpected end of data
    #[error("Unexpected end of data")]
    UnexpectedEof,
    /// Type mismatch
    #[error("Type mismatch: {0}")]
    TypeMismatch(String),
    /// Invalid varint encoding
    #[error("Invalid varint encoding")]
    InvalidVarint,
    /// String is not valid UTF-8
    #[error("Invalid UTF-8: {0}")]
    InvalidUtf8(#[from] std::string::FromUtf8Error),
    /// Requested byte range falls outside the buffer
    #[error("Range [{offset}, {offset}+{length}) out of bounds for buffer of {available} bytes")]
    RangeOutOfBounds {
        /// Start of the requested range
        offset: usize,
        /// Length of the requested range
        length: usize,
        /// Total bytes available
        available: usize,
    },
    /// Schema error
    #[error("Schema error: {0}")]
    Schema(#[from] SchemaError),
}

/// Errors that can occur during dotted-path field lookup
#[derive(Debug, Error)]
pub enum PathError {
    /// Path is empty or contains an empty segment
    #[error("Invalid path: {0}")]
    InvalidPath(String),
    /// No field with the given name at this point in the path
    #[error("Field '{segment}' not found in record '{record}'")]
    FieldNotFound {
        /// The record that was searched
        record: String,
        /// The path segment that did not match
        segment: String,
    },
    /// Path descends into a value that is not a record
    #[error("Cannot descend into '{segment}': {kind} value is not a record")]
    NotARecord {
        /// The path segment that failed
        segment: String,
        /// The kind of value encountered
        kind: &'static str,
    },
}
