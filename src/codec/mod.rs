//! Binary encode/decode of records, with byte-range and schema-evolution
//! forms.
//!
//! The surface preserves two deliberate short-circuits from the adapter this
//! codec replaces:
//! - encoding an absent record (`None`) returns a zero-length buffer, for
//!   every schema, before any validation;
//! - decoding a zero-length range returns a record with every field at its
//!   declared default, for any buffer and offset, before any bounds check.
//!
//! The two pair up: `decode(s, &encode(s, None)?)` is the all-default
//! record. A zero-length buffer is therefore ambiguous between "no record"
//! and a genuine encoding, which does not otherwise occur for non-trivial
//! schemas; [`is_absent`] names the check so the ambiguity is visible at
//! call sites.
//!
//! Bytes inside a decoded range beyond what the schema consumes are
//! ignored.
//!
//! The canonical in-memory form of a union-typed field is
//! [`Value::Union`](crate::value::Value::Union) carrying the branch index.
//! Encoding also accepts a bare (untagged) value in a union slot and tags
//! it with the first branch it fits; decoding always returns the tagged
//! form. A record using the bare convenience therefore round-trips to its
//! tagged equivalent, and the two encode to identical bytes. Enum fields
//! behave the same way: the symbol is canonical (a stale index is
//! re-derived on encode, and a plain string value is accepted), and
//! decoding returns the full `Value::Enum` form.

pub mod de;
pub mod ser;
pub mod zigzag;

use crate::error::{DecodeError, EncodeError, SchemaError};
use crate::schema::{evolution::Resolution, NamedTypes, RecordSchema, Schema};
use crate::value::Record;

/// Whether an encoded buffer is the "absent record" marker produced by
/// `encode(schema, None)`.
#[inline]
pub fn is_absent(bytes: &[u8]) -> bool {
    bytes.is_empty()
}

/// Encode a record against a schema into its Avro binary form.
///
/// `None` short-circuits to a zero-length buffer without touching the
/// schema. Otherwise field values are written in schema-declared order; a
/// field missing from the record falls back to its declared default, and a
/// field with neither value nor default fails the encode.
///
/// # Errors
/// `EncodeError` when the schema is not record-shaped, a field value does
/// not fit its declared type, or a required field has no value.
pub fn encode(schema: &Schema, record: Option<&Record>) -> Result<Vec<u8>, EncodeError> {
    let record = match record {
        Some(record) => record,
        None => return Ok(Vec::new()),
    };
    let types = NamedTypes::from_schema(schema);
    let root = root_record(schema, &types)?;
    let mut buf = Vec::new();
    ser::write_record(root, record, &mut buf, &types)?;
    Ok(buf)
}

/// Decode a full buffer with a single schema (no evolution).
pub fn decode(schema: &Schema, bytes: &[u8]) -> Result<Record, DecodeError> {
    decode_with_reader(schema, schema, bytes)
}

/// Decode a byte range `[offset, offset+length)` with a single schema.
pub fn decode_range(
    schema: &Schema,
    bytes: &[u8],
    offset: usize,
    length: usize,
) -> Result<Record, DecodeError> {
    decode_range_with_reader(schema, schema, bytes, offset, length)
}

/// Decode a full buffer, resolving the writer schema against a reader
/// schema (schema evolution).
pub fn decode_with_reader(
    writer: &Schema,
    reader: &Schema,
    bytes: &[u8],
) -> Result<Record, DecodeError> {
    if is_absent(bytes) {
        return Ok(empty_record(reader)?);
    }
    let writer_types = NamedTypes::from_schema(writer);
    let reader_types = NamedTypes::from_schema(reader);
    let writer_root = root_record(writer, &writer_types)?;
    let reader_root = root_record(reader, &reader_types)?;

    let mut cursor = bytes;
    if writer_root == reader_root {
        return de::read_record(reader_root, &mut cursor, &reader_types);
    }
    let resolution = Resolution::new(writer_root, reader_root, &writer_types, &reader_types)?;
    resolution.decode(&mut cursor)
}

/// Decode a byte range with separate writer and reader schemas. The fully
/// general form; the other decode functions delegate to it.
///
/// A zero `length` returns the all-default record for the reader schema
/// before any bounds checking. Otherwise the range must lie within the
/// buffer; bytes in the range beyond what the schema consumes are ignored.
///
/// # Errors
/// `DecodeError::RangeOutOfBounds` when a non-empty range exceeds the
/// buffer; `DecodeError` when the range is truncated or malformed, or the
/// schemas are not resolvable.
pub fn decode_range_with_reader(
    writer: &Schema,
    reader: &Schema,
    bytes: &[u8],
    offset: usize,
    length: usize,
) -> Result<Record, DecodeError> {
    // Zero length is "absent", checked before bounds
    if length == 0 {
        return Ok(empty_record(reader)?);
    }
    let end = offset.checked_add(length).filter(|end| *end <= bytes.len());
    match end {
        Some(end) => decode_with_reader(writer, reader, &bytes[offset..end]),
        None => Err(DecodeError::RangeOutOfBounds {
            offset,
            length,
            available: bytes.len(),
        }),
    }
}

/// The all-default record a zero-length decode returns.
fn empty_record(reader: &Schema) -> Result<Record, SchemaError> {
    let types = NamedTypes::from_schema(reader);
    let root = root_record(reader, &types)?;
    Ok(Record::new(root))
}

/// Resolve the top-level schema to its record definition.
///
/// Record encode/decode is record-shaped by construction: the root must be
/// a record, possibly through `Ref` indirection.
fn root_record<'a>(
    schema: &'a Schema,
    types: &'a NamedTypes,
) -> Result<&'a RecordSchema, SchemaError> {
    match types.follow(schema)? {
        Schema::Record(record) => Ok(record),
        other => Err(SchemaError::InvalidSchema(format!(
            "Top-level schema must be a record, found '{}'",
            other.type_name()
        ))),
    }
}
