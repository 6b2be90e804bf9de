//! Avro binary encoder.
//!
//! Buffer-appending mirrors of the decoder in [`super::de`]: each function
//! appends the wire encoding of one value to a `Vec<u8>`. Safe widenings
//! (int to long/float/double, long to float/double, float to double) and
//! string/bytes interchange are accepted so that a record projected from an
//! older schema re-encodes under the newer one without copying values first.

use crate::codec::zigzag::{encode_varint, encode_zigzag};
use crate::error::{EncodeError, SchemaError};
use crate::schema::{EnumSchema, FixedSchema, NamedTypes, RecordSchema, Schema};
use crate::value::{Record, Value};

/// Encode a null value (no bytes).
#[inline]
pub fn write_null(_buf: &mut Vec<u8>) {}

/// Encode a boolean as a single byte.
#[inline]
pub fn write_boolean(value: bool, buf: &mut Vec<u8>) {
    buf.push(if value { 1 } else { 0 });
}

/// Encode a 32-bit signed integer as a zigzag varint.
#[inline]
pub fn write_int(value: i32, buf: &mut Vec<u8>) {
    encode_zigzag(value as i64, buf);
}

/// Encode a 64-bit signed integer as a zigzag varint.
#[inline]
pub fn write_long(value: i64, buf: &mut Vec<u8>) {
    encode_zigzag(value, buf);
}

/// Encode a 32-bit float as little-endian IEEE 754.
#[inline]
pub fn write_float(value: f32, buf: &mut Vec<u8>) {
    buf.extend_from_slice(&value.to_le_bytes());
}

/// Encode a 64-bit float as little-endian IEEE 754.
#[inline]
pub fn write_double(value: f64, buf: &mut Vec<u8>) {
    buf.extend_from_slice(&value.to_le_bytes());
}

/// Encode a byte array with its long length prefix.
#[inline]
pub fn write_bytes(value: &[u8], buf: &mut Vec<u8>) {
    write_long(value.len() as i64, buf);
    buf.extend_from_slice(value);
}

/// Encode a string with its long length prefix.
#[inline]
pub fn write_string(value: &str, buf: &mut Vec<u8>) {
    write_bytes(value.as_bytes(), buf);
}

/// Encode an enum symbol as its int index in the schema's symbol list.
///
/// The index is looked up by symbol, not taken from the value, so values
/// projected from a schema with a different symbol order encode correctly.
pub fn write_enum(
    schema: &EnumSchema,
    symbol: &str,
    buf: &mut Vec<u8>,
) -> Result<(), EncodeError> {
    match schema.symbol_index(symbol) {
        Some(index) => {
            write_int(index as i32, buf);
            Ok(())
        }
        None => Err(EncodeError::InvalidValue(format!(
            "'{}' is not a symbol of enum '{}'",
            symbol, schema.name
        ))),
    }
}

/// Encode a fixed-size byte array (raw bytes, no length prefix).
pub fn write_fixed(
    schema: &FixedSchema,
    value: &[u8],
    buf: &mut Vec<u8>,
) -> Result<(), EncodeError> {
    if value.len() != schema.size {
        return Err(EncodeError::InvalidValue(format!(
            "Fixed '{}' requires {} bytes, value has {}",
            schema.name,
            schema.size,
            value.len()
        )));
    }
    buf.extend_from_slice(value);
    Ok(())
}

/// Encode an array as a single block (count, items) plus the terminator.
pub fn write_array(
    items: &Schema,
    values: &[Value],
    buf: &mut Vec<u8>,
    types: &NamedTypes,
) -> Result<(), EncodeError> {
    if !values.is_empty() {
        write_long(values.len() as i64, buf);
        for value in values {
            write_value(items, value, buf, types)?;
        }
    }
    // Zero count terminates the block sequence
    encode_varint(0, buf);
    Ok(())
}

/// Encode a map as a single block (count, key-value pairs) plus the
/// terminator.
pub fn write_map(
    values_schema: &Schema,
    entries: &[(String, Value)],
    buf: &mut Vec<u8>,
    types: &NamedTypes,
) -> Result<(), EncodeError> {
    if !entries.is_empty() {
        write_long(entries.len() as i64, buf);
        for (key, value) in entries {
            write_string(key, buf);
            write_value(values_schema, value, buf, types)?;
        }
    }
    encode_varint(0, buf);
    Ok(())
}

/// Encode a record: field values in schema-declared order.
///
/// A field missing from the record, or left `Null` where the schema does
/// not admit null, falls back to its declared default. With no default the
/// encode fails.
pub fn write_record(
    schema: &RecordSchema,
    record: &Record,
    buf: &mut Vec<u8>,
    types: &NamedTypes,
) -> Result<(), EncodeError> {
    for field in &schema.fields {
        let slot = record.get(&field.name);
        let use_default = match slot {
            None => true,
            Some(Value::Null) => !admits_null(&field.schema, types)?,
            Some(_) => false,
        };
        let value = if use_default { None } else { slot };
        match value {
            Some(value) => write_value(&field.schema, value, buf, types)?,
            None => match &field.default {
                Some(json) => {
                    let default = Value::from_json(json, &field.schema, types)?;
                    write_value(&field.schema, &default, buf, types)?;
                }
                None => {
                    return Err(EncodeError::MissingValue {
                        record: schema.name.clone(),
                        field: field.name.clone(),
                    })
                }
            },
        }
    }
    Ok(())
}

/// Encode one value of any schema type.
pub fn write_value(
    schema: &Schema,
    value: &Value,
    buf: &mut Vec<u8>,
    types: &NamedTypes,
) -> Result<(), EncodeError> {
    match (schema, value) {
        (Schema::Null, Value::Null) => Ok(()),
        (Schema::Boolean, Value::Boolean(b)) => {
            write_boolean(*b, buf);
            Ok(())
        }
        (Schema::Int, Value::Int(n)) => {
            write_int(*n, buf);
            Ok(())
        }
        (Schema::Long, Value::Int(n)) => {
            write_long(*n as i64, buf);
            Ok(())
        }
        (Schema::Long, Value::Long(n)) => {
            write_long(*n, buf);
            Ok(())
        }
        (Schema::Float, Value::Int(n)) => {
            write_float(*n as f32, buf);
            Ok(())
        }
        (Schema::Float, Value::Long(n)) => {
            write_float(*n as f32, buf);
            Ok(())
        }
        (Schema::Float, Value::Float(f)) => {
            write_float(*f, buf);
            Ok(())
        }
        (Schema::Double, Value::Int(n)) => {
            write_double(*n as f64, buf);
            Ok(())
        }
        (Schema::Double, Value::Long(n)) => {
            write_double(*n as f64, buf);
            Ok(())
        }
        (Schema::Double, Value::Float(f)) => {
            write_double(*f as f64, buf);
            Ok(())
        }
        (Schema::Double, Value::Double(f)) => {
            write_double(*f, buf);
            Ok(())
        }
        (Schema::Bytes, Value::Bytes(b)) => {
            write_bytes(b, buf);
            Ok(())
        }
        (Schema::Bytes, Value::String(s)) => {
            write_bytes(s.as_bytes(), buf);
            Ok(())
        }
        (Schema::String, Value::String(s)) => {
            write_string(s, buf);
            Ok(())
        }
        (Schema::String, Value::Bytes(b)) => match std::str::from_utf8(b) {
            Ok(s) => {
                write_string(s, buf);
                Ok(())
            }
            Err(_) => Err(EncodeError::InvalidValue(
                "Bytes value is not valid UTF-8, cannot encode as string".to_string(),
            )),
        },
        (Schema::Record(record_schema), Value::Record(record)) => {
            write_record(record_schema, record, buf, types)
        }
        (Schema::Enum(enum_schema), Value::Enum(_, symbol)) => {
            write_enum(enum_schema, symbol, buf)
        }
        (Schema::Enum(enum_schema), Value::String(symbol)) => {
            write_enum(enum_schema, symbol, buf)
        }
        (Schema::Array(items), Value::Array(values)) => write_array(items, values, buf, types),
        (Schema::Map(values_schema), Value::Map(entries)) => {
            write_map(values_schema, entries, buf, types)
        }
        (Schema::Union(variants), Value::Union(index, inner)) => {
            match variants.get(*index) {
                Some(branch) => {
                    write_long(*index as i64, buf);
                    write_value(branch, inner, buf, types)
                }
                None => Err(EncodeError::InvalidValue(format!(
                    "Union index {} out of range for union with {} branches",
                    index,
                    variants.len()
                ))),
            }
        }
        // A bare value against a union picks the first matching branch.
        // Decoding always returns the tagged Union form, so this is a
        // convenience alias for the canonical representation, not a third
        // wire shape.
        (Schema::Union(variants), bare) => {
            for (index, branch) in variants.iter().enumerate() {
                if value_fits(bare, branch, types) {
                    write_long(index as i64, buf);
                    return write_value(branch, bare, buf, types);
                }
            }
            Err(EncodeError::TypeMismatch(format!(
                "No union branch accepts a {} value",
                bare.type_name()
            )))
        }
        (Schema::Fixed(fixed), Value::Fixed(b)) => write_fixed(fixed, b, buf),
        (Schema::Fixed(fixed), Value::Bytes(b)) => write_fixed(fixed, b, buf),
        (Schema::Ref(_), _) => {
            let resolved = types.follow(schema)?;
            write_value(resolved, value, buf, types)
        }
        (Schema::Logical(logical), _) => write_value(&logical.base, value, buf, types),
        (schema, value) => Err(EncodeError::TypeMismatch(format!(
            "Cannot encode {} value as {}",
            value.type_name(),
            schema.type_name()
        ))),
    }
}

/// Whether a schema admits a null value (it is null, or a union with a null
/// branch).
fn admits_null(schema: &Schema, types: &NamedTypes) -> Result<bool, SchemaError> {
    match types.follow(schema)? {
        Schema::Null => Ok(true),
        Schema::Union(variants) => Ok(variants.iter().any(|v| matches!(v, Schema::Null))),
        Schema::Logical(logical) => admits_null(&logical.base, types),
        _ => Ok(false),
    }
}

/// Whether a value could encode under a schema. Used to pick a union branch
/// for a bare (untagged) value; the actual encode still validates fully.
fn value_fits(value: &Value, schema: &Schema, types: &NamedTypes) -> bool {
    let schema = match types.follow(schema) {
        Ok(s) => s,
        Err(_) => return false,
    };
    match (schema, value) {
        (Schema::Null, Value::Null) => true,
        (Schema::Boolean, Value::Boolean(_)) => true,
        (Schema::Int, Value::Int(_)) => true,
        (Schema::Long, Value::Int(_) | Value::Long(_)) => true,
        (Schema::Float, Value::Int(_) | Value::Long(_) | Value::Float(_)) => true,
        (
            Schema::Double,
            Value::Int(_) | Value::Long(_) | Value::Float(_) | Value::Double(_),
        ) => true,
        (Schema::Bytes, Value::Bytes(_) | Value::String(_)) => true,
        (Schema::String, Value::String(_)) => true,
        (Schema::String, Value::Bytes(b)) => std::str::from_utf8(b).is_ok(),
        // Records and enums in a union are distinguished by name
        (Schema::Record(r), Value::Record(record)) => r.name == record.name(),
        (Schema::Enum(e), Value::Enum(_, symbol)) => e.symbol_index(symbol).is_some(),
        (Schema::Array(_), Value::Array(_)) => true,
        (Schema::Map(_), Value::Map(_)) => true,
        (Schema::Fixed(f), Value::Fixed(b) | Value::Bytes(b)) => b.len() == f.size,
        (Schema::Logical(logical), value) => value_fits(value, &logical.base, types),
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::FieldSchema;
    use serde_json::json;

    #[test]
    fn test_write_primitives() {
        let mut buf = Vec::new();
        write_boolean(true, &mut buf);
        write_int(1, &mut buf);
        write_long(-1, &mut buf);
        write_string("ab", &mut buf);
        assert_eq!(buf, vec![0x01, 0x02, 0x01, 0x04, b'a', b'b']);
    }

    #[test]
    fn test_write_array_single_block() {
        let types = NamedTypes::new();
        let mut buf = Vec::new();
        write_array(
            &Schema::Int,
            &[Value::Int(1), Value::Int(2)],
            &mut buf,
            &types,
        )
        .unwrap();
        // Count 2, items 1 and 2, terminator
        assert_eq!(buf, vec![0x04, 0x02, 0x04, 0x00]);
    }

    #[test]
    fn test_write_empty_array_is_terminator_only() {
        let types = NamedTypes::new();
        let mut buf = Vec::new();
        write_array(&Schema::Int, &[], &mut buf, &types).unwrap();
        assert_eq!(buf, vec![0x00]);
    }

    #[test]
    fn test_write_enum_reindexes_by_symbol() {
        let schema = EnumSchema::new("Color", vec!["RED".to_string(), "GREEN".to_string()]);
        let mut buf = Vec::new();
        // Value carries index 5 from some other schema; symbol wins
        write_value(
            &Schema::Enum(schema),
            &Value::Enum(5, "GREEN".to_string()),
            &mut buf,
            &NamedTypes::new(),
        )
        .unwrap();
        assert_eq!(buf, vec![0x02]);
    }

    #[test]
    fn test_write_fixed_size_mismatch() {
        let schema = FixedSchema::new("Hash", 4);
        let mut buf = Vec::new();
        let result = write_fixed(&schema, &[1, 2, 3], &mut buf);
        assert!(matches!(result, Err(EncodeError::InvalidValue(_))));
    }

    #[test]
    fn test_write_union_bare_value_picks_branch() {
        let types = NamedTypes::new();
        let schema = Schema::Union(vec![Schema::Null, Schema::String]);
        let mut buf = Vec::new();
        write_value(
            &schema,
            &Value::String("x".to_string()),
            &mut buf,
            &types,
        )
        .unwrap();
        // Branch 1, then length-prefixed "x"
        assert_eq!(buf, vec![0x02, 0x02, b'x']);
    }

    #[test]
    fn test_write_union_no_matching_branch() {
        let types = NamedTypes::new();
        let schema = Schema::Union(vec![Schema::Null, Schema::String]);
        let mut buf = Vec::new();
        let result = write_value(&schema, &Value::Boolean(true), &mut buf, &types);
        assert!(matches!(result, Err(EncodeError::TypeMismatch(_))));
    }

    #[test]
    fn test_write_record_default_fallback() {
        let types = NamedTypes::new();
        let schema = RecordSchema::new(
            "R",
            vec![FieldSchema::new("n", Schema::Int).with_default(json!(7))],
        );
        // Record has no value for "n"; the declared default is encoded
        let record = Record::with_name("R");
        let mut buf = Vec::new();
        write_record(&schema, &record, &mut buf, &types).unwrap();
        assert_eq!(buf, vec![0x0E]);
    }

    #[test]
    fn test_write_record_missing_value_no_default() {
        let types = NamedTypes::new();
        let schema = RecordSchema::new("R", vec![FieldSchema::new("n", Schema::Int)]);
        let record = Record::with_name("R");
        let mut buf = Vec::new();
        let result = write_record(&schema, &record, &mut buf, &types);
        assert!(matches!(result, Err(EncodeError::MissingValue { .. })));
    }

    #[test]
    fn test_write_int_promotes_to_long_schema() {
        let types = NamedTypes::new();
        let mut long_buf = Vec::new();
        write_value(&Schema::Long, &Value::Int(42), &mut long_buf, &types).unwrap();
        let mut int_buf = Vec::new();
        write_value(&Schema::Int, &Value::Int(42), &mut int_buf, &types).unwrap();
        // Same varint either way
        assert_eq!(long_buf, int_buf);
    }
}
