//! Avro binary decoder.
//!
//! Cursor-style decoding over a `&mut &[u8]`: each function consumes exactly
//! the bytes its type demands and advances the cursor. The binary encoding
//! follows the Avro specification:
//! - ints and longs are zigzag varints
//! - floats and doubles are little-endian IEEE 754
//! - bytes and strings are length-prefixed
//! - records are field encodings concatenated in schema order, with no
//!   names, tags, or length prefix

use crate::codec::zigzag;
use crate::error::DecodeError;
use crate::schema::{EnumSchema, FixedSchema, NamedTypes, RecordSchema, Schema};
use crate::value::{Record, Value};

/// Decode a null value (no-op, consumes no bytes).
#[inline]
pub fn read_null(_data: &mut &[u8]) -> Result<(), DecodeError> {
    Ok(())
}

/// Decode a boolean value (a single 0x00 or 0x01 byte).
#[inline]
pub fn read_boolean(data: &mut &[u8]) -> Result<bool, DecodeError> {
    if data.is_empty() {
        return Err(DecodeError::UnexpectedEof);
    }
    let byte = data[0];
    *data = &data[1..];
    match byte {
        0 => Ok(false),
        1 => Ok(true),
        _ => Err(DecodeError::InvalidData(format!(
            "Invalid boolean value: {}, expected 0 or 1",
            byte
        ))),
    }
}

/// Decode a 32-bit signed integer (zigzag varint encoded).
#[inline]
pub fn read_int(data: &mut &[u8]) -> Result<i32, DecodeError> {
    let long = read_long(data)?;
    if long < i32::MIN as i64 || long > i32::MAX as i64 {
        return Err(DecodeError::InvalidData(format!(
            "Integer overflow: {} does not fit in i32",
            long
        )));
    }
    Ok(long as i32)
}

/// Decode a 64-bit signed integer (zigzag varint encoded).
#[inline]
pub fn read_long(data: &mut &[u8]) -> Result<i64, DecodeError> {
    zigzag::decode_zigzag(data)
}

/// Decode a 32-bit IEEE 754 floating-point number (little-endian).
#[inline]
pub fn read_float(data: &mut &[u8]) -> Result<f32, DecodeError> {
    if data.len() < 4 {
        return Err(DecodeError::UnexpectedEof);
    }
    let bytes: [u8; 4] = [data[0], data[1], data[2], data[3]];
    *data = &data[4..];
    Ok(f32::from_le_bytes(bytes))
}

/// Decode a 64-bit IEEE 754 floating-point number (little-endian).
#[inline]
pub fn read_double(data: &mut &[u8]) -> Result<f64, DecodeError> {
    if data.len() < 8 {
        return Err(DecodeError::UnexpectedEof);
    }
    let bytes: [u8; 8] = [
        data[0], data[1], data[2], data[3], data[4], data[5], data[6], data[7],
    ];
    *data = &data[8..];
    Ok(f64::from_le_bytes(bytes))
}

/// Decode a byte array (long length prefix, then that many bytes).
#[inline]
pub fn read_bytes(data: &mut &[u8]) -> Result<Vec<u8>, DecodeError> {
    let len = read_long(data)?;
    if len < 0 {
        return Err(DecodeError::InvalidData(format!(
            "Negative bytes length: {}",
            len
        )));
    }
    let len = len as usize;
    if data.len() < len {
        return Err(DecodeError::UnexpectedEof);
    }
    let bytes = data[..len].to_vec();
    *data = &data[len..];
    Ok(bytes)
}

/// Decode a UTF-8 string (long length prefix, then that many bytes).
#[inline]
pub fn read_string(data: &mut &[u8]) -> Result<String, DecodeError> {
    let bytes = read_bytes(data)?;
    String::from_utf8(bytes).map_err(DecodeError::from)
}

/// Decode an enum value (int index into the symbol list).
pub fn read_enum(schema: &EnumSchema, data: &mut &[u8]) -> Result<(usize, String), DecodeError> {
    let index = read_int(data)?;
    if index < 0 || index as usize >= schema.symbols.len() {
        return Err(DecodeError::InvalidData(format!(
            "Enum index {} out of range for '{}' with {} symbols",
            index,
            schema.name,
            schema.symbols.len()
        )));
    }
    let index = index as usize;
    Ok((index, schema.symbols[index].clone()))
}

/// Decode a fixed-size byte array (raw bytes of the schema-declared size).
pub fn read_fixed(schema: &FixedSchema, data: &mut &[u8]) -> Result<Vec<u8>, DecodeError> {
    if data.len() < schema.size {
        return Err(DecodeError::UnexpectedEof);
    }
    let bytes = data[..schema.size].to_vec();
    *data = &data[schema.size..];
    Ok(bytes)
}

/// Read one block count for an array or map.
///
/// A negative count means the block is preceded by its byte size (so readers
/// can skip it without decoding); the item count is the absolute value. The
/// byte size is validated against the remaining input but otherwise unused
/// when reading.
fn read_block_count(data: &mut &[u8]) -> Result<usize, DecodeError> {
    let count = read_long(data)?;
    if count >= 0 {
        return Ok(count as usize);
    }
    let byte_size = read_long(data)?;
    if byte_size < 0 || byte_size as usize > data.len() {
        return Err(DecodeError::InvalidData(format!(
            "Invalid block byte size: {}",
            byte_size
        )));
    }
    match count.checked_neg() {
        Some(n) => Ok(n as usize),
        None => Err(DecodeError::InvalidData(format!(
            "Invalid block count: {}",
            count
        ))),
    }
}

/// Decode an array: one or more blocks of items, terminated by a zero count.
pub fn read_array(
    items: &Schema,
    data: &mut &[u8],
    types: &NamedTypes,
) -> Result<Vec<Value>, DecodeError> {
    let mut values = Vec::new();
    loop {
        let count = read_block_count(data)?;
        if count == 0 {
            return Ok(values);
        }
        for _ in 0..count {
            values.push(read_value(items, data, types)?);
        }
    }
}

/// Decode a map: one or more blocks of string-keyed pairs, terminated by a
/// zero count.
pub fn read_map(
    values_schema: &Schema,
    data: &mut &[u8],
    types: &NamedTypes,
) -> Result<Vec<(String, Value)>, DecodeError> {
    let mut entries = Vec::new();
    loop {
        let count = read_block_count(data)?;
        if count == 0 {
            return Ok(entries);
        }
        for _ in 0..count {
            let key = read_string(data)?;
            let value = read_value(values_schema, data, types)?;
            entries.push((key, value));
        }
    }
}

/// Decode a union value (long branch index, then the branch encoding).
pub fn read_union(
    variants: &[Schema],
    data: &mut &[u8],
    types: &NamedTypes,
) -> Result<(usize, Value), DecodeError> {
    let index = read_long(data)?;
    if index < 0 || index as usize >= variants.len() {
        return Err(DecodeError::InvalidData(format!(
            "Union index {} out of range for union with {} branches",
            index,
            variants.len()
        )));
    }
    let index = index as usize;
    let value = read_value(&variants[index], data, types)?;
    Ok((index, value))
}

/// Decode a record: field values in schema-declared order.
pub fn read_record(
    schema: &RecordSchema,
    data: &mut &[u8],
    types: &NamedTypes,
) -> Result<Record, DecodeError> {
    let mut record = Record::with_name(&schema.name);
    for field in &schema.fields {
        let value = read_value(&field.schema, data, types)?;
        record.set(&field.name, value);
    }
    Ok(record)
}

/// Decode one value of any schema type.
///
/// Logical annotations are transparent: values travel as their base type.
pub fn read_value(
    schema: &Schema,
    data: &mut &[u8],
    types: &NamedTypes,
) -> Result<Value, DecodeError> {
    match schema {
        Schema::Null => {
            read_null(data)?;
            Ok(Value::Null)
        }
        Schema::Boolean => Ok(Value::Boolean(read_boolean(data)?)),
        Schema::Int => Ok(Value::Int(read_int(data)?)),
        Schema::Long => Ok(Value::Long(read_long(data)?)),
        Schema::Float => Ok(Value::Float(read_float(data)?)),
        Schema::Double => Ok(Value::Double(read_double(data)?)),
        Schema::Bytes => Ok(Value::Bytes(read_bytes(data)?)),
        Schema::String => Ok(Value::String(read_string(data)?)),
        Schema::Record(record) => Ok(Value::Record(read_record(record, data, types)?)),
        Schema::Enum(enum_schema) => {
            let (index, symbol) = read_enum(enum_schema, data)?;
            Ok(Value::Enum(index, symbol))
        }
        Schema::Array(items) => Ok(Value::Array(read_array(items, data, types)?)),
        Schema::Map(values) => Ok(Value::Map(read_map(values, data, types)?)),
        Schema::Union(variants) => {
            let (index, value) = read_union(variants, data, types)?;
            Ok(Value::Union(index, Box::new(value)))
        }
        Schema::Fixed(fixed) => Ok(Value::Fixed(read_fixed(fixed, data)?)),
        Schema::Ref(_) => {
            let resolved = types.follow(schema)?;
            read_value(resolved, data, types)
        }
        Schema::Logical(logical) => read_value(&logical.base, data, types),
    }
}

/// Skip one value of any schema type without building it.
///
/// Used when a writer field has no counterpart in the reader schema.
pub fn skip_value(schema: &Schema, data: &mut &[u8], types: &NamedTypes) -> Result<(), DecodeError> {
    match schema {
        Schema::Null => Ok(()),
        Schema::Boolean => {
            if data.is_empty() {
                return Err(DecodeError::UnexpectedEof);
            }
            *data = &data[1..];
            Ok(())
        }
        Schema::Int | Schema::Long => zigzag::skip_varint(data),
        Schema::Float => {
            if data.len() < 4 {
                return Err(DecodeError::UnexpectedEof);
            }
            *data = &data[4..];
            Ok(())
        }
        Schema::Double => {
            if data.len() < 8 {
                return Err(DecodeError::UnexpectedEof);
            }
            *data = &data[8..];
            Ok(())
        }
        Schema::Bytes | Schema::String => {
            let len = read_long(data)?;
            if len < 0 {
                return Err(DecodeError::InvalidData(format!(
                    "Negative bytes length: {}",
                    len
                )));
            }
            let len = len as usize;
            if data.len() < len {
                return Err(DecodeError::UnexpectedEof);
            }
            *data = &data[len..];
            Ok(())
        }
        Schema::Record(record) => {
            for field in &record.fields {
                skip_value(&field.schema, data, types)?;
            }
            Ok(())
        }
        Schema::Enum(_) => zigzag::skip_varint(data),
        Schema::Array(items) => skip_blocks(items, false, data, types),
        Schema::Map(values) => skip_blocks(values, true, data, types),
        Schema::Union(variants) => {
            let index = read_long(data)?;
            if index < 0 || index as usize >= variants.len() {
                return Err(DecodeError::InvalidData(format!(
                    "Union index {} out of range for union with {} branches",
                    index,
                    variants.len()
                )));
            }
            skip_value(&variants[index as usize], data, types)
        }
        Schema::Fixed(fixed) => {
            if data.len() < fixed.size {
                return Err(DecodeError::UnexpectedEof);
            }
            *data = &data[fixed.size..];
            Ok(())
        }
        Schema::Ref(_) => {
            let resolved = types.follow(schema)?;
            skip_value(resolved, data, types)
        }
        Schema::Logical(logical) => skip_value(&logical.base, data, types),
    }
}

/// Skip the blocks of an array or map. `keyed` is true when each item is
/// preceded by a string key (maps).
///
/// A negative block count carries the block's byte size, which lets the
/// whole block be skipped without walking its items.
fn skip_blocks(
    item_schema: &Schema,
    keyed: bool,
    data: &mut &[u8],
    types: &NamedTypes,
) -> Result<(), DecodeError> {
    loop {
        let count = read_long(data)?;
        if count == 0 {
            return Ok(());
        }
        if count < 0 {
            let byte_size = read_long(data)?;
            if byte_size < 0 || byte_size as usize > data.len() {
                return Err(DecodeError::InvalidData(format!(
                    "Invalid block byte size: {}",
                    byte_size
                )));
            }
            *data = &data[byte_size as usize..];
            continue;
        }
        for _ in 0..count {
            if keyed {
                skip_value(&Schema::String, data, types)?;
            }
            skip_value(item_schema, data, types)?;
        }
    }
}
