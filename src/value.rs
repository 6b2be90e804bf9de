//! In-memory values and generic records.
//!
//! Decoded Avro data is represented as a tagged [`Value`] enum rather than
//! dynamically-typed boxes, so consumers (the codec, schema resolution, the
//! dotted-path lookup) can pattern-match instead of downcasting.

use std::fmt;

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use serde_json::Value as JsonValue;

use crate::error::SchemaError;
use crate::schema::{NamedTypes, RecordSchema, Schema};

/// A decoded Avro value.
///
/// Each variant corresponds to one Avro type. Union values carry the branch
/// index alongside the inner value; enum values carry both the symbol index
/// and the symbol itself.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    /// Null value.
    Null,
    /// Boolean value.
    Boolean(bool),
    /// 32-bit signed integer.
    Int(i32),
    /// 64-bit signed integer.
    Long(i64),
    /// 32-bit IEEE 754 floating-point.
    Float(f32),
    /// 64-bit IEEE 754 floating-point.
    Double(f64),
    /// Byte sequence.
    Bytes(Vec<u8>),
    /// UTF-8 string.
    String(String),
    /// Nested record.
    Record(Record),
    /// Enum symbol: index into the schema's symbol list, plus the symbol.
    Enum(usize, String),
    /// Array of values.
    Array(Vec<Value>),
    /// Map from string keys to values, in insertion order.
    Map(Vec<(String, Value)>),
    /// Union value: branch index into the union schema, plus the value.
    Union(usize, Box<Value>),
    /// Fixed-size byte array.
    Fixed(Vec<u8>),
}

impl Value {
    /// A short lowercase name for the value kind, for diagnostics.
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Null => "null",
            Value::Boolean(_) => "boolean",
            Value::Int(_) => "int",
            Value::Long(_) => "long",
            Value::Float(_) => "float",
            Value::Double(_) => "double",
            Value::Bytes(_) => "bytes",
            Value::String(_) => "string",
            Value::Record(_) => "record",
            Value::Enum(_, _) => "enum",
            Value::Array(_) => "array",
            Value::Map(_) => "map",
            Value::Union(_, _) => "union",
            Value::Fixed(_) => "fixed",
        }
    }

    /// Convert a JSON-encoded value (as found in a schema's `default`
    /// declaration) into a [`Value`] matching the given schema.
    ///
    /// Follows the Avro JSON encoding for defaults: bytes and fixed are
    /// strings whose code points are the byte values, enums are their symbol
    /// string, and a union default is encoded against the union's first
    /// branch (and tagged as branch 0).
    ///
    /// # Errors
    /// `SchemaError::InvalidSchema` if the JSON shape does not match the
    /// schema (e.g. a string default for an int field, an unknown enum
    /// symbol, a fixed default of the wrong length).
    pub fn from_json(
        json: &JsonValue,
        schema: &Schema,
        types: &NamedTypes,
    ) -> Result<Value, SchemaError> {
        let schema = types.follow(schema)?;
        match schema {
            Schema::Null => match json {
                JsonValue::Null => Ok(Value::Null),
                other => Err(mismatch("null", other)),
            },
            Schema::Boolean => match json {
                JsonValue::Bool(b) => Ok(Value::Boolean(*b)),
                other => Err(mismatch("boolean", other)),
            },
            Schema::Int => match json.as_i64() {
                Some(n) if (i32::MIN as i64..=i32::MAX as i64).contains(&n) => {
                    Ok(Value::Int(n as i32))
                }
                _ => Err(mismatch("int", json)),
            },
            Schema::Long => match json.as_i64() {
                Some(n) => Ok(Value::Long(n)),
                None => Err(mismatch("long", json)),
            },
            Schema::Float => match json.as_f64() {
                Some(n) => Ok(Value::Float(n as f32)),
                None => Err(mismatch("float", json)),
            },
            Schema::Double => match json.as_f64() {
                Some(n) => Ok(Value::Double(n)),
                None => Err(mismatch("double", json)),
            },
            Schema::Bytes => match json {
                JsonValue::String(s) => Ok(Value::Bytes(json_string_to_bytes(s)?)),
                other => Err(mismatch("bytes", other)),
            },
            Schema::String => match json {
                JsonValue::String(s) => Ok(Value::String(s.clone())),
                other => Err(mismatch("string", other)),
            },
            Schema::Record(record) => match json {
                JsonValue::Object(obj) => {
                    let mut fields = Vec::with_capacity(record.fields.len());
                    for field in &record.fields {
                        let value = match obj.get(&field.name) {
                            Some(v) => Value::from_json(v, &field.schema, types)?,
                            None => match &field.default {
                                Some(d) => Value::from_json(d, &field.schema, types)?,
                                None => {
                                    return Err(SchemaError::InvalidSchema(format!(
                                        "Record default for '{}' is missing field '{}'",
                                        record.name, field.name
                                    )))
                                }
                            },
                        };
                        fields.push((field.name.clone(), value));
                    }
                    Ok(Value::Record(Record {
                        name: record.name.clone(),
                        fields,
                    }))
                }
                other => Err(mismatch("record", other)),
            },
            Schema::Enum(enum_schema) => match json {
                JsonValue::String(symbol) => match enum_schema.symbol_index(symbol) {
                    Some(index) => Ok(Value::Enum(index, symbol.clone())),
                    None => Err(SchemaError::InvalidSchema(format!(
                        "'{}' is not a symbol of enum '{}'",
                        symbol, enum_schema.name
                    ))),
                },
                other => Err(mismatch("enum", other)),
            },
            Schema::Array(items) => match json {
                JsonValue::Array(arr) => {
                    let values: Result<Vec<Value>, SchemaError> = arr
                        .iter()
                        .map(|item| Value::from_json(item, items, types))
                        .collect();
                    Ok(Value::Array(values?))
                }
                other => Err(mismatch("array", other)),
            },
            Schema::Map(values) => match json {
                JsonValue::Object(obj) => {
                    let mut entries = Vec::with_capacity(obj.len());
                    for (key, item) in obj {
                        entries.push((key.clone(), Value::from_json(item, values, types)?));
                    }
                    Ok(Value::Map(entries))
                }
                other => Err(mismatch("map", other)),
            },
            // A union default is encoded against the first branch
            Schema::Union(variants) => match variants.first() {
                Some(first) => {
                    let inner = Value::from_json(json, first, types)?;
                    Ok(Value::Union(0, Box::new(inner)))
                }
                None => Err(SchemaError::InvalidSchema(
                    "Union schema cannot be empty".to_string(),
                )),
            },
            Schema::Fixed(fixed) => match json {
                JsonValue::String(s) => {
                    let bytes = json_string_to_bytes(s)?;
                    if bytes.len() != fixed.size {
                        return Err(SchemaError::InvalidSchema(format!(
                            "Fixed default for '{}' has {} bytes, expected {}",
                            fixed.name,
                            bytes.len(),
                            fixed.size
                        )));
                    }
                    Ok(Value::Fixed(bytes))
                }
                other => Err(mismatch("fixed", other)),
            },
            Schema::Logical(logical) => Value::from_json(json, &logical.base, types),
            // follow() never returns a Ref
            Schema::Ref(name) => Err(SchemaError::InvalidSchema(format!(
                "Unresolved named type reference: '{}'",
                name
            ))),
        }
    }
}

fn mismatch(expected: &str, found: &JsonValue) -> SchemaError {
    SchemaError::InvalidSchema(format!(
        "Default value {} does not match schema type '{}'",
        found, expected
    ))
}

/// Avro JSON-encodes bytes/fixed defaults as a string whose code points are
/// the byte values (0..=255). Code points above 255 have no byte value and
/// are rejected.
fn json_string_to_bytes(s: &str) -> Result<Vec<u8>, SchemaError> {
    s.chars()
        .map(|c| {
            u8::try_from(c as u32).map_err(|_| {
                SchemaError::InvalidSchema(format!(
                    "Byte default contains code point U+{:04X}, outside 0..=255",
                    c as u32
                ))
            })
        })
        .collect()
}

/// A generic record: a named, ordered collection of field values.
///
/// Field order matches the schema the record was built from; lookups are by
/// field name. Nested records are owned by their parent.
#[derive(Debug, Clone, PartialEq)]
pub struct Record {
    name: String,
    fields: Vec<(String, Value)>,
}

impl Record {
    /// Create a record conforming to the given schema, with every field at
    /// its declared default (or [`Value::Null`] when no default is declared
    /// or the default cannot be interpreted).
    ///
    /// This is the "all-default-valued empty record" that a zero-length
    /// decode returns.
    pub fn new(schema: &RecordSchema) -> Self {
        let types = NamedTypes::from_record(schema);
        let fields = schema
            .fields
            .iter()
            .map(|field| {
                let value = field
                    .default
                    .as_ref()
                    .and_then(|d| Value::from_json(d, &field.schema, &types).ok())
                    .unwrap_or(Value::Null);
                (field.name.clone(), value)
            })
            .collect();
        Self {
            name: schema.name.clone(),
            fields,
        }
    }

    /// Create a record with the given name and no fields.
    pub fn with_name(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            fields: Vec::new(),
        }
    }

    /// The record's name (from its schema).
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Get a field value by name.
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.fields
            .iter()
            .find(|(field, _)| field == name)
            .map(|(_, value)| value)
    }

    /// Set a field value by name, appending the field if it does not exist.
    ///
    /// Returns `true` if the field already existed.
    pub fn set(&mut self, name: impl Into<String>, value: Value) -> bool {
        let name = name.into();
        match self.fields.iter_mut().find(|(field, _)| *field == name) {
            Some((_, slot)) => {
                *slot = value;
                true
            }
            None => {
                self.fields.push((name, value));
                false
            }
        }
    }

    /// The fields in order, as (name, value) pairs.
    pub fn fields(&self) -> &[(String, Value)] {
        &self.fields
    }

    /// Number of fields.
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    /// Whether the record has no fields.
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Iterate over (name, value) pairs in field order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.fields
            .iter()
            .map(|(name, value)| (name.as_str(), value))
    }

    /// Consume the record, yielding its (name, value) pairs in field order.
    pub fn into_fields(self) -> Vec<(String, Value)> {
        self.fields
    }
}

/// Render a record as deterministic, human-readable JSON-shaped text.
///
/// Fields appear in record order (not sorted), bytes and fixed values render
/// as base64 strings, enums as their symbol, and union values as their inner
/// value. The output is for logging and debugging; it is not guaranteed to
/// parse back into a [`Record`].
pub fn render(record: &Record) -> String {
    let mut out = String::new();
    render_record(record, &mut out);
    out
}

fn render_record(record: &Record, out: &mut String) {
    out.push('{');
    for (i, (name, value)) in record.fields.iter().enumerate() {
        if i > 0 {
            out.push_str(", ");
        }
        render_json_string(name, out);
        out.push_str(": ");
        render_value(value, out);
    }
    out.push('}');
}

fn render_value(value: &Value, out: &mut String) {
    match value {
        Value::Null => out.push_str("null"),
        Value::Boolean(b) => out.push_str(if *b { "true" } else { "false" }),
        Value::Int(n) => out.push_str(&n.to_string()),
        Value::Long(n) => out.push_str(&n.to_string()),
        Value::Float(f) => out.push_str(&f.to_string()),
        Value::Double(f) => out.push_str(&f.to_string()),
        Value::Bytes(b) | Value::Fixed(b) => {
            render_json_string(&BASE64.encode(b), out);
        }
        Value::String(s) => render_json_string(s, out),
        Value::Record(r) => render_record(r, out),
        Value::Enum(_, symbol) => render_json_string(symbol, out),
        Value::Array(items) => {
            out.push('[');
            for (i, item) in items.iter().enumerate() {
                if i > 0 {
                    out.push_str(", ");
                }
                render_value(item, out);
            }
            out.push(']');
        }
        Value::Map(entries) => {
            out.push('{');
            for (i, (key, item)) in entries.iter().enumerate() {
                if i > 0 {
                    out.push_str(", ");
                }
                render_json_string(key, out);
                out.push_str(": ");
                render_value(item, out);
            }
            out.push('}');
        }
        Value::Union(_, inner) => render_value(inner, out),
    }
}

fn render_json_string(s: &str, out: &mut String) {
    match serde_json::to_string(s) {
        Ok(quoted) => out.push_str(&quoted),
        // to_string on a &str cannot fail; keep the raw text if it somehow does
        Err(_) => out.push_str(s),
    }
}

impl fmt::Display for Record {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&render(self))
    }
}
