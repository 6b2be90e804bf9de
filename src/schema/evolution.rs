//! Writer/reader schema resolution.
//!
//! When the schema a buffer was encoded with (the writer schema) differs
//! from the schema the caller wants (the reader schema), decoding resolves
//! the two: fields present only in the reader take their declared default,
//! fields present only in the writer are skipped on the wire, and fields
//! present in both are read with the writer's on-wire type and promoted to
//! the reader's declared type where Avro's promotion rules allow.

use tracing::debug;

use crate::codec::de::{read_value, skip_value};
use crate::error::{DecodeError, SchemaError};
use crate::schema::{FieldSchema, NamedTypes, RecordSchema, Schema};
use crate::value::{Record, Value};

/// What to do with each writer field, in wire (writer schema) order.
#[derive(Debug)]
enum FieldAction {
    /// Read with the writer field's schema and project into the reader
    /// field at this index.
    Decode { reader_index: usize },
    /// No counterpart in the reader; skip the encoding.
    Skip,
}

/// A resolved mapping from a writer record schema to a reader record schema.
///
/// Built once per (writer, reader) pair and reused for every record decoded
/// against that pair.
#[derive(Debug)]
pub struct Resolution<'a> {
    writer: &'a RecordSchema,
    reader: &'a RecordSchema,
    writer_types: &'a NamedTypes,
    reader_types: &'a NamedTypes,
    actions: Vec<FieldAction>,
    /// Reader fields absent from the writer, with their defaults prebuilt.
    defaults: Vec<(usize, Value)>,
}

impl<'a> Resolution<'a> {
    /// Build the field mapping between a writer and a reader record schema.
    ///
    /// # Errors
    /// `SchemaError::IncompatibleSchemas` when a field present in both has
    /// unresolvable types, or the reader requires a field the writer omits
    /// and declares no default for it.
    pub fn new(
        writer: &'a RecordSchema,
        reader: &'a RecordSchema,
        writer_types: &'a NamedTypes,
        reader_types: &'a NamedTypes,
    ) -> Result<Self, SchemaError> {
        let mut matched: Vec<Option<usize>> = vec![None; writer.fields.len()];
        let mut defaults = Vec::new();

        for (reader_index, reader_field) in reader.fields.iter().enumerate() {
            match find_writer_field(writer, reader_field) {
                Some(writer_index) => {
                    let writer_field = &writer.fields[writer_index];
                    let mut seen = Vec::new();
                    if !resolvable(
                        &writer_field.schema,
                        &reader_field.schema,
                        writer_types,
                        reader_types,
                        &mut seen,
                    ) {
                        return Err(SchemaError::IncompatibleSchemas(format!(
                            "Field '{}' cannot resolve writer type '{}' to reader type '{}'",
                            reader_field.name,
                            writer_field.schema.type_name(),
                            reader_field.schema.type_name()
                        )));
                    }
                    matched[writer_index] = Some(reader_index);
                }
                None => match &reader_field.default {
                    Some(json) => {
                        debug!(
                            field = %reader_field.name,
                            "reader field absent from writer, using default"
                        );
                        let default =
                            Value::from_json(json, &reader_field.schema, reader_types)?;
                        defaults.push((reader_index, default));
                    }
                    None => {
                        return Err(SchemaError::IncompatibleSchemas(format!(
                            "Reader field '{}' is absent from writer '{}' and has no default",
                            reader_field.name, writer.name
                        )))
                    }
                },
            }
        }

        let actions = matched
            .into_iter()
            .map(|m| match m {
                Some(reader_index) => FieldAction::Decode { reader_index },
                None => FieldAction::Skip,
            })
            .collect();

        Ok(Self {
            writer,
            reader,
            writer_types,
            reader_types,
            actions,
            defaults,
        })
    }

    /// The reader schema this resolution projects into.
    pub fn reader(&self) -> &RecordSchema {
        self.reader
    }

    /// Decode one record from the cursor, projecting it into the reader
    /// schema's shape.
    pub fn decode(&self, data: &mut &[u8]) -> Result<Record, DecodeError> {
        let mut slots: Vec<Option<Value>> = Vec::with_capacity(self.reader.fields.len());
        slots.resize_with(self.reader.fields.len(), || None);

        for (writer_field, action) in self.writer.fields.iter().zip(&self.actions) {
            match action {
                FieldAction::Decode { reader_index } => {
                    let value = read_value(&writer_field.schema, data, self.writer_types)?;
                    let reader_field = &self.reader.fields[*reader_index];
                    let projected = project(
                        value,
                        &writer_field.schema,
                        &reader_field.schema,
                        self.writer_types,
                        self.reader_types,
                    )?;
                    slots[*reader_index] = Some(projected);
                }
                FieldAction::Skip => {
                    debug!(field = %writer_field.name, "skipping writer-only field");
                    skip_value(&writer_field.schema, data, self.writer_types)?;
                }
            }
        }

        for (reader_index, default) in &self.defaults {
            slots[*reader_index] = Some(default.clone());
        }

        let mut record = Record::with_name(&self.reader.name);
        for (field, slot) in self.reader.fields.iter().zip(slots) {
            record.set(&field.name, slot.unwrap_or(Value::Null));
        }
        Ok(record)
    }
}

/// Find the writer field a reader field reads from: matched by name, or by
/// one of the reader field's aliases naming the writer field.
fn find_writer_field(writer: &RecordSchema, reader_field: &FieldSchema) -> Option<usize> {
    writer.fields.iter().position(|wf| {
        wf.name == reader_field.name || reader_field.aliases.iter().any(|a| *a == wf.name)
    })
}

/// Whether a writer schema can resolve to a reader schema under Avro's
/// schema resolution rules.
///
/// Union pairs (either side) are always accepted here; branch matching is
/// per-value at decode time. `seen` guards against recursive named types.
fn resolvable(
    writer: &Schema,
    reader: &Schema,
    writer_types: &NamedTypes,
    reader_types: &NamedTypes,
    seen: &mut Vec<(String, String)>,
) -> bool {
    let writer = match strip(writer, writer_types) {
        Some(s) => s,
        None => return false,
    };
    let reader = match strip(reader, reader_types) {
        Some(s) => s,
        None => return false,
    };

    // Union resolution is per-value
    if matches!(writer, Schema::Union(_)) || matches!(reader, Schema::Union(_)) {
        return true;
    }

    match (writer, reader) {
        (Schema::Null, Schema::Null)
        | (Schema::Boolean, Schema::Boolean)
        | (Schema::Int, Schema::Int)
        | (Schema::Long, Schema::Long)
        | (Schema::Float, Schema::Float)
        | (Schema::Double, Schema::Double)
        | (Schema::Bytes, Schema::Bytes)
        | (Schema::String, Schema::String) => true,

        // Promotions
        (Schema::Int, Schema::Long | Schema::Float | Schema::Double) => true,
        (Schema::Long, Schema::Float | Schema::Double) => true,
        (Schema::Float, Schema::Double) => true,
        (Schema::String, Schema::Bytes) => true,
        (Schema::Bytes, Schema::String) => true,

        (Schema::Record(w), Schema::Record(r)) => {
            if !names_match(&w.name, &r.name, &r.aliases) {
                return false;
            }
            let pair = (w.fullname(), r.fullname());
            if seen.contains(&pair) {
                // Recursive pair already being checked
                return true;
            }
            seen.push(pair);
            for reader_field in &r.fields {
                match find_writer_field(w, reader_field) {
                    Some(writer_index) => {
                        if !resolvable(
                            &w.fields[writer_index].schema,
                            &reader_field.schema,
                            writer_types,
                            reader_types,
                            seen,
                        ) {
                            return false;
                        }
                    }
                    None => {
                        if reader_field.default.is_none() {
                            return false;
                        }
                    }
                }
            }
            true
        }

        // Symbol matching is per-value: a writer symbol missing from the
        // reader only errors when such a value is actually read
        (Schema::Enum(w), Schema::Enum(r)) => names_match(&w.name, &r.name, &r.aliases),

        (Schema::Array(w), Schema::Array(r)) => {
            resolvable(w, r, writer_types, reader_types, seen)
        }
        (Schema::Map(w), Schema::Map(r)) => resolvable(w, r, writer_types, reader_types, seen),

        (Schema::Fixed(w), Schema::Fixed(r)) => {
            names_match(&w.name, &r.name, &r.aliases) && w.size == r.size
        }

        _ => false,
    }
}

/// Resolve refs and strip logical annotations, yielding the schema that
/// determines the wire encoding.
fn strip<'a>(schema: &'a Schema, types: &'a NamedTypes) -> Option<&'a Schema> {
    let mut current = types.follow(schema).ok()?;
    while let Schema::Logical(logical) = current {
        current = &logical.base;
    }
    // A logical base could itself be a ref
    if matches!(current, Schema::Ref(_)) {
        current = types.follow(current).ok()?;
    }
    Some(current)
}

fn names_match(writer_name: &str, reader_name: &str, reader_aliases: &[String]) -> bool {
    writer_name == reader_name || reader_aliases.iter().any(|a| a == writer_name)
}

/// Project a value decoded with the writer schema into the reader schema's
/// shape: promotions applied, nested records remapped, enum symbols
/// re-indexed, union values re-tagged.
pub fn project(
    value: Value,
    writer: &Schema,
    reader: &Schema,
    writer_types: &NamedTypes,
    reader_types: &NamedTypes,
) -> Result<Value, DecodeError> {
    let writer = strip(writer, writer_types).ok_or_else(|| {
        DecodeError::Schema(SchemaError::InvalidSchema(
            "Unresolved writer schema reference".to_string(),
        ))
    })?;
    let reader = strip(reader, reader_types).ok_or_else(|| {
        DecodeError::Schema(SchemaError::InvalidSchema(
            "Unresolved reader schema reference".to_string(),
        ))
    })?;

    // A union value projects through the branch it was written with
    if let Schema::Union(writer_branches) = writer {
        let (index, inner) = match value {
            Value::Union(index, inner) => (index, *inner),
            other => {
                return Err(DecodeError::TypeMismatch(format!(
                    "Expected union value for union writer schema, found {}",
                    other.type_name()
                )))
            }
        };
        let writer_branch = writer_branches.get(index).ok_or_else(|| {
            DecodeError::InvalidData(format!(
                "Union index {} out of range for union with {} branches",
                index,
                writer_branches.len()
            ))
        })?;
        return project_into(inner, writer_branch, reader, writer_types, reader_types);
    }

    project_into(value, writer, reader, writer_types, reader_types)
}

/// Project a non-union-tagged value into the reader schema, wrapping it in
/// a union tag if the reader schema is a union.
fn project_into(
    value: Value,
    writer: &Schema,
    reader: &Schema,
    writer_types: &NamedTypes,
    reader_types: &NamedTypes,
) -> Result<Value, DecodeError> {
    if let Schema::Union(reader_branches) = reader {
        for (index, branch) in reader_branches.iter().enumerate() {
            let mut seen = Vec::new();
            if resolvable(writer, branch, writer_types, reader_types, &mut seen) {
                let projected = project(value, writer, branch, writer_types, reader_types)?;
                return Ok(Value::Union(index, Box::new(projected)));
            }
        }
        return Err(DecodeError::Schema(SchemaError::IncompatibleSchemas(
            format!(
                "No reader union branch accepts writer type '{}'",
                writer.type_name()
            ),
        )));
    }

    let writer = strip(writer, writer_types).ok_or_else(|| {
        DecodeError::Schema(SchemaError::InvalidSchema(
            "Unresolved writer schema reference".to_string(),
        ))
    })?;

    match (writer, reader, value) {
        // Exact types pass through
        (w, r, value) if w == r => Ok(value),

        // Promotions
        (Schema::Int, Schema::Long, Value::Int(n)) => Ok(Value::Long(n as i64)),
        (Schema::Int, Schema::Float, Value::Int(n)) => Ok(Value::Float(n as f32)),
        (Schema::Int, Schema::Double, Value::Int(n)) => Ok(Value::Double(n as f64)),
        (Schema::Long, Schema::Float, Value::Long(n)) => Ok(Value::Float(n as f32)),
        (Schema::Long, Schema::Double, Value::Long(n)) => Ok(Value::Double(n as f64)),
        (Schema::Float, Schema::Double, Value::Float(f)) => Ok(Value::Double(f as f64)),
        (Schema::String, Schema::Bytes, Value::String(s)) => Ok(Value::Bytes(s.into_bytes())),
        (Schema::Bytes, Schema::String, Value::Bytes(b)) => {
            Ok(Value::String(String::from_utf8(b)?))
        }

        (Schema::Record(w), Schema::Record(r), Value::Record(record)) => {
            let mut fields: Vec<(String, Option<Value>)> = record
                .into_fields()
                .into_iter()
                .map(|(name, value)| (name, Some(value)))
                .collect();
            let mut projected = Record::with_name(&r.name);
            for reader_field in &r.fields {
                match find_writer_field(w, reader_field) {
                    Some(writer_index) => {
                        let writer_field = &w.fields[writer_index];
                        let value = fields
                            .iter_mut()
                            .find(|(name, _)| *name == writer_field.name)
                            .and_then(|(_, slot)| slot.take())
                            .unwrap_or(Value::Null);
                        let value = project(
                            value,
                            &writer_field.schema,
                            &reader_field.schema,
                            writer_types,
                            reader_types,
                        )?;
                        projected.set(&reader_field.name, value);
                    }
                    None => {
                        let json = reader_field.default.as_ref().ok_or_else(|| {
                            DecodeError::Schema(SchemaError::IncompatibleSchemas(format!(
                                "Reader field '{}' is absent from writer '{}' and has no default",
                                reader_field.name, w.name
                            )))
                        })?;
                        let default =
                            Value::from_json(json, &reader_field.schema, reader_types)
                                .map_err(DecodeError::Schema)?;
                        projected.set(&reader_field.name, default);
                    }
                }
            }
            Ok(Value::Record(projected))
        }

        (Schema::Enum(_), Schema::Enum(r), Value::Enum(_, symbol)) => {
            match r.symbol_index(&symbol) {
                Some(index) => Ok(Value::Enum(index, symbol)),
                None => match &r.default {
                    Some(default) => match r.symbol_index(default) {
                        Some(index) => Ok(Value::Enum(index, default.clone())),
                        None => Err(DecodeError::Schema(SchemaError::IncompatibleSchemas(
                            format!(
                                "Default symbol '{}' is not a symbol of enum '{}'",
                                default, r.name
                            ),
                        ))),
                    },
                    None => Err(DecodeError::Schema(SchemaError::IncompatibleSchemas(
                        format!(
                            "Writer symbol '{}' is not a symbol of enum '{}' and no default is declared",
                            symbol, r.name
                        ),
                    ))),
                },
            }
        }

        (Schema::Array(w), Schema::Array(r), Value::Array(items)) => {
            let projected: Result<Vec<Value>, DecodeError> = items
                .into_iter()
                .map(|item| project(item, w, r, writer_types, reader_types))
                .collect();
            Ok(Value::Array(projected?))
        }

        (Schema::Map(w), Schema::Map(r), Value::Map(entries)) => {
            let mut projected = Vec::with_capacity(entries.len());
            for (key, item) in entries {
                projected.push((key, project(item, w, r, writer_types, reader_types)?));
            }
            Ok(Value::Map(projected))
        }

        (Schema::Fixed(w), Schema::Fixed(r), value) if w.size == r.size => Ok(value),

        (w, r, _) => Err(DecodeError::Schema(SchemaError::IncompatibleSchemas(
            format!(
                "Cannot project writer type '{}' to reader type '{}'",
                w.type_name(),
                r.type_name()
            ),
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::parse_schema;

    fn record(schema: &Schema) -> &RecordSchema {
        match schema {
            Schema::Record(r) => r,
            _ => panic!("expected record schema"),
        }
    }

    #[test]
    fn test_resolution_identity() {
        let schema = parse_schema(
            r#"{"type": "record", "name": "R", "fields": [
                {"name": "a", "type": "int"},
                {"name": "b", "type": "string"}
            ]}"#,
        )
        .unwrap();
        let types = NamedTypes::from_schema(&schema);
        let r = record(&schema);
        let resolution = Resolution::new(r, r, &types, &types).unwrap();
        assert_eq!(resolution.reader().name, "R");
    }

    #[test]
    fn test_resolution_missing_field_no_default_fails() {
        let writer = parse_schema(
            r#"{"type": "record", "name": "R", "fields": [{"name": "a", "type": "int"}]}"#,
        )
        .unwrap();
        let reader = parse_schema(
            r#"{"type": "record", "name": "R", "fields": [
                {"name": "a", "type": "int"},
                {"name": "b", "type": "string"}
            ]}"#,
        )
        .unwrap();
        let wt = NamedTypes::from_schema(&writer);
        let rt = NamedTypes::from_schema(&reader);
        let result = Resolution::new(record(&writer), record(&reader), &wt, &rt);
        assert!(matches!(
            result,
            Err(SchemaError::IncompatibleSchemas(_))
        ));
    }

    #[test]
    fn test_resolution_incompatible_field_type_fails() {
        let writer = parse_schema(
            r#"{"type": "record", "name": "R", "fields": [{"name": "a", "type": "string"}]}"#,
        )
        .unwrap();
        let reader = parse_schema(
            r#"{"type": "record", "name": "R", "fields": [{"name": "a", "type": "int"}]}"#,
        )
        .unwrap();
        let wt = NamedTypes::from_schema(&writer);
        let rt = NamedTypes::from_schema(&reader);
        let result = Resolution::new(record(&writer), record(&reader), &wt, &rt);
        assert!(matches!(
            result,
            Err(SchemaError::IncompatibleSchemas(_))
        ));
    }

    #[test]
    fn test_resolution_alias_match() {
        let writer = parse_schema(
            r#"{"type": "record", "name": "R", "fields": [{"name": "old", "type": "int"}]}"#,
        )
        .unwrap();
        let reader = parse_schema(
            r#"{"type": "record", "name": "R", "fields": [
                {"name": "new", "type": "int", "aliases": ["old"]}
            ]}"#,
        )
        .unwrap();
        let wt = NamedTypes::from_schema(&writer);
        let rt = NamedTypes::from_schema(&reader);
        assert!(Resolution::new(record(&writer), record(&reader), &wt, &rt).is_ok());
    }

    #[test]
    fn test_project_promotions() {
        let types = NamedTypes::new();
        assert_eq!(
            project(Value::Int(7), &Schema::Int, &Schema::Long, &types, &types).unwrap(),
            Value::Long(7)
        );
        assert_eq!(
            project(Value::Int(7), &Schema::Int, &Schema::Double, &types, &types).unwrap(),
            Value::Double(7.0)
        );
        assert_eq!(
            project(
                Value::Float(1.5),
                &Schema::Float,
                &Schema::Double,
                &types,
                &types
            )
            .unwrap(),
            Value::Double(1.5)
        );
        assert_eq!(
            project(
                Value::String("hi".to_string()),
                &Schema::String,
                &Schema::Bytes,
                &types,
                &types
            )
            .unwrap(),
            Value::Bytes(b"hi".to_vec())
        );
    }

    #[test]
    fn test_project_invalid_demotion() {
        let types = NamedTypes::new();
        let result = project(Value::Long(7), &Schema::Long, &Schema::Int, &types, &types);
        assert!(result.is_err());
    }

    #[test]
    fn test_project_union_retag() {
        let types = NamedTypes::new();
        // Writer: [null, int]; reader: [int, null] - branch index changes
        let writer = Schema::Union(vec![Schema::Null, Schema::Int]);
        let reader = Schema::Union(vec![Schema::Int, Schema::Null]);
        let value = Value::Union(1, Box::new(Value::Int(3)));
        assert_eq!(
            project(value, &writer, &reader, &types, &types).unwrap(),
            Value::Union(0, Box::new(Value::Int(3)))
        );
    }

    #[test]
    fn test_project_union_to_non_union() {
        let types = NamedTypes::new();
        let writer = Schema::Union(vec![Schema::Null, Schema::Int]);
        let value = Value::Union(1, Box::new(Value::Int(3)));
        assert_eq!(
            project(value, &writer, &Schema::Long, &types, &types).unwrap(),
            Value::Long(3)
        );
    }

    #[test]
    fn test_project_union_branch_unresolvable() {
        let types = NamedTypes::new();
        let writer = Schema::Union(vec![Schema::Null, Schema::String]);
        let reader = Schema::Union(vec![Schema::Null, Schema::Int]);
        // A null value resolves fine
        let ok = project(
            Value::Union(0, Box::new(Value::Null)),
            &writer,
            &reader,
            &types,
            &types,
        );
        assert!(ok.is_ok());
        // A string value has no reader branch
        let err = project(
            Value::Union(1, Box::new(Value::String("x".to_string()))),
            &writer,
            &reader,
            &types,
            &types,
        );
        assert!(err.is_err());
    }

    #[test]
    fn test_project_enum_reindex_and_default() {
        let types = NamedTypes::new();
        let writer = parse_schema(
            r#"{"type": "enum", "name": "E", "symbols": ["A", "B", "C"]}"#,
        )
        .unwrap();
        let reader = parse_schema(
            r#"{"type": "enum", "name": "E", "symbols": ["C", "B"], "default": "B"}"#,
        )
        .unwrap();
        // "C" is writer index 2, reader index 0
        assert_eq!(
            project(
                Value::Enum(2, "C".to_string()),
                &writer,
                &reader,
                &types,
                &types
            )
            .unwrap(),
            Value::Enum(0, "C".to_string())
        );
        // "A" is not a reader symbol; the reader default applies
        assert_eq!(
            project(
                Value::Enum(0, "A".to_string()),
                &writer,
                &reader,
                &types,
                &types
            )
            .unwrap(),
            Value::Enum(1, "B".to_string())
        );
    }

    #[test]
    fn test_project_nested_record_remap() {
        let writer = parse_schema(
            r#"{"type": "record", "name": "Inner", "fields": [
                {"name": "kept", "type": "int"},
                {"name": "dropped", "type": "string"}
            ]}"#,
        )
        .unwrap();
        let reader = parse_schema(
            r#"{"type": "record", "name": "Inner", "fields": [
                {"name": "kept", "type": "long"},
                {"name": "added", "type": "string", "default": "x"}
            ]}"#,
        )
        .unwrap();
        let wt = NamedTypes::from_schema(&writer);
        let rt = NamedTypes::from_schema(&reader);

        let mut value = Record::with_name("Inner");
        value.set("kept", Value::Int(5));
        value.set("dropped", Value::String("gone".to_string()));

        let projected = project(Value::Record(value), &writer, &reader, &wt, &rt).unwrap();
        match projected {
            Value::Record(r) => {
                assert_eq!(r.get("kept"), Some(&Value::Long(5)));
                assert_eq!(r.get("added"), Some(&Value::String("x".to_string())));
                assert_eq!(r.get("dropped"), None);
            }
            other => panic!("expected record, got {}", other.type_name()),
        }
    }
}
