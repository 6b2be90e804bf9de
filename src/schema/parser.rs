//! JSON schema parser for Avro schemas.
//!
//! Parses Avro schema JSON into the Schema type hierarchy.

use std::collections::HashMap;

use serde_json::Value;
use tracing::warn;

use crate::error::SchemaError;
use crate::schema::{
    EnumSchema, FieldSchema, FixedSchema, LogicalKind, LogicalSchema, RecordSchema, Schema,
};

/// Parse an Avro schema from a JSON string.
///
/// # Arguments
/// * `json` - JSON string representing an Avro schema
///
/// # Returns
/// The parsed Schema or a SchemaError
///
/// # Example
/// ```
/// use avrolite::schema::parse_schema;
///
/// let schema = parse_schema(r#""string""#).unwrap();
/// ```
pub fn parse_schema(json: &str) -> Result<Schema, SchemaError> {
    parse_schema_with_options(json, false)
}

/// Parse an Avro schema from a JSON string with validation options.
///
/// # Arguments
/// * `json` - JSON string representing an Avro schema
/// * `strict` - Whether to enforce strict schema validation
///
/// In strict mode:
/// - Union types cannot contain duplicate types
/// - Union types cannot contain nested unions
/// - Names must follow Avro naming rules (start with letter/underscore, contain only alphanumeric/underscore)
///
/// In permissive mode (default), these violations generate warnings but don't fail parsing.
/// Permissive parsing maximizes compatibility with schemas produced by other writers.
///
/// # Returns
/// The parsed Schema or a SchemaError
///
/// # Example
/// ```
/// use avrolite::schema::parse_schema_with_options;
///
/// // Permissive mode - warnings only
/// let schema = parse_schema_with_options(r#"["int", "int"]"#, false).unwrap();
///
/// // Strict mode - fails on duplicate types in union
/// let result = parse_schema_with_options(r#"["int", "int"]"#, true);
/// assert!(result.is_err());
/// ```
pub fn parse_schema_with_options(json: &str, strict: bool) -> Result<Schema, SchemaError> {
    let value: Value = serde_json::from_str(json)
        .map_err(|e| SchemaError::ParseError(format!("Invalid JSON: {}", e)))?;

    let mut parser = SchemaParser::new().with_strict(strict);
    parser.parse(&value)
}

/// Schema parser with named type resolution context.
///
/// Maintains a registry of named types (records, enums, fixed) for resolving
/// type references during parsing.
#[derive(Debug)]
pub struct SchemaParser {
    /// Registry of named types by their fully qualified name
    named_types: HashMap<String, Schema>,
    /// Current namespace for resolving unqualified names
    current_namespace: Option<String>,
    /// Whether to enforce strict schema validation
    strict: bool,
}

impl Default for SchemaParser {
    fn default() -> Self {
        Self {
            named_types: HashMap::new(),
            current_namespace: None,
            strict: false,
        }
    }
}

impl SchemaParser {
    /// Create a new SchemaParser with default settings (permissive mode).
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a new SchemaParser with strict validation enabled.
    ///
    /// In strict mode:
    /// - Union types cannot contain duplicate types
    /// - Union types cannot contain nested unions
    /// - Names must follow Avro naming rules (start with letter/underscore, contain only alphanumeric/underscore)
    ///
    /// In permissive mode (default), these violations generate warnings but don't fail parsing.
    pub fn new_strict() -> Self {
        Self {
            named_types: HashMap::new(),
            current_namespace: None,
            strict: true,
        }
    }

    /// Set whether to use strict schema validation.
    pub fn with_strict(mut self, strict: bool) -> Self {
        self.strict = strict;
        self
    }

    /// Parse a JSON value into a Schema.
    pub fn parse(&mut self, value: &Value) -> Result<Schema, SchemaError> {
        match value {
            Value::String(s) => self.parse_string_schema(s),
            Value::Object(obj) => self.parse_object_schema(obj),
            Value::Array(arr) => self.parse_union_schema(arr),
            _ => Err(SchemaError::InvalidSchema(format!(
                "Expected string, object, or array, found: {:?}",
                value
            ))),
        }
    }

    /// Parse a primitive type or named type reference from a string.
    fn parse_string_schema(&self, s: &str) -> Result<Schema, SchemaError> {
        match s {
            "null" => Ok(Schema::Null),
            "boolean" => Ok(Schema::Boolean),
            "int" => Ok(Schema::Int),
            "long" => Ok(Schema::Long),
            "float" => Ok(Schema::Float),
            "double" => Ok(Schema::Double),
            "bytes" => Ok(Schema::Bytes),
            "string" => Ok(Schema::String),
            name => {
                // A named type reference. It may not be registered yet
                // (recursive definitions reference themselves before the
                // definition is complete), so keep it as a Ref either way.
                Ok(Schema::Ref(self.resolve_name(name)))
            }
        }
    }

    /// Parse a complex type from a JSON object.
    fn parse_object_schema(
        &mut self,
        obj: &serde_json::Map<String, Value>,
    ) -> Result<Schema, SchemaError> {
        // Check for logical type first
        if let Some(logical_type) = obj.get("logicalType") {
            return self.parse_logical_type(obj, logical_type);
        }

        // Get the type field
        let type_str = obj
            .get("type")
            .and_then(|v| v.as_str())
            .ok_or_else(|| SchemaError::InvalidSchema("Missing 'type' field".to_string()))?;

        match type_str {
            // Primitive types can also appear as objects (with logical types)
            "null" => Ok(Schema::Null),
            "boolean" => Ok(Schema::Boolean),
            "int" => Ok(Schema::Int),
            "long" => Ok(Schema::Long),
            "float" => Ok(Schema::Float),
            "double" => Ok(Schema::Double),
            "bytes" => Ok(Schema::Bytes),
            "string" => Ok(Schema::String),

            // Complex types
            "record" => self.parse_record_schema(obj),
            "enum" => self.parse_enum_schema(obj),
            "array" => self.parse_array_schema(obj),
            "map" => self.parse_map_schema(obj),
            "fixed" => self.parse_fixed_schema(obj),

            // Type could be a named reference
            other => {
                let fullname = self.resolve_name(other);
                if self.named_types.contains_key(&fullname) {
                    Ok(Schema::Ref(fullname))
                } else {
                    Err(SchemaError::UnsupportedType(format!(
                        "Unknown type: {}",
                        other
                    )))
                }
            }
        }
    }

    /// Parse a union schema from a JSON array.
    fn parse_union_schema(&mut self, arr: &[Value]) -> Result<Schema, SchemaError> {
        if arr.is_empty() {
            return Err(SchemaError::InvalidSchema(
                "Union schema cannot be empty".to_string(),
            ));
        }

        let variants: Result<Vec<Schema>, SchemaError> =
            arr.iter().map(|v| self.parse(v)).collect();

        let variants = variants?;

        // Validate union rules
        self.validate_union(&variants)?;

        Ok(Schema::Union(variants))
    }

    /// Parse a record schema.
    fn parse_record_schema(
        &mut self,
        obj: &serde_json::Map<String, Value>,
    ) -> Result<Schema, SchemaError> {
        let name = obj
            .get("name")
            .and_then(|v| v.as_str())
            .ok_or_else(|| SchemaError::InvalidSchema("Record missing 'name' field".to_string()))?
            .to_string();

        // Validate name
        self.validate_name(&name, "Record")?;

        let namespace = obj
            .get("namespace")
            .and_then(|v| v.as_str())
            .map(String::from);

        // Update current namespace for nested types
        let prev_namespace = self.current_namespace.clone();
        if namespace.is_some() {
            self.current_namespace = namespace.clone();
        } else if self.current_namespace.is_none() {
            // If name contains a dot, extract namespace from it
            if let Some(dot_pos) = name.rfind('.') {
                self.current_namespace = Some(name[..dot_pos].to_string());
            }
        }

        let fullname = match &namespace {
            Some(ns) => format!("{}.{}", ns, name),
            None => match &self.current_namespace {
                Some(ns) if !name.contains('.') => format!("{}.{}", ns, name),
                _ => name.clone(),
            },
        };

        // Register the type before parsing fields so recursive references
        // resolve. The placeholder is replaced with the real schema below.
        self.named_types
            .insert(fullname.clone(), Schema::Ref(fullname.clone()));

        let doc = obj.get("doc").and_then(|v| v.as_str()).map(String::from);

        let aliases = obj
            .get("aliases")
            .and_then(|v| v.as_array())
            .map(|arr| {
                arr.iter()
                    .filter_map(|v| v.as_str().map(String::from))
                    .collect()
            })
            .unwrap_or_default();

        // Parse fields
        let fields_value = obj
            .get("fields")
            .and_then(|v| v.as_array())
            .ok_or_else(|| {
                SchemaError::InvalidSchema("Record missing 'fields' array".to_string())
            })?;

        let fields: Result<Vec<FieldSchema>, SchemaError> = fields_value
            .iter()
            .map(|f| self.parse_field_schema(f))
            .collect();

        // Restore previous namespace
        self.current_namespace = prev_namespace;

        let record = RecordSchema {
            name: if name.contains('.') {
                name.rsplit('.').next().unwrap_or(&name).to_string()
            } else {
                name
            },
            namespace: namespace.or_else(|| {
                if fullname.contains('.') {
                    Some(
                        fullname
                            .rsplit_once('.')
                            .map(|(ns, _)| ns.to_string())
                            .unwrap_or_default(),
                    )
                } else {
                    None
                }
            }),
            fields: fields?,
            doc,
            aliases,
        };

        let schema = Schema::Record(record);

        // Update the registry with the actual schema
        self.named_types.insert(fullname, schema.clone());

        Ok(schema)
    }

    /// Parse a field schema within a record.
    fn parse_field_schema(&mut self, value: &Value) -> Result<FieldSchema, SchemaError> {
        let obj = value
            .as_object()
            .ok_or_else(|| SchemaError::InvalidSchema("Field must be an object".to_string()))?;

        let name = obj
            .get("name")
            .and_then(|v| v.as_str())
            .ok_or_else(|| SchemaError::InvalidSchema("Field missing 'name'".to_string()))?
            .to_string();

        // Validate field name
        self.validate_name(&name, "Field")?;

        let type_value = obj
            .get("type")
            .ok_or_else(|| SchemaError::InvalidSchema("Field missing 'type'".to_string()))?;

        let schema = self.parse(type_value)?;

        let default = obj.get("default").cloned();

        let doc = obj.get("doc").and_then(|v| v.as_str()).map(String::from);

        let aliases = obj
            .get("aliases")
            .and_then(|v| v.as_array())
            .map(|arr| {
                arr.iter()
                    .filter_map(|v| v.as_str().map(String::from))
                    .collect()
            })
            .unwrap_or_default();

        Ok(FieldSchema {
            name,
            schema,
            default,
            doc,
            aliases,
        })
    }

    /// Parse an enum schema.
    fn parse_enum_schema(
        &mut self,
        obj: &serde_json::Map<String, Value>,
    ) -> Result<Schema, SchemaError> {
        let name = obj
            .get("name")
            .and_then(|v| v.as_str())
            .ok_or_else(|| SchemaError::InvalidSchema("Enum missing 'name' field".to_string()))?
            .to_string();

        // Validate name
        self.validate_name(&name, "Enum")?;

        let namespace = obj
            .get("namespace")
            .and_then(|v| v.as_str())
            .map(String::from);

        let fullname = match &namespace {
            Some(ns) => format!("{}.{}", ns, name),
            None => match &self.current_namespace {
                Some(ns) if !name.contains('.') => format!("{}.{}", ns, name),
                _ => name.clone(),
            },
        };

        let symbols = obj
            .get("symbols")
            .and_then(|v| v.as_array())
            .ok_or_else(|| SchemaError::InvalidSchema("Enum missing 'symbols' array".to_string()))?
            .iter()
            .filter_map(|v| v.as_str().map(String::from))
            .collect::<Vec<_>>();

        if symbols.is_empty() {
            return Err(SchemaError::InvalidSchema(
                "Enum must have at least one symbol".to_string(),
            ));
        }

        // Validate each symbol name
        for symbol in &symbols {
            self.validate_name(symbol, "Enum symbol")?;
        }

        let doc = obj.get("doc").and_then(|v| v.as_str()).map(String::from);

        let aliases = obj
            .get("aliases")
            .and_then(|v| v.as_array())
            .map(|arr| {
                arr.iter()
                    .filter_map(|v| v.as_str().map(String::from))
                    .collect()
            })
            .unwrap_or_default();

        let default = obj
            .get("default")
            .and_then(|v| v.as_str())
            .map(String::from);

        let enum_schema = EnumSchema {
            name: if name.contains('.') {
                name.rsplit('.').next().unwrap_or(&name).to_string()
            } else {
                name
            },
            namespace: namespace.or_else(|| {
                if fullname.contains('.') {
                    Some(
                        fullname
                            .rsplit_once('.')
                            .map(|(ns, _)| ns.to_string())
                            .unwrap_or_default(),
                    )
                } else {
                    None
                }
            }),
            symbols,
            doc,
            aliases,
            default,
        };

        let schema = Schema::Enum(enum_schema);
        self.named_types.insert(fullname, schema.clone());

        Ok(schema)
    }

    /// Parse an array schema.
    fn parse_array_schema(
        &mut self,
        obj: &serde_json::Map<String, Value>,
    ) -> Result<Schema, SchemaError> {
        let items = obj
            .get("items")
            .ok_or_else(|| SchemaError::InvalidSchema("Array missing 'items' field".to_string()))?;

        let item_schema = self.parse(items)?;
        Ok(Schema::Array(Box::new(item_schema)))
    }

    /// Parse a map schema.
    fn parse_map_schema(
        &mut self,
        obj: &serde_json::Map<String, Value>,
    ) -> Result<Schema, SchemaError> {
        let values = obj
            .get("values")
            .ok_or_else(|| SchemaError::InvalidSchema("Map missing 'values' field".to_string()))?;

        let value_schema = self.parse(values)?;
        Ok(Schema::Map(Box::new(value_schema)))
    }

    /// Parse a fixed schema.
    fn parse_fixed_schema(
        &mut self,
        obj: &serde_json::Map<String, Value>,
    ) -> Result<Schema, SchemaError> {
        let name = obj
            .get("name")
            .and_then(|v| v.as_str())
            .ok_or_else(|| SchemaError::InvalidSchema("Fixed missing 'name' field".to_string()))?
            .to_string();

        // Validate name
        self.validate_name(&name, "Fixed")?;

        let namespace = obj
            .get("namespace")
            .and_then(|v| v.as_str())
            .map(String::from);

        let fullname = match &namespace {
            Some(ns) => format!("{}.{}", ns, name),
            None => match &self.current_namespace {
                Some(ns) if !name.contains('.') => format!("{}.{}", ns, name),
                _ => name.clone(),
            },
        };

        let size =
            obj.get("size").and_then(|v| v.as_u64()).ok_or_else(|| {
                SchemaError::InvalidSchema("Fixed missing 'size' field".to_string())
            })? as usize;

        let doc = obj.get("doc").and_then(|v| v.as_str()).map(String::from);

        let aliases = obj
            .get("aliases")
            .and_then(|v| v.as_array())
            .map(|arr| {
                arr.iter()
                    .filter_map(|v| v.as_str().map(String::from))
                    .collect()
            })
            .unwrap_or_default();

        let fixed_schema = FixedSchema {
            name: if name.contains('.') {
                name.rsplit('.').next().unwrap_or(&name).to_string()
            } else {
                name
            },
            namespace: namespace.or_else(|| {
                if fullname.contains('.') {
                    Some(
                        fullname
                            .rsplit_once('.')
                            .map(|(ns, _)| ns.to_string())
                            .unwrap_or_default(),
                    )
                } else {
                    None
                }
            }),
            size,
            doc,
            aliases,
        };

        let schema = Schema::Fixed(fixed_schema);
        self.named_types.insert(fullname, schema.clone());

        Ok(schema)
    }

    /// Parse a logical type annotation.
    fn parse_logical_type(
        &mut self,
        obj: &serde_json::Map<String, Value>,
        logical_type_value: &Value,
    ) -> Result<Schema, SchemaError> {
        let logical_type_name = logical_type_value.as_str().ok_or_else(|| {
            SchemaError::InvalidSchema("logicalType must be a string".to_string())
        })?;

        // Get the base type
        let type_str = obj.get("type").and_then(|v| v.as_str()).ok_or_else(|| {
            SchemaError::InvalidSchema("Logical type missing 'type' field".to_string())
        })?;

        let base_schema = match type_str {
            "null" => Schema::Null,
            "boolean" => Schema::Boolean,
            "int" => Schema::Int,
            "long" => Schema::Long,
            "float" => Schema::Float,
            "double" => Schema::Double,
            "bytes" => Schema::Bytes,
            "string" => Schema::String,
            "fixed" => self.parse_fixed_schema(obj)?,
            other => {
                return Err(SchemaError::InvalidSchema(format!(
                    "Invalid base type for logical type: {}",
                    other
                )))
            }
        };

        let kind = match logical_type_name {
            "decimal" => {
                let precision = obj
                    .get("precision")
                    .and_then(|v| v.as_u64())
                    .ok_or_else(|| {
                        SchemaError::InvalidSchema("Decimal missing 'precision'".to_string())
                    })? as u32;

                let scale = obj.get("scale").and_then(|v| v.as_u64()).unwrap_or(0) as u32;

                LogicalKind::Decimal { precision, scale }
            }
            "uuid" => LogicalKind::Uuid,
            "date" => LogicalKind::Date,
            "time-millis" => LogicalKind::TimeMillis,
            "time-micros" => LogicalKind::TimeMicros,
            "timestamp-millis" => LogicalKind::TimestampMillis,
            "timestamp-micros" => LogicalKind::TimestampMicros,
            "duration" => LogicalKind::Duration,
            "local-timestamp-millis" => LogicalKind::LocalTimestampMillis,
            "local-timestamp-micros" => LogicalKind::LocalTimestampMicros,
            _other => {
                // Unknown logical type - return base type per Avro spec
                // (unknown logical types should be ignored)
                return Ok(base_schema);
            }
        };

        Ok(Schema::Logical(LogicalSchema::new(base_schema, kind)))
    }

    /// Resolve a type name to its fully qualified form.
    fn resolve_name(&self, name: &str) -> String {
        if name.contains('.') {
            // Already fully qualified
            name.to_string()
        } else if let Some(ns) = &self.current_namespace {
            format!("{}.{}", ns, name)
        } else {
            name.to_string()
        }
    }

    /// Validate that a name follows Avro naming rules.
    ///
    /// Avro names must:
    /// - Start with [A-Za-z_]
    /// - Contain only [A-Za-z0-9_]
    fn validate_name(&self, name: &str, context: &str) -> Result<(), SchemaError> {
        if name.is_empty() {
            let msg = format!("{} name cannot be empty", context);
            if self.strict {
                return Err(SchemaError::InvalidSchema(msg));
            } else {
                warn!("{}", msg);
                return Ok(());
            }
        }

        // Check first character
        let first_char = match name.chars().next() {
            Some(c) => c,
            None => return Ok(()),
        };
        if !first_char.is_ascii_alphabetic() && first_char != '_' {
            let msg = format!(
                "{} name '{}' must start with a letter or underscore",
                context, name
            );
            if self.strict {
                return Err(SchemaError::InvalidSchema(msg));
            } else {
                warn!("{}", msg);
                return Ok(());
            }
        }

        // Check remaining characters
        for ch in name.chars() {
            if !ch.is_ascii_alphanumeric() && ch != '_' {
                let msg = format!(
                    "{} name '{}' contains invalid character '{}' (only alphanumeric and underscore allowed)",
                    context, name, ch
                );
                if self.strict {
                    return Err(SchemaError::InvalidSchema(msg));
                } else {
                    warn!("{}", msg);
                    return Ok(());
                }
            }
        }

        Ok(())
    }

    /// Validate union schema rules.
    ///
    /// Avro unions must:
    /// - Not contain duplicate types
    /// - Not contain nested unions
    fn validate_union(&self, variants: &[Schema]) -> Result<(), SchemaError> {
        // Check for nested unions
        for (i, variant) in variants.iter().enumerate() {
            if matches!(variant, Schema::Union(_)) {
                let msg = format!(
                    "Union contains nested union at position {} (unions cannot be nested)",
                    i
                );
                if self.strict {
                    return Err(SchemaError::InvalidSchema(msg));
                } else {
                    warn!("{}", msg);
                }
            }
        }

        // Check for duplicate types
        let mut seen_types = std::collections::HashSet::new();
        for (i, variant) in variants.iter().enumerate() {
            let type_key = self.get_type_key(variant);
            if !seen_types.insert(type_key.clone()) {
                let msg = format!(
                    "Union contains duplicate type '{}' at position {}",
                    type_key, i
                );
                if self.strict {
                    return Err(SchemaError::InvalidSchema(msg));
                } else {
                    warn!("{}", msg);
                }
            }
        }

        Ok(())
    }

    /// Get a unique key for a schema type (for duplicate detection in unions).
    fn get_type_key(&self, schema: &Schema) -> String {
        match schema {
            Schema::Null => "null".to_string(),
            Schema::Boolean => "boolean".to_string(),
            Schema::Int => "int".to_string(),
            Schema::Long => "long".to_string(),
            Schema::Float => "float".to_string(),
            Schema::Double => "double".to_string(),
            Schema::Bytes => "bytes".to_string(),
            Schema::String => "string".to_string(),
            Schema::Array(_) => "array".to_string(),
            Schema::Map(_) => "map".to_string(),
            Schema::Record(r) => format!("record:{}", r.fullname()),
            Schema::Enum(e) => format!("enum:{}", e.fullname()),
            Schema::Fixed(f) => format!("fixed:{}", f.fullname()),
            Schema::Ref(n) => format!("ref:{}", n),
            Schema::Union(_) => "union".to_string(),
            Schema::Logical(lt) => format!("logical:{}", self.get_type_key(&lt.base)),
        }
    }
}
