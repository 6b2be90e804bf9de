//! Named type registries for resolving type references.
//!
//! Schemas refer to previously defined records, enums, and fixed types by
//! name. The codec resolves those `Ref` nodes lazily while walking values,
//! which keeps recursive schemas (a record containing itself) finite. This
//! module provides the registry the codec resolves against.

use std::collections::HashMap;

use crate::error::SchemaError;
use crate::schema::{RecordSchema, Schema};

/// Refs may chain (a ref registered as another ref during parsing), but any
/// chain longer than this is a cycle.
const MAX_REF_HOPS: usize = 64;

/// A registry of named types (records, enums, fixed) by fully qualified name.
#[derive(Debug, Clone, Default)]
pub struct NamedTypes {
    named_types: HashMap<String, Schema>,
}

impl NamedTypes {
    /// Create a new empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a named type.
    ///
    /// # Arguments
    /// * `name` - The fully qualified name of the type
    /// * `schema` - The schema definition
    pub fn register(&mut self, name: String, schema: Schema) {
        self.named_types.insert(name, schema);
    }

    /// Get a named type from the registry.
    pub fn get(&self, name: &str) -> Option<&Schema> {
        self.named_types.get(name)
    }

    /// Check if a named type exists in the registry.
    pub fn contains(&self, name: &str) -> bool {
        self.named_types.contains_key(name)
    }

    /// Build a registry by extracting all named types from a schema.
    ///
    /// This recursively traverses the schema and registers every named type
    /// (record, enum, fixed) that it encounters.
    pub fn from_schema(schema: &Schema) -> Self {
        let mut types = Self::new();
        types.extract(schema);
        types
    }

    /// Build a registry from a record schema and everything nested in it.
    pub fn from_record(record: &RecordSchema) -> Self {
        let mut types = Self::new();
        types.extract_record(record);
        types
    }

    /// Resolve a schema through any `Ref` indirection.
    ///
    /// Non-ref schemas are returned as-is. Refs are looked up in the
    /// registry, following chains of refs up to a fixed hop limit.
    ///
    /// # Errors
    /// `SchemaError::InvalidSchema` if a referenced name is not registered
    /// or the ref chain cycles.
    pub fn follow<'a>(&'a self, schema: &'a Schema) -> Result<&'a Schema, SchemaError> {
        let mut current = schema;
        for _ in 0..MAX_REF_HOPS {
            match current {
                Schema::Ref(name) => match self.named_types.get(name.as_str()) {
                    // A ref registered under its own name is a placeholder
                    // left by an unfinished parse; treat it as unresolved.
                    Some(Schema::Ref(target)) if target == name => {
                        return Err(SchemaError::InvalidSchema(format!(
                            "Unresolved named type reference: '{}'",
                            name
                        )));
                    }
                    Some(resolved) => current = resolved,
                    None => {
                        return Err(SchemaError::InvalidSchema(format!(
                            "Unresolved named type reference: '{}'",
                            name
                        )));
                    }
                },
                other => return Ok(other),
            }
        }
        Err(SchemaError::InvalidSchema(
            "Named type reference chain is too deep (cycle?)".to_string(),
        ))
    }

    fn extract(&mut self, schema: &Schema) {
        match schema {
            Schema::Record(record) => self.extract_record(record),
            Schema::Enum(enum_schema) => {
                self.named_types
                    .insert(enum_schema.fullname(), schema.clone());
            }
            Schema::Fixed(fixed_schema) => {
                self.named_types
                    .insert(fixed_schema.fullname(), schema.clone());
            }
            Schema::Array(item_schema) => self.extract(item_schema),
            Schema::Map(value_schema) => self.extract(value_schema),
            Schema::Union(variants) => {
                for variant in variants {
                    self.extract(variant);
                }
            }
            Schema::Logical(logical) => self.extract(&logical.base),
            // Primitives and refs don't contain named type definitions
            _ => {}
        }
    }

    fn extract_record(&mut self, record: &RecordSchema) {
        let fullname = record.fullname();
        if self.named_types.contains_key(&fullname) {
            // Already visited (recursive schema)
            return;
        }
        self.named_types
            .insert(fullname, Schema::Record(record.clone()));
        for field in &record.fields {
            self.extract(&field.schema);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{EnumSchema, FieldSchema, FixedSchema};

    #[test]
    fn test_from_schema_simple_record() {
        let record = RecordSchema::new(
            "User",
            vec![
                FieldSchema::new("id", Schema::Long),
                FieldSchema::new("name", Schema::String),
            ],
        )
        .with_namespace("com.example");

        let schema = Schema::Record(record);
        let types = NamedTypes::from_schema(&schema);

        assert!(types.contains("com.example.User"));
    }

    #[test]
    fn test_from_schema_nested_records() {
        let address = RecordSchema::new(
            "Address",
            vec![
                FieldSchema::new("street", Schema::String),
                FieldSchema::new("city", Schema::String),
            ],
        )
        .with_namespace("com.example");

        let person = RecordSchema::new(
            "Person",
            vec![
                FieldSchema::new("name", Schema::String),
                FieldSchema::new("address", Schema::Record(address)),
            ],
        )
        .with_namespace("com.example");

        let schema = Schema::Record(person);
        let types = NamedTypes::from_schema(&schema);

        assert!(types.contains("com.example.Person"));
        assert!(types.contains("com.example.Address"));
    }

    #[test]
    fn test_from_schema_with_enum_and_fixed() {
        let color_enum = EnumSchema::new(
            "Color",
            vec!["RED".to_string(), "GREEN".to_string(), "BLUE".to_string()],
        )
        .with_namespace("com.example");

        let hash_fixed = FixedSchema::new("Hash", 32).with_namespace("com.example");

        let record = RecordSchema::new(
            "Item",
            vec![
                FieldSchema::new("color", Schema::Enum(color_enum)),
                FieldSchema::new("hash", Schema::Fixed(hash_fixed)),
            ],
        )
        .with_namespace("com.example");

        let schema = Schema::Record(record);
        let types = NamedTypes::from_schema(&schema);

        assert!(types.contains("com.example.Item"));
        assert!(types.contains("com.example.Color"));
        assert!(types.contains("com.example.Hash"));
    }

    #[test]
    fn test_from_schema_recursive_record() {
        let linked_list = RecordSchema::new(
            "LinkedList",
            vec![
                FieldSchema::new("value", Schema::Int),
                FieldSchema::new(
                    "next",
                    Schema::Union(vec![
                        Schema::Null,
                        Schema::Ref("LinkedList".to_string()),
                    ]),
                ),
            ],
        );

        let schema = Schema::Record(linked_list);
        let types = NamedTypes::from_schema(&schema);

        assert!(types.contains("LinkedList"));
    }

    #[test]
    fn test_follow_ref() {
        let user = RecordSchema::new("User", vec![FieldSchema::new("name", Schema::String)])
            .with_namespace("com.example");

        let mut types = NamedTypes::new();
        types.register("com.example.User".to_string(), Schema::Record(user));

        let named_ref = Schema::Ref("com.example.User".to_string());
        let resolved = types.follow(&named_ref).unwrap();

        match resolved {
            Schema::Record(r) => {
                assert_eq!(r.name, "User");
                assert_eq!(r.namespace, Some("com.example".to_string()));
            }
            _ => panic!("Expected Record schema"),
        }
    }

    #[test]
    fn test_follow_non_ref_is_identity() {
        let types = NamedTypes::new();
        let schema = Schema::Long;
        assert_eq!(types.follow(&schema).unwrap(), &Schema::Long);
    }

    #[test]
    fn test_follow_unresolved_reference_error() {
        let types = NamedTypes::new();
        let named_ref = Schema::Ref("NonExistent".to_string());

        let result = types.follow(&named_ref);
        assert!(result.is_err());
    }

    #[test]
    fn test_follow_self_referential_placeholder_error() {
        let mut types = NamedTypes::new();
        types.register("Loop".to_string(), Schema::Ref("Loop".to_string()));

        let named_ref = Schema::Ref("Loop".to_string());
        assert!(types.follow(&named_ref).is_err());
    }
}
