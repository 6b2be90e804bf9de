//! Tests for binary encode/decode, the absent/empty short-circuits, byte
//! ranges, record rendering, and dotted-path lookup.

use avrolite::{
    decode, decode_range, encode, is_absent, parse_schema, render, select_field, DecodeError,
    EncodeError, PathError, Record, Schema, Value,
};

fn parse(json: &str) -> Schema {
    parse_schema(json).unwrap()
}

// ============================================================================
// Round-trip Tests
// ============================================================================

#[test]
fn test_roundtrip_all_primitive_fields() {
    let schema = parse(
        r#"{
            "type": "record",
            "name": "Everything",
            "fields": [
                {"name": "b", "type": "boolean"},
                {"name": "i", "type": "int"},
                {"name": "l", "type": "long"},
                {"name": "f", "type": "float"},
                {"name": "d", "type": "double"},
                {"name": "by", "type": "bytes"},
                {"name": "s", "type": "string"},
                {"name": "n", "type": "null"}
            ]
        }"#,
    );

    let mut record = Record::with_name("Everything");
    record.set("b", Value::Boolean(true));
    record.set("i", Value::Int(-12345));
    record.set("l", Value::Long(i64::MAX));
    record.set("f", Value::Float(1.25));
    record.set("d", Value::Double(-2.5));
    record.set("by", Value::Bytes(vec![0, 1, 255]));
    record.set("s", Value::String("héllo".to_string()));
    record.set("n", Value::Null);

    let bytes = encode(&schema, Some(&record)).unwrap();
    assert_eq!(decode(&schema, &bytes).unwrap(), record);
}

#[test]
fn test_roundtrip_complex_fields() {
    let schema = parse(
        r#"{
            "type": "record",
            "name": "Complex",
            "fields": [
                {"name": "tags", "type": {"type": "array", "items": "string"}},
                {"name": "counts", "type": {"type": "map", "values": "long"}},
                {"name": "kind", "type": {"type": "enum", "name": "Kind", "symbols": ["A", "B", "C"]}},
                {"name": "hash", "type": {"type": "fixed", "name": "Hash", "size": 4}},
                {"name": "opt", "type": ["null", "string"]}
            ]
        }"#,
    );

    let mut record = Record::with_name("Complex");
    record.set(
        "tags",
        Value::Array(vec![
            Value::String("x".to_string()),
            Value::String("y".to_string()),
        ]),
    );
    record.set(
        "counts",
        Value::Map(vec![
            ("a".to_string(), Value::Long(1)),
            ("b".to_string(), Value::Long(-2)),
        ]),
    );
    record.set("kind", Value::Enum(2, "C".to_string()));
    record.set("hash", Value::Fixed(vec![9, 8, 7, 6]));
    record.set(
        "opt",
        Value::Union(1, Box::new(Value::String("set".to_string()))),
    );

    let bytes = encode(&schema, Some(&record)).unwrap();
    assert_eq!(decode(&schema, &bytes).unwrap(), record);
}

#[test]
fn test_roundtrip_nested_records() {
    let schema = parse(
        r#"{
            "type": "record",
            "name": "Outer",
            "fields": [
                {"name": "inner", "type": {
                    "type": "record",
                    "name": "Inner",
                    "fields": [{"name": "n", "type": "long"}]
                }},
                {"name": "label", "type": "string"}
            ]
        }"#,
    );

    let mut inner = Record::with_name("Inner");
    inner.set("n", Value::Long(42));
    let mut outer = Record::with_name("Outer");
    outer.set("inner", Value::Record(inner));
    outer.set("label", Value::String("top".to_string()));

    let bytes = encode(&schema, Some(&outer)).unwrap();
    assert_eq!(decode(&schema, &bytes).unwrap(), outer);
}

#[test]
fn test_roundtrip_recursive_schema() {
    let schema = parse(
        r#"{
            "type": "record",
            "name": "LinkedList",
            "fields": [
                {"name": "value", "type": "int"},
                {"name": "next", "type": ["null", "LinkedList"]}
            ]
        }"#,
    );

    let mut tail = Record::with_name("LinkedList");
    tail.set("value", Value::Int(2));
    tail.set("next", Value::Union(0, Box::new(Value::Null)));

    let mut head = Record::with_name("LinkedList");
    head.set("value", Value::Int(1));
    head.set("next", Value::Union(1, Box::new(Value::Record(tail))));

    let bytes = encode(&schema, Some(&head)).unwrap();
    assert_eq!(decode(&schema, &bytes).unwrap(), head);
}

#[test]
fn test_bare_union_value_normalizes_to_tagged_form() {
    let schema = parse(
        r#"{"type": "record", "name": "R", "fields": [
            {"name": "u", "type": ["null", "string"]}
        ]}"#,
    );

    // Bare and tagged forms of the same logical record
    let mut bare = Record::with_name("R");
    bare.set("u", Value::String("x".to_string()));
    let mut tagged = Record::with_name("R");
    tagged.set("u", Value::Union(1, Box::new(Value::String("x".to_string()))));

    // Both encode to the same bytes, and decoding yields the canonical
    // tagged form
    let bytes = encode(&schema, Some(&bare)).unwrap();
    assert_eq!(encode(&schema, Some(&tagged)).unwrap(), bytes);
    let decoded = decode(&schema, &bytes).unwrap();
    assert_eq!(decoded, tagged);

    // The canonical form round-trips exactly
    assert_eq!(decode(&schema, &encode(&schema, Some(&decoded)).unwrap()).unwrap(), decoded);
}

#[test]
fn test_enum_value_normalizes_index_to_schema_order() {
    let schema = parse(
        r#"{"type": "record", "name": "R", "fields": [
            {"name": "e", "type": {"type": "enum", "name": "E", "symbols": ["A", "B"]}}
        ]}"#,
    );

    // A stale index is re-derived from the symbol on encode
    let mut stale = Record::with_name("R");
    stale.set("e", Value::Enum(7, "B".to_string()));
    let bytes = encode(&schema, Some(&stale)).unwrap();

    let decoded = decode(&schema, &bytes).unwrap();
    assert_eq!(decoded.get("e"), Some(&Value::Enum(1, "B".to_string())));
}

#[test]
fn test_encoding_is_deterministic() {
    let schema = parse(
        r#"{"type": "record", "name": "R", "fields": [
            {"name": "a", "type": "long"},
            {"name": "s", "type": "string"}
        ]}"#,
    );
    let mut record = Record::with_name("R");
    record.set("a", Value::Long(77));
    record.set("s", Value::String("same".to_string()));

    let first = encode(&schema, Some(&record)).unwrap();
    let second = encode(&schema, Some(&record)).unwrap();
    assert_eq!(first, second);
}

// ============================================================================
// Absent/Empty Short-circuit Tests
// ============================================================================

#[test]
fn test_encode_none_returns_empty_bytes() {
    let schema = parse(
        r#"{"type": "record", "name": "R", "fields": [{"name": "a", "type": "int"}]}"#,
    );
    let bytes = encode(&schema, None).unwrap();
    assert!(bytes.is_empty());
    assert!(is_absent(&bytes));
}

#[test]
fn test_empty_decode_symmetry() {
    // decode(s, encode(s, None)) == decode over a zero-length range
    // == the all-default record
    let schema = parse(
        r#"{"type": "record", "name": "R", "fields": [
            {"name": "a", "type": "int", "default": 9},
            {"name": "b", "type": "string"}
        ]}"#,
    );

    let absent = encode(&schema, None).unwrap();
    let from_absent = decode(&schema, &absent).unwrap();
    let from_range = decode_range(&schema, &[0xDE, 0xAD], 1, 0).unwrap();

    assert_eq!(from_absent, from_range);
    assert_eq!(from_absent.get("a"), Some(&Value::Int(9)));
    assert_eq!(from_absent.get("b"), Some(&Value::Null));
}

// ============================================================================
// Range Decoding Tests
// ============================================================================

#[test]
fn test_decode_range_within_larger_buffer() {
    let schema = parse(
        r#"{"type": "record", "name": "R", "fields": [{"name": "n", "type": "long"}]}"#,
    );
    let mut record = Record::with_name("R");
    record.set("n", Value::Long(123456));
    let encoded = encode(&schema, Some(&record)).unwrap();

    let mut buffer = vec![0x11; 5];
    buffer.extend_from_slice(&encoded);
    buffer.extend_from_slice(&[0x22; 3]);

    let decoded = decode_range(&schema, &buffer, 5, encoded.len()).unwrap();
    assert_eq!(decoded, record);
}

#[test]
fn test_decode_range_out_of_bounds() {
    let schema = parse(
        r#"{"type": "record", "name": "R", "fields": [{"name": "n", "type": "long"}]}"#,
    );
    let result = decode_range(&schema, &[0x02], 0, 2);
    assert!(matches!(result, Err(DecodeError::RangeOutOfBounds { .. })));

    // Offset overflow must not panic
    let result = decode_range(&schema, &[0x02], usize::MAX, 2);
    assert!(matches!(result, Err(DecodeError::RangeOutOfBounds { .. })));
}

#[test]
fn test_decode_truncated_range_fails() {
    let schema = parse(
        r#"{"type": "record", "name": "R", "fields": [
            {"name": "a", "type": "string"},
            {"name": "b", "type": "string"}
        ]}"#,
    );
    let mut record = Record::with_name("R");
    record.set("a", Value::String("hello".to_string()));
    record.set("b", Value::String("world".to_string()));
    let encoded = encode(&schema, Some(&record)).unwrap();

    // Every proper non-empty prefix fails
    for len in 1..encoded.len() {
        assert!(
            decode_range(&schema, &encoded, 0, len).is_err(),
            "prefix of {} bytes decoded unexpectedly",
            len
        );
    }
}

// ============================================================================
// Encode Error Tests
// ============================================================================

#[test]
fn test_encode_wrong_field_type() {
    let schema = parse(
        r#"{"type": "record", "name": "R", "fields": [{"name": "n", "type": "int"}]}"#,
    );
    let mut record = Record::with_name("R");
    record.set("n", Value::String("not a number".to_string()));
    assert!(matches!(
        encode(&schema, Some(&record)),
        Err(EncodeError::TypeMismatch(_))
    ));
}

#[test]
fn test_encode_missing_field_without_default() {
    let schema = parse(
        r#"{"type": "record", "name": "R", "fields": [{"name" : "n", "type": "int"}]}"#,
    );
    let record = Record::with_name("R");
    assert!(matches!(
        encode(&schema, Some(&record)),
        Err(EncodeError::MissingValue { .. })
    ));
}

#[test]
fn test_encode_missing_field_uses_default() {
    let schema = parse(
        r#"{"type": "record", "name": "R", "fields": [
            {"name": "n", "type": "int", "default": 5}
        ]}"#,
    );
    let record = Record::with_name("R");
    let bytes = encode(&schema, Some(&record)).unwrap();
    let decoded = decode(&schema, &bytes).unwrap();
    assert_eq!(decoded.get("n"), Some(&Value::Int(5)));
}

// ============================================================================
// Render Tests
// ============================================================================

#[test]
fn test_render_decoded_record() {
    let schema = parse(
        r#"{"type": "record", "name": "User", "fields": [
            {"name": "id", "type": "long"},
            {"name": "name", "type": "string"},
            {"name": "email", "type": ["null", "string"]}
        ]}"#,
    );
    let mut record = Record::with_name("User");
    record.set("id", Value::Long(7));
    record.set("name", Value::String("ada".to_string()));
    record.set("email", Value::Union(0, Box::new(Value::Null)));

    let bytes = encode(&schema, Some(&record)).unwrap();
    let decoded = decode(&schema, &bytes).unwrap();
    assert_eq!(
        render(&decoded),
        r#"{"id": 7, "name": "ada", "email": null}"#
    );
}

#[test]
fn test_render_all_unset_record() {
    let schema = parse(
        r#"{"type": "record", "name": "R", "fields": [
            {"name": "a", "type": ["null", "int"]},
            {"name": "b", "type": ["null", "string"]}
        ]}"#,
    );
    let record = decode(&schema, &[]).unwrap();
    assert_eq!(render(&record), r#"{"a": null, "b": null}"#);
}

// ============================================================================
// Path Lookup Tests
// ============================================================================

#[test]
fn test_select_field_on_decoded_record() {
    let schema = parse(
        r#"{
            "type": "record",
            "name": "Root",
            "fields": [
                {"name": "a", "type": {
                    "type": "record",
                    "name": "A",
                    "fields": [
                        {"name": "b", "type": {
                            "type": "record",
                            "name": "B",
                            "fields": [{"name": "c", "type": "long"}]
                        }}
                    ]
                }}
            ]
        }"#,
    );

    let mut b = Record::with_name("B");
    b.set("c", Value::Long(42));
    let mut a = Record::with_name("A");
    a.set("b", Value::Record(b));
    let mut root = Record::with_name("Root");
    root.set("a", Value::Record(a));

    let bytes = encode(&schema, Some(&root)).unwrap();
    let decoded = decode(&schema, &bytes).unwrap();

    assert_eq!(select_field(&decoded, "a.b.c").unwrap(), &Value::Long(42));
    assert!(matches!(
        select_field(&decoded, "a.x"),
        Err(PathError::FieldNotFound { .. })
    ));
    assert!(matches!(
        select_field(&decoded, "a.b.c.d"),
        Err(PathError::NotARecord { .. })
    ));
    assert!(matches!(
        select_field(&decoded, ""),
        Err(PathError::InvalidPath(_))
    ));
}
