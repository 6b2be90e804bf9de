//! Dotted-path field lookup on records.

use crate::error::PathError;
use crate::value::{Record, Value};

/// Look up a nested field by a dot-separated path, e.g. `"a.b.c"`: recurse
/// into nested record `a`, then `b`, then return the value of `c`.
///
/// Union values are unwrapped transparently during descent (and for the
/// final value), so a path written against the record's logical shape works
/// whether or not fields are nullable.
///
/// # Errors
/// - `PathError::InvalidPath` for an empty path or an empty segment
///   (`"a..b"`).
/// - `PathError::FieldNotFound` when any segment names an absent field.
/// - `PathError::NotARecord` when the path descends into a non-record
///   value before its last segment.
///
/// # Example
/// ```
/// use avrolite::{select_field, Record, Value};
///
/// let mut inner = Record::with_name("Inner");
/// inner.set("c", Value::Long(42));
/// let mut outer = Record::with_name("Outer");
/// outer.set("a", Value::Record(inner));
///
/// assert_eq!(select_field(&outer, "a.c").unwrap(), &Value::Long(42));
/// assert!(select_field(&outer, "a.x").is_err());
/// ```
pub fn select_field<'a>(record: &'a Record, path: &str) -> Result<&'a Value, PathError> {
    if path.is_empty() {
        return Err(PathError::InvalidPath("path is empty".to_string()));
    }

    let segments: Vec<&str> = path.split('.').collect();
    let mut current = record;

    for (i, segment) in segments.iter().enumerate() {
        if segment.is_empty() {
            return Err(PathError::InvalidPath(format!(
                "empty segment at position {} in '{}'",
                i, path
            )));
        }

        let value = current.get(segment).ok_or_else(|| PathError::FieldNotFound {
            record: current.name().to_string(),
            segment: segment.to_string(),
        })?;
        let value = unwrap_unions(value);

        if i + 1 == segments.len() {
            return Ok(value);
        }

        match value {
            Value::Record(nested) => current = nested,
            other => {
                return Err(PathError::NotARecord {
                    segment: segment.to_string(),
                    kind: other.type_name(),
                })
            }
        }
    }

    // The loop always returns on the last segment
    Err(PathError::InvalidPath(path.to_string()))
}

fn unwrap_unions(mut value: &Value) -> &Value {
    while let Value::Union(_, inner) = value {
        value = inner;
    }
    value
}
