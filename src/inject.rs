//! Metadata placement inside a record.

use serde_json::{Map, Value};

use crate::InjectionError;
use crate::types::InsertionPath;

/// Place `metadata` under `key` at `path` inside `record`.
///
/// Missing path segments are created as empty objects. An existing
/// segment that is not an object is a [`InjectionError::PathConflict`];
/// conflicts are detected before anything is created, so a failed
/// injection leaves `record` untouched. An existing value at `key` is
/// replaced, which makes repeated injection idempotent.
pub fn inject(
    record: &mut Value,
    path: &InsertionPath,
    key: &str,
    metadata: Value,
) -> Result<(), InjectionError> {
    check_path(record, path)?;

    let mut node = match record {
        Value::Object(map) => map,
        other => return Err(conflict("<root>", other)),
    };
    for segment in path.segments() {
        node = match node
            .entry(segment.clone())
            .or_insert_with(|| Value::Object(Map::new()))
        {
            Value::Object(map) => map,
            other => return Err(conflict(segment, other)),
        };
    }
    node.insert(key.to_string(), metadata);
    Ok(())
}

/// Walk the existing part of `path` looking for a non-object segment.
fn check_path(record: &Value, path: &InsertionPath) -> Result<(), InjectionError> {
    let mut node = match record {
        Value::Object(map) => map,
        other => return Err(conflict("<root>", other)),
    };
    for segment in path.segments() {
        match node.get(segment) {
            None => return Ok(()),
            Some(Value::Object(map)) => node = map,
            Some(other) => return Err(conflict(segment, other)),
        }
    }
    Ok(())
}

fn conflict(segment: &str, found: &Value) -> InjectionError {
    InjectionError::PathConflict {
        segment: segment.to_string(),
        found: kind(found),
    }
}

fn kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
