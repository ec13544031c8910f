//! Dotted field paths (`"profile.address.city"`, `"items.0.sku"`).
//!
//! Numeric segments index into arrays when the value at that point is an
//! array, and act as ordinary keys on objects.

use serde_json::{Map, Value};

use crate::errors::CoreError;

/// Validate a dotted path and split it into segments.
///
/// # Errors
///
/// Returns `CoreError::InvalidPath` if the path is empty or contains an
/// empty segment (`"a..b"`, `".a"`, `"a."`).
pub fn parse(path: &str) -> Result<Vec<&str>, CoreError> {
    if path.is_empty() {
        return Err(CoreError::InvalidPath {
            path: path.to_string(),
            reason: "path is empty".into(),
        });
    }
    let segments: Vec<&str> = path.split('.').collect();
    if segments.iter().any(|s| s.is_empty()) {
        return Err(CoreError::InvalidPath {
            path: path.to_string(),
            reason: "path has an empty segment".into(),
        });
    }
    Ok(segments)
}

/// Join a parent path and a child key.
#[must_use]
pub fn join(parent: &str, key: &str) -> String {
    if parent.is_empty() {
        key.to_string()
    } else {
        format!("{parent}.{key}")
    }
}

/// Look up the value at `segments`, if present.
#[must_use]
pub fn get<'a>(value: &'a Value, segments: &[&str]) -> Option<&'a Value> {
    let mut current = value;
    for segment in segments {
        current = match current {
            Value::Object(map) => map.get(*segment)?,
            Value::Array(items) => items.get(segment.parse::<usize>().ok()?)?,
            _ => return None,
        };
    }
    Some(current)
}

/// Set the value at `segments`, creating intermediate objects as needed.
///
/// A non-container met along the way is replaced by an object. An array is
/// only descended into with an in-range numeric segment; otherwise it is
/// also replaced, matching plain-object assignment semantics.
pub fn set(value: &mut Value, segments: &[&str], new_value: Value) {
    let Some((last, parents)) = segments.split_last() else {
        *value = new_value;
        return;
    };

    let mut current = value;
    for segment in parents {
        current = child_mut(current, segment);
    }

    if let Value::Array(items) = current {
        if let Some(slot) = last.parse::<usize>().ok().and_then(|i| items.get_mut(i)) {
            *slot = new_value;
            return;
        }
    }
    if !current.is_object() {
        *current = Value::Object(Map::new());
    }
    current[*last] = new_value;
}

/// Remove and return the value at `segments`.
///
/// Array elements are removed by position, shifting later elements.
pub fn remove(value: &mut Value, segments: &[&str]) -> Option<Value> {
    let (last, parents) = segments.split_last()?;
    let mut current = value;
    for segment in parents {
        current = match current {
            Value::Object(map) => map.get_mut(*segment)?,
            Value::Array(items) => items.get_mut(segment.parse::<usize>().ok()?)?,
            _ => return None,
        };
    }
    match current {
        Value::Object(map) => map.remove(*last),
        Value::Array(items) => {
            let idx = last.parse::<usize>().ok()?;
            (idx < items.len()).then(|| items.remove(idx))
        }
        _ => None,
    }
}

fn child_mut<'a>(current: &'a mut Value, segment: &str) -> &'a mut Value {
    let array_index = match &*current {
        Value::Array(items) => segment.parse::<usize>().ok().filter(|i| *i < items.len()),
        _ => None,
    };
    if let Some(idx) = array_index {
        return &mut current[idx];
    }
    if !current.is_object() {
        *current = Value::Object(Map::new());
    }
    &mut current[segment]
}
