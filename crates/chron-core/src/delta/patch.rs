use serde_json::{Map, Value};

use super::DeltaNode;
use super::array::{patch_array, unpatch_array};
use crate::errors::{DeltaError, json_type_name};
use crate::path;

/// Apply `delta` to the older snapshot `left`, producing the newer one.
///
/// # Errors
///
/// Returns `DeltaError` if the delta is malformed or does not fit `left`.
pub fn patch(left: &Value, delta: &Value) -> Result<Value, DeltaError> {
    patch_node(Some(left.clone()), delta, "")?
        .ok_or_else(|| DeltaError::malformed("", "delta deletes the root value"))
}

/// Undo `delta` on the newer snapshot `right`, producing the older one.
///
/// `unpatch(&b, &diff(&a, &b)?)` returns `a`.
///
/// # Errors
///
/// Returns `DeltaError` if the delta is malformed or does not fit `right`.
pub fn unpatch(right: &Value, delta: &Value) -> Result<Value, DeltaError> {
    unpatch_node(Some(right.clone()), delta, "")?
        .ok_or_else(|| DeltaError::malformed("", "delta adds the root value"))
}

/// `None` stands for an absent field, on input and output.
pub(super) fn patch_node(
    current: Option<Value>,
    delta: &Value,
    at: &str,
) -> Result<Option<Value>, DeltaError> {
    match classify(delta, at)? {
        DeltaNode::Added(new) | DeltaNode::Modified { new, .. } => Ok(Some(new.clone())),
        DeltaNode::Deleted(_) => Ok(None),
        DeltaNode::Moved { .. } => Err(moved_outside_array(at)),
        DeltaNode::Object(fields) => {
            let object = expect_object(current, at)?;
            walk_object(object, fields, at, patch_node).map(Some)
        }
        DeltaNode::Array(entries) => {
            let items = expect_array(current, at)?;
            patch_array(items, entries, at).map(|v| Some(Value::Array(v)))
        }
    }
}

pub(super) fn unpatch_node(
    current: Option<Value>,
    delta: &Value,
    at: &str,
) -> Result<Option<Value>, DeltaError> {
    match classify(delta, at)? {
        DeltaNode::Added(_) => Ok(None),
        DeltaNode::Modified { old, .. } | DeltaNode::Deleted(old) => Ok(Some(old.clone())),
        DeltaNode::Moved { .. } => Err(moved_outside_array(at)),
        DeltaNode::Object(fields) => {
            let object = expect_object(current, at)?;
            walk_object(object, fields, at, unpatch_node).map(Some)
        }
        DeltaNode::Array(entries) => {
            let items = expect_array(current, at)?;
            unpatch_array(items, entries, at).map(|v| Some(Value::Array(v)))
        }
    }
}

type NodeFn = fn(Option<Value>, &Value, &str) -> Result<Option<Value>, DeltaError>;

fn walk_object(
    mut object: Map<String, Value>,
    fields: &Map<String, Value>,
    at: &str,
    apply: NodeFn,
) -> Result<Value, DeltaError> {
    for (key, child) in fields {
        let child_path = path::join(at, key);
        if let Some(value) = apply(object.remove(key), child, &child_path)? {
            object.insert(key.clone(), value);
        }
    }
    Ok(Value::Object(object))
}

fn classify<'a>(delta: &'a Value, at: &str) -> Result<DeltaNode<'a>, DeltaError> {
    DeltaNode::classify(delta).ok_or_else(|| DeltaError::malformed(at, "unrecognised delta node"))
}

fn moved_outside_array(at: &str) -> DeltaError {
    DeltaError::malformed(at, "move marker outside an array delta")
}

fn expect_object(current: Option<Value>, at: &str) -> Result<Map<String, Value>, DeltaError> {
    match current {
        Some(Value::Object(map)) => Ok(map),
        other => Err(shape_mismatch(at, "object", other.as_ref())),
    }
}

fn expect_array(current: Option<Value>, at: &str) -> Result<Vec<Value>, DeltaError> {
    match current {
        Some(Value::Array(items)) => Ok(items),
        other => Err(shape_mismatch(at, "array", other.as_ref())),
    }
}

fn shape_mismatch(at: &str, expected: &'static str, found: Option<&Value>) -> DeltaError {
    DeltaError::ShapeMismatch {
        path: at.to_string(),
        expected,
        found: found.map_or("nothing", json_type_name),
    }
}
