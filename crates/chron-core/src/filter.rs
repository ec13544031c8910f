//! Omit / pick filtering of deltas before they are recorded.

use serde_json::Value;

use crate::delta::{ARRAY_TAG, ARRAY_TAG_KEY, DeltaNode};
use crate::errors::CoreError;
use crate::path;

/// Restricts a delta to the fields worth recording.
///
/// Filters run in a fixed order: the omit-list first, then the pick-list.
/// A delta that ends up empty is dropped (`apply` returns `None`), which is
/// how no-op and fully-ignored mutations avoid producing a record.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FieldFilter {
    omit: Vec<String>,
    pick: Option<Vec<String>>,
}

impl FieldFilter {
    /// Build a filter from dotted omit paths and top-level pick keys.
    ///
    /// # Errors
    ///
    /// Returns `CoreError::InvalidPath` for an empty or malformed omit path,
    /// or for a pick entry that is empty or dotted.
    pub fn new(omit: Vec<String>, pick: Option<Vec<String>>) -> Result<Self, CoreError> {
        for p in &omit {
            path::parse(p)?;
        }
        if let Some(keys) = &pick {
            for key in keys {
                if key.is_empty() || key.contains('.') {
                    return Err(CoreError::InvalidPath {
                        path: key.clone(),
                        reason: "pick entries must be top-level field names".into(),
                    });
                }
            }
        }
        Ok(Self { omit, pick })
    }

    /// A filter that keeps every field.
    #[must_use]
    pub fn none() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn omit(&self) -> &[String] {
        &self.omit
    }

    #[must_use]
    pub fn pick(&self) -> Option<&[String]> {
        self.pick.as_deref()
    }

    /// Filter a delta. Returns `None` if nothing worth recording is left.
    #[must_use]
    pub fn apply(&self, mut delta: Value) -> Option<Value> {
        if !self.omit.is_empty() {
            let paths: Vec<Vec<&str>> = self.omit.iter().map(|p| p.split('.').collect()).collect();
            omit_deep(&mut delta, &paths);
            prune_empty(&mut delta);
        }

        if let (Some(keys), Value::Object(map)) = (&self.pick, &mut delta) {
            map.retain(|k, _| keys.contains(k));
        }

        (!is_structurally_empty(&delta)).then_some(delta)
    }
}

/// Remove every path relative to every nested object, descending through
/// arrays as well.
fn omit_deep(value: &mut Value, paths: &[Vec<&str>]) {
    for segments in paths {
        remove_path(value, segments);
    }
    match value {
        Value::Object(map) => map.values_mut().for_each(|v| omit_deep(v, paths)),
        Value::Array(items) => items.iter_mut().for_each(|v| omit_deep(v, paths)),
        _ => {}
    }
}

/// Like [`path::remove`], but a path reaching an array (a leaf value pair or
/// an array delta) continues into each of its elements.
fn remove_path(value: &mut Value, segments: &[&str]) {
    match value {
        Value::Array(items) => items.iter_mut().for_each(|item| remove_path(item, segments)),
        Value::Object(map) if map.get(ARRAY_TAG_KEY).is_some_and(|t| t == ARRAY_TAG) => map
            .iter_mut()
            .filter(|(k, _)| k.as_str() != ARRAY_TAG_KEY)
            .for_each(|(_, v)| remove_path(v, segments)),
        Value::Object(map) => match segments {
            [] => {}
            [last] => {
                map.remove(*last);
            }
            [first, rest @ ..] => {
                if let Some(child) = map.get_mut(*first) {
                    remove_path(child, rest);
                }
            }
        },
        _ => {}
    }
}

/// Drop delta nodes emptied by omission: object and array deltas with nothing
/// left, and modifications whose two sides became equal.
fn prune_empty(delta: &mut Value) {
    if let Value::Object(map) = delta {
        for child in map.values_mut() {
            prune_empty(child);
        }
        map.retain(|_, child| {
            let emptied = child.is_object() && is_structurally_empty(child);
            let unchanged = matches!(
                DeltaNode::classify(child),
                Some(DeltaNode::Modified { old, new }) if old == new
            );
            !(emptied || unchanged)
        });
    }
}

/// `true` for `{}`, for an array delta holding only its `_t` tag, and for
/// objects made only of such values.
#[must_use]
pub fn is_structurally_empty(value: &Value) -> bool {
    match value {
        Value::Object(map) => map
            .iter()
            .all(|(k, v)| k == ARRAY_TAG_KEY || is_structurally_empty(v)),
        _ => false,
    }
}
