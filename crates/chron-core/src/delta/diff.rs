use serde_json::{Map, Value, json};

use super::{DELETED, array};

/// Compute the delta that turns `left` into `right`.
///
/// Returns `None` when the two snapshots are structurally equal. A field
/// missing on one side is an add or a delete; a field holding `null` is an
/// ordinary value, so `null -> 1` is a modification.
#[must_use]
pub fn diff(left: &Value, right: &Value) -> Option<Value> {
    if left == right {
        return None;
    }
    match (left, right) {
        (Value::Object(l), Value::Object(r)) => diff_objects(l, r),
        (Value::Array(l), Value::Array(r)) => array::diff_arrays(l, r),
        _ => Some(json!([left, right])),
    }
}

fn diff_objects(left: &Map<String, Value>, right: &Map<String, Value>) -> Option<Value> {
    let mut delta = Map::new();

    for (key, old) in left {
        match right.get(key) {
            Some(new) => {
                if let Some(child) = diff(old, new) {
                    delta.insert(key.clone(), child);
                }
            }
            None => {
                delta.insert(key.clone(), json!([old, DELETED, DELETED]));
            }
        }
    }
    for (key, new) in right {
        if !left.contains_key(key) {
            delta.insert(key.clone(), json!([new]));
        }
    }

    (!delta.is_empty()).then_some(Value::Object(delta))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn scalar_change_is_old_new_pair() {
        let delta = diff(&json!({"status": "open"}), &json!({"status": "closed"}));
        assert_eq!(delta, Some(json!({"status": ["open", "closed"]})));
    }

    #[test]
    fn absent_and_null_are_distinct() {
        assert_eq!(
            diff(&json!({}), &json!({"x": null})),
            Some(json!({"x": [null]}))
        );
        assert_eq!(
            diff(&json!({"x": null}), &json!({"x": 1})),
            Some(json!({"x": [null, 1]}))
        );
        assert_eq!(
            diff(&json!({"x": 1}), &json!({})),
            Some(json!({"x": [1, 0, 0]}))
        );
    }

    #[test]
    fn nested_objects_only_report_changed_leaves() {
        let delta = diff(
            &json!({"a": {"b": 1, "c": 2}, "d": 3}),
            &json!({"a": {"b": 1, "c": 5}, "d": 3}),
        );
        assert_eq!(delta, Some(json!({"a": {"c": [2, 5]}})));
    }

    #[test]
    fn type_change_is_replacement() {
        let delta = diff(&json!({"x": 1}), &json!({"x": {"y": 1}}));
        assert_eq!(delta, Some(json!({"x": [1, {"y": 1}]})));
    }
}
