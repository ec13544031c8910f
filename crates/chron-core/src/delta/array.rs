//! Array deltas: identity-aware matching, LCS, and index bookkeeping.

use std::collections::BTreeSet;

use serde_json::{Map, Value, json};

use super::patch::{patch_node, unpatch_node};
use super::{ARRAY_MOVE, ARRAY_TAG, ARRAY_TAG_KEY, DELETED, DeltaNode, diff};
use crate::errors::DeltaError;
use crate::path;

/// How an array element is recognised across two versions of the array.
#[derive(Debug, PartialEq)]
enum Identity<'a> {
    Key(&'a Value),
    Position(usize),
}

fn identity(value: &Value, position: usize) -> Identity<'_> {
    ["_id", "id"]
        .iter()
        .find_map(|field| value.get(field).filter(|v| !v.is_null()))
        .map_or(Identity::Position(position), Identity::Key)
}

/// Two elements match if they are equal, or if both are containers with the
/// same identity. Scalars never match by position.
fn items_match(left: &Value, left_pos: usize, right: &Value, right_pos: usize) -> bool {
    if left == right {
        return true;
    }
    let is_container = |v: &Value| v.is_object() || v.is_array();
    if !is_container(left) || !is_container(right) {
        return false;
    }
    identity(left, left_pos) == identity(right, right_pos)
}

pub(super) fn diff_arrays(left: &[Value], right: &[Value]) -> Option<Value> {
    let (len1, len2) = (left.len(), right.len());
    let mut delta = Map::new();

    let mut head = 0;
    while head < len1 && head < len2 && items_match(&left[head], head, &right[head], head) {
        if let Some(child) = diff(&left[head], &right[head]) {
            delta.insert(head.to_string(), child);
        }
        head += 1;
    }

    let mut tail = 0;
    while head + tail < len1 && head + tail < len2 {
        let (i1, i2) = (len1 - 1 - tail, len2 - 1 - tail);
        if !items_match(&left[i1], i1, &right[i2], i2) {
            break;
        }
        if let Some(child) = diff(&left[i1], &right[i2]) {
            delta.insert(i2.to_string(), child);
        }
        tail += 1;
    }

    if head + tail == len1 {
        for i in head..len2 - tail {
            delta.insert(i.to_string(), json!([right[i]]));
        }
        return finish(delta);
    }
    if head + tail == len2 {
        for j in head..len1 - tail {
            delta.insert(format!("_{j}"), json!([left[j], DELETED, DELETED]));
        }
        return finish(delta);
    }

    let trimmed1 = &left[head..len1 - tail];
    let trimmed2 = &right[head..len2 - tail];
    let (common1, common2) = lcs(trimmed1, trimmed2);

    let mut removed = Vec::new();
    for j in head..len1 - tail {
        if !common1.contains(&(j - head)) {
            delta.insert(format!("_{j}"), json!([left[j], DELETED, DELETED]));
            removed.push(j);
        }
    }

    for i in head..len2 - tail {
        if let Some(pos) = common2.iter().position(|&k| k == i - head) {
            let j = common1[pos] + head;
            if let Some(child) = diff(&left[j], &right[i]) {
                delta.insert(i.to_string(), child);
            }
            continue;
        }

        let moved = removed.iter().position(|&j| {
            items_match(&trimmed1[j - head], j - head, &trimmed2[i - head], i - head)
        });
        match moved {
            Some(pos) => {
                let j = removed.remove(pos);
                delta.insert(format!("_{j}"), json!(["", i, ARRAY_MOVE]));
                if let Some(child) = diff(&left[j], &right[i]) {
                    delta.insert(i.to_string(), child);
                }
            }
            None => {
                delta.insert(i.to_string(), json!([right[i]]));
            }
        }
    }

    finish(delta)
}

fn finish(mut delta: Map<String, Value>) -> Option<Value> {
    if delta.is_empty() {
        return None;
    }
    delta.insert(ARRAY_TAG_KEY.to_string(), Value::String(ARRAY_TAG.to_string()));
    Some(Value::Object(delta))
}

/// Longest common subsequence under `items_match`, as index lists into
/// `left` and `right`.
fn lcs(left: &[Value], right: &[Value]) -> (Vec<usize>, Vec<usize>) {
    let (n, m) = (left.len(), right.len());
    let mut matrix = vec![vec![0usize; m + 1]; n + 1];
    for i in 1..=n {
        for j in 1..=m {
            matrix[i][j] = if items_match(&left[i - 1], i - 1, &right[j - 1], j - 1) {
                matrix[i - 1][j - 1] + 1
            } else {
                matrix[i - 1][j].max(matrix[i][j - 1])
            };
        }
    }

    let (mut common1, mut common2) = (Vec::new(), Vec::new());
    let (mut i, mut j) = (n, m);
    while i > 0 && j > 0 {
        if items_match(&left[i - 1], i - 1, &right[j - 1], j - 1) {
            common1.push(i - 1);
            common2.push(j - 1);
            i -= 1;
            j -= 1;
        } else if matrix[i][j - 1] > matrix[i - 1][j] {
            j -= 1;
        } else {
            i -= 1;
        }
    }
    common1.reverse();
    common2.reverse();
    (common1, common2)
}

/// The entries of an array delta, split by role.
#[derive(Default)]
struct ArrayEntries<'a> {
    /// New index -> inserted value.
    inserted: Vec<(usize, &'a Value)>,
    /// New index -> delta for an element present on both sides.
    nested: Vec<(usize, &'a Value)>,
    /// Old index -> removed value.
    removed: Vec<(usize, &'a Value)>,
    /// (old index, new index) of moved elements.
    moved: Vec<(usize, usize)>,
}

impl<'a> ArrayEntries<'a> {
    fn parse(delta: &'a Map<String, Value>, at: &str) -> Result<Self, DeltaError> {
        let mut entries = Self::default();
        for (key, node) in delta {
            if key == ARRAY_TAG_KEY {
                continue;
            }
            let child_path = path::join(at, key);
            let classified = DeltaNode::classify(node)
                .ok_or_else(|| DeltaError::malformed(&child_path, "unrecognised delta node"))?;

            if let Some(old_index) = key.strip_prefix('_') {
                let old_index = parse_index(old_index, &child_path)?;
                match classified {
                    DeltaNode::Deleted(value) => entries.removed.push((old_index, value)),
                    DeltaNode::Moved { to } => entries.moved.push((old_index, to)),
                    _ => {
                        return Err(DeltaError::malformed(
                            &child_path,
                            "old-index entries must be deletions or moves",
                        ));
                    }
                }
            } else {
                let new_index = parse_index(key, &child_path)?;
                match classified {
                    DeltaNode::Added(value) => entries.inserted.push((new_index, value)),
                    DeltaNode::Moved { .. } | DeltaNode::Deleted(_) => {
                        return Err(DeltaError::malformed(
                            &child_path,
                            "new-index entries must be insertions or nested deltas",
                        ));
                    }
                    _ => entries.nested.push((new_index, node)),
                }
            }
        }
        Ok(entries)
    }
}

fn parse_index(raw: &str, at: &str) -> Result<usize, DeltaError> {
    raw.parse()
        .map_err(|_| DeltaError::malformed(at, format!("'{raw}' is not an array index")))
}

fn out_of_range(at: &str, index: usize, len: usize) -> DeltaError {
    DeltaError::IndexOutOfRange {
        path: at.to_string(),
        index,
        len,
    }
}

/// Insert `(index, value)` pairs in ascending index order.
fn place(items: &mut Vec<Value>, mut placements: Vec<(usize, Value)>, at: &str) -> Result<(), DeltaError> {
    placements.sort_by_key(|(index, _)| *index);
    for (index, value) in placements {
        if index > items.len() {
            return Err(out_of_range(at, index, items.len()));
        }
        items.insert(index, value);
    }
    Ok(())
}

/// Apply an array delta forward: `left` is the older array.
pub(super) fn patch_array(
    left: Vec<Value>,
    delta: &Map<String, Value>,
    at: &str,
) -> Result<Vec<Value>, DeltaError> {
    let entries = ArrayEntries::parse(delta, at)?;
    let len = left.len();

    let mut taken = BTreeSet::new();
    for &(old_index, _) in &entries.removed {
        taken.insert(old_index);
    }
    for &(old_index, _) in &entries.moved {
        taken.insert(old_index);
    }
    if let Some(&index) = taken.iter().find(|&&i| i >= len) {
        return Err(out_of_range(at, index, len));
    }

    let mut placements: Vec<(usize, Value)> = entries
        .moved
        .iter()
        .map(|&(from, to)| (to, left[from].clone()))
        .collect();
    placements.extend(entries.inserted.iter().map(|&(i, v)| (i, v.clone())));

    let mut items: Vec<Value> = left
        .into_iter()
        .enumerate()
        .filter(|(i, _)| !taken.contains(i))
        .map(|(_, v)| v)
        .collect();
    place(&mut items, placements, at)?;

    for (index, node) in entries.nested {
        let len = items.len();
        let slot = items.get_mut(index).ok_or_else(|| out_of_range(at, index, len))?;
        let child_path = path::join(at, &index.to_string());
        *slot = patch_node(Some(slot.take()), node, &child_path)?
            .ok_or_else(|| DeltaError::malformed(&child_path, "nested delta removed the element"))?;
    }

    Ok(items)
}

/// Apply an array delta in reverse: `right` is the newer array.
pub(super) fn unpatch_array(
    mut right: Vec<Value>,
    delta: &Map<String, Value>,
    at: &str,
) -> Result<Vec<Value>, DeltaError> {
    let entries = ArrayEntries::parse(delta, at)?;

    for &(index, node) in &entries.nested {
        let len = right.len();
        let slot = right.get_mut(index).ok_or_else(|| out_of_range(at, index, len))?;
        let child_path = path::join(at, &index.to_string());
        *slot = unpatch_node(Some(slot.take()), node, &child_path)?
            .ok_or_else(|| DeltaError::malformed(&child_path, "nested delta removed the element"))?;
    }

    let len = right.len();
    let mut added = BTreeSet::new();
    for &(new_index, _) in &entries.inserted {
        added.insert(new_index);
    }
    for &(_, new_index) in &entries.moved {
        added.insert(new_index);
    }
    if let Some(&index) = added.iter().find(|&&i| i >= len) {
        return Err(out_of_range(at, index, len));
    }

    let mut placements: Vec<(usize, Value)> = entries
        .moved
        .iter()
        .map(|&(from, to)| (from, right[to].clone()))
        .collect();
    placements.extend(entries.removed.iter().map(|&(j, v)| (j, v.clone())));

    let mut items: Vec<Value> = right
        .into_iter()
        .enumerate()
        .filter(|(i, _)| !added.contains(i))
        .map(|(_, v)| v)
        .collect();
    place(&mut items, placements, at)?;

    Ok(items)
}
