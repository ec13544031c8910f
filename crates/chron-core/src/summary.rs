//! Human-readable change feed built from audit records.

use serde_json::Value;

use crate::delta::DeltaNode;
use crate::entities::{AuditRecord, HistoryEntry};

/// Turn records into history entries, preserving their order.
///
/// Top-level fields listed in `expandable` render as
/// `"<field> from <old> to <new>"`; every other changed field renders as its
/// bare name. Bare names come first, then expanded fragments.
#[must_use]
pub fn summarize<S: AsRef<str>>(records: &[AuditRecord], expandable: &[S]) -> Vec<HistoryEntry> {
    records
        .iter()
        .map(|record| HistoryEntry {
            changed_by: record.actor.clone(),
            changed_at: record.created_at,
            updated_at: record.updated_at,
            reason: record.reason.clone(),
            comment: describe(&record.diff, expandable),
        })
        .collect()
}

/// Render the comment for a single delta.
#[must_use]
pub fn describe<S: AsRef<str>>(delta: &Value, expandable: &[S]) -> String {
    let mut fields = Vec::new();
    let mut values = Vec::new();

    if let Value::Object(map) = delta {
        for (key, node) in map {
            let expanded = expandable
                .iter()
                .any(|e| e.as_ref() == key)
                .then(|| expand(key, node))
                .flatten();
            match expanded {
                Some(fragment) => values.push(fragment),
                None => fields.push(key.clone()),
            }
        }
    }

    fields.extend(values);
    format!("modified {}", fields.join(", "))
}

/// `None` when the node is a nested delta with no single before/after pair.
fn expand(key: &str, node: &Value) -> Option<String> {
    let (old, new) = match DeltaNode::classify(node)? {
        DeltaNode::Modified { old, new } => (Some(old), Some(new)),
        DeltaNode::Added(new) => (None, Some(new)),
        DeltaNode::Deleted(old) => (Some(old), None),
        _ => return None,
    };
    Some(format!("{key} from {} to {}", render(old), render(new)))
}

fn render(value: Option<&Value>) -> String {
    match value {
        None | Some(Value::Null) => "null".to_string(),
        Some(Value::String(s)) => s.clone(),
        Some(other) => other.to_string(),
    }
}
