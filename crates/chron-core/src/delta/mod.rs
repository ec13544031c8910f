//! Structural diff codec for JSON snapshots.
//!
//! Deltas use the jsondiffpatch wire format so that stored records stay
//! readable by other tooling:
//!
//! ```text
//! [new]               value added
//! [old, new]          value replaced
//! [old, 0, 0]         value deleted
//! { "field": delta }  nested object changes
//! { "_t": "a", "3": delta | [new], "_1": [old, 0, 0] | ["", 3, 3] }
//!                     array changes; plain keys are new indices, `_` keys
//!                     are old indices (deletions and moves)
//! ```
//!
//! Array elements are matched by identity: the element's `_id` field, else its
//! `id` field, else its position. Reordering elements that carry no identifier
//! therefore shows up as replacements rather than moves.

mod array;
mod diff;
mod patch;

pub use diff::diff;
pub use patch::{patch, unpatch};

use serde_json::{Map, Value};

/// Marker stored in the second slot of a deleted node (`[old, 0, 0]`).
const DELETED: u64 = 0;

/// Marker stored in the third slot of a moved array node (`["", to, 3]`).
const ARRAY_MOVE: u64 = 3;

/// Key that flags an object delta as an array delta.
pub(crate) const ARRAY_TAG_KEY: &str = "_t";
pub(crate) const ARRAY_TAG: &str = "a";

/// Typed view of one delta node.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeltaNode<'a> {
    /// `[new]`
    Added(&'a Value),
    /// `[old, new]`
    Modified { old: &'a Value, new: &'a Value },
    /// `[old, 0, 0]`
    Deleted(&'a Value),
    /// `["", to, 3]`, only valid under an array delta's `_<from>` key.
    Moved { to: usize },
    /// Field-by-field changes of an object.
    Object(&'a Map<String, Value>),
    /// Element changes of an array (`"_t": "a"`).
    Array(&'a Map<String, Value>),
}

impl<'a> DeltaNode<'a> {
    /// Classify a raw delta node. Returns `None` for shapes this codec does
    /// not produce (including jsondiffpatch text diffs).
    #[must_use]
    pub fn classify(delta: &'a Value) -> Option<Self> {
        match delta {
            Value::Array(items) => match items.as_slice() {
                [new] => Some(Self::Added(new)),
                [old, new] => Some(Self::Modified { old, new }),
                [old, Value::Number(zero), Value::Number(marker)]
                    if zero.as_u64() == Some(DELETED) && marker.as_u64() == Some(DELETED) =>
                {
                    Some(Self::Deleted(old))
                }
                [_, Value::Number(to), Value::Number(marker)]
                    if marker.as_u64() == Some(ARRAY_MOVE) =>
                {
                    let to = usize::try_from(to.as_u64()?).ok()?;
                    Some(Self::Moved { to })
                }
                _ => None,
            },
            Value::Object(map) if is_array_delta(map) => Some(Self::Array(map)),
            Value::Object(map) => Some(Self::Object(map)),
            _ => None,
        }
    }

    /// The value before the change, for leaf nodes.
    #[must_use]
    pub const fn old_value(&self) -> Option<&'a Value> {
        match self {
            Self::Modified { old, .. } | Self::Deleted(old) => Some(*old),
            _ => None,
        }
    }

    /// The value after the change, for leaf nodes.
    #[must_use]
    pub const fn new_value(&self) -> Option<&'a Value> {
        match self {
            Self::Added(new) | Self::Modified { new, .. } => Some(*new),
            _ => None,
        }
    }
}

fn is_array_delta(map: &Map<String, Value>) -> bool {
    map.get(ARRAY_TAG_KEY).and_then(Value::as_str) == Some(ARRAY_TAG)
}
