//! Error types for the pure (no I/O) parts of Chronicle.
//!
//! Store and configuration errors live in their own crates (`DatabaseError`,
//! `ConfigError`). Both wrap the types defined here.

use thiserror::Error;

/// Errors raised while building filters, policies, or field updates.
#[derive(Debug, Error)]
pub enum CoreError {
    /// A dotted field path is malformed (empty, or has an empty segment).
    #[error("Invalid field path '{path}': {reason}")]
    InvalidPath { path: String, reason: String },

    /// Data failed validation.
    #[error("Validation error: {0}")]
    Validation(String),

    /// A delta could not be applied.
    #[error(transparent)]
    Delta(#[from] DeltaError),
}

/// Errors raised by `patch` / `unpatch` when a delta does not fit the snapshot.
///
/// `path` is the dotted location inside the snapshot (`""` for the root).
#[derive(Debug, Error, PartialEq, Eq)]
pub enum DeltaError {
    /// The delta node is not one of the recognised shapes.
    #[error("Malformed delta at '{path}': {reason}")]
    Malformed { path: String, reason: String },

    /// The snapshot value has the wrong type for the delta node.
    #[error("Delta expects {expected} at '{path}', found {found}")]
    ShapeMismatch {
        path: String,
        expected: &'static str,
        found: &'static str,
    },

    /// An array delta references a position the array does not have.
    #[error("Array delta index {index} out of range at '{path}' (length {len})")]
    IndexOutOfRange {
        path: String,
        index: usize,
        len: usize,
    },
}

impl DeltaError {
    pub(crate) fn malformed(path: &str, reason: impl Into<String>) -> Self {
        Self::Malformed {
            path: path.to_string(),
            reason: reason.into(),
        }
    }
}

/// Short type name of a JSON value, for error messages.
#[must_use]
pub const fn json_type_name(value: &serde_json::Value) -> &'static str {
    match value {
        serde_json::Value::Null => "null",
        serde_json::Value::Bool(_) => "boolean",
        serde_json::Value::Number(_) => "number",
        serde_json::Value::String(_) => "string",
        serde_json::Value::Array(_) => "array",
        serde_json::Value::Object(_) => "object",
    }
}
