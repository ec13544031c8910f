//! Recording policy settings (`[audit]`).

use chron_core::enums::RequiredField;
use chron_core::errors::CoreError;
use chron_core::filter::FieldFilter;
use chron_core::policy::RecordingPolicy;
use serde::{Deserialize, Serialize};

use crate::ConfigError;

/// A single field path or a list of them.
///
/// `omit = "password"` and `omit = ["password", "meta.token"]` are both accepted.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(untagged)]
pub enum FieldList {
    One(String),
    Many(Vec<String>),
}

impl FieldList {
    #[must_use]
    pub fn to_vec(&self) -> Vec<String> {
        match self {
            Self::One(path) => vec![path.clone()],
            Self::Many(paths) => paths.clone(),
        }
    }
}

impl Default for FieldList {
    fn default() -> Self {
        Self::Many(Vec::new())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct AuditConfig {
    /// Dotted paths stripped from every delta.
    #[serde(default)]
    pub omit: FieldList,

    /// Top-level fields to keep. Everything else is dropped when set.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pick: Option<Vec<String>>,

    /// Context fields a mutation must carry to be recorded (`actor`, `reason`;
    /// `user` is read as `actor`).
    #[serde(default)]
    pub required: Vec<RequiredField>,
}

impl AuditConfig {
    /// Build the recording policy, validating every configured path.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidValue` naming `audit.omit` or `audit.pick`
    /// when a path is empty or malformed.
    pub fn policy(&self) -> Result<RecordingPolicy, ConfigError> {
        let filter = FieldFilter::new(self.omit.to_vec(), self.pick.clone()).map_err(|e| {
            let field = match &e {
                CoreError::InvalidPath { path, .. }
                    if self.pick.as_ref().is_some_and(|keys| keys.contains(path)) =>
                {
                    "audit.pick"
                }
                _ => "audit.omit",
            };
            ConfigError::InvalidValue {
                field: field.to_string(),
                reason: e.to_string(),
            }
        })?;

        Ok(RecordingPolicy::new(filter, self.required.clone()))
    }
}
