//! Audit store location.

use serde::{Deserialize, Serialize};

fn default_path() -> String {
    ".chronicle/audit.db".to_string()
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct DatabaseConfig {
    /// Path of the local libSQL file holding the audit log.
    #[serde(default = "default_path")]
    pub path: String,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: default_path(),
        }
    }
}
