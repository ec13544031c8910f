//! Service layer tying the audit log to a recording policy.
//!
//! `AuditService` wraps `ChronDb` (raw database access) and the
//! `RecordingPolicy` built from configuration. Store, recorder, resolver and
//! history methods are implemented as `impl AuditService` blocks in their own
//! modules.

use std::path::Path;

use chron_config::{AuditConfig, ChronConfig};
use chron_core::policy::RecordingPolicy;

use crate::ChronDb;
use crate::error::DatabaseError;

pub struct AuditService {
    db: ChronDb,
    policy: RecordingPolicy,
}

impl AuditService {
    /// Create a new service over a local database.
    ///
    /// # Arguments
    ///
    /// * `db_path` - Path to the libSQL database file, or `":memory:"` for tests.
    /// * `audit` - Omit / pick / required settings. Validated before the
    ///   database is touched.
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError::Config` for invalid audit settings, or
    /// `DatabaseError` if the database cannot be opened.
    pub async fn new_local(db_path: &str, audit: &AuditConfig) -> Result<Self, DatabaseError> {
        let policy = audit.policy()?;
        let db = ChronDb::open_local(db_path).await?;
        Ok(Self { db, policy })
    }

    /// Create a service from loaded configuration, creating the parent
    /// directory of `database.path` if needed.
    ///
    /// # Errors
    ///
    /// Same as [`Self::new_local`], plus `DatabaseError::Other` if the
    /// directory cannot be created.
    pub async fn from_config(config: &ChronConfig) -> Result<Self, DatabaseError> {
        let path = config.database.path.as_str();
        if path != ":memory:" {
            if let Some(parent) = Path::new(path).parent().filter(|p| !p.as_os_str().is_empty()) {
                std::fs::create_dir_all(parent).map_err(|e| {
                    DatabaseError::Other(anyhow::anyhow!(
                        "cannot create {}: {e}",
                        parent.display()
                    ))
                })?;
            }
        }
        Self::new_local(path, &config.audit).await
    }

    /// Create from an existing `ChronDb` and an already-built policy.
    #[must_use]
    pub const fn from_db(db: ChronDb, policy: RecordingPolicy) -> Self {
        Self { db, policy }
    }

    /// Access the underlying database handle.
    #[must_use]
    pub const fn db(&self) -> &ChronDb {
        &self.db
    }

    #[must_use]
    pub const fn policy(&self) -> &RecordingPolicy {
        &self.policy
    }
}
