//! Database error types for chron-db.

use chron_config::ConfigError;
use chron_core::errors::{CoreError, DeltaError};
use thiserror::Error;

/// Errors from store, recorder, and resolver operations.
#[derive(Debug, Error)]
pub enum DatabaseError {
    /// A SQL query failed.
    #[error("Query failed: {0}")]
    Query(String),

    /// Schema migration failed.
    #[error("Migration failed: {0}")]
    Migration(String),

    /// Expected a result row but none was returned.
    #[error("No result returned")]
    NoResult,

    /// Invalid state encountered (e.g., bad data in DB).
    #[error("Invalid state: {0}")]
    InvalidState(String),

    /// Another writer already stored this version for the document.
    ///
    /// Two concurrent mutations read the same latest version and raced to
    /// append the next one. The losing mutation's history is not written.
    #[error("Version {version} already recorded for {collection_name}/{collection_id}")]
    DuplicateVersion {
        collection_name: String,
        collection_id: String,
        version: u64,
    },

    /// A stored delta could not be undone against the snapshot.
    #[error("Reconstruction failed: {0}")]
    Delta(#[from] DeltaError),

    /// Invalid field update or path.
    #[error(transparent)]
    Core(#[from] CoreError),

    /// Invalid audit configuration.
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// The collaborator's document source failed: the snapshot loader while
    /// resolving a version, or the document stream of a bulk update.
    #[error("Document source failed: {0}")]
    Loader(#[source] anyhow::Error),

    /// Underlying libSQL error.
    #[error("libSQL error: {0}")]
    LibSql(#[from] libsql::Error),

    /// Catch-all for unexpected errors.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}
