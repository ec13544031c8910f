//! # chron-db
//!
//! libSQL-backed audit log for Chronicle.
//!
//! Stores one immutable `audit_log` row per recorded mutation and builds the
//! engine on top of it: the recorder (gate, diff, filter, append), the version
//! resolver (undo deltas newest-first from the current snapshot), and the
//! history query surface.
//!
//! Uses the `libsql` crate (v0.9.29) in local mode; pass `":memory:"` for a
//! throwaway database.

pub mod error;
pub mod helpers;
pub mod history;
mod migrations;
pub mod recorder;
pub mod repos;
pub mod resolver;
pub mod service;

#[cfg(test)]
mod test_support;

use error::DatabaseError;
use libsql::Builder;

/// ID prefix for audit records.
pub const PREFIX_AUDIT: &str = "aud";

/// Central database handle for the audit log.
pub struct ChronDb {
    #[allow(dead_code)]
    db: libsql::Database,
    conn: libsql::Connection,
}

impl ChronDb {
    /// Open a local database at the given path.
    ///
    /// Runs migrations automatically on open.
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError` if the database cannot be opened or
    /// migrations fail.
    pub async fn open_local(path: &str) -> Result<Self, DatabaseError> {
        let db = Builder::new_local(path).build().await?;
        let conn = db.connect()?;

        let chron_db = Self { db, conn };
        chron_db.run_migrations().await?;
        Ok(chron_db)
    }

    /// Access the underlying libSQL connection for direct queries and for
    /// opening transactions to pass through `MutationContext`.
    #[must_use]
    pub const fn conn(&self) -> &libsql::Connection {
        &self.conn
    }

    /// Generate a prefixed ID via libSQL. Returns e.g., `"aud-a3f8b2c1"`.
    ///
    /// Uses `randomblob(4)` in SQL to produce 8-char hex, then prepends the prefix.
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError` if the query fails or returns no rows.
    pub async fn generate_id(&self, prefix: &str) -> Result<String, DatabaseError> {
        generate_id_on(&self.conn, prefix).await
    }
}

/// Same as [`ChronDb::generate_id`], on an arbitrary connection (or a
/// transaction, through `Deref`).
pub(crate) async fn generate_id_on(
    conn: &libsql::Connection,
    prefix: &str,
) -> Result<String, DatabaseError> {
    let mut rows = conn
        .query(
            "SELECT ?1 || '-' || lower(hex(randomblob(4)))",
            [prefix],
        )
        .await?;
    let row = rows.next().await?.ok_or(DatabaseError::NoResult)?;
    Ok(row.get::<String>(0)?)
}
