//! Query surface over one document's audit trail.

use chron_core::entities::{AuditRecord, HistoryEntry};
use chron_core::summary;

use crate::error::DatabaseError;
use crate::repos::audit::DiffQuery;
use crate::service::AuditService;

impl AuditService {
    /// Raw records for a document. Without a query: every record, oldest first.
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError` if the query fails.
    pub async fn get_diffs(
        &self,
        collection_name: &str,
        collection_id: &str,
        query: Option<&DiffQuery>,
    ) -> Result<Vec<AuditRecord>, DatabaseError> {
        let default = DiffQuery::default();
        self.find_by_document(collection_name, collection_id, query.unwrap_or(&default))
            .await
    }

    /// Human-readable change feed for a document, oldest first.
    ///
    /// Fields listed in `expandable` show their old and new values; the rest
    /// show only their name.
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError` if the query fails.
    pub async fn get_history<S: AsRef<str> + Sync>(
        &self,
        collection_name: &str,
        collection_id: &str,
        expandable: &[S],
    ) -> Result<Vec<HistoryEntry>, DatabaseError> {
        let records = self.get_diffs(collection_name, collection_id, None).await?;
        Ok(summary::summarize(&records, expandable))
    }
}
