//! Rebuilding past versions of a document.
//!
//! Version `v` names the document as it stood right after record `v` was
//! written. Reconstruction starts from the current snapshot and undoes every
//! record newer than the target, newest first.

use std::future::Future;

use serde_json::{Map, Value};

use chron_core::delta;

use crate::error::DatabaseError;
use crate::service::AuditService;

/// Looks up the current snapshot of a document in the collaborator's store.
pub trait SnapshotLoader {
    /// `Ok(None)` when the document does not exist (e.g. it was removed).
    fn load_by_id(
        &self,
        collection_name: &str,
        collection_id: &str,
    ) -> impl Future<Output = anyhow::Result<Option<Value>>> + Send;
}

impl AuditService {
    /// Reconstruct a document as of `target_version`.
    ///
    /// A document the loader cannot find is treated as `{}`. A target at or
    /// above the latest version returns the current snapshot unchanged.
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError::Loader` if the loader fails,
    /// `DatabaseError::Delta` if a stored delta does not fit the snapshot,
    /// or `DatabaseError` if the store query fails.
    pub async fn get_version<L: SnapshotLoader + Sync>(
        &self,
        loader: &L,
        collection_name: &str,
        collection_id: &str,
        target_version: u64,
    ) -> Result<Value, DatabaseError> {
        let mut snapshot = loader
            .load_by_id(collection_name, collection_id)
            .await
            .map_err(DatabaseError::Loader)?
            .unwrap_or_else(|| Value::Object(Map::new()));

        let Some(first_undone) = target_version.checked_add(1) else {
            return Ok(snapshot);
        };
        let newer = self
            .find_since(collection_name, collection_id, first_undone)
            .await?;

        for record in &newer {
            snapshot = delta::unpatch(&snapshot, &record.diff)?;
        }

        tracing::debug!(
            collection = %collection_name,
            id = %collection_id,
            target_version,
            undone = newer.len(),
            "version reconstructed"
        );
        Ok(snapshot)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::recorder::MutationContext;
    use crate::test_support::helpers::{FailingLoader, MemoryLoader, test_service};
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[tokio::test]
    async fn walks_back_through_updates() {
        let svc = test_service().await;
        let states = [json!({"x": 1}), json!({"x": 2}), json!({"x": 3})];
        svc.record_save("things", "a", None, &states[0], MutationContext::new())
            .await
            .unwrap();
        for pair in states.windows(2) {
            svc.record_save("things", "a", Some(&pair[0]), &pair[1], MutationContext::new())
                .await
                .unwrap();
        }
        let loader = MemoryLoader::with("things", "a", states[2].clone());

        assert_eq!(svc.get_version(&loader, "things", "a", 2).await.unwrap(), json!({"x": 3}));
        assert_eq!(svc.get_version(&loader, "things", "a", 1).await.unwrap(), json!({"x": 2}));
        assert_eq!(svc.get_version(&loader, "things", "a", 0).await.unwrap(), json!({"x": 1}));
    }

    #[tokio::test]
    async fn target_past_latest_is_current() {
        let svc = test_service().await;
        svc.record_save("things", "a", None, &json!({"x": 1}), MutationContext::new())
            .await
            .unwrap();
        let loader = MemoryLoader::with("things", "a", json!({"x": 1}));

        assert_eq!(svc.get_version(&loader, "things", "a", 5).await.unwrap(), json!({"x": 1}));
        assert_eq!(
            svc.get_version(&loader, "things", "a", u64::MAX).await.unwrap(),
            json!({"x": 1})
        );
    }

    #[tokio::test]
    async fn removed_document_is_rebuilt_from_empty() {
        let svc = test_service().await;
        let doc = json!({"name": "widget", "tags": ["a", "b"]});
        svc.record_save("things", "a", None, &doc, MutationContext::new())
            .await
            .unwrap();
        svc.record_remove("things", "a", &doc, MutationContext::new())
            .await
            .unwrap();

        let loader = MemoryLoader::default();
        assert_eq!(svc.get_version(&loader, "things", "a", 1).await.unwrap(), json!({}));
        assert_eq!(svc.get_version(&loader, "things", "a", 0).await.unwrap(), doc);
    }

    #[tokio::test]
    async fn loader_failure_propagates() {
        let svc = test_service().await;
        let result = svc.get_version(&FailingLoader, "things", "a", 0).await;
        assert!(matches!(result, Err(DatabaseError::Loader(_))));
    }

    #[tokio::test]
    async fn mismatched_snapshot_is_a_delta_error() {
        let svc = test_service().await;
        svc.record_save("things", "a", None, &json!({"x": 1}), MutationContext::new())
            .await
            .unwrap();
        svc.record_save(
            "things",
            "a",
            Some(&json!({"x": 1})),
            &json!({"x": 2}),
            MutationContext::new(),
        )
        .await
        .unwrap();
        // Version 1 holds an object delta; the loader hands back an array.
        let loader = MemoryLoader::with("things", "a", json!([1, 2]));
        let result = svc.get_version(&loader, "things", "a", 0).await;
        assert!(matches!(result, Err(DatabaseError::Delta(_))), "{result:?}");
    }
}
