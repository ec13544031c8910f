//! Shared test utilities for chron-db unit tests.

pub(crate) mod helpers {
    use std::collections::HashMap;

    use chron_core::policy::RecordingPolicy;
    use serde_json::Value;

    use crate::ChronDb;
    use crate::resolver::SnapshotLoader;
    use crate::service::AuditService;

    /// In-memory service that records everything.
    pub async fn test_service() -> AuditService {
        test_service_with(RecordingPolicy::default()).await
    }

    /// In-memory service with a specific policy.
    pub async fn test_service_with(policy: RecordingPolicy) -> AuditService {
        let db = ChronDb::open_local(":memory:").await.unwrap();
        AuditService::from_db(db, policy)
    }

    /// Current snapshots keyed by (collection, id).
    #[derive(Default)]
    pub struct MemoryLoader(HashMap<(String, String), Value>);

    impl MemoryLoader {
        pub fn with(collection: &str, id: &str, doc: Value) -> Self {
            let mut docs = HashMap::new();
            docs.insert((collection.to_string(), id.to_string()), doc);
            Self(docs)
        }
    }

    impl SnapshotLoader for MemoryLoader {
        async fn load_by_id(
            &self,
            collection_name: &str,
            collection_id: &str,
        ) -> anyhow::Result<Option<Value>> {
            Ok(self
                .0
                .get(&(collection_name.to_string(), collection_id.to_string()))
                .cloned())
        }
    }

    pub struct FailingLoader;

    impl SnapshotLoader for FailingLoader {
        async fn load_by_id(&self, _: &str, _: &str) -> anyhow::Result<Option<Value>> {
            anyhow::bail!("primary store unreachable")
        }
    }
}
