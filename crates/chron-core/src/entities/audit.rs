use chrono::{DateTime, Utc};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::enums::AuditMethod;

/// One immutable audit record: the filtered delta of a single mutation.
///
/// `version` starts at 0 for the first record of a document and grows by one
/// per record of that `(collection_name, collection_id)` pair.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
pub struct AuditRecord {
    pub id: String,
    pub collection_name: String,
    pub collection_id: String,
    pub method: AuditMethod,
    pub diff: serde_json::Value,
    pub version: u64,
    pub actor: Option<serde_json::Value>,
    pub reason: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// An audit record before the store assigns its id, version, and timestamps.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
pub struct NewAuditRecord {
    pub collection_name: String,
    pub collection_id: String,
    pub method: AuditMethod,
    pub diff: serde_json::Value,
    pub actor: Option<serde_json::Value>,
    pub reason: Option<String>,
}
