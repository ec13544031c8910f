//! Persisted and derived record types.
//!
//! All structs derive `Serialize`, `Deserialize`, and `JsonSchema` for JSON
//! roundtrip and schema validation.

mod audit;
mod history;

pub use audit::{AuditRecord, NewAuditRecord};
pub use history::HistoryEntry;
