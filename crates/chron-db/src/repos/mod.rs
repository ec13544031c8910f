//! Repository modules for the audit log.
//!
//! Each module adds methods to `AuditService` via `impl AuditService` blocks.

pub mod audit;
