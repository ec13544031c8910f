//! Turning mutations into audit records.
//!
//! The collaborator calls in once per mutation with the before/after
//! snapshots. Recording runs the gate, diffs, filters, and appends; a missing
//! required context field or an empty filtered delta skips the mutation
//! without an error.

use std::pin::pin;

use futures_util::{Stream, TryStreamExt};
use libsql::Transaction;
use serde_json::{Map, Value};

use chron_core::delta;
use chron_core::entities::{AuditRecord, NewAuditRecord};
use chron_core::enums::AuditMethod;
use chron_core::update::FieldUpdate;

use crate::error::DatabaseError;
use crate::service::AuditService;

/// Who made a mutation and why, plus the transaction it runs in.
///
/// Passing a transaction makes the version lookup and the insert part of the
/// caller's unit of work; committing or rolling back stays with the caller.
#[derive(Clone, Default)]
pub struct MutationContext<'tx> {
    pub actor: Option<Value>,
    pub reason: Option<String>,
    pub transaction: Option<&'tx Transaction>,
}

impl<'tx> MutationContext<'tx> {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_actor(mut self, actor: impl Into<Value>) -> Self {
        self.actor = Some(actor.into());
        self
    }

    #[must_use]
    pub fn with_reason(mut self, reason: impl Into<String>) -> Self {
        self.reason = Some(reason.into());
        self
    }

    #[must_use]
    pub fn with_transaction(mut self, tx: &'tx Transaction) -> Self {
        self.transaction = Some(tx);
        self
    }
}

/// One mutation as seen by the collaborator.
///
/// A missing snapshot stands for "no document": `before` is `None` on create
/// and `after` is `None` on remove.
pub struct MutationEvent<'tx> {
    pub method: AuditMethod,
    pub collection_name: String,
    pub collection_id: String,
    pub before: Option<Value>,
    pub after: Option<Value>,
    pub context: MutationContext<'tx>,
}

fn empty_document() -> Value {
    Value::Object(Map::new())
}

impl AuditService {
    /// Record a mutation.
    ///
    /// Returns `Ok(None)` when the mutation is skipped: a required context
    /// field is absent, the snapshots are equal, or nothing survives the
    /// field filter.
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError` if the append fails (including
    /// `DatabaseError::DuplicateVersion`).
    pub async fn record(
        &self,
        event: &MutationEvent<'_>,
    ) -> Result<Option<AuditRecord>, DatabaseError> {
        let ctx = &event.context;
        if let Some(field) = self
            .policy()
            .missing(ctx.actor.as_ref(), ctx.reason.as_deref())
        {
            tracing::debug!(
                collection = %event.collection_name,
                id = %event.collection_id,
                %field,
                "required context missing; not recording"
            );
            return Ok(None);
        }

        let empty = empty_document();
        let before = event.before.as_ref().unwrap_or(&empty);
        let after = event.after.as_ref().unwrap_or(&empty);

        let Some(diff) = delta::diff(before, after).and_then(|d| self.policy().filter.apply(d))
        else {
            tracing::debug!(
                collection = %event.collection_name,
                id = %event.collection_id,
                "no recordable changes"
            );
            return Ok(None);
        };

        let record = NewAuditRecord {
            collection_name: event.collection_name.clone(),
            collection_id: event.collection_id.clone(),
            method: event.method,
            diff,
            actor: ctx.actor.clone(),
            reason: ctx.reason.clone(),
        };
        self.append_record(record, ctx.transaction).await.map(Some)
    }

    /// Record a whole-document save. `before = None` marks a create.
    ///
    /// # Errors
    ///
    /// Same as [`Self::record`].
    pub async fn record_save(
        &self,
        collection_name: &str,
        collection_id: &str,
        before: Option<&Value>,
        after: &Value,
        context: MutationContext<'_>,
    ) -> Result<Option<AuditRecord>, DatabaseError> {
        let method = if before.is_some() {
            AuditMethod::Update
        } else {
            AuditMethod::Create
        };
        self.record(&MutationEvent {
            method,
            collection_name: collection_name.to_string(),
            collection_id: collection_id.to_string(),
            before: before.cloned(),
            after: Some(after.clone()),
            context,
        })
        .await
    }

    /// Record a partial update of one document.
    ///
    /// Only the top-level fields the update touches are diffed, so fields it
    /// leaves alone never appear in the record.
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError::Core` for an invalid update, otherwise the
    /// same as [`Self::record`].
    pub async fn record_update(
        &self,
        collection_name: &str,
        collection_id: &str,
        current: &Value,
        update: &FieldUpdate,
        context: MutationContext<'_>,
    ) -> Result<Option<AuditRecord>, DatabaseError> {
        self.record(&MutationEvent {
            method: AuditMethod::Update,
            collection_name: collection_name.to_string(),
            collection_id: collection_id.to_string(),
            before: Some(update.before(current)?),
            after: Some(update.after(current)?),
            context,
        })
        .await
    }

    /// Record the removal of a document.
    ///
    /// # Errors
    ///
    /// Same as [`Self::record`].
    pub async fn record_remove(
        &self,
        collection_name: &str,
        collection_id: &str,
        current: &Value,
        context: MutationContext<'_>,
    ) -> Result<Option<AuditRecord>, DatabaseError> {
        self.record(&MutationEvent {
            method: AuditMethod::Remove,
            collection_name: collection_name.to_string(),
            collection_id: collection_id.to_string(),
            before: Some(current.clone()),
            after: None,
            context,
        })
        .await
    }

    /// Record the same update applied to many documents.
    ///
    /// `documents` yields `(id, current snapshot)` pairs, typically straight
    /// from a database cursor. Each document is diffed and appended before the
    /// next one is pulled, so the stream is never buffered. Stops at the first
    /// failure. Returns the records written.
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError::Loader` if the stream yields an error, or the
    /// first `DatabaseError` from recording. Records appended before the
    /// failure stay written unless the caller rolls back its transaction.
    pub async fn record_bulk_update<S>(
        &self,
        collection_name: &str,
        update: &FieldUpdate,
        documents: S,
        context: MutationContext<'_>,
    ) -> Result<Vec<AuditRecord>, DatabaseError>
    where
        S: Stream<Item = anyhow::Result<(String, Value)>>,
    {
        update.validate()?;
        let mut documents = pin!(documents);
        let mut written = Vec::new();
        while let Some((collection_id, current)) =
            documents.try_next().await.map_err(DatabaseError::Loader)?
        {
            if let Some(record) = self
                .record_update(
                    collection_name,
                    &collection_id,
                    &current,
                    update,
                    context.clone(),
                )
                .await?
            {
                written.push(record);
            }
        }
        tracing::debug!(
            collection = %collection_name,
            written = written.len(),
            "bulk update recorded"
        );
        Ok(written)
    }
}
