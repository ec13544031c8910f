//! Audit log repository.
//!
//! Append-only records keyed by (collection, document, version). Versions are
//! assigned read-then-increment: the latest version is read and the next one
//! inserted on the same connection or transaction. Two writers racing on the
//! same document can read the same latest version; the table's unique
//! constraint turns the loser into `DatabaseError::DuplicateVersion`.
//!
//! Record ids are short and random, so an id can clash with an older record.
//! Such a clash is not a version race: the insert is retried with a fresh id.

use chrono::Utc;
use libsql::{Connection, Transaction};

use chron_core::entities::{AuditRecord, NewAuditRecord};
use chron_core::enums::AuditMethod;

use crate::error::DatabaseError;
use crate::generate_id_on;
use crate::helpers::{
    get_opt_string, parse_datetime, parse_enum, parse_json, parse_optional_json,
    version_from_sql, version_to_sql,
};
use crate::service::AuditService;
use crate::PREFIX_AUDIT;

const SELECT_COLS: &str = "id, collection_name, collection_id, method, diff, version, actor, reason, created_at, updated_at";

/// Traversal order by version.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SortOrder {
    #[default]
    Ascending,
    Descending,
}

impl SortOrder {
    const fn as_sql(self) -> &'static str {
        match self {
            Self::Ascending => "ASC",
            Self::Descending => "DESC",
        }
    }
}

/// Options for querying one document's records.
///
/// Version bounds are inclusive. Without a limit every matching record is
/// returned.
#[derive(Debug, Clone, Default)]
pub struct DiffQuery {
    pub order: SortOrder,
    pub from_version: Option<u64>,
    pub to_version: Option<u64>,
    pub method: Option<AuditMethod>,
    pub limit: Option<u32>,
    pub offset: Option<u32>,
}

fn row_to_record(row: &libsql::Row) -> Result<AuditRecord, DatabaseError> {
    Ok(AuditRecord {
        id: row.get(0)?,
        collection_name: row.get(1)?,
        collection_id: row.get(2)?,
        method: parse_enum(&row.get::<String>(3)?)?,
        diff: parse_json(&row.get::<String>(4)?)?,
        version: version_from_sql(row.get::<i64>(5)?)?,
        actor: parse_optional_json(get_opt_string(row, 6)?.as_deref())?,
        reason: get_opt_string(row, 7)?,
        created_at: parse_datetime(&row.get::<String>(8)?)?,
        updated_at: parse_datetime(&row.get::<String>(9)?)?,
    })
}

/// Attempts at drawing an unused record id before giving up.
const ID_ATTEMPTS: u32 = 3;

/// Which unique constraint an insert ran into.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Collision {
    Version,
    Id,
}

fn collision(e: &libsql::Error) -> Option<Collision> {
    let message = e.to_string();
    if message.contains(
        "UNIQUE constraint failed: audit_log.collection_name, audit_log.collection_id, audit_log.version",
    ) {
        Some(Collision::Version)
    } else if message.contains("UNIQUE constraint failed: audit_log.id") {
        Some(Collision::Id)
    } else {
        None
    }
}

async fn latest_version_on(
    conn: &Connection,
    collection_name: &str,
    collection_id: &str,
) -> Result<Option<u64>, DatabaseError> {
    let mut rows = conn
        .query(
            "SELECT version FROM audit_log
             WHERE collection_name = ?1 AND collection_id = ?2
             ORDER BY version DESC LIMIT 1",
            [collection_name, collection_id],
        )
        .await?;
    match rows.next().await? {
        Some(row) => Ok(Some(version_from_sql(row.get::<i64>(0)?)?)),
        None => Ok(None),
    }
}

impl AuditService {
    /// The connection a call runs on: the caller's transaction if one was
    /// supplied, otherwise the service's own connection.
    pub(crate) fn conn_for<'a>(&'a self, tx: Option<&'a Transaction>) -> &'a Connection {
        tx.map_or_else(|| self.db().conn(), |t| &**t)
    }

    /// Persist one record, assigning the next version for its document.
    ///
    /// The version lookup and the insert both run on `tx` when given.
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError::DuplicateVersion` if a concurrent writer took
    /// the version first, or `DatabaseError` if the store fails (including
    /// when every drawn record id is already taken).
    pub async fn append_record(
        &self,
        record: NewAuditRecord,
        tx: Option<&Transaction>,
    ) -> Result<AuditRecord, DatabaseError> {
        let conn = self.conn_for(tx);
        let version = latest_version_on(conn, &record.collection_name, &record.collection_id)
            .await?
            .map_or(0, |v| v + 1);
        let now = Utc::now();
        let diff = record.diff.to_string();
        let actor = record.actor.as_ref().map(ToString::to_string);

        let mut attempt = 1;
        let id = loop {
            let id = generate_id_on(conn, PREFIX_AUDIT).await?;
            let result = conn
                .execute(
                    &format!(
                        "INSERT INTO audit_log ({SELECT_COLS})
                         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)"
                    ),
                    libsql::params![
                        id.as_str(),
                        record.collection_name.as_str(),
                        record.collection_id.as_str(),
                        record.method.as_str(),
                        diff.as_str(),
                        version_to_sql(version)?,
                        actor.as_deref(),
                        record.reason.as_deref(),
                        now.to_rfc3339(),
                        now.to_rfc3339()
                    ],
                )
                .await;

            let Err(e) = result else {
                break id;
            };
            match collision(&e) {
                Some(Collision::Version) => {
                    tracing::warn!(
                        collection = %record.collection_name,
                        id = %record.collection_id,
                        version,
                        "audit version already taken by a concurrent writer"
                    );
                    return Err(DatabaseError::DuplicateVersion {
                        collection_name: record.collection_name,
                        collection_id: record.collection_id,
                        version,
                    });
                }
                Some(Collision::Id) if attempt < ID_ATTEMPTS => {
                    tracing::debug!(record_id = %id, attempt, "audit record id taken, drawing another");
                    attempt += 1;
                }
                _ => return Err(e.into()),
            }
        };

        tracing::debug!(
            collection = %record.collection_name,
            id = %record.collection_id,
            version,
            method = %record.method,
            "audit record appended"
        );

        Ok(AuditRecord {
            id,
            collection_name: record.collection_name,
            collection_id: record.collection_id,
            method: record.method,
            diff: record.diff,
            version,
            actor: record.actor,
            reason: record.reason,
            created_at: now,
            updated_at: now,
        })
    }

    /// Highest recorded version for a document, `None` if it has no records.
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError` if the query fails.
    pub async fn latest_version(
        &self,
        collection_name: &str,
        collection_id: &str,
    ) -> Result<Option<u64>, DatabaseError> {
        latest_version_on(self.db().conn(), collection_name, collection_id).await
    }

    /// Records for one document, filtered and ordered per `query`.
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError` if the query fails or a row cannot be parsed.
    pub async fn find_by_document(
        &self,
        collection_name: &str,
        collection_id: &str,
        query: &DiffQuery,
    ) -> Result<Vec<AuditRecord>, DatabaseError> {
        let mut params: Vec<libsql::Value> = vec![
            libsql::Value::Text(collection_name.to_string()),
            libsql::Value::Text(collection_id.to_string()),
        ];
        let mut conditions = vec![
            "collection_name = ?1".to_string(),
            "collection_id = ?2".to_string(),
        ];

        if let Some(from) = query.from_version {
            params.push(libsql::Value::Integer(version_to_sql(from)?));
            conditions.push(format!("version >= ?{}", params.len()));
        }
        if let Some(to) = query.to_version {
            params.push(libsql::Value::Integer(version_to_sql(to)?));
            conditions.push(format!("version <= ?{}", params.len()));
        }
        if let Some(method) = query.method {
            params.push(libsql::Value::Text(method.as_str().to_string()));
            conditions.push(format!("method = ?{}", params.len()));
        }

        // SQLite only accepts OFFSET after a LIMIT; -1 means unbounded.
        let paging = match (query.limit, query.offset) {
            (None, None) => String::new(),
            (limit, offset) => format!(
                " LIMIT {} OFFSET {}",
                limit.map_or(-1, i64::from),
                offset.unwrap_or(0)
            ),
        };

        let sql = format!(
            "SELECT {SELECT_COLS} FROM audit_log
             WHERE {}
             ORDER BY version {}{paging}",
            conditions.join(" AND "),
            query.order.as_sql()
        );

        let mut rows = self
            .db()
            .conn()
            .query(&sql, libsql::params_from_iter(params))
            .await?;

        let mut records = Vec::new();
        while let Some(row) = rows.next().await? {
            records.push(row_to_record(&row)?);
        }
        Ok(records)
    }

    /// Records with `version >= min_version`, newest first.
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError` if the query fails.
    pub async fn find_since(
        &self,
        collection_name: &str,
        collection_id: &str,
        min_version: u64,
    ) -> Result<Vec<AuditRecord>, DatabaseError> {
        self.find_by_document(
            collection_name,
            collection_id,
            &DiffQuery {
                order: SortOrder::Descending,
                from_version: Some(min_version),
                ..DiffQuery::default()
            },
        )
        .await
    }
}
