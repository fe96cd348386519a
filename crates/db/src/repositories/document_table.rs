//! Kind-agnostic access to the permission columns of the three document
//! tables.
//!
//! The edit-request workflow and the guarded update/delete paths only need a
//! document's owner, creation time and grant state. [`DocumentTable`] reads
//! and writes those columns for any [`DocumentKind`], so the logic above it
//! is written once instead of per kind.

use docket_core::document::{DocumentHandle, DocumentKind, DocumentRef};
use docket_core::permission::DocumentAccess;
use docket_core::types::{DbId, Timestamp};
use sqlx::{FromRow, PgConnection, PgPool};

use crate::models::document::Deleted;

#[derive(Debug, FromRow)]
struct HandleRow {
    owner_id: DbId,
    created_at: Timestamp,
    allow_editing: bool,
    editable_until: Option<Timestamp>,
    label: String,
}

/// Table metadata for one document kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DocumentTable {
    pub kind: DocumentKind,
    pub table: &'static str,
    /// Column rendered in notification summaries and matched by `?q=`.
    pub label_column: &'static str,
    /// Business date used by `?from=`/`?to=` filters.
    pub date_column: &'static str,
}

/// The table backing `kind`.
pub fn table_for(kind: DocumentKind) -> DocumentTable {
    match kind {
        DocumentKind::Invoice => DocumentTable {
            kind,
            table: "invoices",
            label_column: "company_name",
            date_column: "invoice_date",
        },
        DocumentKind::PurchaseOrder => DocumentTable {
            kind,
            table: "purchase_orders",
            label_column: "po_number",
            date_column: "order_date",
        },
        DocumentKind::StockRegister => DocumentTable {
            kind,
            table: "stock_register_entries",
            label_column: "article_name",
            date_column: "entry_date",
        },
    }
}

impl DocumentTable {
    fn handle_query(&self, lock: bool) -> String {
        format!(
            "SELECT owner_id, created_at, allow_editing, editable_until, {label} AS label
             FROM {table} WHERE id = $1{lock}",
            label = self.label_column,
            table = self.table,
            lock = if lock { " FOR UPDATE" } else { "" },
        )
    }

    fn into_handle(&self, id: &str, row: HandleRow) -> DocumentHandle {
        DocumentHandle {
            reference: DocumentRef::new(self.kind, id),
            access: DocumentAccess {
                owner_id: row.owner_id,
                created_at: row.created_at,
                allow_editing: row.allow_editing,
                editable_until: row.editable_until,
            },
            label: row.label,
        }
    }

    /// Read a document's permission state.
    pub async fn find_handle(
        &self,
        pool: &PgPool,
        id: &str,
    ) -> Result<Option<DocumentHandle>, sqlx::Error> {
        let row = sqlx::query_as::<_, HandleRow>(&self.handle_query(false))
            .bind(id)
            .fetch_optional(pool)
            .await?;
        Ok(row.map(|row| self.into_handle(id, row)))
    }

    /// Read a document's permission state and hold a row lock until the
    /// surrounding transaction ends.
    pub async fn lock_handle(
        &self,
        conn: &mut PgConnection,
        id: &str,
    ) -> Result<Option<DocumentHandle>, sqlx::Error> {
        let row = sqlx::query_as::<_, HandleRow>(&self.handle_query(true))
            .bind(id)
            .fetch_optional(conn)
            .await?;
        Ok(row.map(|row| self.into_handle(id, row)))
    }

    /// Set `allow_editing = true` and `editable_until = until`.
    ///
    /// Returns `false` if the document no longer exists.
    pub async fn apply_grant(
        &self,
        conn: &mut PgConnection,
        id: &str,
        until: Timestamp,
    ) -> Result<bool, sqlx::Error> {
        let query = format!(
            "UPDATE {} SET allow_editing = true, editable_until = $2 WHERE id = $1",
            self.table
        );
        let result = sqlx::query(&query)
            .bind(id)
            .bind(until)
            .execute(conn)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Delete a document together with its edit requests in one transaction.
    /// Line items go with it through `ON DELETE CASCADE`.
    ///
    /// The document row goes first. That waits out any transaction holding
    /// the row lock (a request being filed), so the request cleanup that
    /// follows sees what it committed. Returns `None` if no row matched.
    pub async fn delete(&self, pool: &PgPool, id: &str) -> Result<Option<Deleted>, sqlx::Error> {
        let mut tx = pool.begin().await?;

        let query = format!(
            "DELETE FROM {} WHERE id = $1 RETURNING attachment_path",
            self.table
        );
        let Some(attachment) = sqlx::query_scalar::<_, Option<String>>(&query)
            .bind(id)
            .fetch_optional(&mut *tx)
            .await?
        else {
            return Ok(None);
        };

        sqlx::query("DELETE FROM edit_requests WHERE document_type = $1 AND document_id = $2")
            .bind(self.kind.as_str())
            .bind(id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(Some(Deleted { attachment }))
    }

    /// Count documents, optionally scoped to one owner.
    pub async fn count(&self, pool: &PgPool, owner_id: Option<DbId>) -> Result<i64, sqlx::Error> {
        let query = format!(
            "SELECT COUNT(*) FROM {} WHERE ($1::BIGINT IS NULL OR owner_id = $1)",
            self.table
        );
        sqlx::query_scalar::<_, i64>(&query)
            .bind(owner_id)
            .fetch_one(pool)
            .await
    }

    /// Shared `WHERE` clause for list queries.
    ///
    /// Binds: `$1` ILIKE pattern, `$2` owner id, `$3` from date, `$4` to date.
    pub(crate) fn list_predicate(&self) -> String {
        format!(
            "($1::TEXT IS NULL OR {label} ILIKE $1)
               AND ($2::BIGINT IS NULL OR owner_id = $2)
               AND ($3::DATE IS NULL OR {date} >= $3)
               AND ($4::DATE IS NULL OR {date} <= $4)",
            label = self.label_column,
            date = self.date_column,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_kind_has_a_table() {
        for kind in DocumentKind::ALL {
            assert_eq!(table_for(kind).kind, kind);
        }
        assert_eq!(table_for(DocumentKind::StockRegister).table, "stock_register_entries");
    }

    #[test]
    fn lock_query_appends_for_update() {
        let t = table_for(DocumentKind::PurchaseOrder);
        assert!(t.handle_query(true).ends_with("FOR UPDATE"));
        assert!(!t.handle_query(false).contains("FOR UPDATE"));
        assert!(t.handle_query(false).contains("po_number AS label"));
    }
}
