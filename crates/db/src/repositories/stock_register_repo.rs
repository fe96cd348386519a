//! Repository for the `stock_register_entries` table.

use docket_core::document::DocumentKind;
use docket_core::search::like_pattern;
use docket_core::types::DbId;
use sqlx::{PgConnection, PgPool};

use crate::models::document::{superseded_attachment, DocumentFilter, Page, Updated};
use crate::models::stock_register::{
    CreateStockRegisterEntry, StockRegisterEntry, UpdateStockRegisterEntry,
};
use crate::repositories::document_table::table_for;

const COLUMNS: &str = "id, owner_id, article_name, quantity, location, entry_date, \
    attachment_path, allow_editing, editable_until, created_at, updated_at";

pub struct StockRegisterRepo;

impl StockRegisterRepo {
    pub async fn create(
        pool: &PgPool,
        owner_id: DbId,
        input: &CreateStockRegisterEntry,
    ) -> Result<StockRegisterEntry, sqlx::Error> {
        let query = format!(
            "INSERT INTO stock_register_entries
                (id, owner_id, article_name, quantity, location, entry_date, attachment_path)
             VALUES ($1, $2, $3, $4, $5, $6, $7)
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, StockRegisterEntry>(&query)
            .bind(&input.id)
            .bind(owner_id)
            .bind(&input.article_name)
            .bind(input.quantity)
            .bind(&input.location)
            .bind(input.entry_date)
            .bind(&input.attachment_path)
            .fetch_one(pool)
            .await
    }

    pub async fn find_by_id(
        pool: &PgPool,
        id: &str,
    ) -> Result<Option<StockRegisterEntry>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM stock_register_entries WHERE id = $1");
        sqlx::query_as::<_, StockRegisterEntry>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    pub async fn list(
        pool: &PgPool,
        filter: &DocumentFilter,
    ) -> Result<Page<StockRegisterEntry>, sqlx::Error> {
        let predicate = table_for(DocumentKind::StockRegister).list_predicate();
        let pattern = filter.q.as_deref().map(like_pattern);

        let query = format!(
            "SELECT {COLUMNS} FROM stock_register_entries
             WHERE {predicate}
             ORDER BY created_at DESC, id ASC
             LIMIT $5 OFFSET $6"
        );
        let items = sqlx::query_as::<_, StockRegisterEntry>(&query)
            .bind(&pattern)
            .bind(filter.owner_id)
            .bind(filter.from)
            .bind(filter.to)
            .bind(filter.limit)
            .bind(filter.offset)
            .fetch_all(pool)
            .await?;

        let count = format!("SELECT COUNT(*) FROM stock_register_entries WHERE {predicate}");
        let total = sqlx::query_scalar::<_, i64>(&count)
            .bind(&pattern)
            .bind(filter.owner_id)
            .bind(filter.from)
            .bind(filter.to)
            .fetch_one(pool)
            .await?;

        Ok(Page {
            items,
            total,
            limit: filter.limit,
            offset: filter.offset,
        })
    }

    pub async fn update(
        conn: &mut PgConnection,
        id: &str,
        input: &UpdateStockRegisterEntry,
    ) -> Result<Option<Updated<StockRegisterEntry>>, sqlx::Error> {
        let previous = sqlx::query_scalar::<_, Option<String>>(
            "SELECT attachment_path FROM stock_register_entries WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&mut *conn)
        .await?;
        let Some(previous) = previous else {
            return Ok(None);
        };

        let query = format!(
            "UPDATE stock_register_entries SET
                article_name = COALESCE($2, article_name),
                quantity = COALESCE($3, quantity),
                location = COALESCE($4, location),
                entry_date = COALESCE($5, entry_date),
                attachment_path = COALESCE($6, attachment_path)
             WHERE id = $1
             RETURNING {COLUMNS}"
        );
        let entry = sqlx::query_as::<_, StockRegisterEntry>(&query)
            .bind(id)
            .bind(&input.article_name)
            .bind(input.quantity)
            .bind(&input.location)
            .bind(input.entry_date)
            .bind(&input.attachment_path)
            .fetch_optional(&mut *conn)
            .await?;

        Ok(entry.map(|document| Updated {
            document,
            superseded_attachment: superseded_attachment(previous, input.attachment_path.as_deref()),
        }))
    }
}
