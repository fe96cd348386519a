//! Repository for the `purchase_orders` and `purchase_order_items` tables.

use docket_core::document::DocumentKind;
use docket_core::search::like_pattern;
use docket_core::types::DbId;
use sqlx::{PgConnection, PgPool};

use crate::models::document::{superseded_attachment, DocumentFilter, Page, Updated};
use crate::models::line_item::LineItem;
use crate::models::purchase_order::{
    CreatePurchaseOrder, PurchaseOrder, PurchaseOrderDetail, UpdatePurchaseOrder,
};
use crate::repositories::document_table::table_for;

const COLUMNS: &str = "id, owner_id, po_number, supplier_name, order_date, total_amount, \
    attachment_path, allow_editing, editable_until, created_at, updated_at";

const ITEM_COLUMNS: &str =
    "id, purchase_order_id AS document_id, name, quantity, unit_price, created_at";

/// Provides CRUD operations for purchase orders.
pub struct PurchaseOrderRepo;

impl PurchaseOrderRepo {
    /// Insert a purchase order and its items in one transaction.
    pub async fn create(
        pool: &PgPool,
        owner_id: DbId,
        input: &CreatePurchaseOrder,
    ) -> Result<PurchaseOrderDetail, sqlx::Error> {
        let mut tx = pool.begin().await?;

        let query = format!(
            "INSERT INTO purchase_orders
                (id, owner_id, po_number, supplier_name, order_date, total_amount, attachment_path)
             VALUES ($1, $2, $3, $4, $5, $6, $7)
             RETURNING {COLUMNS}"
        );
        let purchase_order = sqlx::query_as::<_, PurchaseOrder>(&query)
            .bind(&input.id)
            .bind(owner_id)
            .bind(&input.po_number)
            .bind(&input.supplier_name)
            .bind(input.order_date)
            .bind(input.total_amount)
            .bind(&input.attachment_path)
            .fetch_one(&mut *tx)
            .await?;

        let insert_item = format!(
            "INSERT INTO purchase_order_items (purchase_order_id, name, quantity, unit_price)
             VALUES ($1, $2, $3, $4)
             RETURNING {ITEM_COLUMNS}"
        );
        let mut items = Vec::with_capacity(input.items.len());
        for item in &input.items {
            let row = sqlx::query_as::<_, LineItem>(&insert_item)
                .bind(&purchase_order.id)
                .bind(&item.name)
                .bind(item.quantity)
                .bind(item.unit_price)
                .fetch_one(&mut *tx)
                .await?;
            items.push(row);
        }

        tx.commit().await?;
        Ok(PurchaseOrderDetail {
            purchase_order,
            items,
        })
    }

    pub async fn find_by_id(pool: &PgPool, id: &str) -> Result<Option<PurchaseOrder>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM purchase_orders WHERE id = $1");
        sqlx::query_as::<_, PurchaseOrder>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// Find a purchase order with its items.
    pub async fn find_detail(
        pool: &PgPool,
        id: &str,
    ) -> Result<Option<PurchaseOrderDetail>, sqlx::Error> {
        let Some(purchase_order) = Self::find_by_id(pool, id).await? else {
            return Ok(None);
        };
        let items = Self::list_items(pool, id).await?;
        Ok(Some(PurchaseOrderDetail {
            purchase_order,
            items,
        }))
    }

    pub async fn list_items(
        pool: &PgPool,
        purchase_order_id: &str,
    ) -> Result<Vec<LineItem>, sqlx::Error> {
        let query = format!(
            "SELECT {ITEM_COLUMNS} FROM purchase_order_items
             WHERE purchase_order_id = $1
             ORDER BY id ASC"
        );
        sqlx::query_as::<_, LineItem>(&query)
            .bind(purchase_order_id)
            .fetch_all(pool)
            .await
    }

    /// List purchase orders matching `filter`, newest first.
    pub async fn list(
        pool: &PgPool,
        filter: &DocumentFilter,
    ) -> Result<Page<PurchaseOrder>, sqlx::Error> {
        let predicate = table_for(DocumentKind::PurchaseOrder).list_predicate();
        let pattern = filter.q.as_deref().map(like_pattern);

        let query = format!(
            "SELECT {COLUMNS} FROM purchase_orders
             WHERE {predicate}
             ORDER BY created_at DESC, id ASC
             LIMIT $5 OFFSET $6"
        );
        let items = sqlx::query_as::<_, PurchaseOrder>(&query)
            .bind(&pattern)
            .bind(filter.owner_id)
            .bind(filter.from)
            .bind(filter.to)
            .bind(filter.limit)
            .bind(filter.offset)
            .fetch_all(pool)
            .await?;

        let count = format!("SELECT COUNT(*) FROM purchase_orders WHERE {predicate}");
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

    /// Overwrite business fields on the caller's (locked) transaction.
    pub async fn update(
        conn: &mut PgConnection,
        id: &str,
        input: &UpdatePurchaseOrder,
    ) -> Result<Option<Updated<PurchaseOrder>>, sqlx::Error> {
        let previous = sqlx::query_scalar::<_, Option<String>>(
            "SELECT attachment_path FROM purchase_orders WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&mut *conn)
        .await?;
        let Some(previous) = previous else {
            return Ok(None);
        };

        let query = format!(
            "UPDATE purchase_orders SET
                po_number = COALESCE($2, po_number),
                supplier_name = COALESCE($3, supplier_name),
                order_date = COALESCE($4, order_date),
                total_amount = COALESCE($5, total_amount),
                attachment_path = COALESCE($6, attachment_path)
             WHERE id = $1
             RETURNING {COLUMNS}"
        );
        let purchase_order = sqlx::query_as::<_, PurchaseOrder>(&query)
            .bind(id)
            .bind(&input.po_number)
            .bind(&input.supplier_name)
            .bind(input.order_date)
            .bind(input.total_amount)
            .bind(&input.attachment_path)
            .fetch_optional(&mut *conn)
            .await?;

        Ok(purchase_order.map(|document| Updated {
            document,
            superseded_attachment: superseded_attachment(previous, input.attachment_path.as_deref()),
        }))
    }
}
