//! Repository for the `invoices` and `invoice_products` tables.

use docket_core::document::DocumentKind;
use docket_core::search::like_pattern;
use docket_core::types::DbId;
use sqlx::{PgConnection, PgPool};

use crate::models::document::{superseded_attachment, DocumentFilter, Page, Updated};
use crate::models::invoice::{CreateInvoice, Invoice, InvoiceDetail, UpdateInvoice};
use crate::models::line_item::LineItem;
use crate::repositories::document_table::table_for;

const COLUMNS: &str = "id, owner_id, company_name, invoice_date, total_amount, attachment_path, \
    allow_editing, editable_until, created_at, updated_at";

const PRODUCT_COLUMNS: &str = "id, invoice_id AS document_id, name, quantity, unit_price, created_at";

/// Provides CRUD operations for invoices.
pub struct InvoiceRepo;

impl InvoiceRepo {
    /// Insert an invoice and its products in one transaction.
    ///
    /// A duplicate id fails with a unique violation on `pk_invoices`.
    pub async fn create(
        pool: &PgPool,
        owner_id: DbId,
        input: &CreateInvoice,
    ) -> Result<InvoiceDetail, sqlx::Error> {
        let mut tx = pool.begin().await?;

        let query = format!(
            "INSERT INTO invoices
                (id, owner_id, company_name, invoice_date, total_amount, attachment_path)
             VALUES ($1, $2, $3, $4, $5, $6)
             RETURNING {COLUMNS}"
        );
        let invoice = sqlx::query_as::<_, Invoice>(&query)
            .bind(&input.id)
            .bind(owner_id)
            .bind(&input.company_name)
            .bind(input.invoice_date)
            .bind(input.total_amount)
            .bind(&input.attachment_path)
            .fetch_one(&mut *tx)
            .await?;

        let insert_product = format!(
            "INSERT INTO invoice_products (invoice_id, name, quantity, unit_price)
             VALUES ($1, $2, $3, $4)
             RETURNING {PRODUCT_COLUMNS}"
        );
        let mut products = Vec::with_capacity(input.products.len());
        for product in &input.products {
            let row = sqlx::query_as::<_, LineItem>(&insert_product)
                .bind(&invoice.id)
                .bind(&product.name)
                .bind(product.quantity)
                .bind(product.unit_price)
                .fetch_one(&mut *tx)
                .await?;
            products.push(row);
        }

        tx.commit().await?;
        Ok(InvoiceDetail { invoice, products })
    }

    /// Find an invoice by its external id.
    pub async fn find_by_id(pool: &PgPool, id: &str) -> Result<Option<Invoice>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM invoices WHERE id = $1");
        sqlx::query_as::<_, Invoice>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// Find an invoice with its products.
    pub async fn find_detail(pool: &PgPool, id: &str) -> Result<Option<InvoiceDetail>, sqlx::Error> {
        let Some(invoice) = Self::find_by_id(pool, id).await? else {
            return Ok(None);
        };
        let products = Self::list_products(pool, id).await?;
        Ok(Some(InvoiceDetail { invoice, products }))
    }

    /// List products of an invoice in insertion order.
    pub async fn list_products(pool: &PgPool, invoice_id: &str) -> Result<Vec<LineItem>, sqlx::Error> {
        let query = format!(
            "SELECT {PRODUCT_COLUMNS} FROM invoice_products
             WHERE invoice_id = $1
             ORDER BY id ASC"
        );
        sqlx::query_as::<_, LineItem>(&query)
            .bind(invoice_id)
            .fetch_all(pool)
            .await
    }

    /// List invoices matching `filter`, newest first, with the unpaginated total.
    pub async fn list(pool: &PgPool, filter: &DocumentFilter) -> Result<Page<Invoice>, sqlx::Error> {
        let predicate = table_for(DocumentKind::Invoice).list_predicate();
        let pattern = filter.q.as_deref().map(like_pattern);

        let query = format!(
            "SELECT {COLUMNS} FROM invoices
             WHERE {predicate}
             ORDER BY created_at DESC, id ASC
             LIMIT $5 OFFSET $6"
        );
        let items = sqlx::query_as::<_, Invoice>(&query)
            .bind(&pattern)
            .bind(filter.owner_id)
            .bind(filter.from)
            .bind(filter.to)
            .bind(filter.limit)
            .bind(filter.offset)
            .fetch_all(pool)
            .await?;

        let count = format!("SELECT COUNT(*) FROM invoices WHERE {predicate}");
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

    /// Overwrite business fields. Only non-`None` fields are applied.
    ///
    /// Runs on the caller's transaction, which must already hold the row lock
    /// taken by the permission check. Returns `None` if the row is gone.
    pub async fn update(
        conn: &mut PgConnection,
        id: &str,
        input: &UpdateInvoice,
    ) -> Result<Option<Updated<Invoice>>, sqlx::Error> {
        let previous = sqlx::query_scalar::<_, Option<String>>(
            "SELECT attachment_path FROM invoices WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&mut *conn)
        .await?;
        let Some(previous) = previous else {
            return Ok(None);
        };

        let query = format!(
            "UPDATE invoices SET
                company_name = COALESCE($2, company_name),
                invoice_date = COALESCE($3, invoice_date),
                total_amount = COALESCE($4, total_amount),
                attachment_path = COALESCE($5, attachment_path)
             WHERE id = $1
             RETURNING {COLUMNS}"
        );
        let invoice = sqlx::query_as::<_, Invoice>(&query)
            .bind(id)
            .bind(&input.company_name)
            .bind(input.invoice_date)
            .bind(input.total_amount)
            .bind(&input.attachment_path)
            .fetch_optional(&mut *conn)
            .await?;

        Ok(invoice.map(|document| Updated {
            document,
            superseded_attachment: superseded_attachment(previous, input.attachment_path.as_deref()),
        }))
    }
}
