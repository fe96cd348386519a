//! Line items shared by invoices (products) and purchase orders (items).

use docket_core::types::{DbId, Timestamp};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// A row from `invoice_products` or `purchase_order_items`, with the parent
/// key column aliased to `document_id`.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct LineItem {
    pub id: DbId,
    pub document_id: String,
    pub name: String,
    pub quantity: i32,
    pub unit_price: f64,
    pub created_at: Timestamp,
}

/// DTO for a line item supplied with a new document.
#[derive(Debug, Clone, Deserialize)]
pub struct CreateLineItem {
    pub name: String,
    #[serde(default = "default_quantity")]
    pub quantity: i32,
    #[serde(default)]
    pub unit_price: f64,
}

fn default_quantity() -> i32 {
    1
}
