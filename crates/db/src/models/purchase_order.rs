//! Purchase order entity model and DTOs.

use chrono::NaiveDate;
use docket_core::permission::DocumentAccess;
use docket_core::types::{DbId, Timestamp};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use super::line_item::{CreateLineItem, LineItem};

/// A row from the `purchase_orders` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct PurchaseOrder {
    pub id: String,
    pub owner_id: DbId,
    pub po_number: String,
    pub supplier_name: String,
    pub order_date: Option<NaiveDate>,
    pub total_amount: f64,
    pub attachment_path: Option<String>,
    pub allow_editing: bool,
    pub editable_until: Option<Timestamp>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl PurchaseOrder {
    pub fn access(&self) -> DocumentAccess {
        DocumentAccess {
            owner_id: self.owner_id,
            created_at: self.created_at,
            allow_editing: self.allow_editing,
            editable_until: self.editable_until,
        }
    }
}

/// A purchase order together with its items.
#[derive(Debug, Clone, Serialize)]
pub struct PurchaseOrderDetail {
    #[serde(flatten)]
    pub purchase_order: PurchaseOrder,
    pub items: Vec<LineItem>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CreatePurchaseOrder {
    pub id: String,
    pub po_number: String,
    pub supplier_name: String,
    pub order_date: Option<NaiveDate>,
    #[serde(default)]
    pub total_amount: f64,
    pub attachment_path: Option<String>,
    #[serde(default)]
    pub items: Vec<CreateLineItem>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdatePurchaseOrder {
    pub po_number: Option<String>,
    pub supplier_name: Option<String>,
    pub order_date: Option<NaiveDate>,
    pub total_amount: Option<f64>,
    pub attachment_path: Option<String>,
}
