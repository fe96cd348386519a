//! Invoice entity model and DTOs.

use chrono::NaiveDate;
use docket_core::permission::DocumentAccess;
use docket_core::types::{DbId, Timestamp};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use super::line_item::{CreateLineItem, LineItem};

/// A row from the `invoices` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Invoice {
    pub id: String,
    pub owner_id: DbId,
    pub company_name: String,
    pub invoice_date: Option<NaiveDate>,
    pub total_amount: f64,
    pub attachment_path: Option<String>,
    pub allow_editing: bool,
    pub editable_until: Option<Timestamp>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl Invoice {
    pub fn access(&self) -> DocumentAccess {
        DocumentAccess {
            owner_id: self.owner_id,
            created_at: self.created_at,
            allow_editing: self.allow_editing,
            editable_until: self.editable_until,
        }
    }
}

/// An invoice together with its products.
#[derive(Debug, Clone, Serialize)]
pub struct InvoiceDetail {
    #[serde(flatten)]
    pub invoice: Invoice,
    pub products: Vec<LineItem>,
}

/// DTO for creating a new invoice. The owner is the authenticated caller.
#[derive(Debug, Clone, Deserialize)]
pub struct CreateInvoice {
    pub id: String,
    pub company_name: String,
    pub invoice_date: Option<NaiveDate>,
    #[serde(default)]
    pub total_amount: f64,
    pub attachment_path: Option<String>,
    #[serde(default)]
    pub products: Vec<CreateLineItem>,
}

/// DTO for updating an invoice's business fields. All fields are optional.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateInvoice {
    pub company_name: Option<String>,
    pub invoice_date: Option<NaiveDate>,
    pub total_amount: Option<f64>,
    pub attachment_path: Option<String>,
}
