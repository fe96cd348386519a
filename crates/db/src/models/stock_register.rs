//! Stock register entry model and DTOs.

use chrono::NaiveDate;
use docket_core::permission::DocumentAccess;
use docket_core::types::{DbId, Timestamp};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// A row from the `stock_register_entries` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct StockRegisterEntry {
    pub id: String,
    pub owner_id: DbId,
    pub article_name: String,
    pub quantity: i32,
    pub location: Option<String>,
    pub entry_date: Option<NaiveDate>,
    pub attachment_path: Option<String>,
    pub allow_editing: bool,
    pub editable_until: Option<Timestamp>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl StockRegisterEntry {
    pub fn access(&self) -> DocumentAccess {
        DocumentAccess {
            owner_id: self.owner_id,
            created_at: self.created_at,
            allow_editing: self.allow_editing,
            editable_until: self.editable_until,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct CreateStockRegisterEntry {
    pub id: String,
    pub article_name: String,
    #[serde(default)]
    pub quantity: i32,
    pub location: Option<String>,
    pub entry_date: Option<NaiveDate>,
    pub attachment_path: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateStockRegisterEntry {
    pub article_name: Option<String>,
    pub quantity: Option<i32>,
    pub location: Option<String>,
    pub entry_date: Option<NaiveDate>,
    pub attachment_path: Option<String>,
}
