//! Shared query parameter types for API handlers.

use chrono::NaiveDate;
use docket_core::types::DbId;
use serde::Deserialize;

/// `?q=&owner_id=&from=&to=&limit=&offset=` for document listings.
#[derive(Debug, Default, Deserialize)]
pub struct DocumentListParams {
    pub q: Option<String>,
    pub owner_id: Option<DbId>,
    pub from: Option<NaiveDate>,
    pub to: Option<NaiveDate>,
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

/// `?status=&limit=&offset=` for the admin edit-request listing.
#[derive(Debug, Default, Deserialize)]
pub struct EditRequestListParams {
    pub status: Option<String>,
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}
