//! Dashboard summary row types.

use serde::Serialize;

/// Document and edit-request counts for the dashboard.
#[derive(Debug, Clone, Default, Serialize)]
pub struct DashboardSummary {
    pub invoices: i64,
    pub purchase_orders: i64,
    pub stock_register_entries: i64,
    /// Pending requests filed by the caller.
    pub my_pending_requests: i64,
    /// Pending requests across all users; only populated for admins.
    pub pending_requests: Option<i64>,
}
