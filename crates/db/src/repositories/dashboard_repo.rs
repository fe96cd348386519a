//! Aggregate counts for the dashboard summary.

use docket_core::document::DocumentKind;
use docket_core::edit_request::EditRequestStatus;
use docket_core::types::DbId;
use sqlx::PgPool;

use crate::models::dashboard::DashboardSummary;
use crate::repositories::document_table::table_for;
use crate::repositories::edit_request_repo::EditRequestRepo;

pub struct DashboardRepo;

impl DashboardRepo {
    /// Build the summary for one caller.
    ///
    /// `scope_owner` restricts document counts to that owner (`None` for
    /// admins). `include_global_pending` adds the all-users pending count.
    pub async fn summary(
        pool: &PgPool,
        user_id: DbId,
        scope_owner: Option<DbId>,
        include_global_pending: bool,
    ) -> Result<DashboardSummary, sqlx::Error> {
        let invoices = table_for(DocumentKind::Invoice).count(pool, scope_owner).await?;
        let purchase_orders = table_for(DocumentKind::PurchaseOrder)
            .count(pool, scope_owner)
            .await?;
        let stock_register_entries = table_for(DocumentKind::StockRegister)
            .count(pool, scope_owner)
            .await?;

        let my_pending_requests =
            EditRequestRepo::count(pool, Some(EditRequestStatus::Pending), Some(user_id)).await?;
        let pending_requests = if include_global_pending {
            Some(EditRequestRepo::count(pool, Some(EditRequestStatus::Pending), None).await?)
        } else {
            None
        };

        Ok(DashboardSummary {
            invoices,
            purchase_orders,
            stock_register_entries,
            my_pending_requests,
            pending_requests,
        })
    }
}
