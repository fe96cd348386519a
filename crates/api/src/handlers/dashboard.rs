//! Handler for the dashboard summary.

use axum::extract::State;
use axum::Json;
use docket_db::models::dashboard::DashboardSummary;
use docket_db::repositories::DashboardRepo;

use crate::error::AppResult;
use crate::middleware::auth::AuthUser;
use crate::response::DataResponse;
use crate::state::AppState;

/// GET /api/v1/dashboard/summary
///
/// Document counts are scoped to the caller unless they are an admin; admins
/// also get the global pending-request count.
pub async fn summary(
    auth: AuthUser,
    State(state): State<AppState>,
) -> AppResult<Json<DataResponse<DashboardSummary>>> {
    let scope_owner = (!auth.is_admin()).then_some(auth.user_id);
    let summary =
        DashboardRepo::summary(&state.pool, auth.user_id, scope_owner, auth.is_admin()).await?;
    Ok(Json(DataResponse { data: summary }))
}
