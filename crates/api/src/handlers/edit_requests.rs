//! Handlers for the `/edit-requests` resource.
//!
//! Listing and deciding are admin-only. Requesters can read their own
//! requests through `/edit-requests/mine` and `/edit-requests/{id}`.

use axum::extract::{Path, Query, State};
use axum::Json;
use chrono::Utc;
use docket_core::edit_request::StatusFilter;
use docket_core::error::CoreError;
use docket_core::search::{clamp_limit, clamp_offset, DEFAULT_PAGE_SIZE, MAX_PAGE_SIZE};
use docket_core::types::DbId;
use docket_db::models::edit_request::EditRequest;
use docket_db::repositories::EditRequestRepo;
use serde::{Deserialize, Serialize};

use crate::error::{AppError, AppResult};
use crate::middleware::auth::AuthUser;
use crate::middleware::rbac::RequireAdmin;
use crate::query::EditRequestListParams;
use crate::response::DataResponse;
use crate::state::AppState;

/// Request body for approve and reject.
#[derive(Debug, Default, Deserialize)]
pub struct DecisionBody {
    #[serde(default, alias = "responseMessage")]
    pub response_message: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct EditRequestPage {
    pub items: Vec<EditRequest>,
    pub total: i64,
    pub limit: i64,
    pub offset: i64,
}

/// GET /api/v1/edit-requests?status=PENDING|APPROVED|REJECTED|ALL
///
/// Defaults to pending requests, newest first.
pub async fn list(
    RequireAdmin(_admin): RequireAdmin,
    State(state): State<AppState>,
    Query(params): Query<EditRequestListParams>,
) -> AppResult<Json<DataResponse<EditRequestPage>>> {
    let status = StatusFilter::parse(params.status.as_deref())?.status();
    let limit = clamp_limit(params.limit, DEFAULT_PAGE_SIZE, MAX_PAGE_SIZE);
    let offset = clamp_offset(params.offset);

    let items = EditRequestRepo::list(&state.pool, status, limit, offset).await?;
    let total = EditRequestRepo::count(&state.pool, status, None).await?;

    Ok(Json(DataResponse {
        data: EditRequestPage {
            items,
            total,
            limit,
            offset,
        },
    }))
}

/// GET /api/v1/edit-requests/mine
pub async fn mine(
    auth: AuthUser,
    State(state): State<AppState>,
) -> AppResult<Json<DataResponse<Vec<EditRequest>>>> {
    let requests = EditRequestRepo::list_for_user(&state.pool, auth.user_id).await?;
    Ok(Json(DataResponse { data: requests }))
}

/// GET /api/v1/edit-requests/{id}
pub async fn get(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<Json<DataResponse<EditRequest>>> {
    let request = EditRequestRepo::find_by_id(&state.pool, id)
        .await?
        .ok_or_else(|| AppError::Core(CoreError::not_found("EditRequest", id)))?;

    if !auth.is_admin() && request.requested_by_id != auth.user_id {
        return Err(AppError::Core(CoreError::Forbidden(
            "Edit request belongs to another user".into(),
        )));
    }
    Ok(Json(DataResponse { data: request }))
}

/// PUT /api/v1/edit-requests/{id}/approve
///
/// Grants the document a fresh edit window and resolves the request, both
/// in one transaction.
pub async fn approve(
    RequireAdmin(admin): RequireAdmin,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
    body: Option<Json<DecisionBody>>,
) -> AppResult<Json<DataResponse<EditRequest>>> {
    let body = body.map(|Json(b)| b).unwrap_or_default();
    let request = state
        .workflow
        .approve(
            id,
            &admin.actor(),
            body.response_message.as_deref(),
            Utc::now(),
        )
        .await?;
    Ok(Json(DataResponse { data: request }))
}

/// PUT /api/v1/edit-requests/{id}/reject
///
/// A non-empty `response_message` is required.
pub async fn reject(
    RequireAdmin(admin): RequireAdmin,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
    body: Option<Json<DecisionBody>>,
) -> AppResult<Json<DataResponse<EditRequest>>> {
    let body = body.map(|Json(b)| b).unwrap_or_default();
    let request = state
        .workflow
        .reject(
            id,
            &admin.actor(),
            body.response_message.as_deref(),
            Utc::now(),
        )
        .await?;
    Ok(Json(DataResponse { data: request }))
}
