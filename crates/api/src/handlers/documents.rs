//! Handlers shared by the three document kinds.
//!
//! Each kind implements [`DocumentResource`]; the handlers below are generic
//! over it and mounted once per kind in `routes::documents`. Every mutating
//! handler evaluates `can_edit` at call time, inside the transaction that
//! holds the document row.

use async_trait::async_trait;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use chrono::Utc;
use docket_core::document::{validate_document_id, DocumentHandle, DocumentKind, DocumentRef};
use docket_core::error::CoreError;
use docket_core::permission::{can_edit, AllowReason, DenyReason, EditDecision};
use docket_core::search::{
    clamp_limit, clamp_offset, normalize_query, validate_date_range, DEFAULT_PAGE_SIZE,
    MAX_PAGE_SIZE,
};
use docket_core::types::{DbId, Timestamp};
use docket_db::models::document::{DocumentFilter, Page, Updated};
use docket_db::models::edit_request::EditRequest;
use docket_db::models::invoice::{CreateInvoice, Invoice, InvoiceDetail, UpdateInvoice};
use docket_db::models::purchase_order::{
    CreatePurchaseOrder, PurchaseOrder, PurchaseOrderDetail, UpdatePurchaseOrder,
};
use docket_db::models::stock_register::{
    CreateStockRegisterEntry, StockRegisterEntry, UpdateStockRegisterEntry,
};
use docket_db::repositories::{
    table_for, EditRequestRepo, InvoiceRepo, PurchaseOrderRepo, StockRegisterRepo,
};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use sqlx::{PgConnection, PgPool};

use crate::error::{AppError, AppResult};
use crate::middleware::auth::AuthUser;
use crate::query::DocumentListParams;
use crate::response::DataResponse;
use crate::state::AppState;

// ---------------------------------------------------------------------------
// Per-kind data access
// ---------------------------------------------------------------------------

/// Kind-specific DTOs and repository calls behind the generic handlers.
#[async_trait]
pub trait DocumentResource: Send + Sync + 'static {
    const KIND: DocumentKind;

    type Row: Serialize + Send + Sync;
    type Detail: Serialize + Send;
    type Create: DeserializeOwned + Send + Sync;
    type Update: DeserializeOwned + Send + Sync;

    /// Check required fields, the external id and the attachment path of a
    /// new document.
    fn validate_create(input: &Self::Create) -> Result<(), CoreError>;

    /// Check an update against the document it targets.
    fn validate_update(document: &DocumentRef, input: &Self::Update) -> Result<(), CoreError>;

    fn detail_owner(detail: &Self::Detail) -> DbId;

    async fn insert(
        pool: &PgPool,
        owner_id: DbId,
        input: &Self::Create,
    ) -> Result<Self::Detail, sqlx::Error>;

    async fn find_detail(pool: &PgPool, id: &str) -> Result<Option<Self::Detail>, sqlx::Error>;

    async fn list(pool: &PgPool, filter: &DocumentFilter) -> Result<Page<Self::Row>, sqlx::Error>;

    async fn update(
        conn: &mut PgConnection,
        id: &str,
        input: &Self::Update,
    ) -> Result<Option<Updated<Self::Row>>, sqlx::Error>;
}

fn require_field(value: &str, field: &str) -> Result<(), CoreError> {
    if value.trim().is_empty() {
        return Err(CoreError::Validation(format!("{field} is required")));
    }
    Ok(())
}

pub struct Invoices;

#[async_trait]
impl DocumentResource for Invoices {
    const KIND: DocumentKind = DocumentKind::Invoice;

    type Row = Invoice;
    type Detail = InvoiceDetail;
    type Create = CreateInvoice;
    type Update = UpdateInvoice;

    fn validate_create(input: &CreateInvoice) -> Result<(), CoreError> {
        validate_document_id(&input.id)?;
        require_field(&input.company_name, "company_name")?;
        for product in &input.products {
            require_field(&product.name, "product name")?;
        }
        DocumentRef::new(Self::KIND, &input.id).validate_attachment(input.attachment_path.as_deref())
    }

    fn validate_update(document: &DocumentRef, input: &UpdateInvoice) -> Result<(), CoreError> {
        document.validate_attachment(input.attachment_path.as_deref())
    }

    fn detail_owner(detail: &InvoiceDetail) -> DbId {
        detail.invoice.owner_id
    }

    async fn insert(
        pool: &PgPool,
        owner_id: DbId,
        input: &CreateInvoice,
    ) -> Result<InvoiceDetail, sqlx::Error> {
        InvoiceRepo::create(pool, owner_id, input).await
    }

    async fn find_detail(pool: &PgPool, id: &str) -> Result<Option<InvoiceDetail>, sqlx::Error> {
        InvoiceRepo::find_detail(pool, id).await
    }

    async fn list(pool: &PgPool, filter: &DocumentFilter) -> Result<Page<Invoice>, sqlx::Error> {
        InvoiceRepo::list(pool, filter).await
    }

    async fn update(
        conn: &mut PgConnection,
        id: &str,
        input: &UpdateInvoice,
    ) -> Result<Option<Updated<Invoice>>, sqlx::Error> {
        InvoiceRepo::update(conn, id, input).await
    }
}

pub struct PurchaseOrders;

#[async_trait]
impl DocumentResource for PurchaseOrders {
    const KIND: DocumentKind = DocumentKind::PurchaseOrder;

    type Row = PurchaseOrder;
    type Detail = PurchaseOrderDetail;
    type Create = CreatePurchaseOrder;
    type Update = UpdatePurchaseOrder;

    fn validate_create(input: &CreatePurchaseOrder) -> Result<(), CoreError> {
        validate_document_id(&input.id)?;
        require_field(&input.po_number, "po_number")?;
        require_field(&input.supplier_name, "supplier_name")?;
        for item in &input.items {
            require_field(&item.name, "item name")?;
        }
        DocumentRef::new(Self::KIND, &input.id).validate_attachment(input.attachment_path.as_deref())
    }

    fn validate_update(document: &DocumentRef, input: &UpdatePurchaseOrder) -> Result<(), CoreError> {
        document.validate_attachment(input.attachment_path.as_deref())
    }

    fn detail_owner(detail: &PurchaseOrderDetail) -> DbId {
        detail.purchase_order.owner_id
    }

    async fn insert(
        pool: &PgPool,
        owner_id: DbId,
        input: &CreatePurchaseOrder,
    ) -> Result<PurchaseOrderDetail, sqlx::Error> {
        PurchaseOrderRepo::create(pool, owner_id, input).await
    }

    async fn find_detail(
        pool: &PgPool,
        id: &str,
    ) -> Result<Option<PurchaseOrderDetail>, sqlx::Error> {
        PurchaseOrderRepo::find_detail(pool, id).await
    }

    async fn list(
        pool: &PgPool,
        filter: &DocumentFilter,
    ) -> Result<Page<PurchaseOrder>, sqlx::Error> {
        PurchaseOrderRepo::list(pool, filter).await
    }

    async fn update(
        conn: &mut PgConnection,
        id: &str,
        input: &UpdatePurchaseOrder,
    ) -> Result<Option<Updated<PurchaseOrder>>, sqlx::Error> {
        PurchaseOrderRepo::update(conn, id, input).await
    }
}

pub struct StockRegister;

#[async_trait]
impl DocumentResource for StockRegister {
    const KIND: DocumentKind = DocumentKind::StockRegister;

    type Row = StockRegisterEntry;
    type Detail = StockRegisterEntry;
    type Create = CreateStockRegisterEntry;
    type Update = UpdateStockRegisterEntry;

    fn validate_create(input: &CreateStockRegisterEntry) -> Result<(), CoreError> {
        validate_document_id(&input.id)?;
        require_field(&input.article_name, "article_name")?;
        DocumentRef::new(Self::KIND, &input.id).validate_attachment(input.attachment_path.as_deref())
    }

    fn validate_update(
        document: &DocumentRef,
        input: &UpdateStockRegisterEntry,
    ) -> Result<(), CoreError> {
        document.validate_attachment(input.attachment_path.as_deref())
    }

    fn detail_owner(detail: &StockRegisterEntry) -> DbId {
        detail.owner_id
    }

    async fn insert(
        pool: &PgPool,
        owner_id: DbId,
        input: &CreateStockRegisterEntry,
    ) -> Result<StockRegisterEntry, sqlx::Error> {
        StockRegisterRepo::create(pool, owner_id, input).await
    }

    async fn find_detail(
        pool: &PgPool,
        id: &str,
    ) -> Result<Option<StockRegisterEntry>, sqlx::Error> {
        StockRegisterRepo::find_by_id(pool, id).await
    }

    async fn list(
        pool: &PgPool,
        filter: &DocumentFilter,
    ) -> Result<Page<StockRegisterEntry>, sqlx::Error> {
        StockRegisterRepo::list(pool, filter).await
    }

    async fn update(
        conn: &mut PgConnection,
        id: &str,
        input: &UpdateStockRegisterEntry,
    ) -> Result<Option<Updated<StockRegisterEntry>>, sqlx::Error> {
        StockRegisterRepo::update(conn, id, input).await
    }
}

// ---------------------------------------------------------------------------
// Request / response types
// ---------------------------------------------------------------------------

/// Request body for `POST /{kind}/{id}/request-edit`.
#[derive(Debug, Deserialize)]
pub struct RequestEditBody {
    #[serde(default, alias = "requestMessage")]
    pub request_message: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(untagged)]
pub enum PermissionReason {
    Allow(AllowReason),
    Deny(DenyReason),
}

/// Response for `GET /{kind}/{id}/edit-permission`.
#[derive(Debug, Serialize)]
pub struct EditPermissionResponse {
    pub allowed: bool,
    pub reason: PermissionReason,
    /// Human-readable explanation when denied.
    pub message: Option<&'static str>,
    pub needs_permission_request: bool,
    pub initial_window_ends_at: Timestamp,
    pub editable_until: Option<Timestamp>,
    pub pending_request_id: Option<DbId>,
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// Load a document's permission state, or 404.
async fn load_handle(pool: &PgPool, kind: DocumentKind, id: &str) -> AppResult<DocumentHandle> {
    table_for(kind)
        .find_handle(pool, id)
        .await?
        .ok_or_else(|| AppError::Core(DocumentRef::new(kind, id).not_found()))
}

/// Reject non-owners (admins pass).
fn ensure_owner_or_admin(auth: &AuthUser, owner_id: DbId, kind: DocumentKind) -> AppResult<()> {
    if auth.is_admin() || auth.user_id == owner_id {
        return Ok(());
    }
    Err(AppError::Core(CoreError::Forbidden(format!(
        "{} belongs to another user",
        kind.display_name()
    ))))
}

fn build_filter(auth: &AuthUser, params: &DocumentListParams) -> AppResult<DocumentFilter> {
    validate_date_range(params.from, params.to)?;
    let owner_id = if auth.is_admin() {
        params.owner_id
    } else {
        Some(auth.user_id)
    };
    Ok(DocumentFilter {
        q: normalize_query(params.q.as_deref()),
        owner_id,
        from: params.from,
        to: params.to,
        limit: clamp_limit(params.limit, DEFAULT_PAGE_SIZE, MAX_PAGE_SIZE),
        offset: clamp_offset(params.offset),
    })
}

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

/// POST /api/v1/{kind}
///
/// Create a document owned by the caller. A duplicate id yields 409.
pub async fn create<R: DocumentResource>(
    auth: AuthUser,
    State(state): State<AppState>,
    Json(input): Json<R::Create>,
) -> AppResult<(StatusCode, Json<DataResponse<R::Detail>>)> {
    R::validate_create(&input)?;

    let detail = R::insert(&state.pool, auth.user_id, &input).await?;

    tracing::info!(user_id = auth.user_id, kind = %R::KIND, "Document created");

    Ok((StatusCode::CREATED, Json(DataResponse { data: detail })))
}

/// GET /api/v1/{kind}
pub async fn list<R: DocumentResource>(
    auth: AuthUser,
    State(state): State<AppState>,
    Query(params): Query<DocumentListParams>,
) -> AppResult<Json<DataResponse<Page<R::Row>>>> {
    let filter = build_filter(&auth, &params)?;
    let page = R::list(&state.pool, &filter).await?;
    Ok(Json(DataResponse { data: page }))
}

/// GET /api/v1/{kind}/{id}
pub async fn get<R: DocumentResource>(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<Json<DataResponse<R::Detail>>> {
    let detail = R::find_detail(&state.pool, &id)
        .await?
        .ok_or_else(|| AppError::Core(DocumentRef::new(R::KIND, &id).not_found()))?;
    ensure_owner_or_admin(&auth, R::detail_owner(&detail), R::KIND)?;
    Ok(Json(DataResponse { data: detail }))
}

/// PUT /api/v1/{kind}/{id}
///
/// Overwrite business fields if `can_edit` allows it right now. The row is
/// locked for the check and the write, so a concurrent approval is seen
/// either fully or not at all. A replaced attachment is released after the
/// commit.
pub async fn update<R: DocumentResource>(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(input): Json<R::Update>,
) -> AppResult<Json<DataResponse<R::Row>>> {
    let document = DocumentRef::new(R::KIND, &id);
    R::validate_update(&document, &input)?;
    let mut tx = state.pool.begin().await?;

    let handle = table_for(R::KIND)
        .lock_handle(&mut *tx, &id)
        .await?
        .ok_or_else(|| AppError::Core(document.not_found()))?;

    let decision = can_edit(
        &handle.access,
        &auth.actor(),
        Utc::now(),
        state.workflow.policy(),
    );
    if let EditDecision::Deny(denial) = decision {
        tracing::info!(
            user_id = auth.user_id,
            document = %document,
            reason = ?denial.reason,
            "Edit denied",
        );
        return Err(denial.into());
    }

    let updated = R::update(&mut *tx, &id, &input)
        .await?
        .ok_or_else(|| AppError::Core(document.not_found()))?;
    tx.commit().await?;

    tracing::info!(
        user_id = auth.user_id,
        document = %document,
        decision = ?decision,
        "Document updated",
    );

    if let Some(path) = &updated.superseded_attachment {
        state.attachments.release(&document, path).await;
    }

    Ok(Json(DataResponse {
        data: updated.document,
    }))
}

/// DELETE /api/v1/{kind}/{id}
///
/// Owner or admin. Removes the document, its line items and its edit
/// requests, then releases the attachment.
pub async fn delete<R: DocumentResource>(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<StatusCode> {
    let handle = load_handle(&state.pool, R::KIND, &id).await?;
    ensure_owner_or_admin(&auth, handle.access.owner_id, R::KIND)?;

    let deleted = table_for(R::KIND)
        .delete(&state.pool, &id)
        .await?
        .ok_or_else(|| AppError::Core(handle.reference.not_found()))?;

    tracing::info!(user_id = auth.user_id, document = %handle.reference, "Document deleted");

    if let Some(path) = &deleted.attachment {
        state.attachments.release(&handle.reference, path).await;
    }

    Ok(StatusCode::NO_CONTENT)
}

/// GET /api/v1/{kind}/{id}/edit-permission
///
/// The caller's current edit decision, plus whatever they need to act on it.
pub async fn edit_permission<R: DocumentResource>(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<Json<DataResponse<EditPermissionResponse>>> {
    let handle = load_handle(&state.pool, R::KIND, &id).await?;
    ensure_owner_or_admin(&auth, handle.access.owner_id, R::KIND)?;

    let policy = state.workflow.policy();
    let decision = can_edit(&handle.access, &auth.actor(), Utc::now(), policy);
    let pending: Option<EditRequest> =
        EditRequestRepo::find_pending(&state.pool, &handle.reference).await?;

    let (allowed, reason, message, needs_permission_request) = match decision {
        EditDecision::Allow(reason) => (true, PermissionReason::Allow(reason), None, false),
        EditDecision::Deny(denial) => (
            false,
            PermissionReason::Deny(denial.reason),
            Some(denial.reason.message()),
            denial.needs_permission_request,
        ),
    };

    Ok(Json(DataResponse {
        data: EditPermissionResponse {
            allowed,
            reason,
            message,
            needs_permission_request,
            initial_window_ends_at: policy.initial_window_end(handle.access.created_at),
            editable_until: handle.access.editable_until,
            pending_request_id: pending.map(|r| r.id),
        },
    }))
}

/// POST /api/v1/{kind}/{id}/request-edit
///
/// File an edit request for a document whose edit window has closed.
pub async fn request_edit<R: DocumentResource>(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(input): Json<RequestEditBody>,
) -> AppResult<(StatusCode, Json<DataResponse<EditRequest>>)> {
    let document = DocumentRef::new(R::KIND, id);
    let request = state
        .workflow
        .create_request(
            &document,
            &auth.actor(),
            input.request_message.as_deref(),
            Utc::now(),
        )
        .await?;

    Ok((StatusCode::CREATED, Json(DataResponse { data: request })))
}
