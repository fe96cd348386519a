//! Edit request ledger model and DTOs.

use docket_core::document::{DocumentKind, DocumentRef};
use docket_core::edit_request::EditRequestStatus;
use docket_core::error::CoreError;
use docket_core::types::{DbId, Timestamp};
use serde::Serialize;
use sqlx::FromRow;

/// A row from the `edit_requests` table.
#[derive(Debug, Clone, PartialEq, FromRow, Serialize)]
pub struct EditRequest {
    pub id: DbId,
    pub document_type: String,
    pub document_id: String,
    pub status: String,
    pub request_message: Option<String>,
    pub response_message: Option<String>,
    pub requested_by_id: DbId,
    pub admin_user_id: Option<DbId>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl EditRequest {
    pub fn status(&self) -> Result<EditRequestStatus, CoreError> {
        EditRequestStatus::parse(&self.status)
    }

    pub fn document(&self) -> Result<DocumentRef, CoreError> {
        Ok(DocumentRef::new(
            DocumentKind::parse(&self.document_type)?,
            self.document_id.clone(),
        ))
    }
}

/// DTO for inserting a new PENDING request.
#[derive(Debug, Clone)]
pub struct CreateEditRequest {
    pub document: DocumentRef,
    pub requested_by_id: DbId,
    pub request_message: String,
}

/// The terminal write applied by an admin decision.
#[derive(Debug, Clone)]
pub struct ResolveEditRequest {
    pub id: DbId,
    pub status: EditRequestStatus,
    pub response_message: Option<String>,
    pub admin_user_id: DbId,
    pub resolved_at: Timestamp,
}
