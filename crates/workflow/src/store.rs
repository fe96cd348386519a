//! Persistence seam for the workflow.

use async_trait::async_trait;
use docket_core::document::{DocumentHandle, DocumentRef};
use docket_core::edit_request::EditRequestStatus;
use docket_core::types::{DbId, Timestamp};
use docket_db::models::edit_request::{CreateEditRequest, EditRequest, ResolveEditRequest};

use crate::error::WorkflowError;

/// Result of inserting a new PENDING request.
#[derive(Debug, Clone, PartialEq)]
pub enum InsertOutcome {
    Created(EditRequest),
    /// Another PENDING request for the same document won the race.
    DuplicatePending,
    /// The document was deleted before the insert.
    DocumentMissing,
}

/// An admin decision to persist. When `grant_until` is set the document's
/// grant is applied in the same unit of work as the ledger update.
#[derive(Debug, Clone)]
pub struct Resolution {
    pub request: ResolveEditRequest,
    pub grant_until: Option<Timestamp>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ResolveOutcome {
    Resolved(EditRequest),
    /// The request was decided by someone else first.
    AlreadyResolved(EditRequestStatus),
    /// The request (or its document) no longer exists.
    Missing,
}

#[async_trait]
pub trait EditRequestStore: Send + Sync {
    async fn find_document(
        &self,
        document: &DocumentRef,
    ) -> Result<Option<DocumentHandle>, WorkflowError>;

    async fn find_pending(
        &self,
        document: &DocumentRef,
    ) -> Result<Option<EditRequest>, WorkflowError>;

    /// Insert a PENDING request. Must not create a second PENDING row for
    /// the same document, even under concurrent calls.
    async fn insert_request(&self, input: &CreateEditRequest)
        -> Result<InsertOutcome, WorkflowError>;

    async fn find_request(&self, id: DbId) -> Result<Option<EditRequest>, WorkflowError>;

    /// Atomically re-check that the request is PENDING, apply the grant (if
    /// any) and move the request to its terminal status. Either every write
    /// lands or none does.
    async fn resolve_request(&self, resolution: &Resolution)
        -> Result<ResolveOutcome, WorkflowError>;

    async fn find_username(&self, user_id: DbId) -> Result<Option<String>, WorkflowError>;
}

#[async_trait]
impl<T: EditRequestStore + ?Sized> EditRequestStore for std::sync::Arc<T> {
    async fn find_document(
        &self,
        document: &DocumentRef,
    ) -> Result<Option<DocumentHandle>, WorkflowError> {
        (**self).find_document(document).await
    }

    async fn find_pending(
        &self,
        document: &DocumentRef,
    ) -> Result<Option<EditRequest>, WorkflowError> {
        (**self).find_pending(document).await
    }

    async fn insert_request(
        &self,
        input: &CreateEditRequest,
    ) -> Result<InsertOutcome, WorkflowError> {
        (**self).insert_request(input).await
    }

    async fn find_request(&self, id: DbId) -> Result<Option<EditRequest>, WorkflowError> {
        (**self).find_request(id).await
    }

    async fn resolve_request(
        &self,
        resolution: &Resolution,
    ) -> Result<ResolveOutcome, WorkflowError> {
        (**self).resolve_request(resolution).await
    }

    async fn find_username(&self, user_id: DbId) -> Result<Option<String>, WorkflowError> {
        (**self).find_username(user_id).await
    }
}
