//! Edit request orchestration.
//!
//! ```text
//! owner --create_request--> PENDING --approve--> APPROVED (+ grant on document)
//!                                   --reject---> REJECTED
//! ```
//!
//! Every operation takes `now` explicitly so the time windows are testable.
//! Notifications go out only after the store has committed, and publish
//! failures never fail the operation.

use std::sync::Arc;

use docket_core::document::DocumentRef;
use docket_core::edit_request::{
    validate_request_message, validate_response_message, Decision,
};
use docket_core::error::CoreError;
use docket_core::permission::{Actor, EditPolicy};
use docket_core::rooms::{Room, EVENT_EDIT_REQUEST_UPDATE, EVENT_NEW_EDIT_REQUEST};
use docket_core::types::{DbId, Timestamp};
use docket_db::models::edit_request::{CreateEditRequest, EditRequest, ResolveEditRequest};
use docket_events::{Notifier, NotifyError};

use crate::error::WorkflowError;
use crate::store::{EditRequestStore, InsertOutcome, Resolution, ResolveOutcome};

pub struct EditRequestWorkflow<S> {
    store: S,
    notifier: Arc<dyn Notifier>,
    policy: EditPolicy,
}

impl<S: EditRequestStore> EditRequestWorkflow<S> {
    pub fn new(store: S, notifier: Arc<dyn Notifier>, policy: EditPolicy) -> Self {
        Self {
            store,
            notifier,
            policy,
        }
    }

    pub fn policy(&self) -> &EditPolicy {
        &self.policy
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// File a request to edit a document whose edit window has closed.
    ///
    /// Fails with `NotFound` for an unknown document, `Forbidden` for a
    /// non-owner, `Validation` while the initial edit window is open, and
    /// `Conflict` when a PENDING request already exists.
    pub async fn create_request(
        &self,
        document: &DocumentRef,
        requester: &Actor,
        message: Option<&str>,
        now: Timestamp,
    ) -> Result<EditRequest, WorkflowError> {
        let message = validate_request_message(message)?;

        let handle = self
            .store
            .find_document(document)
            .await?
            .ok_or_else(|| document.not_found())?;

        if handle.access.owner_id != requester.user_id {
            return Err(CoreError::Forbidden(
                "Only the document owner may request edit permission".into(),
            )
            .into());
        }

        if now < self.policy.initial_window_end(handle.access.created_at) {
            return Err(CoreError::Validation(
                "Document is still within its edit window; no permission request is needed".into(),
            )
            .into());
        }

        if self.store.find_pending(document).await?.is_some() {
            return Err(pending_conflict().into());
        }

        let input = CreateEditRequest {
            document: document.clone(),
            requested_by_id: requester.user_id,
            request_message: message,
        };
        let request = match self.store.insert_request(&input).await? {
            InsertOutcome::Created(request) => request,
            InsertOutcome::DuplicatePending => return Err(pending_conflict().into()),
            InsertOutcome::DocumentMissing => return Err(document.not_found().into()),
        };

        tracing::info!(
            request_id = request.id,
            document = %document,
            user_id = requester.user_id,
            "Edit request created",
        );

        let requested_by = self.username_for(requester.user_id).await;
        self.notify(Room::Admins, EVENT_NEW_EDIT_REQUEST, || {
            Ok(serde_json::json!({
                "request": serde_json::to_value(&request)?,
                "summary": handle.summary(),
                "requested_by": requested_by,
            }))
        });

        Ok(request)
    }

    /// Approve a PENDING request: grant the document until
    /// `now + grant_duration` and resolve the request, atomically.
    pub async fn approve(
        &self,
        request_id: DbId,
        admin: &Actor,
        response_message: Option<&str>,
        now: Timestamp,
    ) -> Result<EditRequest, WorkflowError> {
        self.decide(Decision::Approve, request_id, admin, response_message, now)
            .await
    }

    /// Reject a PENDING request. A reason is required; the document is not
    /// touched.
    pub async fn reject(
        &self,
        request_id: DbId,
        admin: &Actor,
        response_message: Option<&str>,
        now: Timestamp,
    ) -> Result<EditRequest, WorkflowError> {
        self.decide(Decision::Reject, request_id, admin, response_message, now)
            .await
    }

    async fn decide(
        &self,
        decision: Decision,
        request_id: DbId,
        admin: &Actor,
        response_message: Option<&str>,
        now: Timestamp,
    ) -> Result<EditRequest, WorkflowError> {
        if !admin.role.is_admin() {
            return Err(CoreError::Forbidden("Admin role required".into()).into());
        }

        let current = self
            .store
            .find_request(request_id)
            .await?
            .ok_or_else(|| CoreError::not_found("EditRequest", request_id))?;
        current.status()?.ensure_pending()?;

        let response_message = validate_response_message(decision, response_message)?;

        let grant_until = match decision {
            Decision::Approve => Some(self.policy.grant_expiry(now)),
            Decision::Reject => None,
        };
        let resolution = Resolution {
            request: ResolveEditRequest {
                id: request_id,
                status: decision.target_status(),
                response_message,
                admin_user_id: admin.user_id,
                resolved_at: now,
            },
            grant_until,
        };

        let request = match self.store.resolve_request(&resolution).await? {
            ResolveOutcome::Resolved(request) => request,
            ResolveOutcome::AlreadyResolved(status) => {
                status.ensure_pending()?;
                return Err(CoreError::Internal(format!(
                    "Edit request {request_id} reported resolved while still pending"
                ))
                .into());
            }
            ResolveOutcome::Missing => {
                return Err(CoreError::not_found("EditRequest", request_id).into())
            }
        };

        tracing::info!(
            request_id,
            admin_id = admin.user_id,
            status = %request.status,
            editable_until = ?grant_until,
            "Edit request resolved",
        );

        self.notify(Room::EditRequest(request_id), EVENT_EDIT_REQUEST_UPDATE, || {
            Ok(serde_json::json!({
                "request": serde_json::to_value(&request)?,
                "status": request.status,
                "response_message": request.response_message,
                "editable_until": grant_until,
            }))
        });

        Ok(request)
    }

    async fn username_for(&self, user_id: DbId) -> String {
        match self.store.find_username(user_id).await {
            Ok(Some(username)) => username,
            Ok(None) => format!("user #{user_id}"),
            Err(e) => {
                tracing::warn!(user_id, error = %e, "Failed to look up username for notification");
                format!("user #{user_id}")
            }
        }
    }

    /// Best-effort publish. Errors are logged and swallowed.
    fn notify(
        &self,
        room: Room,
        event: &str,
        payload: impl FnOnce() -> Result<serde_json::Value, NotifyError>,
    ) {
        let result = payload().and_then(|payload| self.notifier.publish(room, event, payload));
        if let Err(e) = result {
            tracing::warn!(room = %room, event, error = %e, "Failed to publish notification");
        }
    }
}

fn pending_conflict() -> CoreError {
    CoreError::Conflict("A pending edit request already exists for this document".into())
}
