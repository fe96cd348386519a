//! In-memory store and recording notifier for workflow tests.

#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::{TimeZone, Utc};
use docket_core::document::{DocumentHandle, DocumentKind, DocumentRef};
use docket_core::edit_request::EditRequestStatus;
use docket_core::permission::{Actor, DocumentAccess, EditPolicy};
use docket_core::roles::Role;
use docket_core::rooms::Room;
use docket_core::types::{DbId, Timestamp};
use docket_db::models::edit_request::{CreateEditRequest, EditRequest};
use docket_events::{Notifier, NotifyError};
use docket_workflow::{
    EditRequestStore, EditRequestWorkflow, InsertOutcome, Resolution, ResolveOutcome,
    WorkflowError,
};

pub const OWNER: DbId = 10;
pub const OTHER: DbId = 11;
pub const ADMIN: DbId = 1;

pub fn t0() -> Timestamp {
    Utc.with_ymd_and_hms(2025, 3, 1, 9, 0, 0).unwrap()
}

pub fn owner() -> Actor {
    Actor::new(OWNER, Role::User)
}

pub fn other() -> Actor {
    Actor::new(OTHER, Role::User)
}

pub fn admin() -> Actor {
    Actor::new(ADMIN, Role::Admin)
}

pub fn d1() -> DocumentRef {
    DocumentRef::new(DocumentKind::Invoice, "D1")
}

// ---------------------------------------------------------------------------
// MemoryStore
// ---------------------------------------------------------------------------

#[derive(Default)]
struct State {
    documents: HashMap<DocumentRef, DocumentHandle>,
    requests: Vec<EditRequest>,
    usernames: HashMap<DbId, String>,
}

/// Every operation runs under one lock, so each call is atomic.
#[derive(Default)]
pub struct MemoryStore {
    state: Mutex<State>,
    fail_resolves: AtomicBool,
}

impl MemoryStore {
    pub fn with_document(document: &DocumentRef, owner_id: DbId, created_at: Timestamp) -> Self {
        let store = Self::default();
        store.add_document(document, owner_id, created_at);
        store.add_user(OWNER, "alice");
        store.add_user(OTHER, "bob");
        store.add_user(ADMIN, "root");
        store
    }

    pub fn add_document(&self, document: &DocumentRef, owner_id: DbId, created_at: Timestamp) {
        let handle = DocumentHandle {
            reference: document.clone(),
            access: DocumentAccess {
                owner_id,
                created_at,
                allow_editing: false,
                editable_until: None,
            },
            label: "Acme Ltd".to_string(),
        };
        self.state
            .lock()
            .unwrap()
            .documents
            .insert(document.clone(), handle);
    }

    pub fn add_user(&self, id: DbId, username: &str) {
        self.state
            .lock()
            .unwrap()
            .usernames
            .insert(id, username.to_string());
    }

    pub fn access(&self, document: &DocumentRef) -> DocumentAccess {
        self.state.lock().unwrap().documents[document].access.clone()
    }

    pub fn requests(&self) -> Vec<EditRequest> {
        self.state.lock().unwrap().requests.clone()
    }

    /// Make every subsequent resolve fail as a store error without writing.
    pub fn fail_resolves(&self) {
        self.fail_resolves.store(true, Ordering::SeqCst);
    }
}

fn is_pending_for(request: &EditRequest, document: &DocumentRef) -> bool {
    request.status == EditRequestStatus::Pending.as_str()
        && request.document_type == document.kind.as_str()
        && request.document_id == document.id
}

#[async_trait]
impl EditRequestStore for MemoryStore {
    async fn find_document(
        &self,
        document: &DocumentRef,
    ) -> Result<Option<DocumentHandle>, WorkflowError> {
        Ok(self.state.lock().unwrap().documents.get(document).cloned())
    }

    async fn find_pending(
        &self,
        document: &DocumentRef,
    ) -> Result<Option<EditRequest>, WorkflowError> {
        let state = self.state.lock().unwrap();
        Ok(state
            .requests
            .iter()
            .find(|r| is_pending_for(r, document))
            .cloned())
    }

    async fn insert_request(
        &self,
        input: &CreateEditRequest,
    ) -> Result<InsertOutcome, WorkflowError> {
        let mut state = self.state.lock().unwrap();
        if !state.documents.contains_key(&input.document) {
            return Ok(InsertOutcome::DocumentMissing);
        }
        if state.requests.iter().any(|r| is_pending_for(r, &input.document)) {
            return Ok(InsertOutcome::DuplicatePending);
        }
        let request = EditRequest {
            id: state.requests.len() as DbId + 1,
            document_type: input.document.kind.as_str().to_string(),
            document_id: input.document.id.clone(),
            status: EditRequestStatus::Pending.as_str().to_string(),
            request_message: Some(input.request_message.clone()),
            response_message: None,
            requested_by_id: input.requested_by_id,
            admin_user_id: None,
            created_at: t0(),
            updated_at: t0(),
        };
        state.requests.push(request.clone());
        Ok(InsertOutcome::Created(request))
    }

    async fn find_request(&self, id: DbId) -> Result<Option<EditRequest>, WorkflowError> {
        let state = self.state.lock().unwrap();
        Ok(state.requests.iter().find(|r| r.id == id).cloned())
    }

    async fn resolve_request(
        &self,
        resolution: &Resolution,
    ) -> Result<ResolveOutcome, WorkflowError> {
        if self.fail_resolves.load(Ordering::SeqCst) {
            return Err(sqlx::Error::PoolTimedOut.into());
        }

        let mut state = self.state.lock().unwrap();
        let input = &resolution.request;
        let Some(index) = state.requests.iter().position(|r| r.id == input.id) else {
            return Ok(ResolveOutcome::Missing);
        };
        let status = state.requests[index].status()?;
        if status.is_terminal() {
            return Ok(ResolveOutcome::AlreadyResolved(status));
        }

        if let Some(until) = resolution.grant_until {
            let document = state.requests[index].document()?;
            let Some(handle) = state.documents.get_mut(&document) else {
                return Ok(ResolveOutcome::Missing);
            };
            handle.access.allow_editing = true;
            handle.access.editable_until = Some(until);
        }

        let request = &mut state.requests[index];
        request.status = input.status.as_str().to_string();
        request.response_message = input.response_message.clone();
        request.admin_user_id = Some(input.admin_user_id);
        request.updated_at = input.resolved_at;
        Ok(ResolveOutcome::Resolved(request.clone()))
    }

    async fn find_username(&self, user_id: DbId) -> Result<Option<String>, WorkflowError> {
        Ok(self.state.lock().unwrap().usernames.get(&user_id).cloned())
    }
}

// ---------------------------------------------------------------------------
// RecordingNotifier
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct Published {
    pub room: Room,
    pub event: String,
    pub payload: serde_json::Value,
}

#[derive(Default)]
pub struct RecordingNotifier {
    published: Mutex<Vec<Published>>,
    failing: bool,
}

impl RecordingNotifier {
    pub fn failing() -> Self {
        Self {
            failing: true,
            ..Default::default()
        }
    }

    pub fn published(&self) -> Vec<Published> {
        self.published.lock().unwrap().clone()
    }
}

impl Notifier for RecordingNotifier {
    fn publish(
        &self,
        room: Room,
        event: &str,
        payload: serde_json::Value,
    ) -> Result<(), NotifyError> {
        if self.failing {
            return Err(NotifyError::Transport("socket server down".into()));
        }
        self.published.lock().unwrap().push(Published {
            room,
            event: event.to_string(),
            payload,
        });
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Fixtures
// ---------------------------------------------------------------------------

pub struct Harness {
    pub workflow: EditRequestWorkflow<Arc<MemoryStore>>,
    pub store: Arc<MemoryStore>,
    pub notifier: Arc<RecordingNotifier>,
}

/// A workflow over one invoice `D1` owned by [`OWNER`] and created at [`t0`].
pub fn harness() -> Harness {
    harness_with(RecordingNotifier::default())
}

pub fn harness_with(notifier: RecordingNotifier) -> Harness {
    let store = Arc::new(MemoryStore::with_document(&d1(), OWNER, t0()));
    let notifier = Arc::new(notifier);
    let workflow = EditRequestWorkflow::new(store.clone(), notifier.clone(), EditPolicy::default());
    Harness {
        workflow,
        store,
        notifier,
    }
}
