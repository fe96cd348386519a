//! Edit request workflow behaviour against the in-memory store.

mod common;

use std::sync::Arc;

use assert_matches::assert_matches;
use chrono::Duration;
use docket_core::document::{DocumentKind, DocumentRef};
use docket_core::error::CoreError;
use docket_core::permission::{can_edit, DenyReason, EditDecision, EditDenial, EditPolicy};
use docket_core::rooms::Room;
use docket_workflow::WorkflowError;

use common::*;

// ---------------------------------------------------------------------------
// Scenarios
// ---------------------------------------------------------------------------

#[tokio::test]
async fn approve_grants_edit_window_to_owner() {
    let h = harness();
    let policy = EditPolicy::default();

    let attempt = t0() + Duration::hours(25);
    assert_eq!(
        can_edit(&h.store.access(&d1()), &owner(), attempt, &policy),
        EditDecision::Deny(EditDenial {
            reason: DenyReason::WindowClosed,
            needs_permission_request: true,
        })
    );

    let request = h
        .workflow
        .create_request(&d1(), &owner(), Some("please fix typo"), attempt)
        .await
        .unwrap();
    assert_eq!(request.status, "PENDING");
    assert_eq!(request.requested_by_id, OWNER);
    assert_eq!(request.request_message.as_deref(), Some("please fix typo"));

    let approved_at = attempt + Duration::minutes(30);
    let approved = h
        .workflow
        .approve(request.id, &admin(), Some("ok"), approved_at)
        .await
        .unwrap();
    assert_eq!(approved.status, "APPROVED");
    assert_eq!(approved.admin_user_id, Some(ADMIN));
    assert_eq!(approved.response_message.as_deref(), Some("ok"));

    let access = h.store.access(&d1());
    assert!(access.allow_editing);
    assert_eq!(access.editable_until, Some(approved_at + Duration::hours(24)));
    assert!(can_edit(&access, &owner(), approved_at + Duration::hours(1), &policy).is_allowed());
    assert!(!can_edit(&access, &owner(), approved_at + Duration::hours(24), &policy).is_allowed());
}

#[tokio::test]
async fn reject_leaves_document_closed() {
    let h = harness();
    let now = t0() + Duration::hours(25);

    let request = h
        .workflow
        .create_request(&d1(), &owner(), Some("please fix typo"), now)
        .await
        .unwrap();
    let rejected = h
        .workflow
        .reject(request.id, &admin(), Some("insufficient detail"), now)
        .await
        .unwrap();

    assert_eq!(rejected.status, "REJECTED");
    assert_eq!(rejected.response_message.as_deref(), Some("insufficient detail"));

    let access = h.store.access(&d1());
    assert!(!access.allow_editing);
    assert_eq!(access.editable_until, None);
    assert!(!can_edit(&access, &owner(), now, &EditPolicy::default()).is_allowed());
}

#[tokio::test]
async fn second_request_while_pending_conflicts() {
    let h = harness();
    let now = t0() + Duration::hours(25);

    h.workflow
        .create_request(&d1(), &owner(), Some("first"), now)
        .await
        .unwrap();
    let err = h
        .workflow
        .create_request(&d1(), &owner(), Some("second"), now)
        .await
        .unwrap_err();

    assert_matches!(err, WorkflowError::Core(CoreError::Conflict(_)));
    assert_eq!(h.store.requests().len(), 1);
}

#[tokio::test]
async fn non_owner_cannot_request() {
    let h = harness();
    let err = h
        .workflow
        .create_request(&d1(), &other(), Some("let me in"), t0() + Duration::hours(25))
        .await
        .unwrap_err();

    assert_matches!(err, WorkflowError::Core(CoreError::Forbidden(_)));
    assert!(h.store.requests().is_empty());
    assert!(h.notifier.published().is_empty());
}

// ---------------------------------------------------------------------------
// create_request validation
// ---------------------------------------------------------------------------

#[tokio::test]
async fn request_within_initial_window_is_rejected() {
    let h = harness();
    let err = h
        .workflow
        .create_request(&d1(), &owner(), Some("early"), t0() + Duration::hours(2))
        .await
        .unwrap_err();
    assert_matches!(err, WorkflowError::Core(CoreError::Validation(_)));
}

#[tokio::test]
async fn request_requires_message() {
    let h = harness();
    let now = t0() + Duration::hours(25);
    for message in [None, Some(""), Some("   ")] {
        let err = h
            .workflow
            .create_request(&d1(), &owner(), message, now)
            .await
            .unwrap_err();
        assert_matches!(err, WorkflowError::Core(CoreError::Validation(_)));
    }
}

#[tokio::test]
async fn request_for_unknown_document_is_not_found() {
    let h = harness();
    let missing = DocumentRef::new(DocumentKind::PurchaseOrder, "PO-404");
    let err = h
        .workflow
        .create_request(&missing, &owner(), Some("fix"), t0())
        .await
        .unwrap_err();
    assert_matches!(
        err,
        WorkflowError::Core(CoreError::NotFound { entity: "PurchaseOrder", .. })
    );
}

#[tokio::test]
async fn new_request_is_announced_to_admins() {
    let h = harness();
    let request = h
        .workflow
        .create_request(&d1(), &owner(), Some("please fix typo"), t0() + Duration::hours(25))
        .await
        .unwrap();

    let published = h.notifier.published();
    assert_eq!(published.len(), 1);
    assert_eq!(published[0].room, Room::Admins);
    assert_eq!(published[0].event, "new-edit-request");
    assert_eq!(published[0].payload["summary"], "Invoice Acme Ltd");
    assert_eq!(published[0].payload["requested_by"], "alice");
    assert_eq!(published[0].payload["request"]["id"], request.id);
}

#[tokio::test]
async fn expired_grant_may_be_requested_again() {
    let h = harness();
    let now = t0() + Duration::hours(25);
    let first = h
        .workflow
        .create_request(&d1(), &owner(), Some("first"), now)
        .await
        .unwrap();
    h.workflow.approve(first.id, &admin(), None, now).await.unwrap();

    let after_expiry = now + Duration::hours(24);
    let decision = can_edit(&h.store.access(&d1()), &owner(), after_expiry, &EditPolicy::default());
    assert_eq!(
        decision,
        EditDecision::Deny(EditDenial {
            reason: DenyReason::GrantExpired,
            needs_permission_request: false,
        })
    );

    let second = h
        .workflow
        .create_request(&d1(), &owner(), Some("again"), after_expiry)
        .await
        .unwrap();
    assert_ne!(second.id, first.id);
}

// ---------------------------------------------------------------------------
// Single pending invariant and terminal states
// ---------------------------------------------------------------------------

#[tokio::test]
async fn resolved_request_frees_the_document_for_a_new_one() {
    let h = harness();
    let now = t0() + Duration::hours(25);

    let first = h
        .workflow
        .create_request(&d1(), &owner(), Some("first"), now)
        .await
        .unwrap();
    h.workflow
        .reject(first.id, &admin(), Some("no"), now)
        .await
        .unwrap();

    let second = h
        .workflow
        .create_request(&d1(), &owner(), Some("second"), now)
        .await
        .unwrap();
    assert_eq!(second.status, "PENDING");
    assert_eq!(h.store.requests().len(), 2);
}

#[tokio::test]
async fn approved_request_frees_the_document_for_a_new_one() {
    let h = harness();
    let now = t0() + Duration::hours(25);

    let first = h
        .workflow
        .create_request(&d1(), &owner(), Some("first"), now)
        .await
        .unwrap();
    h.workflow.approve(first.id, &admin(), None, now).await.unwrap();

    let second = h
        .workflow
        .create_request(&d1(), &owner(), Some("more changes"), now + Duration::hours(1))
        .await
        .unwrap();
    assert_eq!(second.status, "PENDING");
    assert_eq!(h.store.requests().len(), 2);
}

#[tokio::test]
async fn resolved_requests_are_terminal() {
    let h = harness();
    let now = t0() + Duration::hours(25);
    let request = h
        .workflow
        .create_request(&d1(), &owner(), Some("fix"), now)
        .await
        .unwrap();
    let approved = h
        .workflow
        .approve(request.id, &admin(), Some("ok"), now)
        .await
        .unwrap();
    let access_after_approval = h.store.access(&d1());

    let later = now + Duration::hours(3);
    let err = h
        .workflow
        .approve(request.id, &admin(), Some("again"), later)
        .await
        .unwrap_err();
    assert_matches!(err, WorkflowError::Core(CoreError::Conflict(ref m)) if m.contains("approved"));

    let err = h
        .workflow
        .reject(request.id, &admin(), Some("changed my mind"), later)
        .await
        .unwrap_err();
    assert_matches!(err, WorkflowError::Core(CoreError::Conflict(_)));

    assert_eq!(h.store.requests(), vec![approved]);
    assert_eq!(h.store.access(&d1()), access_after_approval);
}

#[tokio::test]
async fn reject_requires_reason() {
    let h = harness();
    let now = t0() + Duration::hours(25);
    let request = h
        .workflow
        .create_request(&d1(), &owner(), Some("fix"), now)
        .await
        .unwrap();

    let err = h
        .workflow
        .reject(request.id, &admin(), Some("  "), now)
        .await
        .unwrap_err();
    assert_matches!(err, WorkflowError::Core(CoreError::Validation(_)));
    assert_eq!(h.store.requests()[0].status, "PENDING");
}

#[tokio::test]
async fn decisions_on_unknown_request_are_not_found() {
    let h = harness();
    let err = h.workflow.approve(99, &admin(), None, t0()).await.unwrap_err();
    assert_matches!(
        err,
        WorkflowError::Core(CoreError::NotFound { entity: "EditRequest", .. })
    );
}

#[tokio::test]
async fn only_admins_decide() {
    let h = harness();
    let now = t0() + Duration::hours(25);
    let request = h
        .workflow
        .create_request(&d1(), &owner(), Some("fix"), now)
        .await
        .unwrap();

    let err = h
        .workflow
        .approve(request.id, &owner(), None, now)
        .await
        .unwrap_err();
    assert_matches!(err, WorkflowError::Core(CoreError::Forbidden(_)));
    assert!(!h.store.access(&d1()).allow_editing);
}

// ---------------------------------------------------------------------------
// Atomicity and notification side channel
// ---------------------------------------------------------------------------

#[tokio::test]
async fn failed_resolution_leaves_request_pending_and_unannounced() {
    let h = harness();
    let now = t0() + Duration::hours(25);
    let request = h
        .workflow
        .create_request(&d1(), &owner(), Some("fix"), now)
        .await
        .unwrap();
    h.store.fail_resolves();

    let err = h
        .workflow
        .approve(request.id, &admin(), None, now)
        .await
        .unwrap_err();
    assert_matches!(err, WorkflowError::Store(_));

    assert_eq!(h.store.requests()[0].status, "PENDING");
    assert!(!h.store.access(&d1()).allow_editing);
    let updates: Vec<_> = h
        .notifier
        .published()
        .into_iter()
        .filter(|p| p.room == Room::EditRequest(request.id))
        .collect();
    assert!(updates.is_empty());
}

#[tokio::test]
async fn resolution_is_announced_on_request_room() {
    let h = harness();
    let now = t0() + Duration::hours(25);
    let request = h
        .workflow
        .create_request(&d1(), &owner(), Some("fix"), now)
        .await
        .unwrap();
    h.workflow
        .reject(request.id, &admin(), Some("insufficient detail"), now)
        .await
        .unwrap();

    let published = h.notifier.published();
    let update = published.last().unwrap();
    assert_eq!(update.room, Room::EditRequest(request.id));
    assert_eq!(update.event, "edit-request-update");
    assert_eq!(update.payload["status"], "REJECTED");
    assert_eq!(update.payload["response_message"], "insufficient detail");
}

#[tokio::test]
async fn publish_failures_do_not_fail_the_workflow() {
    let h = harness_with(RecordingNotifier::failing());
    let now = t0() + Duration::hours(25);

    let request = h
        .workflow
        .create_request(&d1(), &owner(), Some("fix"), now)
        .await
        .unwrap();
    let approved = h
        .workflow
        .approve(request.id, &admin(), None, now)
        .await
        .unwrap();

    assert_eq!(approved.status, "APPROVED");
    assert!(h.store.access(&d1()).allow_editing);
}

// ---------------------------------------------------------------------------
// Races
// ---------------------------------------------------------------------------

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_creates_yield_one_pending_request() {
    let h = harness();
    let workflow = Arc::new(h.workflow);
    let now = t0() + Duration::hours(25);

    let handles: Vec<_> = (0..8)
        .map(|i| {
            let workflow = workflow.clone();
            tokio::spawn(async move {
                workflow
                    .create_request(&d1(), &owner(), Some(&format!("attempt {i}")), now)
                    .await
            })
        })
        .collect();

    let mut created = 0;
    for handle in handles {
        match handle.await.unwrap() {
            Ok(_) => created += 1,
            Err(err) => assert_matches!(err, WorkflowError::Core(CoreError::Conflict(_))),
        }
    }
    assert_eq!(created, 1);
    assert_eq!(h.store.requests().len(), 1);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_decisions_apply_exactly_once() {
    let h = harness();
    let now = t0() + Duration::hours(25);
    let request = h
        .workflow
        .create_request(&d1(), &owner(), Some("fix"), now)
        .await
        .unwrap();
    let id = request.id;
    let workflow = Arc::new(h.workflow);

    let handles: Vec<_> = (0..8)
        .map(|i| {
            let workflow = workflow.clone();
            tokio::spawn(async move {
                if i % 2 == 0 {
                    workflow.approve(id, &admin(), None, now).await
                } else {
                    workflow.reject(id, &admin(), Some("no"), now).await
                }
            })
        })
        .collect();

    let mut resolved = Vec::new();
    for handle in handles {
        match handle.await.unwrap() {
            Ok(request) => resolved.push(request),
            Err(err) => assert_matches!(err, WorkflowError::Core(CoreError::Conflict(_))),
        }
    }
    assert_eq!(resolved.len(), 1);

    let stored = &h.store.requests()[0];
    assert_eq!(stored, &resolved[0]);
    assert_eq!(
        h.store.access(&d1()).allow_editing,
        stored.status == "APPROVED"
    );
}
