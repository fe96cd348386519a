//! Concurrency behaviour of the Postgres store.
//!
//! Each test races real transactions against a per-test database from
//! `DATABASE_URL`, so the interleavings are the ones Postgres produces under
//! READ COMMITTED.

use assert_matches::assert_matches;
use chrono::{TimeZone, Utc};
use docket_core::document::{DocumentKind, DocumentRef};
use docket_core::edit_request::EditRequestStatus;
use docket_core::roles::Role;
use docket_core::types::{DbId, Timestamp};
use docket_db::models::edit_request::{CreateEditRequest, ResolveEditRequest};
use docket_db::models::invoice::CreateInvoice;
use docket_db::models::user::CreateUser;
use docket_db::repositories::{table_for, EditRequestRepo, InvoiceRepo, UserRepo};
use docket_workflow::{EditRequestStore, InsertOutcome, PgEditRequestStore, Resolution, ResolveOutcome};
use sqlx::PgPool;

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

async fn new_user(pool: &PgPool, username: &str, role: Role) -> DbId {
    UserRepo::create(
        pool,
        &CreateUser {
            username: username.to_string(),
            email: format!("{username}@example.com"),
            password_hash: "not-a-real-hash".to_string(),
            role,
        },
    )
    .await
    .unwrap()
    .id
}

async fn new_invoice(pool: &PgPool, owner: DbId, id: &str) -> DocumentRef {
    let input = CreateInvoice {
        id: id.to_string(),
        company_name: "Acme".to_string(),
        invoice_date: None,
        total_amount: 10.0,
        attachment_path: None,
        products: Vec::new(),
    };
    InvoiceRepo::create(pool, owner, &input).await.unwrap();
    DocumentRef::new(DocumentKind::Invoice, id)
}

fn request_for(document: &DocumentRef, owner: DbId) -> CreateEditRequest {
    CreateEditRequest {
        document: document.clone(),
        requested_by_id: owner,
        request_message: "please fix typo".to_string(),
    }
}

fn approval(request_id: DbId, admin: DbId, until: Timestamp) -> Resolution {
    Resolution {
        request: ResolveEditRequest {
            id: request_id,
            status: EditRequestStatus::Approved,
            response_message: Some("ok".into()),
            admin_user_id: admin,
            resolved_at: until - chrono::Duration::hours(24),
        },
        grant_until: Some(until),
    }
}

fn at(hour: u32) -> Timestamp {
    Utc.with_ymd_and_hms(2030, 1, 2, hour, 0, 0).unwrap()
}

async fn requests_for(pool: &PgPool, document: &DocumentRef) -> i64 {
    sqlx::query_scalar::<_, i64>(
        "SELECT COUNT(*) FROM edit_requests WHERE document_type = $1 AND document_id = $2",
    )
    .bind(document.kind.as_str())
    .bind(&document.id)
    .fetch_one(pool)
    .await
    .unwrap()
}

/// Wait until some session in this test's database is blocked on a lock.
async fn wait_for_lock_waiter(pool: &PgPool) {
    for _ in 0..250 {
        let waiting = sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM pg_stat_activity
             WHERE datname = current_database() AND wait_event_type = 'Lock'",
        )
        .fetch_one(pool)
        .await
        .unwrap();
        if waiting > 0 {
            return;
        }
        tokio::time::sleep(std::time::Duration::from_millis(20)).await;
    }
    panic!("No session ever blocked on a lock");
}

// ---------------------------------------------------------------------------
// Filing a request against a delete
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_delete_waits_for_request_being_filed(pool: PgPool) {
    let owner = new_user(&pool, "alice", Role::User).await;
    let doc = new_invoice(&pool, owner, "D1").await;
    let table = table_for(DocumentKind::Invoice);

    // Same steps as `insert_request`, held open so the delete has to queue.
    let mut filing = pool.begin().await.unwrap();
    assert!(table.lock_handle(&mut *filing, "D1").await.unwrap().is_some());
    EditRequestRepo::create(&mut *filing, &request_for(&doc, owner))
        .await
        .unwrap();

    let delete_pool = pool.clone();
    let delete = tokio::spawn(async move { table.delete(&delete_pool, "D1").await });
    wait_for_lock_waiter(&pool).await;

    filing.commit().await.unwrap();
    let deleted = delete.await.unwrap().unwrap();
    assert!(deleted.is_some());

    assert_eq!(requests_for(&pool, &doc).await, 0, "Delete left an orphaned request");

    // A document re-created under the same id starts with a clean ledger.
    new_invoice(&pool, owner, "D1").await;
    let store = PgEditRequestStore::new(pool.clone());
    let outcome = store.insert_request(&request_for(&doc, owner)).await.unwrap();
    assert_matches!(outcome, InsertOutcome::Created(_));
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_racing_request_and_delete_leave_no_orphans(pool: PgPool) {
    let owner = new_user(&pool, "alice", Role::User).await;
    let store = PgEditRequestStore::new(pool.clone());
    let table = table_for(DocumentKind::Invoice);

    for round in 0..10 {
        let id = format!("D{round}");
        let doc = new_invoice(&pool, owner, &id).await;
        let input = request_for(&doc, owner);

        let (filed, deleted) = tokio::join!(store.insert_request(&input), table.delete(&pool, &id));

        assert!(deleted.unwrap().is_some());
        assert_matches!(
            filed.unwrap(),
            InsertOutcome::Created(_) | InsertOutcome::DocumentMissing
        );
        assert_eq!(requests_for(&pool, &doc).await, 0, "Round {round} left an orphan");
    }
}

// ---------------------------------------------------------------------------
// Concurrent decisions
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_concurrent_approvals_apply_exactly_one_grant(pool: PgPool) {
    let owner = new_user(&pool, "alice", Role::User).await;
    let first_admin = new_user(&pool, "root", Role::Admin).await;
    let second_admin = new_user(&pool, "ops", Role::Admin).await;
    let doc = new_invoice(&pool, owner, "D1").await;
    let store = PgEditRequestStore::new(pool.clone());

    let InsertOutcome::Created(request) =
        store.insert_request(&request_for(&doc, owner)).await.unwrap()
    else {
        panic!("Request was not created");
    };

    let first = approval(request.id, first_admin, at(10));
    let second = approval(request.id, second_admin, at(20));
    let (a, b) = tokio::join!(store.resolve_request(&first), store.resolve_request(&second));

    let (winner, until) = match (a.unwrap(), b.unwrap()) {
        (ResolveOutcome::Resolved(r), ResolveOutcome::AlreadyResolved(s)) => {
            assert_eq!(s, EditRequestStatus::Approved);
            (r, at(10))
        }
        (ResolveOutcome::AlreadyResolved(s), ResolveOutcome::Resolved(r)) => {
            assert_eq!(s, EditRequestStatus::Approved);
            (r, at(20))
        }
        other => panic!("Expected exactly one approval to win, got {other:?}"),
    };

    let stored = EditRequestRepo::find_by_id(&pool, request.id).await.unwrap().unwrap();
    assert_eq!(stored, winner);
    assert_eq!(stored.status, "APPROVED");

    // Only the winner's grant reaches the document.
    let handle = table_for(DocumentKind::Invoice)
        .find_handle(&pool, "D1")
        .await
        .unwrap()
        .unwrap();
    assert!(handle.access.allow_editing);
    assert_eq!(handle.access.editable_until, Some(until));
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_approval_blocked_by_edit_is_invisible_until_commit(pool: PgPool) {
    let owner = new_user(&pool, "alice", Role::User).await;
    let admin = new_user(&pool, "root", Role::Admin).await;
    let doc = new_invoice(&pool, owner, "D1").await;
    let store = PgEditRequestStore::new(pool.clone());
    let table = table_for(DocumentKind::Invoice);

    let InsertOutcome::Created(request) =
        store.insert_request(&request_for(&doc, owner)).await.unwrap()
    else {
        panic!("Request was not created");
    };

    // An edit holds the document row, as the update handler does.
    let mut edit = pool.begin().await.unwrap();
    let seen = table.lock_handle(&mut *edit, "D1").await.unwrap().unwrap();
    assert!(!seen.access.allow_editing);

    let approving = store.clone();
    let resolution = approval(request.id, admin, at(10));
    let approve = tokio::spawn(async move { approving.resolve_request(&resolution).await });
    wait_for_lock_waiter(&pool).await;

    // Mid-approval, readers see neither half.
    let pending = EditRequestRepo::find_by_id(&pool, request.id).await.unwrap().unwrap();
    assert_eq!(pending.status, "PENDING");
    let handle = table.find_handle(&pool, "D1").await.unwrap().unwrap();
    assert!(!handle.access.allow_editing);

    edit.commit().await.unwrap();
    assert_matches!(approve.await.unwrap().unwrap(), ResolveOutcome::Resolved(_));

    // Afterwards, both halves together.
    let approved = EditRequestRepo::find_by_id(&pool, request.id).await.unwrap().unwrap();
    assert_eq!(approved.status, "APPROVED");
    let handle = table.find_handle(&pool, "D1").await.unwrap().unwrap();
    assert!(handle.access.allow_editing);
    assert_eq!(handle.access.editable_until, Some(at(10)));
}
