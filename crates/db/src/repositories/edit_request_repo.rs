//! Repository for the `edit_requests` ledger.

use docket_core::document::DocumentRef;
use docket_core::edit_request::{EditRequestStatus, STATUS_PENDING};
use docket_core::types::DbId;
use sqlx::{PgConnection, PgExecutor, PgPool};

use crate::models::edit_request::{CreateEditRequest, EditRequest, ResolveEditRequest};

const COLUMNS: &str = "id, document_type, document_id, status, request_message, \
    response_message, requested_by_id, admin_user_id, created_at, updated_at";

/// Name of the partial unique index enforcing one PENDING request per document.
pub const PENDING_UNIQUE_CONSTRAINT: &str = "uq_edit_requests_pending";

/// Provides ledger operations for edit requests.
pub struct EditRequestRepo;

impl EditRequestRepo {
    /// Insert a PENDING request.
    ///
    /// A concurrent insert for the same document fails with a unique
    /// violation on [`PENDING_UNIQUE_CONSTRAINT`].
    pub async fn create<'e>(
        executor: impl PgExecutor<'e>,
        input: &CreateEditRequest,
    ) -> Result<EditRequest, sqlx::Error> {
        let query = format!(
            "INSERT INTO edit_requests
                (document_type, document_id, status, request_message, requested_by_id)
             VALUES ($1, $2, '{STATUS_PENDING}', $3, $4)
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, EditRequest>(&query)
            .bind(input.document.kind.as_str())
            .bind(&input.document.id)
            .bind(&input.request_message)
            .bind(input.requested_by_id)
            .fetch_one(executor)
            .await
    }

    pub async fn find_by_id(pool: &PgPool, id: DbId) -> Result<Option<EditRequest>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM edit_requests WHERE id = $1");
        sqlx::query_as::<_, EditRequest>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// Load a request and lock it until the surrounding transaction ends, so
    /// racing decisions serialise on the status check.
    pub async fn find_by_id_for_update(
        conn: &mut PgConnection,
        id: DbId,
    ) -> Result<Option<EditRequest>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM edit_requests WHERE id = $1 FOR UPDATE");
        sqlx::query_as::<_, EditRequest>(&query)
            .bind(id)
            .fetch_optional(conn)
            .await
    }

    /// The PENDING request for a document, if one exists.
    pub async fn find_pending(
        pool: &PgPool,
        document: &DocumentRef,
    ) -> Result<Option<EditRequest>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM edit_requests
             WHERE document_type = $1 AND document_id = $2 AND status = '{STATUS_PENDING}'"
        );
        sqlx::query_as::<_, EditRequest>(&query)
            .bind(document.kind.as_str())
            .bind(&document.id)
            .fetch_optional(pool)
            .await
    }

    /// List requests, newest first. `status = None` lists every status.
    pub async fn list(
        pool: &PgPool,
        status: Option<EditRequestStatus>,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<EditRequest>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM edit_requests
             WHERE ($1::TEXT IS NULL OR status = $1)
             ORDER BY created_at DESC, id DESC
             LIMIT $2 OFFSET $3"
        );
        sqlx::query_as::<_, EditRequest>(&query)
            .bind(status.map(EditRequestStatus::as_str))
            .bind(limit)
            .bind(offset)
            .fetch_all(pool)
            .await
    }

    /// Count requests, optionally filtered by status and requester.
    pub async fn count(
        pool: &PgPool,
        status: Option<EditRequestStatus>,
        requested_by_id: Option<DbId>,
    ) -> Result<i64, sqlx::Error> {
        sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM edit_requests
             WHERE ($1::TEXT IS NULL OR status = $1)
               AND ($2::BIGINT IS NULL OR requested_by_id = $2)",
        )
        .bind(status.map(EditRequestStatus::as_str))
        .bind(requested_by_id)
        .fetch_one(pool)
        .await
    }

    /// A user's own requests, newest first.
    pub async fn list_for_user(
        pool: &PgPool,
        user_id: DbId,
    ) -> Result<Vec<EditRequest>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM edit_requests
             WHERE requested_by_id = $1
             ORDER BY created_at DESC, id DESC"
        );
        sqlx::query_as::<_, EditRequest>(&query)
            .bind(user_id)
            .fetch_all(pool)
            .await
    }

    /// Move a PENDING request to its terminal status.
    ///
    /// Returns `None` if the request is missing or no longer PENDING.
    pub async fn resolve(
        conn: &mut PgConnection,
        input: &ResolveEditRequest,
    ) -> Result<Option<EditRequest>, sqlx::Error> {
        let query = format!(
            "UPDATE edit_requests SET
                status = $2,
                response_message = $3,
                admin_user_id = $4,
                updated_at = $5
             WHERE id = $1 AND status = '{STATUS_PENDING}'
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, EditRequest>(&query)
            .bind(input.id)
            .bind(input.status.as_str())
            .bind(&input.response_message)
            .bind(input.admin_user_id)
            .bind(input.resolved_at)
            .fetch_optional(conn)
            .await
    }
}
