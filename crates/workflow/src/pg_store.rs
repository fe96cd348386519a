//! Postgres-backed [`EditRequestStore`].

use async_trait::async_trait;
use docket_core::document::{DocumentHandle, DocumentRef};
use docket_core::types::DbId;
use docket_db::models::edit_request::{CreateEditRequest, EditRequest};
use docket_db::repositories::edit_request_repo::PENDING_UNIQUE_CONSTRAINT;
use docket_db::repositories::{table_for, EditRequestRepo, UserRepo};
use sqlx::PgPool;

use crate::error::WorkflowError;
use crate::store::{EditRequestStore, InsertOutcome, Resolution, ResolveOutcome};

#[derive(Clone)]
pub struct PgEditRequestStore {
    pool: PgPool,
}

impl PgEditRequestStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

fn is_pending_conflict(err: &sqlx::Error) -> bool {
    err.as_database_error().is_some_and(|db| {
        db.code().as_deref() == Some("23505") && db.constraint() == Some(PENDING_UNIQUE_CONSTRAINT)
    })
}

#[async_trait]
impl EditRequestStore for PgEditRequestStore {
    async fn find_document(
        &self,
        document: &DocumentRef,
    ) -> Result<Option<DocumentHandle>, WorkflowError> {
        Ok(table_for(document.kind)
            .find_handle(&self.pool, &document.id)
            .await?)
    }

    async fn find_pending(
        &self,
        document: &DocumentRef,
    ) -> Result<Option<EditRequest>, WorkflowError> {
        Ok(EditRequestRepo::find_pending(&self.pool, document).await?)
    }

    async fn insert_request(
        &self,
        input: &CreateEditRequest,
    ) -> Result<InsertOutcome, WorkflowError> {
        let mut tx = self.pool.begin().await?;

        // Holding the document row keeps a concurrent delete from orphaning
        // the new request.
        let handle = table_for(input.document.kind)
            .lock_handle(&mut *tx, &input.document.id)
            .await?;
        if handle.is_none() {
            return Ok(InsertOutcome::DocumentMissing);
        }

        match EditRequestRepo::create(&mut *tx, input).await {
            Ok(request) => {
                tx.commit().await?;
                Ok(InsertOutcome::Created(request))
            }
            Err(err) if is_pending_conflict(&err) => Ok(InsertOutcome::DuplicatePending),
            Err(err) => Err(err.into()),
        }
    }

    async fn find_request(&self, id: DbId) -> Result<Option<EditRequest>, WorkflowError> {
        Ok(EditRequestRepo::find_by_id(&self.pool, id).await?)
    }

    async fn resolve_request(
        &self,
        resolution: &Resolution,
    ) -> Result<ResolveOutcome, WorkflowError> {
        let mut tx = self.pool.begin().await?;

        let Some(current) =
            EditRequestRepo::find_by_id_for_update(&mut *tx, resolution.request.id).await?
        else {
            return Ok(ResolveOutcome::Missing);
        };
        let status = current.status()?;
        if status.is_terminal() {
            return Ok(ResolveOutcome::AlreadyResolved(status));
        }

        if let Some(until) = resolution.grant_until {
            let document = current.document()?;
            let granted = table_for(document.kind)
                .apply_grant(&mut *tx, &document.id, until)
                .await?;
            if !granted {
                return Ok(ResolveOutcome::Missing);
            }
        }

        let Some(resolved) = EditRequestRepo::resolve(&mut *tx, &resolution.request).await? else {
            return Ok(ResolveOutcome::Missing);
        };

        tx.commit().await?;
        Ok(ResolveOutcome::Resolved(resolved))
    }

    async fn find_username(&self, user_id: DbId) -> Result<Option<String>, WorkflowError> {
        Ok(UserRepo::find_username(&self.pool, user_id).await?)
    }
}
