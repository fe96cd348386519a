//! Route definitions shared by every document kind.

use axum::routing::{get, post};
use axum::Router;

use crate::handlers::documents::{self, DocumentResource};
use crate::state::AppState;

/// Routes for one document kind, mounted at its segment
/// (`/invoices`, `/purchase-orders`, `/stock-register`).
///
/// ```text
/// GET    /                       -> list
/// POST   /                       -> create
/// GET    /{id}                   -> get
/// PUT    /{id}                   -> update
/// DELETE /{id}                   -> delete
/// GET    /{id}/edit-permission   -> edit_permission
/// POST   /{id}/request-edit      -> request_edit
/// ```
pub fn router<R: DocumentResource>() -> Router<AppState> {
    Router::new()
        .route("/", get(documents::list::<R>).post(documents::create::<R>))
        .route(
            "/{id}",
            get(documents::get::<R>)
                .put(documents::update::<R>)
                .delete(documents::delete::<R>),
        )
        .route("/{id}/edit-permission", get(documents::edit_permission::<R>))
        .route("/{id}/request-edit", post(documents::request_edit::<R>))
}
