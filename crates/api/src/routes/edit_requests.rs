//! Route definitions for the `/edit-requests` resource.

use axum::routing::{get, put};
use axum::Router;

use crate::handlers::edit_requests;
use crate::state::AppState;

/// Routes mounted at `/edit-requests`.
///
/// ```text
/// GET  /              -> list (admin)
/// GET  /mine          -> mine
/// GET  /{id}          -> get
/// PUT  /{id}/approve  -> approve (admin)
/// PUT  /{id}/reject   -> reject (admin)
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(edit_requests::list))
        .route("/mine", get(edit_requests::mine))
        .route("/{id}", get(edit_requests::get))
        .route("/{id}/approve", put(edit_requests::approve))
        .route("/{id}/reject", put(edit_requests::reject))
}
