//! Route definitions for `/admin`.

use axum::routing::post;
use axum::Router;

use crate::handlers::admin;
use crate::state::AppState;

/// Routes mounted at `/admin`.
///
/// ```text
/// POST /users -> create_user
/// ```
pub fn router() -> Router<AppState> {
    Router::new().route("/users", post(admin::create_user))
}
