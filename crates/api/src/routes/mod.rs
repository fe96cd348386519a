pub mod admin;
pub mod auth;
pub mod dashboard;
pub mod documents;
pub mod edit_requests;
pub mod health;

use axum::routing::get;
use axum::Router;

use crate::handlers::documents::{Invoices, PurchaseOrders, StockRegister};
use crate::state::AppState;
use crate::ws;

/// Build the `/api/v1` route tree.
///
/// Route hierarchy:
///
/// ```text
/// /ws?token=...                                    WebSocket (rooms)
///
/// /auth/register                                   register (public)
/// /auth/login                                      login (public)
/// /auth/me                                         current user
///
/// /admin/users                                     create user (admin only)
///
/// /invoices                                        list, create
/// /invoices/{id}                                   get, update, delete
/// /invoices/{id}/edit-permission                   current edit decision
/// /invoices/{id}/request-edit                      file an edit request (POST)
/// /purchase-orders/...                             same shape as /invoices
/// /stock-register/...                              same shape as /invoices
///
/// /edit-requests                                   list (admin only)
/// /edit-requests/mine                              caller's own requests
/// /edit-requests/{id}                              get (admin or requester)
/// /edit-requests/{id}/approve                      approve (admin only, PUT)
/// /edit-requests/{id}/reject                       reject (admin only, PUT)
///
/// /dashboard/summary                               counts
/// ```
pub fn api_routes() -> Router<AppState> {
    Router::new()
        // WebSocket: admin announcements and per-request updates.
        .route("/ws", get(ws::ws_handler))
        .nest("/auth", auth::router())
        .nest("/admin", admin::router())
        .nest("/invoices", documents::router::<Invoices>())
        .nest("/purchase-orders", documents::router::<PurchaseOrders>())
        .nest("/stock-register", documents::router::<StockRegister>())
        .nest("/edit-requests", edit_requests::router())
        .nest("/dashboard", dashboard::router())
}
