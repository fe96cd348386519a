//! Repository layer: one zero-sized struct per table with async CRUD methods.
//!
//! Pool-level methods take `&PgPool`; methods that must run inside a caller's
//! transaction take `&mut PgConnection` (pass `&mut *tx`).

pub mod dashboard_repo;
pub mod document_table;
pub mod edit_request_repo;
pub mod invoice_repo;
pub mod purchase_order_repo;
pub mod stock_register_repo;
pub mod user_repo;

pub use dashboard_repo::DashboardRepo;
pub use document_table::{table_for, DocumentTable};
pub use edit_request_repo::EditRequestRepo;
pub use invoice_repo::InvoiceRepo;
pub use purchase_order_repo::PurchaseOrderRepo;
pub use stock_register_repo::StockRegisterRepo;
pub use user_repo::UserRepo;
