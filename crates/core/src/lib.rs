//! Pure domain logic for the docket document backend.
//!
//! Nothing in this crate performs I/O. Database access lives in `docket-db`,
//! orchestration in `docket-workflow`, and HTTP in `docket-api`.

pub mod document;
pub mod edit_request;
pub mod error;
pub mod permission;
pub mod roles;
pub mod rooms;
pub mod search;
pub mod types;
