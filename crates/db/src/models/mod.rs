//! Domain model structs and DTOs.
//!
//! Each submodule contains:
//! - A `FromRow` + `Serialize` entity struct matching the database row
//! - A `Deserialize` create DTO for inserts
//! - A `Deserialize` update DTO (all `Option` fields) for patches

pub mod dashboard;
pub mod document;
pub mod edit_request;
pub mod invoice;
pub mod line_item;
pub mod purchase_order;
pub mod stock_register;
pub mod user;
