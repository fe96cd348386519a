//! Request handlers, grouped by resource.

pub mod admin;
pub mod auth;
pub mod dashboard;
pub mod documents;
pub mod edit_requests;
