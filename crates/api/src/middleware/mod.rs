//! Authentication and authorization extractors.
//!
//! - [`auth::AuthUser`] -- the authenticated caller, from a JWT Bearer token.
//! - [`rbac::RequireAdmin`] -- requires the `ADMIN` role.

pub mod auth;
pub mod rbac;
