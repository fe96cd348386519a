//! The edit-request workflow: filing requests against closed documents and
//! applying admin decisions.
//!
//! [`EditRequestWorkflow`] holds the rules and is generic over an
//! [`EditRequestStore`]. [`PgEditRequestStore`] is the Postgres
//! implementation; it performs approval (grant + ledger update) in a single
//! transaction.

pub mod error;
pub mod pg_store;
pub mod service;
pub mod store;

pub use error::WorkflowError;
pub use pg_store::PgEditRequestStore;
pub use service::EditRequestWorkflow;
pub use store::{EditRequestStore, InsertOutcome, Resolution, ResolveOutcome};
