//! Docket real-time notification fan-out.
//!
//! - [`Notifier`] is the seam the edit-request workflow publishes through.
//! - [`EventBus`] is the in-process implementation, backed by
//!   `tokio::sync::broadcast`; the API server forwards its events to
//!   WebSocket rooms.
//! - [`NoopNotifier`] drops everything, for deployments without a
//!   real-time transport.

pub mod bus;
pub mod notifier;

pub use bus::{EventBus, RealtimeEvent};
pub use notifier::{NoopNotifier, Notifier, NotifyError};
