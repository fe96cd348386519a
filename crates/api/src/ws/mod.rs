//! WebSocket infrastructure for real-time edit-request notifications.
//!
//! Connections authenticate with `?token=`, then join rooms: admins start
//! in `admins`, and any client may ask to join the per-request room of a
//! request it filed.

mod handler;
mod heartbeat;
pub mod manager;
pub mod protocol;

pub use handler::ws_handler;
pub use heartbeat::start_heartbeat;
pub use manager::WsManager;
