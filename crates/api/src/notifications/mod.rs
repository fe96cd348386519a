//! Delivery of bus events to WebSocket rooms.
//!
//! The [`RoomRouter`] subscribes to the event bus and forwards each event to
//! the sockets joined to its room.

pub mod router;

pub use router::RoomRouter;
