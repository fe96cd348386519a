//! The publish seam used by the edit-request workflow.

use docket_core::rooms::Room;

use crate::bus::{EventBus, RealtimeEvent};

#[derive(Debug, thiserror::Error)]
pub enum NotifyError {
    #[error("Failed to encode notification payload: {0}")]
    Payload(#[from] serde_json::Error),

    #[error("Notification transport unavailable: {0}")]
    Transport(String),
}

/// Fire-and-forget delivery of an event to the members of a room.
///
/// Delivery is at-most-once to currently connected subscribers. Callers log
/// and drop errors; nothing here is part of a transaction.
pub trait Notifier: Send + Sync {
    fn publish(&self, room: Room, event: &str, payload: serde_json::Value)
        -> Result<(), NotifyError>;
}

impl Notifier for EventBus {
    fn publish(
        &self,
        room: Room,
        event: &str,
        payload: serde_json::Value,
    ) -> Result<(), NotifyError> {
        let delivered =
            EventBus::publish(self, RealtimeEvent::new(room, event).with_payload(payload));
        tracing::debug!(room = %room, event, delivered, "Published realtime event");
        Ok(())
    }
}

/// Drops every event.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopNotifier;

impl Notifier for NoopNotifier {
    fn publish(
        &self,
        room: Room,
        event: &str,
        _payload: serde_json::Value,
    ) -> Result<(), NotifyError> {
        tracing::trace!(room = %room, event, "Realtime transport disabled; event dropped");
        Ok(())
    }
}
