//! Event-to-room forwarding loop.

use std::sync::Arc;

use axum::extract::ws::Message;
use docket_events::RealtimeEvent;
use tokio::sync::broadcast;

use crate::ws::WsManager;

/// Forwards [`RealtimeEvent`]s to the WebSocket connections joined to the
/// event's room.
///
/// Delivery is at-most-once: nobody in the room means nobody sees the
/// event, and a lagging router skips what it missed.
pub struct RoomRouter {
    ws_manager: Arc<WsManager>,
}

impl RoomRouter {
    pub fn new(ws_manager: Arc<WsManager>) -> Self {
        Self { ws_manager }
    }

    /// Run the routing loop until the bus is dropped.
    pub async fn run(self, mut receiver: broadcast::Receiver<RealtimeEvent>) {
        loop {
            match receiver.recv().await {
                Ok(event) => {
                    self.deliver(&event).await;
                }
                Err(broadcast::error::RecvError::Lagged(n)) => {
                    tracing::warn!(skipped = n, "Room router lagged");
                }
                Err(broadcast::error::RecvError::Closed) => {
                    tracing::info!("Event bus closed, room router shutting down");
                    break;
                }
            }
        }
    }

    /// Serialize one event and queue it for every member of its room.
    ///
    /// Returns the number of connections it was queued for.
    pub async fn deliver(&self, event: &RealtimeEvent) -> usize {
        let json = match serde_json::to_string(event) {
            Ok(json) => json,
            Err(e) => {
                tracing::warn!(error = %e, event = %event.event, "Failed to serialize event");
                return 0;
            }
        };

        let delivered = self
            .ws_manager
            .send_to_room(&event.room, Message::Text(json.into()))
            .await;
        tracing::debug!(room = %event.room, event = %event.event, delivered, "Event delivered");
        delivered
    }
}
