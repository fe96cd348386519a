//! JSON frames exchanged over `/api/v1/ws`.
//!
//! Inbound: `{"action":"subscribe","room":"edit-request-update-42"}` and
//! `{"action":"unsubscribe", ...}`. Outbound event frames are serialized
//! [`docket_events::RealtimeEvent`]s; acknowledgements and errors use
//! [`ServerMessage`].

use docket_core::roles::Role;
use docket_core::rooms::Room;
use docket_core::types::DbId;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(tag = "action", rename_all = "lowercase")]
pub enum ClientMessage {
    Subscribe { room: String },
    Unsubscribe { room: String },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "event", rename_all = "kebab-case")]
pub enum ServerMessage {
    Subscribed { room: String },
    Unsubscribed { room: String },
    Error { message: String },
}

impl ServerMessage {
    pub fn error(message: impl Into<String>) -> Self {
        ServerMessage::Error {
            message: message.into(),
        }
    }
}

/// Whether a user may join `room`.
///
/// `requested_by` is the requester of the edit request behind a per-request
/// room, or `None` if the request does not exist (or was not looked up).
pub fn may_join(room: &Room, user_id: DbId, role: Role, requested_by: Option<DbId>) -> bool {
    if role.is_admin() {
        return true;
    }
    match room {
        Room::Admins => false,
        Room::EditRequest(_) => requested_by == Some(user_id),
    }
}
