//! Real-time room and event names.
//!
//! These must match what browser clients subscribe to over `/api/v1/ws`.

use serde::{Serialize, Serializer};

use crate::types::DbId;

/// Room shared by every connected admin session.
pub const ROOM_ADMINS: &str = "admins";

/// Prefix of the per-request room; the request id is appended.
pub const ROOM_EDIT_REQUEST_PREFIX: &str = "edit-request-update-";

/// Published to [`Room::Admins`] when a user files a new edit request.
pub const EVENT_NEW_EDIT_REQUEST: &str = "new-edit-request";

/// Published to [`Room::EditRequest`] when an admin approves or rejects.
pub const EVENT_EDIT_REQUEST_UPDATE: &str = "edit-request-update";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Room {
    Admins,
    EditRequest(DbId),
}

impl Room {
    pub fn name(&self) -> String {
        match self {
            Room::Admins => ROOM_ADMINS.to_string(),
            Room::EditRequest(id) => format!("{ROOM_EDIT_REQUEST_PREFIX}{id}"),
        }
    }

    /// Parse a room name sent by a client. Unknown names yield `None`.
    pub fn parse(name: &str) -> Option<Self> {
        if name == ROOM_ADMINS {
            return Some(Room::Admins);
        }
        name.strip_prefix(ROOM_EDIT_REQUEST_PREFIX)
            .and_then(|id| id.parse::<DbId>().ok())
            .filter(|id| *id > 0)
            .map(Room::EditRequest)
    }
}

impl std::fmt::Display for Room {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.name())
    }
}

impl Serialize for Room {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.name())
    }
}
