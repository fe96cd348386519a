//! Edit permission evaluator.
//!
//! [`can_edit`] decides whether an actor may mutate a document at a given
//! instant. It is pure and cheap; callers re-evaluate it on every mutating
//! request because both `now` and `editable_until` move between calls.

use chrono::Duration;
use serde::Serialize;

use crate::error::CoreError;
use crate::roles::Role;
use crate::types::{DbId, Timestamp};

/// Default self-edit window after creation (hours).
pub const DEFAULT_INITIAL_EDIT_WINDOW_HOURS: i64 = 24;

/// Default lifetime of an admin-approved grant (hours).
pub const DEFAULT_GRANT_DURATION_HOURS: i64 = 24;

/// Time-window policy applied to every document kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EditPolicy {
    /// How long the owner may edit freely after creation.
    pub initial_window: Duration,
    /// How long an approved edit request keeps the document editable.
    pub grant_duration: Duration,
}

impl EditPolicy {
    /// Build a policy from hour counts. Both must be positive.
    pub fn from_hours(initial_window_hours: i64, grant_duration_hours: i64) -> Result<Self, CoreError> {
        if initial_window_hours <= 0 || grant_duration_hours <= 0 {
            return Err(CoreError::Validation(
                "Edit window and grant duration must be positive".into(),
            ));
        }
        Ok(Self {
            initial_window: Duration::hours(initial_window_hours),
            grant_duration: Duration::hours(grant_duration_hours),
        })
    }

    /// `editable_until` for a grant approved at `now`.
    pub fn grant_expiry(&self, now: Timestamp) -> Timestamp {
        now + self.grant_duration
    }

    /// End of the owner's free-edit window for a document created at `created_at`.
    pub fn initial_window_end(&self, created_at: Timestamp) -> Timestamp {
        created_at + self.initial_window
    }
}

impl Default for EditPolicy {
    fn default() -> Self {
        Self {
            initial_window: Duration::hours(DEFAULT_INITIAL_EDIT_WINDOW_HOURS),
            grant_duration: Duration::hours(DEFAULT_GRANT_DURATION_HOURS),
        }
    }
}

/// The permission-relevant columns of a document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocumentAccess {
    pub owner_id: DbId,
    pub created_at: Timestamp,
    pub allow_editing: bool,
    pub editable_until: Option<Timestamp>,
}

/// The authenticated caller, as supplied by the auth layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Actor {
    pub user_id: DbId,
    pub role: Role,
}

impl Actor {
    pub fn new(user_id: DbId, role: Role) -> Self {
        Self { user_id, role }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AllowReason {
    Admin,
    InitialWindow,
    Grant,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DenyReason {
    NotOwner,
    /// Initial window closed and no grant was ever approved.
    WindowClosed,
    /// A grant exists but `editable_until` has passed.
    GrantExpired,
}

impl DenyReason {
    pub fn message(self) -> &'static str {
        match self {
            DenyReason::NotOwner => "Only the document owner may edit this document",
            DenyReason::WindowClosed => {
                "The edit window has closed; request edit permission from an administrator"
            }
            DenyReason::GrantExpired => {
                "The approved edit permission has expired; submit a new edit request"
            }
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EditDenial {
    pub reason: DenyReason,
    /// True when requesting permission is the appropriate next step
    /// (window closed and no grant flag set).
    pub needs_permission_request: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EditDecision {
    Allow(AllowReason),
    Deny(EditDenial),
}

impl EditDecision {
    pub fn is_allowed(&self) -> bool {
        matches!(self, EditDecision::Allow(_))
    }
}

/// Decide whether `actor` may edit the document described by `access` at `now`.
pub fn can_edit(
    access: &DocumentAccess,
    actor: &Actor,
    now: Timestamp,
    policy: &EditPolicy,
) -> EditDecision {
    if actor.role.is_admin() {
        return EditDecision::Allow(AllowReason::Admin);
    }

    if actor.user_id != access.owner_id {
        return EditDecision::Deny(EditDenial {
            reason: DenyReason::NotOwner,
            needs_permission_request: false,
        });
    }

    let within_initial_window = now - access.created_at < policy.initial_window;
    if within_initial_window {
        return EditDecision::Allow(AllowReason::InitialWindow);
    }

    let has_valid_grant =
        access.allow_editing && access.editable_until.map_or(true, |until| now < until);
    if has_valid_grant {
        return EditDecision::Allow(AllowReason::Grant);
    }

    let reason = if access.allow_editing {
        DenyReason::GrantExpired
    } else {
        DenyReason::WindowClosed
    };
    EditDecision::Deny(EditDenial {
        reason,
        needs_permission_request: !access.allow_editing,
    })
}
