//! Edit request status machine and message validation.
//!
//! ```text
//! PENDING --approve--> APPROVED   (terminal)
//! PENDING --reject---> REJECTED   (terminal)
//! ```

use serde::{Deserialize, Serialize};

use crate::error::CoreError;

pub const STATUS_PENDING: &str = "PENDING";
pub const STATUS_APPROVED: &str = "APPROVED";
pub const STATUS_REJECTED: &str = "REJECTED";

/// Query value meaning "no status filter".
pub const STATUS_FILTER_ALL: &str = "ALL";

/// Upper bound on request and response messages.
pub const MAX_MESSAGE_LEN: usize = 2000;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum EditRequestStatus {
    Pending,
    Approved,
    Rejected,
}

impl EditRequestStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            EditRequestStatus::Pending => STATUS_PENDING,
            EditRequestStatus::Approved => STATUS_APPROVED,
            EditRequestStatus::Rejected => STATUS_REJECTED,
        }
    }

    pub fn parse(value: &str) -> Result<Self, CoreError> {
        match value {
            STATUS_PENDING => Ok(EditRequestStatus::Pending),
            STATUS_APPROVED => Ok(EditRequestStatus::Approved),
            STATUS_REJECTED => Ok(EditRequestStatus::Rejected),
            other => Err(CoreError::Validation(format!(
                "Invalid edit request status '{other}'"
            ))),
        }
    }

    pub fn is_terminal(self) -> bool {
        self != EditRequestStatus::Pending
    }

    /// Fail with `Conflict("already {status}")` unless the request is pending.
    pub fn ensure_pending(self) -> Result<(), CoreError> {
        if self.is_terminal() {
            return Err(CoreError::Conflict(format!(
                "Edit request already {}",
                self.as_str().to_ascii_lowercase()
            )));
        }
        Ok(())
    }
}

impl std::fmt::Display for EditRequestStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An admin decision on a pending request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    Approve,
    Reject,
}

impl Decision {
    /// The terminal status a decision moves a request into.
    pub fn target_status(self) -> EditRequestStatus {
        match self {
            Decision::Approve => EditRequestStatus::Approved,
            Decision::Reject => EditRequestStatus::Rejected,
        }
    }
}

/// `?status=` filter for listing requests.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusFilter {
    All,
    Only(EditRequestStatus),
}

impl StatusFilter {
    /// Parse an optional query value; absent means `PENDING`.
    pub fn parse(value: Option<&str>) -> Result<Self, CoreError> {
        match value.map(str::trim) {
            None | Some("") => Ok(StatusFilter::Only(EditRequestStatus::Pending)),
            Some(v) if v.eq_ignore_ascii_case(STATUS_FILTER_ALL) => Ok(StatusFilter::All),
            Some(v) => EditRequestStatus::parse(&v.to_ascii_uppercase()).map(StatusFilter::Only),
        }
    }

    pub fn status(self) -> Option<EditRequestStatus> {
        match self {
            StatusFilter::All => None,
            StatusFilter::Only(status) => Some(status),
        }
    }
}

/// Validate and trim the message attached to a new request.
pub fn validate_request_message(message: Option<&str>) -> Result<String, CoreError> {
    let trimmed = message.map(str::trim).unwrap_or_default();
    if trimmed.is_empty() {
        return Err(CoreError::Validation("Request message is required".into()));
    }
    check_length(trimmed)?;
    Ok(trimmed.to_string())
}

/// Validate the admin's response. Rejections must carry a reason.
pub fn validate_response_message(
    decision: Decision,
    message: Option<&str>,
) -> Result<Option<String>, CoreError> {
    let trimmed = message.map(str::trim).filter(|m| !m.is_empty());
    match (decision, trimmed) {
        (Decision::Reject, None) => Err(CoreError::Validation(
            "A rejection reason is required".into(),
        )),
        (_, Some(m)) => {
            check_length(m)?;
            Ok(Some(m.to_string()))
        }
        (Decision::Approve, None) => Ok(None),
    }
}

fn check_length(message: &str) -> Result<(), CoreError> {
    if message.chars().count() > MAX_MESSAGE_LEN {
        return Err(CoreError::Validation(format!(
            "Message must be at most {MAX_MESSAGE_LEN} characters"
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_pending_may_transition() {
        assert!(EditRequestStatus::Pending.ensure_pending().is_ok());

        let err = EditRequestStatus::Approved.ensure_pending().unwrap_err();
        assert_eq!(err.to_string(), "Conflict: Edit request already approved");

        let err = EditRequestStatus::Rejected.ensure_pending().unwrap_err();
        assert!(matches!(err, CoreError::Conflict(_)));
    }

    #[test]
    fn decisions_map_to_terminal_statuses() {
        assert_eq!(Decision::Approve.target_status(), EditRequestStatus::Approved);
        assert_eq!(Decision::Reject.target_status(), EditRequestStatus::Rejected);
        assert!(Decision::Approve.target_status().is_terminal());
        assert!(Decision::Reject.target_status().is_terminal());
    }

    #[test]
    fn status_filter_defaults_to_pending() {
        assert_eq!(
            StatusFilter::parse(None).unwrap(),
            StatusFilter::Only(EditRequestStatus::Pending)
        );
        assert_eq!(StatusFilter::parse(Some("ALL")).unwrap(), StatusFilter::All);
        assert_eq!(StatusFilter::parse(Some("all")).unwrap().status(), None);
        assert_eq!(
            StatusFilter::parse(Some("rejected")).unwrap(),
            StatusFilter::Only(EditRequestStatus::Rejected)
        );
        assert!(StatusFilter::parse(Some("CANCELLED")).is_err());
    }

    #[test]
    fn request_message_is_required_and_trimmed() {
        assert!(validate_request_message(None).is_err());
        assert!(validate_request_message(Some("   ")).is_err());
        assert_eq!(
            validate_request_message(Some("  please fix typo ")).unwrap(),
            "please fix typo"
        );
        assert!(validate_request_message(Some(&"a".repeat(MAX_MESSAGE_LEN + 1))).is_err());
    }

    #[test]
    fn rejection_requires_reason_but_approval_does_not() {
        assert!(validate_response_message(Decision::Reject, None).is_err());
        assert!(validate_response_message(Decision::Reject, Some("  ")).is_err());
        assert_eq!(
            validate_response_message(Decision::Reject, Some("insufficient detail")).unwrap(),
            Some("insufficient detail".to_string())
        );
        assert_eq!(validate_response_message(Decision::Approve, None).unwrap(), None);
        assert_eq!(
            validate_response_message(Decision::Approve, Some(" ok ")).unwrap(),
            Some("ok".to_string())
        );
    }
}
