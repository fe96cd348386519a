//! Types shared by the three document repositories.

use chrono::NaiveDate;
use docket_core::types::DbId;
use serde::Serialize;

/// Filters accepted by document list queries. Already normalised and clamped.
#[derive(Debug, Clone, Default)]
pub struct DocumentFilter {
    /// Substring match on the kind's identifying field.
    pub q: Option<String>,
    pub owner_id: Option<DbId>,
    /// Inclusive lower bound on the document date.
    pub from: Option<NaiveDate>,
    /// Inclusive upper bound on the document date.
    pub to: Option<NaiveDate>,
    pub limit: i64,
    pub offset: i64,
}

/// A page of rows plus the unpaginated total.
#[derive(Debug, Clone, Serialize)]
pub struct Page<T: Serialize> {
    pub items: Vec<T>,
    pub total: i64,
    pub limit: i64,
    pub offset: i64,
}

/// Result of an update: the new row and, when the attachment was replaced,
/// the superseded path the caller should release once the commit is done.
#[derive(Debug, Clone)]
pub struct Updated<T> {
    pub document: T,
    pub superseded_attachment: Option<String>,
}

/// Result of a delete: the attachment path the caller should release once
/// the commit is done.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Deleted {
    pub attachment: Option<String>,
}

/// Which attachment (if any) an update leaves behind.
pub fn superseded_attachment(previous: Option<String>, replacement: Option<&str>) -> Option<String> {
    match (previous, replacement) {
        (Some(old), Some(new)) if old != new => Some(old),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn superseded_only_when_replaced_with_different_path() {
        assert_eq!(superseded_attachment(None, Some("a.pdf")), None);
        assert_eq!(superseded_attachment(Some("a.pdf".into()), None), None);
        assert_eq!(superseded_attachment(Some("a.pdf".into()), Some("a.pdf")), None);
        assert_eq!(
            superseded_attachment(Some("a.pdf".into()), Some("b.pdf")),
            Some("a.pdf".into())
        );
    }
}
