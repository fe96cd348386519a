//! Document kinds and references.
//!
//! The three document kinds share the same permission columns, so everything
//! above the data-access layer works on a [`DocumentRef`] (kind + external id)
//! instead of one nullable foreign key per kind.

use serde::{Deserialize, Serialize};

use crate::error::CoreError;
use crate::permission::DocumentAccess;

/// Stored value for invoice references in `edit_requests.document_type`.
pub const DOCUMENT_INVOICE: &str = "INVOICE";
/// Stored value for purchase-order references.
pub const DOCUMENT_PURCHASE_ORDER: &str = "PURCHASE_ORDER";
/// Stored value for stock-register references.
pub const DOCUMENT_STOCK_REGISTER: &str = "STOCK_REGISTER";

/// Maximum length of an externally supplied document identifier.
pub const MAX_DOCUMENT_ID_LEN: usize = 64;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DocumentKind {
    Invoice,
    PurchaseOrder,
    StockRegister,
}

impl DocumentKind {
    pub const ALL: [DocumentKind; 3] = [
        DocumentKind::Invoice,
        DocumentKind::PurchaseOrder,
        DocumentKind::StockRegister,
    ];

    /// Value stored in `edit_requests.document_type`.
    pub fn as_str(self) -> &'static str {
        match self {
            DocumentKind::Invoice => DOCUMENT_INVOICE,
            DocumentKind::PurchaseOrder => DOCUMENT_PURCHASE_ORDER,
            DocumentKind::StockRegister => DOCUMENT_STOCK_REGISTER,
        }
    }

    pub fn parse(value: &str) -> Result<Self, CoreError> {
        match value {
            DOCUMENT_INVOICE => Ok(DocumentKind::Invoice),
            DOCUMENT_PURCHASE_ORDER => Ok(DocumentKind::PurchaseOrder),
            DOCUMENT_STOCK_REGISTER => Ok(DocumentKind::StockRegister),
            other => Err(CoreError::Validation(format!(
                "Unknown document type '{other}'"
            ))),
        }
    }

    /// Entity name used in `NotFound` errors and log fields.
    pub fn entity_name(self) -> &'static str {
        match self {
            DocumentKind::Invoice => "Invoice",
            DocumentKind::PurchaseOrder => "PurchaseOrder",
            DocumentKind::StockRegister => "StockRegisterEntry",
        }
    }

    /// Human-readable name used in notification summaries.
    pub fn display_name(self) -> &'static str {
        match self {
            DocumentKind::Invoice => "Invoice",
            DocumentKind::PurchaseOrder => "Purchase order",
            DocumentKind::StockRegister => "Stock register entry",
        }
    }

    /// URL path segment under `/api/v1`.
    pub fn route_segment(self) -> &'static str {
        match self {
            DocumentKind::Invoice => "invoices",
            DocumentKind::PurchaseOrder => "purchase-orders",
            DocumentKind::StockRegister => "stock-register",
        }
    }
}

impl std::fmt::Display for DocumentKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Tagged reference to one document of any kind.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DocumentRef {
    pub kind: DocumentKind,
    pub id: String,
}

impl DocumentRef {
    pub fn new(kind: DocumentKind, id: impl Into<String>) -> Self {
        Self {
            kind,
            id: id.into(),
        }
    }

    pub fn not_found(&self) -> CoreError {
        CoreError::not_found(self.kind.entity_name(), &self.id)
    }

    /// Directory this document's attachments live under, e.g. `invoices/INV-1/`.
    pub fn attachment_prefix(&self) -> String {
        format!("{}/{}/", self.kind.route_segment(), self.id)
    }

    /// Whether `path` is a file under [`Self::attachment_prefix`].
    pub fn owns_attachment(&self, path: &str) -> bool {
        let Some(name) = path.strip_prefix(&self.attachment_prefix()) else {
            return false;
        };
        !name.is_empty()
            && !name.contains('\\')
            && name.split('/').all(|part| !part.is_empty() && part != "." && part != "..")
    }

    /// Reject an attachment path that does not belong to this document.
    pub fn validate_attachment(&self, path: Option<&str>) -> Result<(), CoreError> {
        match path {
            Some(path) if !self.owns_attachment(path) => Err(CoreError::Validation(format!(
                "attachment_path must be a file under '{}'",
                self.attachment_prefix()
            ))),
            _ => Ok(()),
        }
    }
}

impl std::fmt::Display for DocumentRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}", self.kind, self.id)
    }
}

/// A document's permission state plus the identifying field used in
/// notification summaries (company name, PO number, article name).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocumentHandle {
    pub reference: DocumentRef,
    pub access: DocumentAccess,
    pub label: String,
}

impl DocumentHandle {
    /// e.g. `Purchase order PO-2024-117`.
    pub fn summary(&self) -> String {
        format!("{} {}", self.reference.kind.display_name(), self.label)
    }
}

/// Validate an externally supplied document identifier.
pub fn validate_document_id(id: &str) -> Result<(), CoreError> {
    let trimmed = id.trim();
    if trimmed.is_empty() {
        return Err(CoreError::Validation("Document id must not be empty".into()));
    }
    if trimmed.len() != id.len() {
        return Err(CoreError::Validation(
            "Document id must not have surrounding whitespace".into(),
        ));
    }
    if id.len() > MAX_DOCUMENT_ID_LEN {
        return Err(CoreError::Validation(format!(
            "Document id must be at most {MAX_DOCUMENT_ID_LEN} characters"
        )));
    }
    if id.contains('/') {
        return Err(CoreError::Validation(
            "Document id must not contain '/'".into(),
        ));
    }
    Ok(())
}
