//! Attachment file release.
//!
//! Documents only reference attachments by path. When an update replaces
//! the path, or the document is deleted, the old file is removed here after
//! the database change has committed. Failures are logged, never surfaced.
//!
//! A document may only release files under its own
//! [`DocumentRef::attachment_prefix`].

use std::path::{Component, Path, PathBuf};

use docket_core::document::DocumentRef;

/// Resolves stored attachment paths against a root directory.
#[derive(Debug, Clone)]
pub struct AttachmentStore {
    root: PathBuf,
}

impl AttachmentStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Map a stored path onto the root. Absolute paths and paths that climb
    /// out with `..` are refused.
    pub fn resolve(&self, stored: &str) -> Option<PathBuf> {
        let relative = Path::new(stored.trim());
        if relative.as_os_str().is_empty() {
            return None;
        }
        let contained = relative
            .components()
            .all(|c| matches!(c, Component::Normal(_) | Component::CurDir));
        contained.then(|| self.root.join(relative))
    }

    /// Remove an attachment that `document` no longer references. Missing
    /// files are not an error.
    pub async fn release(&self, document: &DocumentRef, stored: &str) {
        if !document.owns_attachment(stored) {
            tracing::warn!(
                document = %document,
                path = stored,
                "Refusing to release attachment owned by another document",
            );
            return;
        }
        let Some(path) = self.resolve(stored) else {
            tracing::warn!(path = stored, "Refusing to release attachment outside root");
            return;
        };

        match tokio::fs::remove_file(&path).await {
            Ok(()) => tracing::info!(path = %path.display(), "Attachment released"),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::debug!(path = %path.display(), "Attachment already gone");
            }
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "Failed to release attachment");
            }
        }
    }
}
