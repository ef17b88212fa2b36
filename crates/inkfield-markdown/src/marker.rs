//! Upload markers: live objects tracking one in-buffer image attachment
//! through its upload lifecycle.
//!
//! A marker is created `Pending` when the user triggers an insertion, or
//! `Success` when the parser seeds it from an already-uploaded image
//! reference. It settles exactly once - to `Success` (placeholder rewritten
//! to final image markdown, file attached) or `Error` (placeholder rewritten
//! to an inline failure indicator). After settlement the tracked range keeps
//! shifting with surrounding edits but the state is immutable.

use inkfield_editor_core::MarkHandle;
use serde::{Deserialize, Serialize};
use smol_str::SmolStr;

use crate::value::FileRef;

/// Opaque marker identity, assigned by the registry.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct MarkerId(pub(crate) u64);

impl std::fmt::Display for MarkerId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "marker#{}", self.0)
    }
}

/// Upload marker lifecycle state.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum MarkerState {
    /// Upload in flight; a placeholder is rendered in the buffer.
    #[default]
    Pending,
    /// Upload committed; the marker tracks final image markdown.
    Success,
    /// Upload failed; the marker tracks an inline error indicator.
    Error,
}

impl MarkerState {
    /// Whether the marker has reached a terminal state.
    pub fn is_settled(&self) -> bool {
        !matches!(self, Self::Pending)
    }
}

/// How a new upload placeholder is introduced into the buffer.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum InsertMode {
    /// Insert a standalone placeholder block, replacing any current
    /// selection, wrapped in blank lines.
    Insertion,
    /// Replace the current selection in place, reusing the selected text as
    /// the image title.
    ReplaceBySelection,
}

/// Inline indicator written over the placeholder when an upload fails.
pub const UPLOAD_ERROR_TEXT: &str = "![upload failed]()";

/// Metadata delivered by the upload transport when an upload commits.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct UploadedFile {
    pub name: SmolStr,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub size: Option<u64>,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

impl UploadedFile {
    /// Uploaded-file metadata with just a name.
    pub fn named(name: impl Into<SmolStr>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }
}

/// Asynchronous message from the upload transport, consumed at delivery
/// time by resolving the marker through the registry - never through a
/// range captured at request time.
#[derive(Clone, Debug, PartialEq)]
pub enum UploadOutcome {
    /// The transport committed the upload.
    Success(UploadedFile),
    /// The transport reported a failure reason.
    Failure(SmolStr),
}

/// What a settlement did to the buffer.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SettleOutcome {
    /// The tracked placeholder was rewritten in place.
    Rewritten,
    /// The tracked span had been deleted by intervening edits; state (and,
    /// on success, the files list) was updated without a buffer rewrite.
    Orphaned,
}

/// A live upload marker bound to a tracked buffer span.
#[derive(Debug)]
pub struct UploadMarker {
    pub(crate) id: MarkerId,
    pub(crate) handle: MarkHandle,
    pub(crate) state: MarkerState,
    pub(crate) title: SmolStr,
    pub(crate) file: Option<FileRef>,
}

impl UploadMarker {
    /// The marker's registry identity.
    pub fn id(&self) -> MarkerId {
        self.id
    }

    /// Handle of the live-tracked span.
    pub fn handle(&self) -> MarkHandle {
        self.handle
    }

    /// Current lifecycle state.
    pub fn state(&self) -> MarkerState {
        self.state
    }

    /// Whether the marker has settled.
    pub fn is_settled(&self) -> bool {
        self.state.is_settled()
    }

    /// Image title carried by the placeholder.
    pub fn title(&self) -> &str {
        &self.title
    }

    /// Attached file, present once the marker reached `Success`.
    pub fn file(&self) -> Option<&FileRef> {
        self.file.as_ref()
    }

    pub(crate) fn settle_success(&mut self, file: FileRef, handle: MarkHandle) {
        self.state = MarkerState::Success;
        self.file = Some(file);
        self.handle = handle;
    }

    pub(crate) fn settle_error(&mut self, handle: MarkHandle) {
        self.state = MarkerState::Error;
        self.handle = handle;
    }
}

/// Escape characters that would terminate the title span of image syntax.
pub(crate) fn escape_title(title: &str) -> String {
    let mut out = String::with_capacity(title.len());
    for ch in title.chars() {
        if matches!(ch, '[' | ']' | '\\') {
            out.push('\\');
        }
        out.push(ch);
    }
    out
}

/// Placeholder markdown for a pending upload: `![<title>]()`.
pub(crate) fn placeholder_markdown(title: &str) -> String {
    format!("![{}]()", escape_title(title))
}

/// Final markdown for a committed upload: `![<title>](<name>)`.
pub(crate) fn image_markdown(title: &str, name: &str) -> String {
    format!("![{}]({})", escape_title(title), name)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_state_settled() {
        assert!(!MarkerState::Pending.is_settled());
        assert!(MarkerState::Success.is_settled());
        assert!(MarkerState::Error.is_settled());
    }

    #[test]
    fn test_placeholder_markdown() {
        assert_eq!(placeholder_markdown(""), "![]()");
        assert_eq!(placeholder_markdown("Elsass"), "![Elsass]()");
    }

    #[test]
    fn test_image_markdown() {
        assert_eq!(image_markdown("", "cat.jpg"), "![](cat.jpg)");
        assert_eq!(image_markdown("Cat", "cat.jpg"), "![Cat](cat.jpg)");
    }

    #[test]
    fn test_title_escaping() {
        assert_eq!(escape_title("a[b]c"), r"a\[b\]c");
        assert_eq!(escape_title(r"a\b"), r"a\\b");
        assert_eq!(image_markdown("x]y", "f.png"), r"![x\]y](f.png)");
    }
}
