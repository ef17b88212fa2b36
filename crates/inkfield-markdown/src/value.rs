//! The field's structured value: markdown text plus attached file metadata.

use serde::{Deserialize, Serialize};
use smol_str::SmolStr;

/// Opaque identity of an attached file.
///
/// Assigned by the value synchronizer from a monotonic counter and never
/// reused. It is the join key between `StructuredValue::files` and in-text
/// upload markers, deliberately decoupled from the file name (names can be
/// edited and reused). Identities are in-memory only and do not serialize.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct FileId(pub u64);

impl std::fmt::Display for FileId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "file#{}", self.0)
    }
}

/// Metadata for one attached file.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct FileRef {
    /// In-memory identity, assigned at insertion time.
    #[serde(skip)]
    pub id: FileId,
    /// File name as reported by the upload transport. Also the target of
    /// the markdown image reference.
    pub name: SmolStr,
    /// Size in bytes, when known.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub size: Option<u64>,
    /// Opaque transport metadata, passed through untouched.
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

impl FileRef {
    /// Create a file reference with just a name.
    pub fn named(name: impl Into<SmolStr>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }
}

/// The field's bound data: markdown text and attached files.
///
/// `files` is kept in insertion order. Every file referenced by a committed
/// in-text marker appears in `files` no later than the moment the marker
/// commits.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct StructuredValue {
    #[serde(default)]
    pub text: String,
    #[serde(default)]
    pub files: Vec<FileRef>,
}

impl StructuredValue {
    /// Create a value with text and no files.
    pub fn from_text(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            files: Vec::new(),
        }
    }
}
