//! inkfield-markdown: markdown field core with inline upload markers.
//!
//! Keeps a structured value (markdown text plus attached file references)
//! synchronized with an editing surface while managing `![title](name)`
//! upload placeholders through their asynchronous lifecycle:
//!
//! - [`MarkdownField`] - one editor instance: surface + registry + value
//! - [`UploadMarker`] - a live-tracked in-buffer attachment
//! - [`MarkerRegistry`] - canonical marker set, keyed by opaque identity
//! - [`ValueSynchronizer`] - value ownership and `input`-event emission
//!
//! The model is single-threaded and event-driven; upload results are
//! messages consumed at delivery time through [`MarkdownField::resolve_upload`].

pub mod config;
pub mod error;
pub mod field;
pub mod marker;
mod parse;
pub mod registry;
pub mod sync;
pub mod value;

pub use config::{FieldConfig, ToolbarButton, UploadConfig};
pub use error::FieldError;
pub use field::MarkdownField;
pub use marker::{
    InsertMode, MarkerId, MarkerState, SettleOutcome, UploadMarker, UploadOutcome, UploadedFile,
    UPLOAD_ERROR_TEXT,
};
pub use registry::MarkerRegistry;
pub use sync::{InputListener, ValueSynchronizer};
pub use value::{FileId, FileRef, StructuredValue};
