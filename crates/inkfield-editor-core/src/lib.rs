//! inkfield-editor-core: editing-surface abstraction for the markdown field.
//!
//! This crate provides:
//! - `EditSurface` trait for line/column-addressable text editing surfaces
//! - `RopeSurface` - ropey-backed implementation with live mark tracking
//! - `Position` / `TextRange` addressing types
//!
//! All addressing is in Unicode scalar values (chars), not bytes.

pub mod surface;
pub mod types;

pub use surface::{ChangeListener, EditSurface, MarkHandle, RopeSurface, SurfaceError};
pub use types::{Position, TextRange};
