//! Error types for the markdown field.

use inkfield_editor_core::SurfaceError;
use thiserror::Error;

use crate::marker::MarkerId;

/// Errors surfaced by field operations.
///
/// Recovered conditions are deliberately absent: an orphaned settlement
/// (the tracked span was deleted before the upload resolved) is reported
/// through `SettleOutcome::Orphaned`, not as an error, and a failed upload
/// is rendered as an inline indicator rather than propagated.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
#[non_exhaustive]
pub enum FieldError {
    /// A user-driven mutation arrived while the field is read-only.
    #[error("field is read-only")]
    ReadOnly,

    /// A range addressed positions outside the buffer.
    #[error("range out of bounds")]
    OutOfBounds,

    /// No marker is registered under this identity.
    #[error("unknown upload marker {0}")]
    UnknownMarker(MarkerId),

    /// The marker already reached a terminal state.
    #[error("upload marker {0} already settled")]
    AlreadySettled(MarkerId),

    /// A new marker's range overlaps a registered live marker. This is a
    /// registry bookkeeping bug, not a user condition.
    #[error("marker range overlaps a registered live marker")]
    DuplicateRegistration,
}

impl From<SurfaceError> for FieldError {
    fn from(e: SurfaceError) -> Self {
        match e {
            SurfaceError::ReadOnly => FieldError::ReadOnly,
            SurfaceError::OutOfBounds => FieldError::OutOfBounds,
            // SurfaceError is non_exhaustive upstream
            _ => FieldError::OutOfBounds,
        }
    }
}
