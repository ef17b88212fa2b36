//! Registry of live upload markers for one field instance.
//!
//! The registry owns the canonical marker set, keyed by opaque identity
//! (never by live object identity), so settlement messages arriving out of
//! order relative to user edits can always find their marker. It also
//! enforces that no two live markers ever claim overlapping spans.

use std::collections::HashMap;

use inkfield_editor_core::{EditSurface, MarkHandle};
use smol_str::SmolStr;

use crate::error::FieldError;
use crate::marker::{MarkerId, MarkerState, UploadMarker};
use crate::value::FileRef;

/// Canonical set of upload markers for one field instance.
#[derive(Default)]
pub struct MarkerRegistry {
    markers: HashMap<u64, UploadMarker>,
    next_id: u64,
}

impl MarkerRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a new marker over the span tracked by `handle`.
    ///
    /// Fails with `DuplicateRegistration` when the span overlaps any
    /// registered marker whose mark is still alive. That indicates a
    /// bookkeeping bug in the caller, so it also trips a debug assertion.
    pub fn register<S: EditSurface>(
        &mut self,
        surface: &S,
        handle: MarkHandle,
        state: MarkerState,
        title: SmolStr,
        file: Option<FileRef>,
    ) -> Result<MarkerId, FieldError> {
        if let Some(range) = surface.find_mark(handle) {
            for existing in self.markers.values() {
                let Some(claimed) = surface.find_mark(existing.handle) else {
                    continue;
                };
                if range.overlaps(&claimed) {
                    tracing::error!(
                        existing = %existing.id,
                        ?range,
                        "marker registration over an already-claimed span"
                    );
                    debug_assert!(false, "marker registration over an already-claimed span");
                    return Err(FieldError::DuplicateRegistration);
                }
            }
        }

        let id = MarkerId(self.next_id);
        self.next_id += 1;
        self.markers.insert(
            id.0,
            UploadMarker {
                id,
                handle,
                state,
                title,
                file,
            },
        );
        Ok(id)
    }

    /// Look up a marker by identity.
    pub fn resolve(&self, id: MarkerId) -> Option<&UploadMarker> {
        self.markers.get(&id.0)
    }

    /// Look up a marker mutably by identity.
    pub(crate) fn resolve_mut(&mut self, id: MarkerId) -> Option<&mut UploadMarker> {
        self.markers.get_mut(&id.0)
    }

    /// Number of registered markers.
    pub fn len(&self) -> usize {
        self.markers.len()
    }

    /// Whether the registry is empty.
    pub fn is_empty(&self) -> bool {
        self.markers.is_empty()
    }

    /// Iterate over registered markers (unspecified order).
    pub fn iter(&self) -> impl Iterator<Item = &UploadMarker> {
        self.markers.values()
    }

    /// Drop all markers and clear their marks from the surface.
    ///
    /// Used when the buffer is re-seeded: the parser rebuilds markers from
    /// the fresh text.
    pub fn clear<S: EditSurface>(&mut self, surface: &mut S) {
        for (_, marker) in self.markers.drain() {
            surface.clear_mark(marker.handle);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use inkfield_editor_core::{Position, RopeSurface, TextRange};

    fn range(c0: usize, c1: usize) -> TextRange {
        TextRange::new(Position::new(0, c0), Position::new(0, c1))
    }

    #[test]
    fn test_register_and_resolve() {
        let mut surface = RopeSurface::from_text("![]() and ![]()");
        let mut registry = MarkerRegistry::new();

        let h1 = surface.mark_range(range(0, 5));
        let h2 = surface.mark_range(range(10, 15));
        let id1 = registry
            .register(&surface, h1, MarkerState::Pending, "".into(), None)
            .unwrap();
        let id2 = registry
            .register(&surface, h2, MarkerState::Pending, "".into(), None)
            .unwrap();

        assert_ne!(id1, id2);
        assert_eq!(registry.len(), 2);
        assert_eq!(registry.resolve(id1).unwrap().handle(), h1);
        assert!(registry.resolve(MarkerId(99)).is_none());
    }

    #[test]
    #[cfg_attr(debug_assertions, should_panic(expected = "already-claimed span"))]
    fn test_overlapping_registration_rejected() {
        let mut surface = RopeSurface::from_text("0123456789");
        let mut registry = MarkerRegistry::new();

        let h1 = surface.mark_range(range(2, 8));
        registry
            .register(&surface, h1, MarkerState::Pending, "".into(), None)
            .unwrap();

        let h2 = surface.mark_range(range(5, 9));
        let result = registry.register(&surface, h2, MarkerState::Pending, "".into(), None);
        assert_eq!(result, Err(FieldError::DuplicateRegistration));
    }

    #[test]
    fn test_dead_marks_do_not_block_registration() {
        let mut surface = RopeSurface::from_text("0123456789");
        let mut registry = MarkerRegistry::new();

        let h1 = surface.mark_range(range(2, 8));
        registry
            .register(&surface, h1, MarkerState::Pending, "".into(), None)
            .unwrap();
        // delete the first marker's whole span
        surface.replace_range(range(2, 8), "").unwrap();
        assert!(surface.find_mark(h1).is_none());

        let h2 = surface.mark_range(range(0, 4));
        assert!(
            registry
                .register(&surface, h2, MarkerState::Pending, "".into(), None)
                .is_ok()
        );
    }

    #[test]
    fn test_clear_drops_marks() {
        let mut surface = RopeSurface::from_text("![]()");
        let mut registry = MarkerRegistry::new();

        let h = surface.mark_range(range(0, 5));
        registry
            .register(&surface, h, MarkerState::Pending, "".into(), None)
            .unwrap();

        registry.clear(&mut surface);
        assert!(registry.is_empty());
        assert!(surface.find_mark(h).is_none());
        assert_eq!(surface.live_mark_count(), 0);
    }
}
