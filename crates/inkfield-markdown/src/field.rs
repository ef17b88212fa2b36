//! The markdown field: one editor instance tying surface, marker registry,
//! and value synchronizer together.
//!
//! All mutation flows through this type on a single execution context.
//! Upload outcomes arrive as messages (`resolve_upload`) whenever the
//! host's transport completes; they locate their placeholder through the
//! live mark handle at delivery time, never through positions captured at
//! request time.

use inkfield_editor_core::{EditSurface, Position, RopeSurface, TextRange};
use smol_str::SmolStr;

use crate::config::FieldConfig;
use crate::error::FieldError;
use crate::marker::{
    image_markdown, placeholder_markdown, InsertMode, MarkerId, MarkerState, SettleOutcome,
    UploadOutcome, UPLOAD_ERROR_TEXT,
};
use crate::parse;
use crate::registry::MarkerRegistry;
use crate::sync::ValueSynchronizer;
use crate::value::StructuredValue;

/// Width of the empty placeholder `![]()` in chars.
const PLACEHOLDER_LEN: usize = 5;

/// A markdown editing field bound to a structured value.
pub struct MarkdownField {
    surface: RopeSurface,
    registry: MarkerRegistry,
    sync: ValueSynchronizer,
    config: FieldConfig,
}

impl MarkdownField {
    /// Build a field, seed it with `value`, and parse existing image
    /// references into live markers.
    pub fn new(value: StructuredValue, config: FieldConfig) -> Self {
        let mut surface = RopeSurface::new();
        surface.set_read_only(config.read_only);
        let sync = ValueSynchronizer::new();
        sync.attach(&mut surface);

        let mut field = Self {
            surface,
            registry: MarkerRegistry::new(),
            sync,
            config,
        };
        field.seed(value);
        field
    }

    /// Current buffer text.
    pub fn text(&self) -> String {
        self.surface.text()
    }

    /// Snapshot of the canonical value.
    pub fn value(&self) -> StructuredValue {
        self.sync.value()
    }

    /// Subscribe to emitted value updates (the `input` event).
    pub fn subscribe(&self, listener: impl FnMut(&StructuredValue) + 'static) {
        self.sync.subscribe(Box::new(listener));
    }

    /// Read access to the underlying surface.
    pub fn surface(&self) -> &RopeSurface {
        &self.surface
    }

    /// Read access to the marker registry.
    pub fn markers(&self) -> &MarkerRegistry {
        &self.registry
    }

    /// Active locale.
    pub fn locale(&self) -> &str {
        &self.config.locale
    }

    /// Field configuration.
    pub fn config(&self) -> &FieldConfig {
        &self.config
    }

    /// Whether the field rejects user-driven edits.
    pub fn is_read_only(&self) -> bool {
        self.surface.is_read_only()
    }

    /// Toggle read-only mode, propagated to the surface.
    pub fn set_read_only(&mut self, read_only: bool) {
        self.config.read_only = read_only;
        self.surface.set_read_only(read_only);
    }

    /// User-driven edit: replace `range` with `text`.
    pub fn edit(&mut self, range: TextRange, text: &str) -> Result<(), FieldError> {
        self.surface.replace_range(range, text)?;
        Ok(())
    }

    /// Current selection.
    pub fn selection(&self) -> TextRange {
        self.surface.selection()
    }

    /// Set the selection.
    pub fn set_selection(&mut self, range: TextRange) {
        self.surface.set_selection(range);
    }

    /// Replace the bound value (external identity change) and re-seed.
    pub fn set_value(&mut self, value: StructuredValue) {
        self.seed(value);
    }

    /// Switch the active locale.
    ///
    /// A changed locale re-seeds the buffer with the then-current value and
    /// re-runs the upload parser - the host framework may swap the whole
    /// editor widget on locale switches, so existing uploaded images must
    /// come back as live markers.
    pub fn set_locale(&mut self, locale: impl Into<SmolStr>) {
        let locale = locale.into();
        if locale == self.config.locale {
            return;
        }
        tracing::debug!(from = %self.config.locale, to = %locale, "locale changed, re-seeding");
        self.config.locale = locale;
        let value = self.sync.value();
        self.seed(value);
    }

    /// Insert an upload placeholder at the current selection.
    ///
    /// `Insertion` replaces the selection with a standalone `![]()` block
    /// wrapped in blank lines and puts the caret in the empty title span.
    /// `ReplaceBySelection` replaces the selection in place with
    /// `![<selection>]()`, reusing the selected text as the title.
    pub fn insert_upload(&mut self, mode: InsertMode) -> Result<MarkerId, FieldError> {
        if self.surface.is_read_only() {
            return Err(FieldError::ReadOnly);
        }
        let sel = self.surface.selection();
        let sel_start = self
            .surface
            .offset_of(sel.from)
            .ok_or(FieldError::OutOfBounds)?;

        match mode {
            InsertMode::Insertion => {
                let at_line_start = sel_start == 0
                    || matches!(self.surface.char_at(sel_start - 1), Some('\n'));
                let prefix = if at_line_start { "\n" } else { "\n\n" };
                self.surface
                    .replace_range(sel, &format!("{prefix}![]()\n\n"))?;
                let start = sel_start + prefix.len();
                // caret lands between the brackets: `![|]()`
                self.register_placeholder(
                    start,
                    start + PLACEHOLDER_LEN,
                    SmolStr::default(),
                    start + 2,
                )
            }
            InsertMode::ReplaceBySelection => {
                let title = self.surface.slice(sel).unwrap_or_default();
                let placeholder = placeholder_markdown(&title);
                let len = placeholder.chars().count();
                self.surface.replace_range(sel, &placeholder)?;
                self.register_placeholder(sel_start, sel_start + len, title, sel_start + len)
            }
        }
    }

    fn register_placeholder(
        &mut self,
        start: usize,
        end: usize,
        title: SmolStr,
        caret: usize,
    ) -> Result<MarkerId, FieldError> {
        let range = TextRange::new(self.surface.position_at(start), self.surface.position_at(end));
        let caret = self.surface.position_at(caret);
        self.surface.set_selection(TextRange::collapsed(caret));
        let handle = self.surface.mark_range(range);
        match self
            .registry
            .register(&self.surface, handle, MarkerState::Pending, title, None)
        {
            Ok(id) => {
                tracing::debug!(%id, "upload placeholder inserted");
                Ok(id)
            }
            Err(e) => {
                self.surface.clear_mark(handle);
                Err(e)
            }
        }
    }

    /// Consume one upload outcome for the given marker.
    ///
    /// Success records the file in the value's files list, rewrites the
    /// tracked placeholder to final image markdown, and settles the marker.
    /// Failure rewrites the placeholder to an inline error indicator and
    /// records nothing. Either way, if intervening edits deleted the
    /// tracked span the rewrite is skipped (`SettleOutcome::Orphaned`) -
    /// the settlement itself still applies. Settlement rewrites go through
    /// the forced surface path so they succeed while the field is
    /// read-only: they reflect an already-committed outcome, not user
    /// input.
    pub fn resolve_upload(
        &mut self,
        id: MarkerId,
        outcome: UploadOutcome,
    ) -> Result<SettleOutcome, FieldError> {
        let Some(marker) = self.registry.resolve_mut(id) else {
            return Err(FieldError::UnknownMarker(id));
        };
        if marker.is_settled() {
            return Err(FieldError::AlreadySettled(id));
        }

        match outcome {
            UploadOutcome::Success(uploaded) => {
                // the file must be in `files` by the time the marker commits
                let file = self.sync.append_file(uploaded);
                match self.surface.find_mark(marker.handle) {
                    Some(range) => {
                        let markdown = image_markdown(&marker.title, &file.name);
                        let start = self
                            .surface
                            .offset_of(range.from)
                            .ok_or(FieldError::OutOfBounds)?;
                        self.surface.clear_mark(marker.handle);
                        self.surface.force_replace_range(range, &markdown)?;
                        let end = self.surface.position_at(start + markdown.chars().count());
                        let handle = self
                            .surface
                            .mark_range(TextRange::new(self.surface.position_at(start), end));
                        marker.settle_success(file, handle);
                        tracing::debug!(%id, "upload settled");
                        Ok(SettleOutcome::Rewritten)
                    }
                    None => {
                        tracing::warn!(
                            %id,
                            name = %file.name,
                            "upload settled for a deleted span; file recorded without rewrite"
                        );
                        let handle = marker.handle;
                        marker.settle_success(file, handle);
                        // no buffer change fired, but consumers must still
                        // learn about the appended file
                        self.sync.emit_current();
                        Ok(SettleOutcome::Orphaned)
                    }
                }
            }
            UploadOutcome::Failure(reason) => {
                tracing::warn!(%id, %reason, "upload failed");
                match self.surface.find_mark(marker.handle) {
                    Some(range) => {
                        let start = self
                            .surface
                            .offset_of(range.from)
                            .ok_or(FieldError::OutOfBounds)?;
                        self.surface.clear_mark(marker.handle);
                        self.surface.force_replace_range(range, UPLOAD_ERROR_TEXT)?;
                        let end = self
                            .surface
                            .position_at(start + UPLOAD_ERROR_TEXT.chars().count());
                        let handle = self
                            .surface
                            .mark_range(TextRange::new(self.surface.position_at(start), end));
                        marker.settle_error(handle);
                        Ok(SettleOutcome::Rewritten)
                    }
                    None => {
                        let handle = marker.handle;
                        marker.settle_error(handle);
                        Ok(SettleOutcome::Orphaned)
                    }
                }
            }
        }
    }

    /// Replace the whole buffer with the value's text and rebuild markers.
    fn seed(&mut self, value: StructuredValue) {
        self.registry.clear(&mut self.surface);
        self.sync.seed(value);
        let text = self.sync.value().text;
        tracing::debug!(chars = text.chars().count(), "seeding buffer");
        let whole = TextRange::new(
            Position::origin(),
            self.surface.position_at(self.surface.len_chars()),
        );
        self.surface
            .force_replace_range(whole, &text)
            .expect("full-buffer range is always valid");
        self.run_upload_parser();
    }

    /// Scan the seeded text and install a `Success` marker over every image
    /// reference naming a known attached file.
    fn run_upload_parser(&mut self) {
        let text = self.surface.text();
        let matches = parse::scan_images(&text);
        let files = self.sync.files();
        let pairs = parse::claim_files(&matches, &files);
        let mut seeded = 0usize;
        for (idx, file) in pairs {
            let m = &matches[idx];
            let range = TextRange::new(
                self.surface.position_at(m.start),
                self.surface.position_at(m.end),
            );
            self.surface.set_selection(range);
            let handle = self.surface.mark_range(range);
            match self.registry.register(
                &self.surface,
                handle,
                MarkerState::Success,
                m.title.clone(),
                Some(file.clone()),
            ) {
                Ok(marker_id) => {
                    seeded += 1;
                    tracing::trace!(%marker_id, name = %file.name, "seeded upload marker");
                }
                Err(e) => {
                    self.surface.clear_mark(handle);
                    tracing::error!(%e, name = %file.name, "failed to seed upload marker");
                }
            }
        }
        if !matches.is_empty() {
            tracing::debug!(matches = matches.len(), seeded, "upload parse complete");
        }
    }
}
