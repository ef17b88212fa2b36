//! The `EditSurface` trait and its ropey-backed implementation.
//!
//! An edit surface is the contract the field layer holds over an interactive
//! text-editing widget: line/column-addressed reads and replacements,
//! selection get/set, a read-only toggle, change notification, and live
//! range-tracking marks whose bounds auto-adjust as surrounding text is
//! edited. Marks are the only safe way to locate a span across edits;
//! captured positions go stale immediately.

use std::collections::HashMap;

use smol_str::{SmolStr, ToSmolStr};
use thiserror::Error;

use crate::types::{Position, TextRange};

/// Listener invoked with the full buffer text after each mutation.
///
/// Notification is synchronous, within the mutating call, once per
/// user-visible edit.
pub type ChangeListener = Box<dyn FnMut(&str)>;

/// Errors from surface mutations.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
#[non_exhaustive]
pub enum SurfaceError {
    /// The surface is read-only and the mutation was user-driven.
    #[error("surface is read-only")]
    ReadOnly,

    /// A position in the requested range does not exist in the buffer.
    #[error("range out of bounds")]
    OutOfBounds,
}

/// Opaque handle to a live-tracked mark.
///
/// The handle stays valid for the lifetime of the surface; once the marked
/// span is fully deleted, `find_mark` returns `None` forever after.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct MarkHandle(u64);

/// A line/column-addressable text-editing surface.
pub trait EditSurface {
    /// Full buffer contents.
    fn text(&self) -> String;

    /// Total length in chars.
    fn len_chars(&self) -> usize;

    /// Character at the given char offset, if any.
    fn char_at(&self, char_offset: usize) -> Option<char>;

    /// Slice of the buffer covered by `range`. Returns `None` if the range
    /// addresses positions outside the buffer.
    fn slice(&self, range: TextRange) -> Option<SmolStr>;

    /// Convert a char offset to a position. Offsets past the end clamp to
    /// the end of the buffer.
    fn position_at(&self, char_offset: usize) -> Position;

    /// Convert a position to a char offset. Returns `None` if the position
    /// does not exist in the buffer.
    fn offset_of(&self, pos: Position) -> Option<usize>;

    /// User-driven replacement of `range` with `text`. Rejected while the
    /// surface is read-only.
    fn replace_range(&mut self, range: TextRange, text: &str) -> Result<(), SurfaceError>;

    /// Programmatic replacement that ignores the read-only flag.
    ///
    /// Reserved for internal rewrites: seeding the buffer from an external
    /// value, and upload-marker settlement (which reflects an
    /// already-committed upload outcome, not user input).
    fn force_replace_range(&mut self, range: TextRange, text: &str) -> Result<(), SurfaceError>;

    /// Current selection, normalized.
    fn selection(&self) -> TextRange;

    /// Set the selection, clamping to buffer bounds.
    fn set_selection(&mut self, range: TextRange);

    /// Start live-tracking `range` (clamped to buffer bounds).
    fn mark_range(&mut self, range: TextRange) -> MarkHandle;

    /// Current bounds of a mark, or `None` once its span has been fully
    /// deleted (or the mark was cleared).
    fn find_mark(&self, handle: MarkHandle) -> Option<TextRange>;

    /// Stop tracking a mark.
    fn clear_mark(&mut self, handle: MarkHandle);

    /// Register a change listener.
    fn on_change(&mut self, listener: ChangeListener);

    /// Toggle read-only mode.
    fn set_read_only(&mut self, read_only: bool);

    /// Whether the surface is read-only.
    fn is_read_only(&self) -> bool;
}

/// Live mark span in char offsets.
#[derive(Clone, Copy, Debug)]
struct MarkSpan {
    start: usize,
    end: usize,
}

/// Ropey-backed edit surface.
///
/// Text lives in a rope for O(log n) edits and line/char conversions; marks
/// and the selection are kept as char offsets and adjusted on every edit.
pub struct RopeSurface {
    rope: ropey::Rope,
    // (start, end), kept normalized
    selection: (usize, usize),
    marks: HashMap<u64, MarkSpan>,
    next_mark: u64,
    read_only: bool,
    listeners: Vec<ChangeListener>,
}

impl Default for RopeSurface {
    fn default() -> Self {
        Self::new()
    }
}

impl RopeSurface {
    /// Create an empty surface.
    pub fn new() -> Self {
        Self {
            rope: ropey::Rope::default(),
            selection: (0, 0),
            marks: HashMap::new(),
            next_mark: 0,
            read_only: false,
            listeners: Vec::new(),
        }
    }

    /// Create a surface seeded with `text`. No change notification fires.
    pub fn from_text(text: &str) -> Self {
        Self {
            rope: ropey::Rope::from_str(text),
            ..Self::new()
        }
    }

    /// Number of live (still-found) marks.
    pub fn live_mark_count(&self) -> usize {
        self.marks.len()
    }

    /// Char offset for a position, clamping line and column into bounds.
    fn clamp_offset(&self, pos: Position) -> usize {
        let last_line = self.rope.len_lines().saturating_sub(1);
        let line = pos.line.min(last_line);
        let line_start = self.rope.line_to_char(line);
        let line_end = self.line_end_char(line);
        (line_start + pos.column).min(line_end)
    }

    /// Char offset of the last addressable column on `line` (before the
    /// newline, or end of buffer on the last line).
    fn line_end_char(&self, line: usize) -> usize {
        if line + 1 < self.rope.len_lines() {
            self.rope.line_to_char(line + 1) - 1
        } else {
            self.rope.len_chars()
        }
    }

    fn offset_range(&self, range: TextRange) -> Result<(usize, usize), SurfaceError> {
        let range = range.normalize();
        let start = self.offset_of(range.from).ok_or(SurfaceError::OutOfBounds)?;
        let end = self.offset_of(range.to).ok_or(SurfaceError::OutOfBounds)?;
        Ok((start, end))
    }

    /// Apply a replacement that has already been bounds-checked, then adjust
    /// marks and selection and notify listeners.
    fn apply_replace(&mut self, start: usize, end: usize, text: &str) {
        self.rope.remove(start..end);
        self.rope.insert(start, text);
        let inserted = text.chars().count();

        let mut dead = Vec::new();
        for (id, span) in self.marks.iter_mut() {
            match adjust_span(*span, start, end, inserted) {
                Some(next) => *span = next,
                None => dead.push(*id),
            }
        }
        for id in dead {
            tracing::trace!(mark = id, "mark span fully deleted by edit");
            self.marks.remove(&id);
        }

        self.selection = (
            adjust_point(self.selection.0, start, end, inserted),
            adjust_point(self.selection.1, start, end, inserted),
        );

        self.notify();
    }

    /// Invoke all change listeners with the post-edit text.
    fn notify(&mut self) {
        let text = self.rope.to_string();
        let mut taken = std::mem::take(&mut self.listeners);
        for listener in taken.iter_mut() {
            listener(&text);
        }
        // keep listeners registered during notification
        taken.append(&mut self.listeners);
        self.listeners = taken;
    }
}

impl EditSurface for RopeSurface {
    fn text(&self) -> String {
        self.rope.to_string()
    }

    fn len_chars(&self) -> usize {
        self.rope.len_chars()
    }

    fn char_at(&self, char_offset: usize) -> Option<char> {
        if char_offset >= self.rope.len_chars() {
            return None;
        }
        Some(self.rope.char(char_offset))
    }

    fn slice(&self, range: TextRange) -> Option<SmolStr> {
        let (start, end) = self.offset_range(range).ok()?;
        Some(self.rope.slice(start..end).to_smolstr())
    }

    fn position_at(&self, char_offset: usize) -> Position {
        let offset = char_offset.min(self.rope.len_chars());
        let line = self.rope.char_to_line(offset);
        Position {
            line,
            column: offset - self.rope.line_to_char(line),
        }
    }

    fn offset_of(&self, pos: Position) -> Option<usize> {
        if pos.line >= self.rope.len_lines() {
            return None;
        }
        let line_start = self.rope.line_to_char(pos.line);
        let offset = line_start + pos.column;
        (offset <= self.line_end_char(pos.line)).then_some(offset)
    }

    fn replace_range(&mut self, range: TextRange, text: &str) -> Result<(), SurfaceError> {
        if self.read_only {
            return Err(SurfaceError::ReadOnly);
        }
        self.force_replace_range(range, text)
    }

    fn force_replace_range(&mut self, range: TextRange, text: &str) -> Result<(), SurfaceError> {
        let (start, end) = self.offset_range(range)?;
        self.apply_replace(start, end, text);
        Ok(())
    }

    fn selection(&self) -> TextRange {
        TextRange {
            from: self.position_at(self.selection.0),
            to: self.position_at(self.selection.1),
        }
    }

    fn set_selection(&mut self, range: TextRange) {
        let range = range.normalize();
        let start = self.clamp_offset(range.from);
        let end = self.clamp_offset(range.to).max(start);
        self.selection = (start, end);
    }

    fn mark_range(&mut self, range: TextRange) -> MarkHandle {
        let range = range.normalize();
        let start = self.clamp_offset(range.from);
        let end = self.clamp_offset(range.to).max(start);
        let id = self.next_mark;
        self.next_mark += 1;
        self.marks.insert(id, MarkSpan { start, end });
        MarkHandle(id)
    }

    fn find_mark(&self, handle: MarkHandle) -> Option<TextRange> {
        let span = self.marks.get(&handle.0)?;
        Some(TextRange {
            from: self.position_at(span.start),
            to: self.position_at(span.end),
        })
    }

    fn clear_mark(&mut self, handle: MarkHandle) {
        self.marks.remove(&handle.0);
    }

    fn on_change(&mut self, listener: ChangeListener) {
        self.listeners.push(listener);
    }

    fn set_read_only(&mut self, read_only: bool) {
        self.read_only = read_only;
    }

    fn is_read_only(&self) -> bool {
        self.read_only
    }
}

/// Adjust a mark span for an edit replacing chars `[start, end)` with
/// `inserted` chars. Returns `None` when the edit covers the whole span
/// (the mark dies).
///
/// Insertions exactly at the span start land before the mark (the span
/// shifts right); insertions exactly at the span end land after it (the
/// span does not extend).
fn adjust_span(span: MarkSpan, start: usize, end: usize, inserted: usize) -> Option<MarkSpan> {
    let deleted = end - start;

    if span.end <= start {
        // entirely before the edit
        Some(span)
    } else if span.start >= end {
        // entirely after: shift by the edit delta
        Some(MarkSpan {
            start: span.start + inserted - deleted,
            end: span.end + inserted - deleted,
        })
    } else if start <= span.start && end >= span.end {
        // edit covers the span
        None
    } else if start >= span.start && end <= span.end {
        // edit strictly inside: span end follows the delta
        Some(MarkSpan {
            start: span.start,
            end: span.end + inserted - deleted,
        })
    } else if start < span.start {
        // left edge clipped: survivor starts after the inserted text
        Some(MarkSpan {
            start: start + inserted,
            end: span.end + inserted - deleted,
        })
    } else {
        // right edge clipped: survivor ends where the edit begins
        Some(MarkSpan {
            start: span.start,
            end: start,
        })
    }
}

/// Adjust a single point (selection endpoint) for an edit.
fn adjust_point(point: usize, start: usize, end: usize, inserted: usize) -> usize {
    if point <= start {
        point
    } else if point >= end {
        point + inserted - (end - start)
    } else {
        // point was inside the replaced span: collapse to the end of the
        // inserted text
        start + inserted
    }
}
