//! Addressing types for the editing surface: positions and text ranges.
//!
//! Positions are line/column pairs measured in chars, zero-based. A
//! `TextRange` is half-open: `from` is included, `to` is not. Both go stale
//! as soon as the buffer is edited; use a mark handle to track a span
//! through edits.

use serde::{Deserialize, Serialize};

/// A line/column position in the buffer, measured in chars.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Position {
    pub line: usize,
    pub column: usize,
}

impl Position {
    /// Create a position at the given line and column.
    pub fn new(line: usize, column: usize) -> Self {
        Self { line, column }
    }

    /// The origin position (start of buffer).
    pub fn origin() -> Self {
        Self { line: 0, column: 0 }
    }
}

/// A half-open span of buffer text between two positions.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TextRange {
    pub from: Position,
    pub to: Position,
}

impl TextRange {
    /// Create a range between two positions.
    pub fn new(from: Position, to: Position) -> Self {
        Self { from, to }
    }

    /// Create a collapsed range (caret) at the given position.
    pub fn collapsed(at: Position) -> Self {
        Self { from: at, to: at }
    }

    /// Check if the range is collapsed (caret only).
    pub fn is_collapsed(&self) -> bool {
        self.from == self.to
    }

    /// Normalize so that `from <= to`.
    pub fn normalize(self) -> Self {
        if self.from <= self.to {
            self
        } else {
            Self {
                from: self.to,
                to: self.from,
            }
        }
    }

    /// Check if two normalized ranges share at least one position.
    ///
    /// Collapsed ranges never overlap anything (half-open semantics).
    pub fn overlaps(&self, other: &TextRange) -> bool {
        if self.is_collapsed() || other.is_collapsed() {
            return false;
        }
        self.from < other.to && other.from < self.to
    }
}
