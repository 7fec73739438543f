//! Position, selection and range types shared by both coordinate spaces
//!
//! Host coordinates are 0-based lines with UTF-16 columns. Modal coordinates
//! are 1-based lines with byte columns. Conversion between the two lives in
//! `primitives::coordinates`; this module only holds the value types.

use serde::{Deserialize, Serialize};

/// Cursor position in host coordinates (0-based line, UTF-16 column)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize)]
pub struct CursorPosition {
    pub line: usize,
    pub column: usize,
}

impl CursorPosition {
    pub fn new(line: usize, column: usize) -> Self {
        Self { line, column }
    }
}

/// Cursor position in modal-engine coordinates (1-based line, byte column)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ModalPosition {
    pub line: usize,
    pub column: usize,
}

impl ModalPosition {
    pub fn new(line: usize, column: usize) -> Self {
        Self { line, column }
    }
}

/// A selection in host coordinates
///
/// `anchor` is the fixed end, `active` the moving end. With no selection both
/// ends are the cursor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SelectionRange {
    pub anchor: CursorPosition,
    pub active: CursorPosition,
}

/// A selection with zero-width ranges collapsed to a bare cursor
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NormalizedSelection {
    Cursor(CursorPosition),
    Range {
        anchor: CursorPosition,
        active: CursorPosition,
    },
}

impl SelectionRange {
    pub fn new(anchor: CursorPosition, active: CursorPosition) -> Self {
        Self { anchor, active }
    }

    /// An empty selection at `pos`
    pub fn cursor(pos: CursorPosition) -> Self {
        Self {
            anchor: pos,
            active: pos,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.anchor == self.active
    }

    /// The cursor end of the selection
    pub fn cursor_position(&self) -> CursorPosition {
        self.active
    }

    pub fn normalized(&self) -> NormalizedSelection {
        if self.is_empty() {
            NormalizedSelection::Cursor(self.active)
        } else {
            NormalizedSelection::Range {
                anchor: self.anchor,
                active: self.active,
            }
        }
    }

    /// Compare two selections after zero-width normalization
    pub fn same_as(&self, other: &SelectionRange) -> bool {
        self.normalized() == other.normalized()
    }
}

/// Visible line range of a view, half-open: `top_line..bottom_line`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "RawVisibleRange")]
pub struct VisibleRange {
    pub top_line: usize,
    pub bottom_line: usize,
}

/// Wire form of a visible range; an inverted range collapses to empty
#[derive(Deserialize)]
struct RawVisibleRange {
    top_line: usize,
    bottom_line: usize,
}

impl From<RawVisibleRange> for VisibleRange {
    fn from(raw: RawVisibleRange) -> Self {
        Self::new(raw.top_line, raw.bottom_line)
    }
}

impl VisibleRange {
    pub fn new(top_line: usize, bottom_line: usize) -> Self {
        Self {
            top_line,
            bottom_line: bottom_line.max(top_line),
        }
    }

    /// Number of lines covered by the range
    pub fn line_count(&self) -> usize {
        self.bottom_line.saturating_sub(self.top_line)
    }

    pub fn contains(&self, line: usize) -> bool {
        line >= self.top_line && line < self.bottom_line
    }

    /// 1-based screen row of `line` within this range, if it is visible
    pub fn winline(&self, line: usize) -> Option<usize> {
        self.contains(line).then(|| line - self.top_line + 1)
    }
}

/// Editing mode reported by the modal engine
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ModalMode {
    #[default]
    Normal,
    Insert,
    Replace,
    Visual,
    VisualLine,
    VisualBlock,
    CommandLine,
    OperatorPending,
}

impl ModalMode {
    /// Parse a mode short name as reported by vim-style engines ("n", "i", "R",
    /// "v", "V", "^V", "c", "no", ...). Unknown names fall back to normal.
    pub fn from_short_name(name: &str) -> Self {
        match name {
            "i" | "ic" | "ix" | "insert" => Self::Insert,
            "R" | "Rc" | "Rx" | "Rv" | "replace" => Self::Replace,
            "v" | "visual" => Self::Visual,
            "V" | "visual_line" => Self::VisualLine,
            "\u{16}" | "^V" | "visual_block" => Self::VisualBlock,
            "c" | "cv" | "ce" | "cmdline" => Self::CommandLine,
            s if s.starts_with("no") => Self::OperatorPending,
            _ => Self::Normal,
        }
    }

    /// Modes where the cursor may sit one past the last character of a line
    pub fn allows_past_end(self) -> bool {
        matches!(self, Self::Insert | Self::Replace | Self::CommandLine)
    }

    pub fn is_visual(self) -> bool {
        matches!(self, Self::Visual | Self::VisualLine | Self::VisualBlock)
    }
}
