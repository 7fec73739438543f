//! Mirror of a host document's lines
//!
//! The reconciler never edits text. It only needs line content to clamp
//! positions and to convert columns between UTF-16 and byte offsets, so a
//! document is kept as a plain vector of lines without terminators.

use serde::{Deserialize, Serialize};

/// Read-only access to document lines, as needed by coordinate translation
pub trait LineSource {
    /// Number of lines (an empty document still has one empty line)
    fn line_count(&self) -> usize;

    /// Content of `line`, without its terminator
    fn line(&self, line: usize) -> Option<&str>;
}

/// Line snapshot of one document
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentSnapshot {
    lines: Vec<String>,
}

impl DocumentSnapshot {
    pub fn new(lines: Vec<String>) -> Self {
        Self { lines }
    }

    /// Build a snapshot from raw text, accepting both `\n` and `\r\n`
    pub fn from_text(text: &str) -> Self {
        let lines = text
            .split('\n')
            .map(|s| s.trim_end_matches('\r').to_string())
            .collect();
        Self { lines }
    }

    pub fn lines(&self) -> &[String] {
        &self.lines
    }

    /// Replace lines `first_line..last_line` with `replacement`
    ///
    /// Out-of-range bounds are clamped to the document, so a stale change
    /// degrades into an append rather than a panic.
    pub fn replace_lines(&mut self, first_line: usize, last_line: usize, replacement: Vec<String>) {
        let len = self.lines.len();
        let start = first_line.min(len);
        let end = last_line.clamp(start, len);
        self.lines.splice(start..end, replacement);
    }
}

impl LineSource for DocumentSnapshot {
    fn line_count(&self) -> usize {
        self.lines.len().max(1)
    }

    fn line(&self, line: usize) -> Option<&str> {
        match self.lines.get(line) {
            Some(s) => Some(s.as_str()),
            None if line == 0 && self.lines.is_empty() => Some(""),
            None => None,
        }
    }
}

impl LineSource for [String] {
    fn line_count(&self) -> usize {
        self.len().max(1)
    }

    fn line(&self, line: usize) -> Option<&str> {
        match self.get(line) {
            Some(s) => Some(s.as_str()),
            None if line == 0 && self.is_empty() => Some(""),
            None => None,
        }
    }
}
