//! Coordinate translation between the host editor and the modal engine
//!
//! Host positions use 0-based lines and UTF-16 columns. Modal positions use
//! 1-based lines and byte columns. Both directions are total: anything out of
//! range is clamped to the nearest valid position instead of failing.
//!
//! Columns are measured in grapheme clusters. A column that lands inside a
//! cluster (a surrogate pair, a base character plus combining marks, an emoji
//! sequence) snaps back to the start of that cluster, so both sides always
//! agree on which character the cursor is on.
//!
//! End of line differs between modes: insert-like modes may place the cursor
//! one past the last character, normal-like modes stop on the last character.
//! That clamp is the only place where `to_host(to_modal(p)) != p` for a
//! grapheme-aligned host position.

use crate::model::document::LineSource;
use crate::model::position::{CursorPosition, ModalMode, ModalPosition, SelectionRange};
use unicode_segmentation::UnicodeSegmentation;

/// Total UTF-16 length of a line
pub fn utf16_len(text: &str) -> usize {
    text.encode_utf16().count()
}

/// Convert a UTF-16 column to a byte offset, snapping to a cluster start
///
/// Returns `(byte_offset, snapped_utf16_column)`.
pub fn utf16_to_byte(text: &str, column: usize) -> (usize, usize) {
    let mut utf16 = 0;
    for (byte, cluster) in text.grapheme_indices(true) {
        let width = cluster.encode_utf16().count();
        if utf16 + width > column {
            return (byte, utf16);
        }
        utf16 += width;
    }
    (text.len(), utf16)
}

/// Convert a byte offset to a UTF-16 column, snapping to a cluster start
///
/// Returns `(utf16_column, snapped_byte_offset)`.
pub fn byte_to_utf16(text: &str, byte: usize) -> (usize, usize) {
    let mut utf16 = 0;
    for (start, cluster) in text.grapheme_indices(true) {
        if start + cluster.len() > byte {
            return (utf16, start);
        }
        utf16 += cluster.encode_utf16().count();
    }
    (utf16, text.len())
}

/// Byte offset of the start of the last cluster, or 0 for an empty line
fn last_cluster_byte(text: &str) -> usize {
    text.grapheme_indices(true)
        .next_back()
        .map(|(start, _)| start)
        .unwrap_or(0)
}

/// Largest byte column the cursor may occupy on `text` in `mode`
pub fn max_cursor_byte(text: &str, mode: ModalMode) -> usize {
    if mode.allows_past_end() {
        text.len()
    } else {
        last_cluster_byte(text)
    }
}

fn clamp_line<D: LineSource + ?Sized>(doc: &D, line: usize) -> (usize, &str) {
    let line = line.min(doc.line_count().saturating_sub(1));
    (line, doc.line(line).unwrap_or(""))
}

/// Host position -> modal position
pub fn to_modal<D: LineSource + ?Sized>(
    pos: CursorPosition,
    mode: ModalMode,
    doc: &D,
) -> ModalPosition {
    let (line, text) = clamp_line(doc, pos.line);
    let (byte, _) = utf16_to_byte(text, pos.column);
    ModalPosition {
        line: line + 1,
        column: byte.min(max_cursor_byte(text, mode)),
    }
}

/// Modal position -> host position
pub fn to_host<D: LineSource + ?Sized>(
    pos: ModalPosition,
    mode: ModalMode,
    doc: &D,
) -> CursorPosition {
    let (line, text) = clamp_line(doc, pos.line.saturating_sub(1));
    let byte = pos.column.min(max_cursor_byte(text, mode));
    let (column, _) = byte_to_utf16(text, byte);
    CursorPosition { line, column }
}

/// Whether a host position refers to existing content
pub fn host_in_range<D: LineSource + ?Sized>(pos: CursorPosition, doc: &D) -> bool {
    match doc.line(pos.line) {
        Some(text) if pos.line < doc.line_count() => pos.column <= utf16_len(text),
        _ => false,
    }
}

/// Whether a modal position refers to existing content
pub fn modal_in_range<D: LineSource + ?Sized>(pos: ModalPosition, doc: &D) -> bool {
    pos.line >= 1
        && pos.line <= doc.line_count()
        && doc
            .line(pos.line - 1)
            .is_some_and(|text| pos.column <= text.len())
}

/// Advance a host position past the cluster it sits on (end of line stays put)
fn after_cluster<D: LineSource + ?Sized>(pos: CursorPosition, doc: &D) -> CursorPosition {
    let (line, text) = clamp_line(doc, pos.line);
    let (byte, column) = utf16_to_byte(text, pos.column);
    let width = text[byte..]
        .graphemes(true)
        .next()
        .map(|g| g.encode_utf16().count())
        .unwrap_or(0);
    CursorPosition {
        line,
        column: column + width,
    }
}

/// Convert a modal cursor (plus the other end of a visual selection) into a
/// host selection
///
/// Visual selections in the modal engine include the character under the
/// cursor; host selections are exclusive at their end, so the later end is
/// pushed past its cluster. Linewise selections cover whole lines.
pub fn modal_selection_to_host<D: LineSource + ?Sized>(
    active: ModalPosition,
    anchor: Option<ModalPosition>,
    mode: ModalMode,
    doc: &D,
) -> SelectionRange {
    let active_host = to_host(active, mode, doc);
    let Some(anchor) = anchor.filter(|_| mode.is_visual()) else {
        return SelectionRange::cursor(active_host);
    };
    let anchor_host = to_host(anchor, mode, doc);
    let forward = anchor_host <= active_host;

    match mode {
        ModalMode::VisualLine => {
            let (first, last) = if forward {
                (anchor_host.line, active_host.line)
            } else {
                (active_host.line, anchor_host.line)
            };
            let (_, last_text) = clamp_line(doc, last);
            let start = CursorPosition::new(first, 0);
            let end = CursorPosition::new(last, utf16_len(last_text));
            if forward {
                SelectionRange::new(start, end)
            } else {
                SelectionRange::new(end, start)
            }
        }
        _ => {
            if forward {
                SelectionRange::new(anchor_host, after_cluster(active_host, doc))
            } else {
                SelectionRange::new(after_cluster(anchor_host, doc), active_host)
            }
        }
    }
}
