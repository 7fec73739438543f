use crate::model::event::ScrollCommand;
use crate::model::position::VisibleRange;

/// How the host should bring a range on screen
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RevealPolicy {
    /// Do not scroll
    None,
    /// Put the first line of the range at the top of the view
    Top,
    /// Center the range in the view
    Center,
    /// Let the host scroll as little as possible
    Default,
}

/// Result of a scroll computation: where the view should be and where the
/// cursor ends up
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Reveal {
    pub range: VisibleRange,
    pub cursor_line: usize,
    pub policy: RevealPolicy,
}

impl Reveal {
    /// 1-based screen row of the cursor inside the revealed range
    pub fn winline(&self) -> usize {
        self.range.winline(self.cursor_line).unwrap_or(1)
    }
}

/// The viewport of one view - what portion of the document is visible
///
/// The host is authoritative for `top_line`: it owns rendering, soft wrap and
/// folding, so whatever it last reported is what is actually on screen. The
/// modal engine keeps its own scroll anchor (topline/height) which is tracked
/// separately and mirrored to the host when the engine scrolls on its own.
#[derive(Debug, Clone)]
pub struct Viewport {
    /// First visible line (0-based, host coordinates)
    pub top_line: usize,

    /// Number of rows the view can show
    pub height: usize,

    /// Number of lines in the document
    pub line_count: usize,

    /// Lines to keep visible above/below the cursor for screen-relative motions
    pub scroll_off: usize,

    /// Lines shared between consecutive pages on `ctrl-f`/`ctrl-b`
    pub page_overlap: usize,

    /// Last topline reported by the modal engine (1-based)
    modal_topline: Option<usize>,

    /// Last window height reported by the modal engine
    modal_height: Option<usize>,
}

impl Viewport {
    /// Create a new viewport
    pub fn new(height: usize, line_count: usize) -> Self {
        Self {
            top_line: 0,
            height: height.max(1),
            line_count: line_count.max(1),
            scroll_off: 0,
            page_overlap: 2,
            modal_topline: None,
            modal_height: None,
        }
    }

    /// Update the document size, keeping the top line inside it
    pub fn set_line_count(&mut self, line_count: usize) {
        self.line_count = line_count.max(1);
        self.top_line = self.top_line.min(self.max_top());
    }

    /// Currently visible range, clipped to the document
    pub fn visible_range(&self) -> VisibleRange {
        self.range_from(self.top_line)
    }

    /// Adopt a visible range reported by the host
    ///
    /// Returns true if the top line or height changed.
    pub fn set_visible_range(&mut self, range: VisibleRange) -> bool {
        let height = range.line_count().max(1);
        // Near the end of the document the host reports a short range; that
        // does not mean the view shrank.
        let height = if range.bottom_line >= self.line_count {
            height.max(self.height)
        } else {
            height
        };
        let changed = self.top_line != range.top_line || self.height != height;
        self.top_line = range.top_line.min(self.max_top());
        self.height = height;
        changed
    }

    /// Record the modal engine's scroll anchor and return the host range it
    /// corresponds to
    pub fn set_modal_anchor(&mut self, topline: usize, height: usize) -> VisibleRange {
        self.modal_topline = Some(topline.max(1));
        self.modal_height = Some(height.max(1));
        let top = topline.saturating_sub(1).min(self.max_top());
        VisibleRange::new(top, (top + height.max(1)).min(self.line_count))
    }

    /// Last anchor reported by the modal engine, as (topline, height)
    pub fn modal_anchor(&self) -> Option<(usize, usize)> {
        self.modal_topline.zip(self.modal_height)
    }

    /// 1-based screen row of `line`, if visible
    pub fn winline(&self, line: usize) -> Option<usize> {
        self.visible_range().winline(line)
    }

    /// Whether a reported screen row is close enough to the expected one
    ///
    /// Soft wrap and partially rendered lines make the two models disagree by
    /// a few rows; that is not worth a correction.
    pub fn winline_within(expected: usize, actual: usize, tolerance: usize) -> bool {
        expected.abs_diff(actual) <= tolerance
    }

    /// Largest valid top line
    fn max_top(&self) -> usize {
        self.line_count.saturating_sub(1)
    }

    fn range_from(&self, top: usize) -> VisibleRange {
        let top = top.min(self.max_top());
        VisibleRange::new(top, (top + self.height).min(self.line_count))
    }

    /// Compute where the view and cursor should end up for a scroll command
    ///
    /// `cursor_line` is the current cursor line in host coordinates. The
    /// returned cursor always lies inside the returned range.
    pub fn compute_reveal(&self, cursor_line: usize, command: ScrollCommand) -> Reveal {
        let height = self.height.max(1);
        let last_line = self.max_top();
        let cursor = cursor_line.min(last_line);
        let current = self.visible_range();
        let so = self.scroll_off.min(height.saturating_sub(1) / 2);

        let (top, target, policy) = match command {
            ScrollCommand::CursorToTop => (cursor, cursor, RevealPolicy::Top),
            ScrollCommand::CursorToCenter => (
                cursor.saturating_sub((height - 1) / 2),
                cursor,
                RevealPolicy::Top,
            ),
            ScrollCommand::CursorToBottom => {
                (cursor.saturating_sub(height - 1), cursor, RevealPolicy::Top)
            }
            ScrollCommand::PageForward { count } => {
                let step = height.saturating_sub(self.page_overlap).max(1);
                let top = (current.top_line + step * count.max(1)).min(last_line);
                // Forward paging leaves the cursor on the first row of the page
                let target = if top > 0 { top + so } else { top };
                (top, target, RevealPolicy::Top)
            }
            ScrollCommand::PageBackward { count } => {
                let step = height.saturating_sub(self.page_overlap).max(1);
                let top = current.top_line.saturating_sub(step * count.max(1));
                let bottom = (top + height).min(self.line_count);
                let limit = if bottom < self.line_count {
                    bottom.saturating_sub(1 + so)
                } else {
                    bottom.saturating_sub(1)
                };
                (top, cursor.min(limit), RevealPolicy::Top)
            }
            ScrollCommand::HalfPageDown => {
                let amount = (height / 2).max(1);
                let top = (current.top_line + amount).min(last_line);
                (top, (cursor + amount).min(last_line), RevealPolicy::Top)
            }
            ScrollCommand::HalfPageUp => {
                let amount = (height / 2).max(1);
                let top = current.top_line.saturating_sub(amount);
                (top, cursor.saturating_sub(amount), RevealPolicy::Top)
            }
            ScrollCommand::ScreenTop { count } => {
                let keep = if current.top_line > 0 { so } else { 0 };
                let offset = count.max(1).saturating_sub(1).max(keep);
                (current.top_line, current.top_line + offset, RevealPolicy::None)
            }
            ScrollCommand::ScreenMiddle => {
                let visible = current.line_count().max(1);
                (
                    current.top_line,
                    current.top_line + (visible - 1) / 2,
                    RevealPolicy::None,
                )
            }
            ScrollCommand::ScreenBottom { count } => {
                let keep = if current.bottom_line < self.line_count {
                    so
                } else {
                    0
                };
                let offset = count.max(1).saturating_sub(1).max(keep);
                let target = current
                    .bottom_line
                    .saturating_sub(1 + offset)
                    .max(current.top_line);
                (current.top_line, target, RevealPolicy::None)
            }
            ScrollCommand::Reveal => {
                if current.contains(cursor) {
                    (current.top_line, cursor, RevealPolicy::None)
                } else if cursor < current.top_line && current.top_line - cursor < height {
                    (cursor, cursor, RevealPolicy::Default)
                } else if cursor >= current.bottom_line && cursor - current.bottom_line < height {
                    (cursor + 1 - height.min(cursor + 1), cursor, RevealPolicy::Default)
                } else {
                    (
                        cursor.saturating_sub((height - 1) / 2),
                        cursor,
                        RevealPolicy::Center,
                    )
                }
            }
        };

        let range = self.range_from(top);
        let cursor_line = target.clamp(range.top_line, range.bottom_line.saturating_sub(1));
        tracing::trace!(
            "compute_reveal: {:?} cursor {} -> {}, range {:?} -> {:?}",
            command,
            cursor,
            cursor_line,
            current,
            range
        );
        Reveal {
            range,
            cursor_line,
            policy,
        }
    }
}
