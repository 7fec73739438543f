//! Cursor shape derived from the modal engine's mode
//!
//! The style is tracked per view: two panes side by side, one in insert mode
//! and one in normal mode, each keep their own shape no matter which one was
//! focused last.

use crate::model::position::ModalMode;
use serde::{Deserialize, Serialize};

/// Shape of the host cursor
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CursorShape {
    /// Block cursor (█)
    Block,
    /// Vertical bar cursor (│)
    Line,
    /// Underline cursor (_)
    Underline,
}

/// Extra highlight applied on top of the shape
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CursorHighlight {
    #[default]
    Default,
    /// Visual modes tint the cursor so it stands out from the selection
    Visual,
}

/// Full cursor style sent to the host
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CursorStyle {
    pub shape: CursorShape,
    pub blink: bool,
    pub highlight: CursorHighlight,
}

impl CursorStyle {
    /// All shape/blink combinations, named like terminal cursor styles
    pub const OPTIONS: &'static [&'static str] = &[
        "blinking_block",
        "steady_block",
        "blinking_bar",
        "steady_bar",
        "blinking_underline",
        "steady_underline",
    ];

    /// Convert to string representation (highlight is not part of the name)
    pub fn as_str(self) -> &'static str {
        match (self.shape, self.blink) {
            (CursorShape::Block, true) => "blinking_block",
            (CursorShape::Block, false) => "steady_block",
            (CursorShape::Line, true) => "blinking_bar",
            (CursorShape::Line, false) => "steady_bar",
            (CursorShape::Underline, true) => "blinking_underline",
            (CursorShape::Underline, false) => "steady_underline",
        }
    }

    /// Parse from string
    pub fn parse(s: &str) -> Option<Self> {
        let (shape, blink) = match s {
            "blinking_block" => (CursorShape::Block, true),
            "steady_block" => (CursorShape::Block, false),
            "blinking_bar" => (CursorShape::Line, true),
            "steady_bar" => (CursorShape::Line, false),
            "blinking_underline" => (CursorShape::Underline, true),
            "steady_underline" => (CursorShape::Underline, false),
            _ => return None,
        };
        Some(Self {
            shape,
            blink,
            highlight: CursorHighlight::Default,
        })
    }
}

/// Cursor style for a modal mode
pub fn style_for(mode: ModalMode, blink: bool) -> CursorStyle {
    let (shape, highlight) = match mode {
        ModalMode::Normal => (CursorShape::Block, CursorHighlight::Default),
        ModalMode::Insert | ModalMode::CommandLine => (CursorShape::Line, CursorHighlight::Default),
        ModalMode::Replace | ModalMode::OperatorPending => {
            (CursorShape::Underline, CursorHighlight::Default)
        }
        ModalMode::Visual | ModalMode::VisualLine | ModalMode::VisualBlock => {
            (CursorShape::Block, CursorHighlight::Visual)
        }
    };
    CursorStyle {
        shape,
        blink,
        highlight,
    }
}
