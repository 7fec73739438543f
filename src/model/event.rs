use crate::model::position::{ModalMode, ModalPosition, SelectionRange, VisibleRange};
use serde::{Deserialize, Serialize};

/// Unique identifier for a host view (one document shown in one pane)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ViewId(pub usize);

/// Unique identifier for a modal-engine window
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct WindowId(pub usize);

/// Unique identifier for a document known to the host
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct DocumentId(pub usize);

/// How the host classified a newly shown view
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ViewKind {
    /// A real editor pane the user works in
    Durable,
    /// A side effect of navigation (peek, preview); never a cursor source
    Transient,
}

/// Scroll and screen-relative motions the host intercepts so they can be
/// computed against what is actually on screen
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScrollCommand {
    /// `zt`: cursor line to the top row
    CursorToTop,
    /// `zz`: cursor line to the middle row
    CursorToCenter,
    /// `zb`: cursor line to the bottom row
    CursorToBottom,
    /// `ctrl-f`
    PageForward { count: usize },
    /// `ctrl-b`
    PageBackward { count: usize },
    /// `ctrl-d`
    HalfPageDown,
    /// `ctrl-u`
    HalfPageUp,
    /// `H`: count-th visible line from the top
    ScreenTop { count: usize },
    /// `M`
    ScreenMiddle,
    /// `L`: count-th visible line from the bottom
    ScreenBottom { count: usize },
    /// Reveal the cursor line with minimal scrolling (search jumps)
    Reveal,
}

impl ScrollCommand {
    /// Commands whose target depends on the host's current visible range
    pub fn needs_visible_range(&self) -> bool {
        !matches!(
            self,
            Self::CursorToTop | Self::CursorToCenter | Self::CursorToBottom | Self::Reveal
        )
    }
}

/// Notifications from the host editor
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum HostEvent {
    /// A document was opened; `lines` is its content without line terminators
    DocumentOpened {
        document: DocumentId,
        lines: Vec<String>,
    },

    /// Lines `first_line..last_line` of a document were replaced
    DocumentChanged {
        document: DocumentId,
        first_line: usize,
        last_line: usize,
        replacement: Vec<String>,
    },

    /// A view became visible. `kind` is `None` when the host gives no signal
    /// about whether the view is transient.
    EditorShown {
        view: ViewId,
        document: DocumentId,
        kind: Option<ViewKind>,
    },

    /// A view was closed
    EditorHidden { view: ViewId },

    /// Focus moved to another view (or to no editor at all)
    ActiveEditorChanged { view: Option<ViewId> },

    /// The selection of a view changed. `generation` is set when the host
    /// tags the notification with the generation of the command it applied.
    SelectionChanged {
        view: ViewId,
        selection: SelectionRange,
        #[serde(default)]
        generation: Option<u64>,
    },

    /// The visible ranges of a view changed (one range per folded region)
    VisibleRangesChanged {
        view: ViewId,
        ranges: Vec<VisibleRange>,
    },

    /// The user typed directly into a view
    KeyInput { view: ViewId },

    /// A transient view was turned into a real editor
    ViewPromoted { view: ViewId },

    /// The user invoked a scroll or screen-relative motion
    ScrollRequested {
        view: ViewId,
        command: ScrollCommand,
    },
}

/// Notifications from the modal engine
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ModalEvent {
    /// The cursor of a window moved. `anchor` is the other end of a visual
    /// selection, when one is active.
    CursorMoved {
        window: WindowId,
        position: ModalPosition,
        #[serde(default)]
        anchor: Option<ModalPosition>,
    },

    /// The editing mode changed for a window
    ModeChanged { window: WindowId, mode: ModalMode },

    /// A window scrolled; `topline` is 1-based
    WindowScrolled {
        window: WindowId,
        topline: usize,
        height: usize,
    },
}

impl ModalEvent {
    pub fn window(&self) -> WindowId {
        match self {
            Self::CursorMoved { window, .. }
            | Self::ModeChanged { window, .. }
            | Self::WindowScrolled { window, .. } => *window,
        }
    }
}
