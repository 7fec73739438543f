use crate::model::errors::SyncError;
use crate::model::event::{ViewId, WindowId};
use crate::model::position::{ModalPosition, SelectionRange, VisibleRange};
use crate::view::cursor_style::CursorStyle;
use crate::view::viewport::RevealPolicy;
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::time::Instant;

/// Command for the host editor
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum HostCommand {
    /// Set the selection, optionally revealing a range in the same step
    SetSelection {
        view: ViewId,
        selection: SelectionRange,
        reveal: Option<(VisibleRange, RevealPolicy)>,
    },
    RevealRange {
        view: ViewId,
        range: VisibleRange,
        policy: RevealPolicy,
    },
    SetCursorStyle { view: ViewId, style: CursorStyle },
    /// Read back the range the host is actually showing
    QueryVisibleRange { view: ViewId },
}

/// Command for the modal engine
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ModalCommand {
    SetCursor {
        window: WindowId,
        position: ModalPosition,
    },
    /// Make `window` the engine's current window
    ActivateWindow { window: WindowId },
    /// 1-based topline
    SetTopline { window: WindowId, topline: usize },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "target", content = "command", rename_all = "snake_case")]
pub enum Command {
    Host(HostCommand),
    Modal(ModalCommand),
}

/// A command emitted by the reconciler
///
/// Tracked commands carry the generation of the apply they belong to and
/// must be acknowledged with a [`Completion`]. Untracked ones (window
/// activation, cursor style) are fire-and-forget.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Outbound {
    pub view: ViewId,
    pub generation: Option<u64>,
    pub command: Command,
}

impl Outbound {
    pub fn tracked(view: ViewId, generation: u64, command: Command) -> Self {
        Self {
            view,
            generation: Some(generation),
            command,
        }
    }

    pub fn untracked(view: ViewId, command: Command) -> Self {
        Self {
            view,
            generation: None,
            command,
        }
    }
}

/// Result of a tracked command, fed back by the driver
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Completion {
    /// A command was applied (or failed; both release the apply token)
    Applied { view: ViewId, generation: u64 },
    /// Reply to [`HostCommand::QueryVisibleRange`]
    VisibleRange {
        view: ViewId,
        generation: u64,
        range: Option<VisibleRange>,
    },
}

impl Completion {
    pub fn view(&self) -> ViewId {
        match self {
            Completion::Applied { view, .. } | Completion::VisibleRange { view, .. } => *view,
        }
    }

    pub fn generation(&self) -> u64 {
        match self {
            Completion::Applied { generation, .. } | Completion::VisibleRange { generation, .. } => {
                *generation
            }
        }
    }
}

/// A recorded reconciliation problem
#[derive(Debug, Clone)]
pub struct Diagnostic {
    pub at: Instant,
    pub error: SyncError,
}

/// Bounded ring of recent problems, oldest dropped first
#[derive(Debug)]
pub struct Diagnostics {
    entries: VecDeque<Diagnostic>,
    capacity: usize,
}

impl Diagnostics {
    pub fn new(capacity: usize) -> Self {
        Self {
            entries: VecDeque::with_capacity(capacity.min(256)),
            capacity: capacity.max(1),
        }
    }

    pub fn record(&mut self, error: SyncError, at: Instant) {
        if self.entries.len() == self.capacity {
            self.entries.pop_front();
        }
        self.entries.push_back(Diagnostic { at, error });
    }

    pub fn iter(&self) -> impl Iterator<Item = &Diagnostic> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
