//! Error taxonomy for reconciliation
//!
//! None of these reach the user. Every variant degrades to "skip this one
//! update": a missed reconciliation corrects itself on the next cursor or
//! scroll event.

use crate::model::event::{ViewId, WindowId};
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SyncError {
    /// An echo of our own command, or an update for a closed view
    #[error("stale notification for {view:?}: {reason}")]
    StaleNotification { view: Option<ViewId>, reason: String },

    /// A position referred to content that no longer exists; it was clamped
    #[error("position {line}:{column} out of range for {view:?}, clamped")]
    TranslationOutOfRange {
        view: ViewId,
        line: usize,
        column: usize,
    },

    /// A view or window could not be resolved; the update was dropped
    #[error("cannot resolve {0}")]
    ResolutionFailure(Unresolved),

    /// The counterpart never acknowledged an apply
    #[error("apply generation {generation} for {view:?} timed out")]
    ApplyTimeout { view: ViewId, generation: u64 },
}

/// What failed to resolve
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Unresolved {
    View(ViewId),
    Window(WindowId),
}

impl std::fmt::Display for Unresolved {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Unresolved::View(view) => write!(f, "view {}", view.0),
            Unresolved::Window(window) => write!(f, "window {}", window.0),
        }
    }
}

impl SyncError {
    pub fn stale(view: impl Into<Option<ViewId>>, reason: impl Into<String>) -> Self {
        SyncError::StaleNotification {
            view: view.into(),
            reason: reason.into(),
        }
    }
}
