//! Reconciliation engine
//!
//! The [`Reconciler`] is a synchronous state machine. Each entry point takes
//! one notification (host event, modal event, command completion or a timer
//! tick) plus the current time and returns the commands to send. It performs
//! no I/O; the async driver in `services::async_bridge` carries commands to
//! the host and the modal engine and feeds their results back.
//!
//! Handlers are split by source:
//! - `host_events`: selection, visible range and view lifecycle from the host
//! - `modal_events`: cursor, mode and scroll notifications from the engine
//! - `scroll`: host-intercepted scroll and screen-relative motions
//! - `apply`: acknowledgments, timeouts and queue replay

mod apply;
mod host_events;
mod modal_events;
mod scroll;
pub mod types;

use crate::config::SyncConfig;
use crate::model::document::DocumentSnapshot;
use crate::model::errors::SyncError;
use crate::model::event::{DocumentId, ViewId};
use crate::state::ViewState;
use crate::view::cursor_style::style_for;
use crate::view::registry::ViewRegistry;
use std::collections::HashMap;
use std::time::{Duration, Instant};

pub use self::types::{
    Command, Completion, Diagnostic, Diagnostics, HostCommand, ModalCommand, Outbound,
};

/// Keeps host views and modal windows in agreement about cursor, selection
/// and viewport
pub struct Reconciler {
    config: SyncConfig,
    registry: ViewRegistry,
    views: HashMap<ViewId, ViewState>,
    documents: HashMap<DocumentId, DocumentSnapshot>,
    /// View the host reports as focused
    active_view: Option<ViewId>,
    diagnostics: Diagnostics,
}

impl Reconciler {
    pub fn new(config: SyncConfig) -> Self {
        let diagnostics = Diagnostics::new(config.diagnostics_capacity);
        Self {
            config,
            registry: ViewRegistry::new(),
            views: HashMap::new(),
            documents: HashMap::new(),
            active_view: None,
            diagnostics,
        }
    }

    pub fn config(&self) -> &SyncConfig {
        &self.config
    }

    pub fn registry(&self) -> &ViewRegistry {
        &self.registry
    }

    pub fn view_state(&self, view: ViewId) -> Option<&ViewState> {
        self.views.get(&view)
    }

    pub fn active_view(&self) -> Option<ViewId> {
        self.active_view
    }

    pub fn document(&self, document: DocumentId) -> Option<&DocumentSnapshot> {
        self.documents.get(&document)
    }

    pub fn diagnostics(&self) -> &Diagnostics {
        &self.diagnostics
    }

    /// Whether any view has an apply in flight or queued work
    pub fn is_settled(&self) -> bool {
        self.views
            .values()
            .all(|s| s.apply.is_idle() && s.pending_len() == 0)
    }

    fn grace(&self) -> Duration {
        Duration::from_millis(self.config.transient_grace_ms)
    }

    fn apply_timeout(&self) -> Duration {
        Duration::from_millis(self.config.apply_timeout_ms)
    }

    fn is_active(&self, view: ViewId) -> bool {
        self.active_view == Some(view)
    }

    /// Log a problem and keep it in the diagnostics ring
    fn diagnose(&mut self, error: SyncError, now: Instant) {
        match &error {
            SyncError::StaleNotification { .. } | SyncError::ResolutionFailure(_) => {
                tracing::debug!("dropped: {}", error)
            }
            SyncError::TranslationOutOfRange { .. } => tracing::debug!("{}", error),
            SyncError::ApplyTimeout { .. } => tracing::warn!("{}", error),
        }
        self.diagnostics.record(error, now);
    }

    /// Make `view` the modal engine's current window and bring the engine's
    /// cursor and the host's cursor style in line with it
    ///
    /// The window is activated before any cursor command so the cursor lands
    /// in the right window.
    fn activate(&mut self, view: ViewId, now: Instant, out: &mut Vec<Outbound>) {
        let Some(window) = self.views.get(&view).map(|s| s.window) else {
            return;
        };
        self.registry.focus(view);
        tracing::debug!("activating {:?} for {:?}", window, view);
        out.push(Outbound::untracked(
            view,
            Command::Modal(ModalCommand::ActivateWindow { window }),
        ));
        self.forward_host_selection(view, now, true, out);
        self.apply_cursor_style(view, true, out);
    }

    /// Turn a provisional or transient view into a durable one
    fn promote_view(&mut self, view: ViewId, now: Instant, out: &mut Vec<Outbound>) {
        let Some(state) = self.views.get_mut(&view) else {
            return;
        };
        if state.is_durable() {
            return;
        }
        state.make_durable();
        self.registry.promote(view);
        tracing::debug!("{:?} is now durable", view);
        if self.is_active(view) {
            self.activate(view, now, out);
        }
    }

    /// Send the cursor style for the view's current mode
    fn apply_cursor_style(&mut self, view: ViewId, force: bool, out: &mut Vec<Outbound>) {
        let blink = self.config.cursor_blink;
        let Some(state) = self.views.get_mut(&view) else {
            return;
        };
        if !state.is_durable() {
            return;
        }
        let style = style_for(state.mode, blink);
        if !force && state.cursor_style == Some(style) {
            return;
        }
        state.cursor_style = Some(style);
        out.push(Outbound::untracked(
            view,
            Command::Host(HostCommand::SetCursorStyle { view, style }),
        ));
    }
}

/// Lines of a document, or an empty document if it is unknown
fn lines_of(documents: &HashMap<DocumentId, DocumentSnapshot>, document: DocumentId) -> &[String] {
    documents.get(&document).map(|d| d.lines()).unwrap_or(&[])
}

