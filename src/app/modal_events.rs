use crate::model::errors::{SyncError, Unresolved};
use crate::model::event::{ModalEvent, ScrollCommand, ViewId};
use crate::model::position::{ModalMode, ModalPosition, VisibleRange};
use crate::primitives::coordinates;
use crate::state::{AppliedToHost, ApplyKind, Observation, PendingUpdate};
use crate::view::viewport::{RevealPolicy, Viewport};
use std::time::Instant;

use super::types::{Command, HostCommand, Outbound};
use super::{lines_of, Reconciler};

impl Reconciler {
    /// Process one modal engine notification
    ///
    /// Events are attributed to the window's authoritative view; windows with
    /// no durable view (only peeks, or already closed) are dropped.
    pub fn handle_modal(&mut self, event: ModalEvent, now: Instant) -> Vec<Outbound> {
        tracing::trace!("modal event: {:?}", event);
        let mut out = Vec::new();
        let window = event.window();
        let Some(view) = self.registry.resolve_reverse(window) else {
            self.diagnose(SyncError::ResolutionFailure(Unresolved::Window(window)), now);
            return out;
        };

        match event {
            ModalEvent::CursorMoved {
                position, anchor, ..
            } => self.on_modal_cursor(view, position, anchor, now, &mut out),
            ModalEvent::ModeChanged { mode, .. } => self.on_mode_changed(view, mode, &mut out),
            ModalEvent::WindowScrolled {
                topline, height, ..
            } => self.on_window_scrolled(view, topline, height, now, &mut out),
        }
        out
    }

    fn on_modal_cursor(
        &mut self,
        view: ViewId,
        position: ModalPosition,
        anchor: Option<ModalPosition>,
        now: Instant,
        out: &mut Vec<Outbound>,
    ) {
        let Some(state) = self.views.get_mut(&view) else {
            self.diagnose(SyncError::ResolutionFailure(Unresolved::View(view)), now);
            return;
        };
        match state.observe_modal(position, anchor) {
            Observation::Changed => {}
            Observation::Echo => {
                tracing::trace!("echo of modal cursor on {:?}", view);
                return;
            }
            Observation::Unchanged | Observation::Stale => return,
        }
        if !self.is_active(view) {
            tracing::debug!("modal cursor for inactive {:?} recorded only", view);
            return;
        }
        self.forward_modal_cursor(view, now, out);
    }

    /// Apply the modal cursor (and visual selection) to the host, revealing it
    /// if it moved off-screen
    pub(super) fn forward_modal_cursor(
        &mut self,
        view: ViewId,
        now: Instant,
        out: &mut Vec<Outbound>,
    ) {
        let Some(state) = self.views.get_mut(&view) else {
            return;
        };
        let Some(position) = state.modal_cursor else {
            return;
        };
        if !state.apply.is_idle() {
            state.enqueue(PendingUpdate::ModalCursor, now);
            tracing::trace!("{:?} busy, queued modal cursor", view);
            return;
        }

        let doc = lines_of(&self.documents, state.document);
        let problem = (!coordinates::modal_in_range(position, doc)).then_some(
            SyncError::TranslationOutOfRange {
                view,
                line: position.line,
                column: position.column,
            },
        );
        let selection =
            coordinates::modal_selection_to_host(position, state.modal_anchor, state.mode, doc);

        if !state.host_selection.is_some_and(|s| s.same_as(&selection)) {
            let line = selection.cursor_position().line;
            let reveal = if state.viewport_known {
                let reveal = state.viewport.compute_reveal(line, ScrollCommand::Reveal);
                (reveal.policy != RevealPolicy::None).then_some((reveal.range, reveal.policy))
            } else {
                Some((VisibleRange::new(line, line + 1), RevealPolicy::Default))
            };

            let generation = state.begin_apply(ApplyKind::ModalUpdate, 1, now);
            state.applied_to_host = Some(AppliedToHost {
                generation,
                selection: Some(selection),
                range: reveal.map(|(range, _)| range),
            });
            tracing::debug!(
                "modal -> host {:?}: {:?} -> {:?} (reveal {:?}, generation {})",
                view,
                position,
                selection,
                reveal,
                generation
            );
            out.push(Outbound::tracked(
                view,
                generation,
                Command::Host(HostCommand::SetSelection {
                    view,
                    selection,
                    reveal,
                }),
            ));
        }

        if let Some(problem) = problem {
            self.diagnose(problem, now);
        }
    }

    fn on_mode_changed(&mut self, view: ViewId, mode: ModalMode, out: &mut Vec<Outbound>) {
        let Some(state) = self.views.get_mut(&view) else {
            return;
        };
        if !state.observe_mode(mode) {
            return;
        }
        tracing::debug!("{:?} mode -> {:?}", view, mode);
        self.apply_cursor_style(view, false, out);
    }

    fn on_window_scrolled(
        &mut self,
        view: ViewId,
        topline: usize,
        height: usize,
        now: Instant,
        out: &mut Vec<Outbound>,
    ) {
        let Some(state) = self.views.get_mut(&view) else {
            return;
        };
        match state.observe_modal_scroll(topline, height) {
            Observation::Changed => {}
            Observation::Echo => {
                tracing::trace!("echo of topline {} on {:?}", topline, view);
                return;
            }
            Observation::Unchanged | Observation::Stale => return,
        }
        if !self.is_active(view) {
            return;
        }
        self.forward_modal_scroll(view, now, out);
    }

    /// Mirror the modal engine's own scrolling to the host
    pub(super) fn forward_modal_scroll(
        &mut self,
        view: ViewId,
        now: Instant,
        out: &mut Vec<Outbound>,
    ) {
        let tolerance = self.config.screen_row_tolerance;
        let Some(state) = self.views.get_mut(&view) else {
            return;
        };
        let Some((topline, height)) = state.viewport.modal_anchor() else {
            return;
        };
        if !state.apply.is_idle() {
            state.enqueue(PendingUpdate::ModalScroll, now);
            return;
        }

        let target = state.viewport.set_modal_anchor(topline, height);
        let current = state.viewport.visible_range();
        // Soft wrap makes the engine's idea of the top row drift slightly
        if state.viewport_known
            && Viewport::winline_within(target.top_line, current.top_line, tolerance)
        {
            tracing::trace!(
                "modal topline {} within tolerance of host top {} on {:?}",
                topline,
                current.top_line,
                view
            );
            return;
        }

        let generation = state.begin_apply(ApplyKind::ModalUpdate, 1, now);
        let selection = state.applied_to_host.and_then(|applied| applied.selection);
        state.applied_to_host = Some(AppliedToHost {
            generation,
            selection,
            range: Some(target),
        });
        tracing::debug!(
            "modal scroll on {:?}: topline {} -> reveal {:?} (generation {})",
            view,
            topline,
            target,
            generation
        );
        out.push(Outbound::tracked(
            view,
            generation,
            Command::Host(HostCommand::RevealRange {
                view,
                range: target,
                policy: RevealPolicy::Top,
            }),
        ));
    }
}
