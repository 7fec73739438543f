//! Host event handlers
//!
//! The host is authoritative for what is on screen and for view lifecycle.
//! Selection changes are forwarded to the modal engine as cursor moves; host
//! scrolling is mirrored to the engine and never corrected on the host.

use crate::model::document::{DocumentSnapshot, LineSource};
use crate::model::errors::{SyncError, Unresolved};
use crate::model::event::{DocumentId, HostEvent, ViewId, ViewKind};
use crate::model::position::{CursorPosition, SelectionRange, VisibleRange};
use crate::primitives::coordinates;
use crate::state::{AppliedToHost, AppliedToModal, ApplyKind, Observation, PendingUpdate, ViewState};
use crate::view::viewport::RevealPolicy;
use std::time::Instant;

use super::types::{Command, HostCommand, ModalCommand, Outbound};
use super::{lines_of, Reconciler};

impl Reconciler {
    /// Process one host notification
    pub fn handle_host(&mut self, event: HostEvent, now: Instant) -> Vec<Outbound> {
        tracing::trace!("host event: {:?}", event);
        let mut out = Vec::new();
        match event {
            HostEvent::DocumentOpened { document, lines } => {
                self.on_document_opened(document, lines);
            }
            HostEvent::DocumentChanged {
                document,
                first_line,
                last_line,
                replacement,
            } => {
                self.on_document_changed(document, first_line, last_line, replacement);
            }
            HostEvent::EditorShown {
                view,
                document,
                kind,
            } => self.on_editor_shown(view, document, kind, now, &mut out),
            HostEvent::EditorHidden { view } => self.on_editor_hidden(view, now),
            HostEvent::ActiveEditorChanged { view } => {
                self.on_active_editor_changed(view, now, &mut out)
            }
            HostEvent::SelectionChanged {
                view,
                selection,
                generation,
            } => self.on_selection_changed(view, selection, generation, now, &mut out),
            HostEvent::VisibleRangesChanged { view, ranges } => {
                self.on_visible_ranges_changed(view, &ranges, now, &mut out)
            }
            HostEvent::KeyInput { view } => self.on_key_input(view, now, &mut out),
            HostEvent::ViewPromoted { view } => {
                if self.views.contains_key(&view) {
                    self.promote_view(view, now, &mut out);
                } else {
                    self.diagnose(SyncError::ResolutionFailure(Unresolved::View(view)), now);
                }
            }
            HostEvent::ScrollRequested { view, command } => {
                self.on_scroll_requested(view, command, now, &mut out)
            }
        }
        out
    }

    fn on_document_opened(&mut self, document: DocumentId, lines: Vec<String>) {
        let snapshot = DocumentSnapshot::new(lines);
        let line_count = snapshot.line_count();
        self.documents.insert(document, snapshot);
        self.update_line_counts(document, line_count);
    }

    fn on_document_changed(
        &mut self,
        document: DocumentId,
        first_line: usize,
        last_line: usize,
        replacement: Vec<String>,
    ) {
        let snapshot = self.documents.entry(document).or_default();
        snapshot.replace_lines(first_line, last_line, replacement);
        let line_count = snapshot.line_count();
        self.update_line_counts(document, line_count);
    }

    fn update_line_counts(&mut self, document: DocumentId, line_count: usize) {
        for state in self.views.values_mut().filter(|s| s.document == document) {
            state.viewport.set_line_count(line_count);
        }
    }

    fn on_editor_shown(
        &mut self,
        view: ViewId,
        document: DocumentId,
        kind: Option<ViewKind>,
        now: Instant,
        out: &mut Vec<Outbound>,
    ) {
        if self.views.contains_key(&view) {
            tracing::trace!("{:?} already shown", view);
            return;
        }

        let line_count = self.documents.entry(document).or_default().line_count();
        // Unclassified views stay out of reverse resolution until settled
        let window = self
            .registry
            .register(view, document, kind.unwrap_or(ViewKind::Transient));
        let mut state = match kind {
            Some(kind) => ViewState::new(view, window, document, kind, line_count),
            None => ViewState::provisional(view, window, document, line_count, now),
        };
        state.viewport.scroll_off = self.config.scroll_off;
        state.viewport.page_overlap = self.config.page_overlap;
        tracing::debug!(
            "{:?} shown for {:?} as {:?} (provisional: {})",
            view,
            document,
            state.kind,
            state.is_provisional()
        );
        let durable = state.is_durable();
        self.views.insert(view, state);

        // Focus may have been reported before the view itself
        if durable && self.is_active(view) {
            self.activate(view, now, out);
        }
    }

    fn on_editor_hidden(&mut self, view: ViewId, now: Instant) {
        let Some(state) = self.views.remove(&view) else {
            self.diagnose(SyncError::stale(view, "close of unknown view"), now);
            return;
        };

        if state.is_provisional() {
            if !state.keystroke_seen && !state.grace_elapsed(now, self.grace()) {
                tracing::debug!("{:?} closed inside grace interval, treated as peek", view);
            } else {
                tracing::debug!("provisional {:?} closed", view);
            }
        } else if state.kind == ViewKind::Transient {
            tracing::debug!("transient {:?} closed", view);
        }
        if let Some(flight) = state.apply.in_flight() {
            tracing::debug!(
                "{:?} closed with generation {} in flight, late acknowledgments will be dropped",
                view,
                flight.generation
            );
        }

        self.registry.unregister(view);
        if self.active_view == Some(view) {
            self.active_view = None;
        }
    }

    fn on_active_editor_changed(
        &mut self,
        view: Option<ViewId>,
        now: Instant,
        out: &mut Vec<Outbound>,
    ) {
        self.active_view = view;
        let Some(view) = view else {
            return;
        };
        let Some(state) = self.views.get(&view) else {
            self.diagnose(SyncError::ResolutionFailure(Unresolved::View(view)), now);
            return;
        };
        if !state.is_durable() {
            tracing::debug!("{:?} focused but not durable, activation deferred", view);
            return;
        }
        self.activate(view, now, out);
    }

    fn on_selection_changed(
        &mut self,
        view: ViewId,
        selection: SelectionRange,
        generation: Option<u64>,
        now: Instant,
        out: &mut Vec<Outbound>,
    ) {
        let Some(state) = self.views.get_mut(&view) else {
            self.diagnose(SyncError::stale(view, "selection for unknown view"), now);
            return;
        };

        match state.observe_host(selection, generation) {
            Observation::Changed => {}
            Observation::Unchanged => return,
            Observation::Echo => {
                tracing::trace!("echo of host selection on {:?}", view);
                return;
            }
            Observation::Stale => {
                let reason = format!("selection tagged with superseded generation {generation:?}");
                self.diagnose(SyncError::stale(view, reason), now);
                return;
            }
        }

        if !state.is_durable() {
            tracing::trace!("holding selection of non-durable {:?}", view);
            return;
        }
        if !self.is_active(view) {
            tracing::debug!("deferring selection of inactive {:?} until activation", view);
            return;
        }
        self.forward_host_selection(view, now, false, out);
    }

    /// Send the view's host selection to the modal engine as a cursor move
    ///
    /// With `force` the command is sent even if the engine already reported
    /// the same cursor, as needed after switching windows.
    pub(super) fn forward_host_selection(
        &mut self,
        view: ViewId,
        now: Instant,
        force: bool,
        out: &mut Vec<Outbound>,
    ) {
        let Some(state) = self.views.get_mut(&view) else {
            return;
        };
        let Some(selection) = state.host_selection else {
            return;
        };
        if !state.apply.is_idle() {
            state.enqueue(PendingUpdate::HostSelection, now);
            tracing::trace!("{:?} busy, queued host selection", view);
            return;
        }

        let doc = lines_of(&self.documents, state.document);
        let cursor = selection.cursor_position();
        let problem = (!coordinates::host_in_range(cursor, doc)).then_some(
            SyncError::TranslationOutOfRange {
                view,
                line: cursor.line,
                column: cursor.column,
            },
        );
        let position = coordinates::to_modal(cursor, state.mode, doc);

        if force || state.modal_cursor != Some(position) {
            let generation = state.begin_apply(ApplyKind::HostUpdate, 1, now);
            state.applied_to_modal = Some(AppliedToModal {
                generation,
                position: Some(position),
                topline: None,
            });
            tracing::debug!(
                "host -> modal {:?}: {:?} -> {:?} (generation {})",
                view,
                cursor,
                position,
                generation
            );
            out.push(Outbound::tracked(
                view,
                generation,
                Command::Modal(ModalCommand::SetCursor {
                    window: state.window,
                    position,
                }),
            ));
        }

        if let Some(problem) = problem {
            self.diagnose(problem, now);
        }
    }

    fn on_visible_ranges_changed(
        &mut self,
        view: ViewId,
        ranges: &[VisibleRange],
        now: Instant,
        out: &mut Vec<Outbound>,
    ) {
        let (Some(first), Some(last)) = (ranges.first(), ranges.last()) else {
            return;
        };
        // Folded regions split the visible area; only its extent matters
        let range = VisibleRange::new(first.top_line, last.bottom_line.max(first.bottom_line));

        let Some(state) = self.views.get_mut(&view) else {
            self.diagnose(SyncError::stale(view, "visible range for unknown view"), now);
            return;
        };
        match state.observe_host_range(range) {
            Observation::Changed => {}
            Observation::Echo => {
                tracing::trace!("echo of reveal on {:?}", view);
                return;
            }
            Observation::Unchanged | Observation::Stale => return,
        }
        if !state.is_durable() || !self.is_active(view) {
            return;
        }
        self.forward_host_range(view, now, out);
    }

    /// Mirror the host's scroll position to the modal engine
    ///
    /// When the scroll left the cursor off-screen, the cursor is pulled into
    /// the new range on both sides without scrolling the host.
    pub(super) fn forward_host_range(&mut self, view: ViewId, now: Instant, out: &mut Vec<Outbound>) {
        let Some(state) = self.views.get_mut(&view) else {
            return;
        };
        if !state.apply.is_idle() {
            state.enqueue(PendingUpdate::HostVisibleRange, now);
            return;
        }

        let range = state.viewport.visible_range();
        let topline = range.top_line + 1;
        let window = state.window;
        let mut commands = Vec::new();

        if state.viewport.modal_anchor().map(|(top, _)| top) != Some(topline) {
            commands.push(Command::Modal(ModalCommand::SetTopline { window, topline }));
        }

        let doc = lines_of(&self.documents, state.document);
        let mut pulled = None;
        if let Some(selection) = state.host_selection {
            let cursor = selection.cursor_position();
            if !range.contains(cursor.line) && range.line_count() > 0 {
                let line = cursor.line.clamp(range.top_line, range.bottom_line - 1);
                let position =
                    coordinates::to_modal(CursorPosition::new(line, cursor.column), state.mode, doc);
                let host = coordinates::to_host(position, state.mode, doc);
                // Only the cursor end moves; a selection the user made survives
                let selection = if selection.is_empty() {
                    SelectionRange::cursor(host)
                } else {
                    SelectionRange::new(selection.anchor, host)
                };
                commands.push(Command::Modal(ModalCommand::SetCursor { window, position }));
                commands.push(Command::Host(HostCommand::SetSelection {
                    view,
                    selection,
                    reveal: Some((range, RevealPolicy::None)),
                }));
                pulled = Some((position, selection));
            }
        }

        if commands.is_empty() {
            return;
        }

        let generation = state.begin_apply(ApplyKind::HostUpdate, commands.len(), now);
        state.applied_to_modal = Some(AppliedToModal {
            generation,
            position: pulled.map(|(position, _)| position),
            topline: Some(topline),
        });
        if let Some((_, selection)) = pulled {
            state.applied_to_host = Some(AppliedToHost {
                generation,
                selection: Some(selection),
                range: Some(range),
            });
        }
        tracing::debug!(
            "host scroll on {:?} -> topline {} (cursor pulled: {}, generation {})",
            view,
            topline,
            pulled.is_some(),
            generation
        );
        out.extend(
            commands
                .into_iter()
                .map(|command| Outbound::tracked(view, generation, command)),
        );
    }

    fn on_key_input(&mut self, view: ViewId, now: Instant, out: &mut Vec<Outbound>) {
        let Some(state) = self.views.get_mut(&view) else {
            self.diagnose(SyncError::stale(view, "keystroke in unknown view"), now);
            return;
        };
        state.keystroke_seen = true;
        if state.is_provisional() {
            tracing::debug!("keystroke in provisional {:?}", view);
            self.promote_view(view, now, out);
        }
    }
}
