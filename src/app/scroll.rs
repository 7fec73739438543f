//! Host-intercepted scroll and screen-relative motions
//!
//! `zt`/`zz`/`zb`, paging and `H`/`M`/`L` depend on what is actually on
//! screen, which only the host knows (soft wrap, folding, font size). The
//! flow is:
//! 1. read back the host's visible range (skipped for cursor-relative
//!    commands once the viewport is known)
//! 2. compute the reveal against that range
//! 3. send the host "set selection + reveal" and the modal "set cursor" under
//!    one generation

use crate::model::errors::SyncError;
use crate::model::event::{ScrollCommand, ViewId};
use crate::model::position::{CursorPosition, SelectionRange};
use crate::primitives::coordinates;
use crate::state::{AppliedToHost, AppliedToModal, ApplyKind, PendingUpdate};
use std::time::Instant;

use super::types::{Command, HostCommand, ModalCommand, Outbound};
use super::{lines_of, Reconciler};

impl Reconciler {
    pub(super) fn on_scroll_requested(
        &mut self,
        view: ViewId,
        command: ScrollCommand,
        now: Instant,
        out: &mut Vec<Outbound>,
    ) {
        let Some(state) = self.views.get(&view) else {
            self.diagnose(SyncError::stale(view, "scroll in unknown view"), now);
            return;
        };
        if !state.is_durable() {
            tracing::debug!("{:?} in non-durable {:?} ignored", command, view);
            return;
        }
        self.start_scroll(view, command, now, out);
    }

    pub(super) fn start_scroll(
        &mut self,
        view: ViewId,
        command: ScrollCommand,
        now: Instant,
        out: &mut Vec<Outbound>,
    ) {
        let Some(state) = self.views.get_mut(&view) else {
            return;
        };
        if !state.apply.is_idle() {
            state.enqueue(PendingUpdate::Scroll(command), now);
            tracing::trace!("{:?} busy, queued {:?}", view, command);
            return;
        }

        if command.needs_visible_range() || !state.viewport_known {
            let generation = state.begin_scroll_query(command, now);
            tracing::debug!(
                "{:?} on {:?}: reading back visible range (generation {})",
                command,
                view,
                generation
            );
            out.push(Outbound::tracked(
                view,
                generation,
                Command::Host(HostCommand::QueryVisibleRange { view }),
            ));
            return;
        }

        let generation = state.begin_apply(ApplyKind::ModalUpdate, 2, now);
        self.finish_scroll(view, generation, command, out);
    }

    /// Compute the reveal for `command` and emit the combined apply
    pub(super) fn finish_scroll(
        &mut self,
        view: ViewId,
        generation: u64,
        command: ScrollCommand,
        out: &mut Vec<Outbound>,
    ) {
        let Some(state) = self.views.get_mut(&view) else {
            return;
        };
        let doc = lines_of(&self.documents, state.document);
        let mode = state.mode;

        // A selection we applied and the host has not contradicted is newer
        // than the last one observed
        let cursor = state
            .applied_to_host
            .and_then(|applied| applied.selection)
            .or(state.host_selection)
            .map(|s| s.cursor_position())
            .or_else(|| state.modal_cursor.map(|p| coordinates::to_host(p, mode, doc)))
            .unwrap_or_default();
        let reveal = state.viewport.compute_reveal(cursor.line, command);

        // Keep the column, clamped to the target line for the current mode
        let position =
            coordinates::to_modal(CursorPosition::new(reveal.cursor_line, cursor.column), mode, doc);
        let selection = SelectionRange::cursor(coordinates::to_host(position, mode, doc));

        state.extend_apply(generation, 2);
        state.applied_to_host = Some(AppliedToHost {
            generation,
            selection: Some(selection),
            range: Some(reveal.range),
        });
        state.applied_to_modal = Some(AppliedToModal {
            generation,
            position: Some(position),
            topline: Some(reveal.range.top_line + 1),
        });

        tracing::debug!(
            "{:?} on {:?}: cursor {} -> {}, range {:?} (winline {}, generation {})",
            command,
            view,
            cursor.line,
            reveal.cursor_line,
            reveal.range,
            reveal.winline(),
            generation
        );
        out.push(Outbound::tracked(
            view,
            generation,
            Command::Host(HostCommand::SetSelection {
                view,
                selection,
                reveal: Some((reveal.range, reveal.policy)),
            }),
        ));
        out.push(Outbound::tracked(
            view,
            generation,
            Command::Modal(ModalCommand::SetCursor {
                window: state.window,
                position,
            }),
        ));
    }
}
