//! Acknowledgments, timeouts and queue replay
//!
//! A view holds one apply token. Commands of the apply carry its generation;
//! when every tracked command has been acknowledged (or the apply timed out)
//! the token is released and queued work for the view is replayed in order.
//! Acknowledgments for a closed view or a superseded generation are dropped.

use crate::model::errors::SyncError;
use crate::model::event::ViewId;
use crate::state::{Ack, PendingUpdate};
use std::time::Instant;

use super::types::{Completion, Outbound};
use super::Reconciler;

impl Reconciler {
    /// Process the result of a tracked command
    pub fn complete(&mut self, completion: Completion, now: Instant) -> Vec<Outbound> {
        let mut out = Vec::new();
        let view = completion.view();
        let generation = completion.generation();

        let Some(state) = self.views.get_mut(&view) else {
            let reason = format!("acknowledgment of generation {generation} for closed view");
            self.diagnose(SyncError::stale(view, reason), now);
            return out;
        };

        match completion {
            Completion::VisibleRange { range, .. } => {
                let Some(command) = state.take_awaiting_range(generation) else {
                    let reason = format!("visible range reply for generation {generation}");
                    self.diagnose(SyncError::stale(view, reason), now);
                    return out;
                };
                match range {
                    Some(range) => {
                        state.viewport.set_visible_range(range);
                        state.viewport_known = true;
                    }
                    None => tracing::debug!(
                        "no visible range from host for {:?}, using last known",
                        view
                    ),
                }
                self.finish_scroll(view, generation, command, &mut out);
            }
            Completion::Applied { .. } => match state.acknowledge(generation) {
                Ack::Completed => {
                    tracing::trace!("{:?} generation {} complete", view, generation);
                    self.drain_pending(view, now, &mut out);
                }
                Ack::Partial => {}
                Ack::Stale => {
                    let reason = format!("acknowledgment of superseded generation {generation}");
                    self.diagnose(SyncError::stale(view, reason), now);
                }
            },
        }
        out
    }

    /// Advance time: settle provisional views whose grace interval elapsed
    /// and abandon applies that were never acknowledged
    pub fn tick(&mut self, now: Instant) -> Vec<Outbound> {
        let mut out = Vec::new();
        let grace = self.grace();
        let timeout = self.apply_timeout();

        let mut views: Vec<ViewId> = self.views.keys().copied().collect();
        views.sort();

        for view in views {
            let Some(state) = self.views.get_mut(&view) else {
                continue;
            };
            if state.grace_elapsed(now, grace) {
                tracing::debug!("grace interval elapsed for provisional {:?}", view);
                self.promote_view(view, now, &mut out);
            }

            let Some(state) = self.views.get_mut(&view) else {
                continue;
            };
            let queued_for = state.oldest_pending(now);
            if let Some(generation) = state.expire_apply(now, timeout) {
                tracing::warn!(
                    "{:?}: generation {} unacknowledged after {:?}, proceeding (queued for {:?})",
                    view,
                    generation,
                    timeout,
                    queued_for
                );
                self.diagnose(SyncError::ApplyTimeout { view, generation }, now);
                self.drain_pending(view, now, &mut out);
            }
        }
        out
    }

    /// Replay queued updates while the view is idle
    pub(super) fn drain_pending(&mut self, view: ViewId, now: Instant, out: &mut Vec<Outbound>) {
        loop {
            let Some(state) = self.views.get_mut(&view) else {
                return;
            };
            if !state.apply.is_idle() {
                return;
            }
            let Some(update) = state.next_pending() else {
                return;
            };
            tracing::trace!("replaying {:?} for {:?}", update, view);
            match update {
                // Forwarded again on activation
                PendingUpdate::HostSelection if !self.is_active(view) => {}
                PendingUpdate::HostSelection => self.forward_host_selection(view, now, false, out),
                PendingUpdate::HostVisibleRange => self.forward_host_range(view, now, out),
                PendingUpdate::ModalCursor => self.forward_modal_cursor(view, now, out),
                PendingUpdate::ModalScroll => self.forward_modal_scroll(view, now, out),
                PendingUpdate::Scroll(command) => self.start_scroll(view, command, now, out),
            }
        }
    }
}
