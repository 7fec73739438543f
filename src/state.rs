use crate::model::event::{DocumentId, ScrollCommand, ViewId, ViewKind, WindowId};
use crate::model::position::{ModalMode, ModalPosition, SelectionRange, VisibleRange};
use crate::view::cursor_style::CursorStyle;
use crate::view::viewport::Viewport;
use std::collections::VecDeque;
use std::time::{Duration, Instant};

/// Outcome of recording an observation from one side
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Observation {
    /// New state that the other side has not seen yet
    Changed,
    /// Same as what was already observed
    Unchanged,
    /// The notification reports back a command we issued
    Echo,
    /// Tagged with a generation older than the last applied one
    Stale,
}

/// Last command the engine applied to the host for a view
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AppliedToHost {
    pub generation: u64,
    pub selection: Option<SelectionRange>,
    pub range: Option<VisibleRange>,
}

/// Last command the engine applied to the modal engine for a view
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AppliedToModal {
    pub generation: u64,
    pub position: Option<ModalPosition>,
    pub topline: Option<usize>,
}

/// An apply waiting for acknowledgment
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InFlight {
    pub generation: u64,
    pub started: Instant,
    /// Tracked commands not yet acknowledged
    pub outstanding: usize,
    /// Set while a scroll command waits for the host's visible range
    pub awaiting_range: Option<ScrollCommand>,
}

/// Per-view apply token. At most one apply is in flight for a view.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ApplyState {
    #[default]
    Idle,
    /// A host-originated change is being applied to the modal engine
    ApplyingHostUpdate(InFlight),
    /// A modal-originated change (cursor, scroll) is being applied to the host
    ApplyingModalUpdate(InFlight),
}

impl ApplyState {
    pub fn is_idle(&self) -> bool {
        matches!(self, ApplyState::Idle)
    }

    pub fn in_flight(&self) -> Option<&InFlight> {
        match self {
            ApplyState::Idle => None,
            ApplyState::ApplyingHostUpdate(f) | ApplyState::ApplyingModalUpdate(f) => Some(f),
        }
    }

    fn in_flight_mut(&mut self) -> Option<&mut InFlight> {
        match self {
            ApplyState::Idle => None,
            ApplyState::ApplyingHostUpdate(f) | ApplyState::ApplyingModalUpdate(f) => Some(f),
        }
    }
}

/// Direction of an apply
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApplyKind {
    HostUpdate,
    ModalUpdate,
}

/// Work deferred while a view is busy
///
/// Cursor and range updates carry no payload: replaying one re-reads the
/// latest observed state, so a burst of moves collapses into one apply.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PendingUpdate {
    HostSelection,
    HostVisibleRange,
    ModalCursor,
    ModalScroll,
    Scroll(ScrollCommand),
}

impl PendingUpdate {
    fn same_kind(&self, other: &PendingUpdate) -> bool {
        std::mem::discriminant(self) == std::mem::discriminant(other)
    }
}

#[derive(Debug, Clone, Copy)]
struct Queued {
    update: PendingUpdate,
    queued_at: Instant,
}

/// Result of an acknowledgment
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Ack {
    /// The apply finished; the view is idle again
    Completed,
    /// More commands of the same apply are still outstanding
    Partial,
    /// Not the generation in flight
    Stale,
}

/// Everything the reconciler knows about one host view
#[derive(Debug)]
pub struct ViewState {
    pub view: ViewId,
    pub window: WindowId,
    pub document: DocumentId,
    pub kind: ViewKind,

    /// Set while the host gave no transient/durable signal; the time the view
    /// was shown
    pub provisional_since: Option<Instant>,
    pub keystroke_seen: bool,

    // Observed state, written by the ingress observers
    pub host_selection: Option<SelectionRange>,
    pub modal_cursor: Option<ModalPosition>,
    pub modal_anchor: Option<ModalPosition>,
    pub mode: ModalMode,
    pub viewport: Viewport,
    /// Whether the host has reported a visible range yet
    pub viewport_known: bool,

    // Applied state, written by the engine
    pub generation: u64,
    pub applied_to_host: Option<AppliedToHost>,
    pub applied_to_modal: Option<AppliedToModal>,
    pub apply: ApplyState,
    pub cursor_style: Option<CursorStyle>,

    pending: VecDeque<Queued>,
}

impl ViewState {
    pub fn new(
        view: ViewId,
        window: WindowId,
        document: DocumentId,
        kind: ViewKind,
        line_count: usize,
    ) -> Self {
        Self {
            view,
            window,
            document,
            kind,
            provisional_since: None,
            keystroke_seen: false,
            host_selection: None,
            modal_cursor: None,
            modal_anchor: None,
            mode: ModalMode::Normal,
            viewport: Viewport::new(1, line_count),
            viewport_known: false,
            generation: 0,
            applied_to_host: None,
            applied_to_modal: None,
            apply: ApplyState::Idle,
            cursor_style: None,
            pending: VecDeque::new(),
        }
    }

    /// Create a view the host did not classify
    pub fn provisional(
        view: ViewId,
        window: WindowId,
        document: DocumentId,
        line_count: usize,
        now: Instant,
    ) -> Self {
        let mut state = Self::new(view, window, document, ViewKind::Transient, line_count);
        state.provisional_since = Some(now);
        state
    }

    pub fn is_provisional(&self) -> bool {
        self.provisional_since.is_some()
    }

    /// Durable and no longer provisional: a valid cursor source
    pub fn is_durable(&self) -> bool {
        self.kind == ViewKind::Durable && !self.is_provisional()
    }

    pub fn make_durable(&mut self) {
        self.kind = ViewKind::Durable;
        self.provisional_since = None;
    }

    /// Whether a provisional view has outlived the grace interval
    pub fn grace_elapsed(&self, now: Instant, grace: Duration) -> bool {
        self.provisional_since
            .is_some_and(|since| now.saturating_duration_since(since) >= grace)
    }

    /// Record a host selection
    ///
    /// The echo rule runs first: a selection equal to the last one applied to
    /// the host (at the same generation, when tagged) is our own command
    /// coming back. Any other change invalidates the applied record, so a
    /// later identical user selection is not mistaken for an echo.
    pub fn observe_host(&mut self, selection: SelectionRange, generation: Option<u64>) -> Observation {
        if let Some(applied) = self.applied_to_host {
            if let Some(g) = generation {
                if g < applied.generation {
                    return Observation::Stale;
                }
            }
            let same_generation = generation.is_none_or(|g| g == applied.generation);
            if same_generation && applied.selection.is_some_and(|s| s.same_as(&selection)) {
                self.host_selection = Some(selection);
                return Observation::Echo;
            }
        }

        if self.host_selection.is_some_and(|s| s.same_as(&selection)) {
            return Observation::Unchanged;
        }

        self.host_selection = Some(selection);
        self.applied_to_host = None;
        Observation::Changed
    }

    /// Record a host visible range (already merged across folded regions)
    pub fn observe_host_range(&mut self, range: VisibleRange) -> Observation {
        self.viewport_known = true;
        if self
            .applied_to_host
            .is_some_and(|applied| applied.range == Some(range))
        {
            self.viewport.set_visible_range(range);
            return Observation::Echo;
        }
        if self.viewport.set_visible_range(range) {
            if let Some(applied) = self.applied_to_host.as_mut() {
                applied.range = None;
            }
            Observation::Changed
        } else {
            Observation::Unchanged
        }
    }

    /// Record a modal cursor, with the other end of a visual selection
    pub fn observe_modal(
        &mut self,
        position: ModalPosition,
        anchor: Option<ModalPosition>,
    ) -> Observation {
        if self
            .applied_to_modal
            .is_some_and(|applied| applied.position == Some(position))
            && anchor.is_none()
        {
            self.modal_cursor = Some(position);
            self.modal_anchor = None;
            return Observation::Echo;
        }

        if self.modal_cursor == Some(position) && self.modal_anchor == anchor {
            return Observation::Unchanged;
        }

        self.modal_cursor = Some(position);
        self.modal_anchor = anchor;
        self.applied_to_modal = None;
        Observation::Changed
    }

    /// Record a modal scroll anchor
    pub fn observe_modal_scroll(&mut self, topline: usize, height: usize) -> Observation {
        let echo = self
            .applied_to_modal
            .is_some_and(|applied| applied.topline == Some(topline));
        let previous = self.viewport.modal_anchor();
        self.viewport.set_modal_anchor(topline, height);
        if echo {
            Observation::Echo
        } else if previous == Some((topline.max(1), height.max(1))) {
            Observation::Unchanged
        } else {
            if let Some(applied) = self.applied_to_modal.as_mut() {
                applied.topline = None;
            }
            Observation::Changed
        }
    }

    /// Returns true if the mode changed
    pub fn observe_mode(&mut self, mode: ModalMode) -> bool {
        let changed = self.mode != mode;
        self.mode = mode;
        changed
    }

    /// Start an apply and return its generation
    pub fn begin_apply(&mut self, kind: ApplyKind, outstanding: usize, now: Instant) -> u64 {
        self.generation += 1;
        let flight = InFlight {
            generation: self.generation,
            started: now,
            outstanding,
            awaiting_range: None,
        };
        self.apply = match kind {
            ApplyKind::HostUpdate => ApplyState::ApplyingHostUpdate(flight),
            ApplyKind::ModalUpdate => ApplyState::ApplyingModalUpdate(flight),
        };
        self.generation
    }

    /// Start a scroll: the first step reads back the host's visible range
    pub fn begin_scroll_query(&mut self, command: ScrollCommand, now: Instant) -> u64 {
        let generation = self.begin_apply(ApplyKind::ModalUpdate, 1, now);
        if let Some(flight) = self.apply.in_flight_mut() {
            flight.awaiting_range = Some(command);
        }
        generation
    }

    /// Take the scroll command waiting on a range read-back for `generation`
    pub fn take_awaiting_range(&mut self, generation: u64) -> Option<ScrollCommand> {
        let flight = self.apply.in_flight_mut()?;
        if flight.generation != generation {
            return None;
        }
        flight.awaiting_range.take()
    }

    /// Reuse the current generation for further commands of the same apply
    pub fn extend_apply(&mut self, generation: u64, outstanding: usize) -> bool {
        match self.apply.in_flight_mut() {
            Some(flight) if flight.generation == generation => {
                flight.outstanding = outstanding;
                true
            }
            _ => false,
        }
    }

    pub fn acknowledge(&mut self, generation: u64) -> Ack {
        let Some(flight) = self.apply.in_flight_mut() else {
            return Ack::Stale;
        };
        if flight.generation != generation || flight.awaiting_range.is_some() {
            return Ack::Stale;
        }
        flight.outstanding = flight.outstanding.saturating_sub(1);
        if flight.outstanding == 0 {
            self.apply = ApplyState::Idle;
            Ack::Completed
        } else {
            Ack::Partial
        }
    }

    /// Abandon an apply that has been in flight longer than `timeout`.
    /// Returns the abandoned generation.
    pub fn expire_apply(&mut self, now: Instant, timeout: Duration) -> Option<u64> {
        let flight = self.apply.in_flight()?;
        if now.saturating_duration_since(flight.started) < timeout {
            return None;
        }
        let generation = flight.generation;
        self.apply = ApplyState::Idle;
        Some(generation)
    }

    /// Queue an update, replacing any queued update of the same kind
    pub fn enqueue(&mut self, update: PendingUpdate, now: Instant) {
        self.pending.retain(|q| !q.update.same_kind(&update));
        self.pending.push_back(Queued {
            update,
            queued_at: now,
        });
    }

    pub fn next_pending(&mut self) -> Option<PendingUpdate> {
        self.pending.pop_front().map(|q| q.update)
    }

    pub fn pending_len(&self) -> usize {
        self.pending.len()
    }

    /// Age of the oldest queued update
    pub fn oldest_pending(&self, now: Instant) -> Option<Duration> {
        self.pending
            .front()
            .map(|q| now.saturating_duration_since(q.queued_at))
    }
}
