//! Async Bridge: drives the synchronous reconciler from a Tokio event loop
//!
//! - Host and modal notifications arrive on one ingress channel, tagged by
//!   source, and are handled in arrival order
//! - The reconciler decides synchronously; it never awaits
//! - Commands it emits are executed on a `JoinSet`, one batch at a time.
//!   Commands from one step run in order inside a single task, so a window is
//!   activated before a cursor lands in it, and the next batch cannot
//!   activate another window before the mode of this one has been read
//! - Results come back as completions; RPC failures are logged and count as
//!   acknowledgments so the view never stays blocked
//!
//! Philosophy (same split as the editor's LSP plumbing):
//! - I/O is async
//! - Decisions are sync

use crate::app::{Command, Completion, HostCommand, ModalCommand, Outbound, Reconciler};
use crate::config::SyncConfig;
use crate::model::event::{HostEvent, ModalEvent, WindowId};
use crate::services::rpc::{HostEditor, ModalEngine, RpcError};
use std::collections::VecDeque;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::mpsc;
use tokio::task::{JoinError, JoinSet};
use tokio::time::MissedTickBehavior;

/// A notification entering the bridge
#[derive(Debug, Clone)]
pub enum Ingress {
    Host(HostEvent),
    Modal(ModalEvent),
}

/// Work executed against the host and the engine, one job at a time
#[derive(Debug)]
enum Job {
    Batch(Vec<Outbound>),
    /// Look up the height the engine left out of a scroll notification
    WindowHeight { window: WindowId, topline: usize },
}

/// Result of one executed command
#[derive(Debug)]
enum Finished {
    Completion(Completion),
    /// Follow-up notification produced by the driver itself
    Event(Ingress),
}

/// Cloneable sender for host and modal notifications
#[derive(Debug, Clone)]
pub struct BridgeHandle {
    sender: mpsc::UnboundedSender<Ingress>,
}

impl BridgeHandle {
    /// Returns false if the bridge has stopped
    pub fn host_event(&self, event: HostEvent) -> bool {
        self.sender.send(Ingress::Host(event)).is_ok()
    }

    /// Returns false if the bridge has stopped
    pub fn modal_event(&self, event: ModalEvent) -> bool {
        self.sender.send(Ingress::Modal(event)).is_ok()
    }
}

pub struct Bridge {
    reconciler: Reconciler,
    host: Arc<dyn HostEditor>,
    modal: Arc<dyn ModalEngine>,
    receiver: mpsc::UnboundedReceiver<Ingress>,
    /// Holds at most one running job
    in_flight: JoinSet<Vec<Finished>>,
    queued: VecDeque<Job>,
    tick_interval: Duration,
}

impl Bridge {
    /// Create a bridge and the handle that feeds it. The bridge stops once
    /// every handle is dropped.
    pub fn new(
        config: SyncConfig,
        host: Arc<dyn HostEditor>,
        modal: Arc<dyn ModalEngine>,
    ) -> (Self, BridgeHandle) {
        let (sender, receiver) = mpsc::unbounded_channel();
        let tick_interval = Duration::from_millis(config.tick_interval_ms.max(1));
        let bridge = Self {
            reconciler: Reconciler::new(config),
            host,
            modal,
            receiver,
            in_flight: JoinSet::new(),
            queued: VecDeque::new(),
            tick_interval,
        };
        (bridge, BridgeHandle { sender })
    }

    pub fn reconciler(&self) -> &Reconciler {
        &self.reconciler
    }

    /// Run until all handles are dropped, then wait for in-flight commands
    pub async fn run(mut self) -> Reconciler {
        let mut ticker = tokio::time::interval(self.tick_interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        tracing::info!("sync bridge started (tick {:?})", self.tick_interval);

        loop {
            tokio::select! {
                message = self.receiver.recv() => match message {
                    Some(message) => self.dispatch(message),
                    None => break,
                },
                Some(joined) = self.in_flight.join_next(), if !self.in_flight.is_empty() => {
                    self.on_joined(joined);
                }
                _ = ticker.tick() => self.tick(Instant::now()),
            }
        }

        while let Some(joined) = self.in_flight.join_next().await {
            self.on_joined(joined);
        }
        tracing::info!("sync bridge stopped");
        self.reconciler
    }

    /// Process everything queued and in flight until the bridge is quiet
    ///
    /// Does not advance timers; call [`Bridge::tick`] for that.
    pub async fn run_until_idle(&mut self) {
        loop {
            while let Ok(message) = self.receiver.try_recv() {
                self.dispatch(message);
            }
            match self.in_flight.join_next().await {
                Some(joined) => self.on_joined(joined),
                None if self.receiver.is_empty() && self.queued.is_empty() => break,
                None => self.start_next(),
            }
        }
    }

    /// Run timeouts and provisional-view promotion as of `now`
    pub fn tick(&mut self, now: Instant) {
        let out = self.reconciler.tick(now);
        self.spawn_batch(out);
    }

    fn dispatch(&mut self, message: Ingress) {
        let now = Instant::now();
        let out = match message {
            // Engines that omit the window height get it looked up first
            Ingress::Modal(ModalEvent::WindowScrolled {
                window,
                topline,
                height: 0,
            }) => {
                self.enqueue(Job::WindowHeight { window, topline });
                return;
            }
            Ingress::Host(event) => self.reconciler.handle_host(event, now),
            Ingress::Modal(event) => self.reconciler.handle_modal(event, now),
        };
        self.spawn_batch(out);
    }

    fn on_joined(&mut self, joined: Result<Vec<Finished>, JoinError>) {
        match joined {
            Ok(finished) => {
                for item in finished {
                    match item {
                        Finished::Completion(completion) => {
                            let out = self.reconciler.complete(completion, Instant::now());
                            self.spawn_batch(out);
                        }
                        Finished::Event(message) => self.dispatch(message),
                    }
                }
            }
            Err(e) => tracing::error!("bridge task failed: {}", e),
        }
        self.start_next();
    }

    fn spawn_batch(&mut self, out: Vec<Outbound>) {
        if !out.is_empty() {
            self.enqueue(Job::Batch(out));
        }
    }

    fn enqueue(&mut self, job: Job) {
        self.queued.push_back(job);
        self.start_next();
    }

    /// Start the oldest queued job unless one is still running
    fn start_next(&mut self) {
        if !self.in_flight.is_empty() {
            return;
        }
        let Some(job) = self.queued.pop_front() else {
            return;
        };
        if !self.queued.is_empty() {
            tracing::trace!("{} jobs waiting behind {:?}", self.queued.len(), job);
        }
        let host = Arc::clone(&self.host);
        let modal = Arc::clone(&self.modal);
        self.in_flight.spawn(async move {
            match job {
                Job::Batch(out) => execute_batch(host, modal, out).await,
                Job::WindowHeight { window, topline } => {
                    vec![lookup_window_height(modal, window, topline).await]
                }
            }
        });
    }
}

/// Fill in the height of a scroll notification that came without one
async fn lookup_window_height(
    modal: Arc<dyn ModalEngine>,
    window: WindowId,
    topline: usize,
) -> Finished {
    let height = match modal.window_height(window).await {
        Ok(height) => height,
        Err(e) => {
            tracing::warn!("window_height({:?}) failed: {}", window, e);
            1
        }
    };
    Finished::Event(Ingress::Modal(ModalEvent::WindowScrolled {
        window,
        topline,
        height: height.max(1),
    }))
}

/// Execute commands in order, collecting completions for tracked ones
async fn execute_batch(
    host: Arc<dyn HostEditor>,
    modal: Arc<dyn ModalEngine>,
    out: Vec<Outbound>,
) -> Vec<Finished> {
    let mut finished = Vec::new();
    for outbound in out {
        let view = outbound.view;
        let result: Result<(), RpcError> = match outbound.command {
            Command::Host(HostCommand::SetSelection {
                view,
                selection,
                reveal,
            }) => host.set_selection(view, selection, reveal).await,
            Command::Host(HostCommand::RevealRange {
                view,
                range,
                policy,
            }) => host.reveal_range(view, range, policy).await,
            Command::Host(HostCommand::SetCursorStyle { view, style }) => {
                host.set_cursor_style(view, style).await
            }
            Command::Host(HostCommand::QueryVisibleRange { view }) => {
                let range = match host.visible_range(view).await {
                    Ok(range) => range,
                    Err(e) => {
                        tracing::warn!("visible_range({:?}) failed: {}", view, e);
                        None
                    }
                };
                if let Some(generation) = outbound.generation {
                    finished.push(Finished::Completion(Completion::VisibleRange {
                        view,
                        generation,
                        range,
                    }));
                }
                continue;
            }
            Command::Modal(ModalCommand::SetCursor { window, position }) => {
                modal.set_cursor(window, position).await
            }
            Command::Modal(ModalCommand::ActivateWindow { window }) => {
                let result = modal.activate_window(window).await;
                // The new window may be in another mode than the last one
                match modal.mode(window).await {
                    Ok(mode) => finished.push(Finished::Event(Ingress::Modal(
                        ModalEvent::ModeChanged { window, mode },
                    ))),
                    Err(e) => tracing::debug!("mode({:?}) failed: {}", window, e),
                }
                result
            }
            Command::Modal(ModalCommand::SetTopline { window, topline }) => {
                modal.set_topline(window, topline).await
            }
        };

        if let Err(e) = result {
            tracing::warn!("command for {:?} failed, treating as applied: {}", view, e);
        }
        if let Some(generation) = outbound.generation {
            finished.push(Finished::Completion(Completion::Applied { view, generation }));
        }
    }
    finished
}
