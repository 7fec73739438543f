//! In-process stand-in for the modal engine
//!
//! Like the real engine, it reports the cursor after every cursor command and
//! the topline after every scroll command.

use async_trait::async_trait;
use modal_sync::model::event::{ModalEvent, WindowId};
use modal_sync::model::position::{ModalMode, ModalPosition};
use modal_sync::services::async_bridge::BridgeHandle;
use modal_sync::services::rpc::{ModalEngine, RpcError};
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Mutex, OnceLock};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModalCall {
    SetCursor {
        window: WindowId,
        position: ModalPosition,
    },
    ActivateWindow {
        window: WindowId,
    },
    SetTopline {
        window: WindowId,
        topline: usize,
    },
}

pub struct FakeModal {
    height: usize,
    calls: Mutex<Vec<ModalCall>>,
    modes: Mutex<HashMap<WindowId, ModalMode>>,
    cursors: Mutex<HashMap<WindowId, ModalPosition>>,
    current: Mutex<Option<WindowId>>,
    /// Number of upcoming cursor commands to reject
    failing_cursor_commands: AtomicUsize,
    handle: OnceLock<BridgeHandle>,
}

impl FakeModal {
    pub fn new(height: usize) -> Self {
        Self {
            height,
            calls: Mutex::new(Vec::new()),
            modes: Mutex::new(HashMap::new()),
            cursors: Mutex::new(HashMap::new()),
            current: Mutex::new(None),
            failing_cursor_commands: AtomicUsize::new(0),
            handle: OnceLock::new(),
        }
    }

    pub fn connect(&self, handle: BridgeHandle) {
        let _ = self.handle.set(handle);
    }

    pub fn calls(&self) -> Vec<ModalCall> {
        self.calls.lock().unwrap().clone()
    }

    pub fn clear_calls(&self) {
        self.calls.lock().unwrap().clear();
    }

    pub fn cursor_of(&self, window: WindowId) -> Option<ModalPosition> {
        self.cursors.lock().unwrap().get(&window).copied()
    }

    pub fn current_window(&self) -> Option<WindowId> {
        *self.current.lock().unwrap()
    }

    /// Cursor commands sent to `window`, in order
    pub fn cursor_commands(&self, window: WindowId) -> Vec<ModalPosition> {
        self.calls()
            .into_iter()
            .filter_map(|call| match call {
                ModalCall::SetCursor {
                    window: w,
                    position,
                } if w == window => Some(position),
                _ => None,
            })
            .collect()
    }

    /// Reject the next `count` cursor commands with a remote error
    pub fn fail_cursor_commands(&self, count: usize) {
        self.failing_cursor_commands.store(count, Ordering::SeqCst);
    }

    /// Switch mode as if the user pressed a mode key, and report it
    pub fn switch_mode(&self, window: WindowId, mode: ModalMode) {
        self.modes.lock().unwrap().insert(window, mode);
        self.notify(ModalEvent::ModeChanged { window, mode });
    }

    /// Move the cursor as if the user typed a motion, and report it
    pub fn user_motion(&self, window: WindowId, position: ModalPosition) {
        self.cursors.lock().unwrap().insert(window, position);
        self.notify(ModalEvent::CursorMoved {
            window,
            position,
            anchor: None,
        });
    }

    /// Scroll the window on its own (`ctrl-e`, `zt` handled by the engine)
    pub fn user_scroll(&self, window: WindowId, topline: usize) {
        self.notify(ModalEvent::WindowScrolled {
            window,
            topline,
            height: self.height,
        });
    }

    fn record(&self, call: ModalCall) {
        self.calls.lock().unwrap().push(call);
    }

    fn notify(&self, event: ModalEvent) {
        if let Some(handle) = self.handle.get() {
            handle.modal_event(event);
        }
    }
}

#[async_trait]
impl ModalEngine for FakeModal {
    async fn set_cursor(&self, window: WindowId, position: ModalPosition) -> Result<(), RpcError> {
        self.record(ModalCall::SetCursor { window, position });
        let failing = self.failing_cursor_commands.load(Ordering::SeqCst);
        if failing > 0 {
            self.failing_cursor_commands
                .store(failing - 1, Ordering::SeqCst);
            return Err(RpcError::Remote("E5555: invalid cursor".to_string()));
        }
        self.cursors.lock().unwrap().insert(window, position);
        self.notify(ModalEvent::CursorMoved {
            window,
            position,
            anchor: None,
        });
        Ok(())
    }

    async fn activate_window(&self, window: WindowId) -> Result<(), RpcError> {
        self.record(ModalCall::ActivateWindow { window });
        *self.current.lock().unwrap() = Some(window);
        Ok(())
    }

    async fn set_topline(&self, window: WindowId, topline: usize) -> Result<(), RpcError> {
        self.record(ModalCall::SetTopline { window, topline });
        self.notify(ModalEvent::WindowScrolled {
            window,
            topline,
            height: self.height,
        });
        Ok(())
    }

    async fn window_height(&self, _window: WindowId) -> Result<usize, RpcError> {
        Ok(self.height)
    }

    async fn mode(&self, window: WindowId) -> Result<ModalMode, RpcError> {
        Ok(self
            .modes
            .lock()
            .unwrap()
            .get(&window)
            .copied()
            .unwrap_or_default())
    }
}
