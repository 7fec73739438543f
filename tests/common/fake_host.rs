//! In-process stand-in for the host editor
//!
//! Records every call, keeps a visible range and selection per view, and
//! reports its own changes back through the bridge the way a real host
//! would: applying a selection produces a selection notification, scrolling
//! produces a visible range notification.

use async_trait::async_trait;
use modal_sync::model::event::{HostEvent, ViewId};
use modal_sync::model::position::{SelectionRange, VisibleRange};
use modal_sync::services::async_bridge::BridgeHandle;
use modal_sync::services::rpc::{HostEditor, RpcError};
use modal_sync::view::cursor_style::CursorStyle;
use modal_sync::view::viewport::RevealPolicy;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::{Mutex, OnceLock};

/// One call received by the fake host
#[derive(Debug, Clone, PartialEq)]
pub enum HostCall {
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
    SetCursorStyle {
        view: ViewId,
        style: CursorStyle,
    },
    QueryVisibleRange {
        view: ViewId,
    },
    Execute {
        name: String,
    },
}

#[derive(Debug, Clone, Default)]
struct HostView {
    range: Option<VisibleRange>,
    selection: Option<SelectionRange>,
    style: Option<CursorStyle>,
}

pub struct FakeHost {
    height: usize,
    calls: Mutex<Vec<HostCall>>,
    views: Mutex<HashMap<ViewId, HostView>>,
    /// Notifications to emit when a named command runs
    scripts: Mutex<HashMap<String, Vec<HostEvent>>>,
    handle: OnceLock<BridgeHandle>,
}

impl FakeHost {
    /// A host whose views show `height` lines
    pub fn new(height: usize) -> Self {
        Self {
            height,
            calls: Mutex::new(Vec::new()),
            views: Mutex::new(HashMap::new()),
            scripts: Mutex::new(HashMap::new()),
            handle: OnceLock::new(),
        }
    }

    pub fn connect(&self, handle: BridgeHandle) {
        let _ = self.handle.set(handle);
    }

    pub fn height(&self) -> usize {
        self.height
    }

    /// Register what `execute_command(name)` reports back
    pub fn script(&self, name: &str, events: Vec<HostEvent>) {
        self.scripts
            .lock()
            .unwrap()
            .insert(name.to_string(), events);
    }

    pub fn calls(&self) -> Vec<HostCall> {
        self.calls.lock().unwrap().clone()
    }

    pub fn clear_calls(&self) {
        self.calls.lock().unwrap().clear();
    }

    /// Selections applied to `view`, in order
    pub fn selections(&self, view: ViewId) -> Vec<SelectionRange> {
        self.calls()
            .into_iter()
            .filter_map(|call| match call {
                HostCall::SetSelection {
                    view: v, selection, ..
                } if v == view => Some(selection),
                _ => None,
            })
            .collect()
    }

    pub fn visible_range_of(&self, view: ViewId) -> Option<VisibleRange> {
        self.views.lock().unwrap().get(&view).and_then(|v| v.range)
    }

    pub fn selection_of(&self, view: ViewId) -> Option<SelectionRange> {
        self.views.lock().unwrap().get(&view).and_then(|v| v.selection)
    }

    pub fn cursor_style_of(&self, view: ViewId) -> Option<CursorStyle> {
        self.views.lock().unwrap().get(&view).and_then(|v| v.style)
    }

    /// Set the range a view shows without notifying anyone (the user
    /// scrolled, and the notification has not been delivered yet)
    pub fn user_scroll(&self, view: ViewId, range: VisibleRange) {
        self.views.lock().unwrap().entry(view).or_default().range = Some(range);
    }

    /// Set a selection as if the user clicked
    pub fn user_select(&self, view: ViewId, selection: SelectionRange) {
        self.views.lock().unwrap().entry(view).or_default().selection = Some(selection);
    }

    fn record(&self, call: HostCall) {
        self.calls.lock().unwrap().push(call);
    }

    fn notify(&self, event: HostEvent) {
        if let Some(handle) = self.handle.get() {
            handle.host_event(event);
        }
    }

    /// Scroll `view` the way the host would for `policy`; returns the new
    /// range if it moved
    fn reveal(&self, view: ViewId, range: VisibleRange, policy: RevealPolicy) -> Option<VisibleRange> {
        let mut views = self.views.lock().unwrap();
        let state = views.entry(view).or_default();
        let current = state
            .range
            .unwrap_or_else(|| VisibleRange::new(0, self.height));
        let height = self.height;
        let top = match policy {
            RevealPolicy::None => return None,
            RevealPolicy::Top => range.top_line,
            RevealPolicy::Center => {
                let middle = (range.top_line + range.bottom_line) / 2;
                middle.saturating_sub(height / 2)
            }
            RevealPolicy::Default => {
                if current.contains(range.top_line) {
                    return None;
                } else if range.top_line < current.top_line {
                    range.top_line
                } else {
                    (range.top_line + 1).saturating_sub(height)
                }
            }
        };
        let next = match policy {
            // Reveal requests with a full-height range are taken as is
            RevealPolicy::Top => range,
            _ => VisibleRange::new(top, top + height),
        };
        if Some(next) == state.range {
            return None;
        }
        state.range = Some(next);
        Some(next)
    }
}

#[async_trait]
impl HostEditor for FakeHost {
    async fn set_selection(
        &self,
        view: ViewId,
        selection: SelectionRange,
        reveal: Option<(VisibleRange, RevealPolicy)>,
    ) -> Result<(), RpcError> {
        self.record(HostCall::SetSelection {
            view,
            selection,
            reveal,
        });
        self.user_select(view, selection);
        self.notify(HostEvent::SelectionChanged {
            view,
            selection,
            generation: None,
        });
        if let Some((range, policy)) = reveal {
            if let Some(next) = self.reveal(view, range, policy) {
                self.notify(HostEvent::VisibleRangesChanged {
                    view,
                    ranges: vec![next],
                });
            }
        }
        Ok(())
    }

    async fn reveal_range(
        &self,
        view: ViewId,
        range: VisibleRange,
        policy: RevealPolicy,
    ) -> Result<(), RpcError> {
        self.record(HostCall::RevealRange {
            view,
            range,
            policy,
        });
        if let Some(next) = self.reveal(view, range, policy) {
            self.notify(HostEvent::VisibleRangesChanged {
                view,
                ranges: vec![next],
            });
        }
        Ok(())
    }

    async fn set_cursor_style(&self, view: ViewId, style: CursorStyle) -> Result<(), RpcError> {
        self.record(HostCall::SetCursorStyle { view, style });
        self.views.lock().unwrap().entry(view).or_default().style = Some(style);
        Ok(())
    }

    async fn visible_range(&self, view: ViewId) -> Result<Option<VisibleRange>, RpcError> {
        self.record(HostCall::QueryVisibleRange { view });
        Ok(self.visible_range_of(view))
    }

    async fn execute_command(&self, name: &str, _args: Value) -> Result<Value, RpcError> {
        self.record(HostCall::Execute {
            name: name.to_string(),
        });
        let events = self
            .scripts
            .lock()
            .unwrap()
            .get(name)
            .cloned()
            .ok_or_else(|| RpcError::UnknownTarget(format!("command {name}")))?;
        for event in events {
            if let HostEvent::SelectionChanged {
                view, selection, ..
            } = &event
            {
                self.user_select(*view, *selection);
            }
            self.notify(event);
        }
        Ok(Value::Null)
    }
}
