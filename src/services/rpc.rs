//! RPC surfaces of the two editors
//!
//! The transport itself is out of scope: implementations wrap whatever channel
//! reaches the host extension API or the embedded engine. Calls are assumed
//! reliable and ordered per connection.

use crate::model::event::{ViewId, WindowId};
use crate::model::position::{ModalMode, ModalPosition, SelectionRange, VisibleRange};
use crate::view::cursor_style::CursorStyle;
use crate::view::viewport::RevealPolicy;
use async_trait::async_trait;
use serde_json::Value;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RpcError {
    #[error("connection closed")]
    Closed,
    #[error("remote error: {0}")]
    Remote(String),
    #[error("unknown {0}")]
    UnknownTarget(String),
}

/// Commands the host editor accepts
#[async_trait]
pub trait HostEditor: Send + Sync {
    /// Set the selection of a view, revealing `reveal` in the same step
    async fn set_selection(
        &self,
        view: ViewId,
        selection: SelectionRange,
        reveal: Option<(VisibleRange, RevealPolicy)>,
    ) -> Result<(), RpcError>;

    async fn reveal_range(
        &self,
        view: ViewId,
        range: VisibleRange,
        policy: RevealPolicy,
    ) -> Result<(), RpcError>;

    async fn set_cursor_style(&self, view: ViewId, style: CursorStyle) -> Result<(), RpcError>;

    /// What the view is actually showing; `None` if the host cannot tell
    async fn visible_range(&self, view: ViewId) -> Result<Option<VisibleRange>, RpcError>;

    /// Run a host command by name (navigation, peek, ...)
    async fn execute_command(&self, name: &str, args: Value) -> Result<Value, RpcError>;
}

/// Commands the modal engine accepts
#[async_trait]
pub trait ModalEngine: Send + Sync {
    async fn set_cursor(&self, window: WindowId, position: ModalPosition) -> Result<(), RpcError>;

    /// Make `window` the engine's current window
    async fn activate_window(&self, window: WindowId) -> Result<(), RpcError>;

    /// Scroll so that `topline` (1-based) is the first row
    async fn set_topline(&self, window: WindowId, topline: usize) -> Result<(), RpcError>;

    async fn window_height(&self, window: WindowId) -> Result<usize, RpcError>;

    async fn mode(&self, window: WindowId) -> Result<ModalMode, RpcError>;
}
