//! View registry: host views <-> modal windows
//!
//! Design (following the split model of one buffer shown in several panes):
//! - Every host view shows exactly one document
//! - All views of a document share one modal window
//! - A window reverse-resolves to exactly one durable view at a time: the most
//!   recently focused one. Outbound modal cursor updates for that window are
//!   attributed to it.
//! - Transient views (peek, preview) get the document's window for lookups but
//!   never become the reverse target until promoted

use crate::model::event::{DocumentId, ViewId, ViewKind, WindowId};
use std::collections::HashMap;

/// Registration record for one view
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ViewEntry {
    pub view: ViewId,
    pub document: DocumentId,
    pub window: WindowId,
    pub kind: ViewKind,
}

impl ViewEntry {
    pub fn is_transient(&self) -> bool {
        self.kind == ViewKind::Transient
    }
}

#[derive(Debug, Default)]
pub struct ViewRegistry {
    views: HashMap<ViewId, ViewEntry>,

    /// Window assigned to each document with at least one open view
    windows: HashMap<DocumentId, WindowId>,

    /// Durable views per window, least recently focused first
    focus_order: HashMap<WindowId, Vec<ViewId>>,

    /// Next window ID to assign
    next_window_id: usize,
}

impl ViewRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a view and return its window
    ///
    /// Registering an already known view returns its existing window; the
    /// mapping is stable for the life of the view.
    pub fn register(&mut self, view: ViewId, document: DocumentId, kind: ViewKind) -> WindowId {
        if let Some(entry) = self.views.get(&view) {
            return entry.window;
        }

        let next_window_id = &mut self.next_window_id;
        let window = *self.windows.entry(document).or_insert_with(|| {
            let id = WindowId(*next_window_id);
            *next_window_id += 1;
            id
        });

        if kind == ViewKind::Durable {
            // A new pane does not steal authority from one the user focused
            self.focus_order.entry(window).or_default().insert(0, view);
        }

        tracing::debug!(
            "registered {:?} ({:?}) for {:?} -> {:?}",
            view,
            kind,
            document,
            window
        );
        self.views.insert(
            view,
            ViewEntry {
                view,
                document,
                window,
                kind,
            },
        );
        window
    }

    /// Remove a view. Returns its entry if it was registered.
    pub fn unregister(&mut self, view: ViewId) -> Option<ViewEntry> {
        let entry = self.views.remove(&view)?;

        if let Some(order) = self.focus_order.get_mut(&entry.window) {
            order.retain(|v| *v != view);
            if order.is_empty() {
                self.focus_order.remove(&entry.window);
            }
        }

        let window_in_use = self.views.values().any(|e| e.window == entry.window);
        if !window_in_use {
            self.windows.remove(&entry.document);
            tracing::debug!("released {:?} for {:?}", entry.window, entry.document);
        }

        Some(entry)
    }

    pub fn resolve(&self, view: ViewId) -> Option<WindowId> {
        self.views.get(&view).map(|e| e.window)
    }

    /// The durable view that currently owns `window`
    pub fn resolve_reverse(&self, window: WindowId) -> Option<ViewId> {
        self.focus_order
            .get(&window)
            .and_then(|order| order.last().copied())
    }

    pub fn is_transient(&self, view: ViewId) -> bool {
        self.views.get(&view).is_some_and(|e| e.is_transient())
    }

    /// Make `view` the authoritative view for its window
    ///
    /// Returns false for unknown or transient views, which never take over a
    /// window.
    pub fn focus(&mut self, view: ViewId) -> bool {
        let Some(entry) = self.views.get(&view) else {
            return false;
        };
        if entry.is_transient() {
            return false;
        }
        let order = self.focus_order.entry(entry.window).or_default();
        order.retain(|v| *v != view);
        order.push(view);
        true
    }

    /// Turn a transient view into a durable one
    ///
    /// Like a newly registered pane, the promoted view ranks below every view
    /// already focused on its window until it is focused itself.
    pub fn promote(&mut self, view: ViewId) -> Option<WindowId> {
        let entry = self.views.get_mut(&view)?;
        if entry.kind == ViewKind::Durable {
            return Some(entry.window);
        }
        entry.kind = ViewKind::Durable;
        let window = entry.window;
        let order = self.focus_order.entry(window).or_default();
        order.retain(|v| *v != view);
        order.insert(0, view);
        Some(window)
    }

    pub fn len(&self) -> usize {
        self.views.len()
    }

    pub fn is_empty(&self) -> bool {
        self.views.is_empty()
    }
}
