//! View layer
//!
//! Per-view presentation state: what is visible, which modal window a view
//! maps to, and how its cursor is drawn.

pub mod cursor_style;
pub mod registry;
pub mod viewport;
