//! Low-level primitives
//!
//! Pure functions with no reconciler state.

pub mod coordinates;
