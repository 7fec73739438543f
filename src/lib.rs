//! Cursor, selection and viewport reconciliation between a host editor and an
//! embedded modal editing engine
//!
//! - `model`: identities, positions, events and errors shared by every layer
//! - `primitives`: coordinate translation between the two editors
//! - `view`: viewport model, view registry and cursor styles
//! - `state`: what is known about each host view
//! - `app`: the reconciler
//! - `services`: async driver, RPC traits and tracing setup (`runtime` feature)

pub mod app;
pub mod config;
pub mod model;
pub mod primitives;
#[cfg(feature = "runtime")]
pub mod services;
pub mod state;
pub mod view;
