//! Asynchronous services around the reconciler

pub mod async_bridge;
pub mod rpc;
pub mod tracing_setup;
