// Shared helpers for integration tests. Not every test binary uses all of them.
#![allow(dead_code)]

pub mod fake_host;
pub mod fake_modal;
pub mod tracing;
