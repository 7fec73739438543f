use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Route reconciler logs to the test output. Honors `RUST_LOG`; safe to call
/// from every test.
pub fn init_tracing_from_env() {
    let _ = tracing_subscriber::registry()
        .with(fmt::layer().with_test_writer())
        .with(EnvFilter::from_default_env().add_directive(::tracing::Level::DEBUG.into()))
        .try_init();
}
