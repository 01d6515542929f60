//! Log subscriber setup for the daemon
//!
//! Console logging through `tracing-subscriber` with an environment filter.
//! The decision engine itself never logs - the audit stream is its record -
//! so this only covers the daemon, the control plane, and the consumers.

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Initialize the tracing subsystem.
///
/// Honors `RUST_LOG`; defaults to info globally and debug for this crate.
pub fn init_logging() {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info,vetogate=debug"));

    let fmt_layer = tracing_subscriber::fmt::layer()
        .with_target(true)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false);

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt_layer)
        .init();
}
