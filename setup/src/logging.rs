//! Development-time tracing for debugging setup runs.
//!
//! Tracing output is diagnostics only: it goes to stderr and is filtered by
//! `RUST_LOG`. The result message a user sees is printed by the CLI on
//! stdout and does not depend on the log level.

use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

/// Initialize the tracing subscriber.
///
/// Reads `RUST_LOG`. Defaults to `warn` if unset.
///
/// # Example
/// ```bash
/// RUST_LOG=molcajete_setup=debug molcajete-setup add git
/// ```
pub fn init() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(std::io::stderr).compact())
        .init();
}
