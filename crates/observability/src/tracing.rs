//! Tracing initialization for the crates' own diagnostics.
//!
//! Event log lines go through [`crate::logging`]; this subscriber only carries
//! what the library reports about itself (subscriptions, suppressed failures).

use tracing_subscriber::EnvFilter;

/// Default filter when `RUST_LOG` is unset.
pub const DEFAULT_FILTER: &str = "info";

/// Initialize tracing with `RUST_LOG`, falling back to [`DEFAULT_FILTER`].
///
/// Safe to call multiple times (subsequent calls are no-ops).
pub fn init() {
    init_with_default(DEFAULT_FILTER);
}

/// Initialize tracing with `RUST_LOG`, falling back to `directive`.
pub fn init_with_default(directive: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(directive));

    // JSON to stderr so diagnostics never interleave with console event lines.
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .json()
        .with_writer(std::io::stderr)
        .with_timer(tracing_subscriber::fmt::time::SystemTime)
        .with_target(false)
        .try_init();
}
