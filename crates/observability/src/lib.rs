//! Event logging (sinks, formatting, filtering) and tracing setup.

/// Initialize process-wide diagnostics (tracing).
///
/// This is safe to call multiple times; subsequent calls become no-ops.
pub fn init() {
    tracing::init();
}

/// Tracing configuration (filters, layers).
pub mod tracing;

/// Leveled event logger and its sinks.
pub mod logging;

pub use logging::{
    ConsoleSink, FileSink, LogSink, Logger, LoggerConfig, MASTER_LOG, MemorySink, colorize,
    format_line,
};
