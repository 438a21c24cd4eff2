//! Error model shared by the codec, logger and bus.

use thiserror::Error;

/// Result type used across the herald crates.
pub type HeraldResult<T> = Result<T, HeraldError>;

/// Herald-level error.
///
/// Callback failures are deliberately absent: they never reach the caller of
/// `publish` and are turned into `EXCEPTION:ERROR` events instead.
#[derive(Debug, Error)]
pub enum HeraldError {
    /// A level index outside `0..=5` was looked up.
    #[error("unknown level: {0}")]
    UnknownLevel(i64),

    /// A log line could not be appended to a sink.
    #[error("failed to write log line to sink `{sink}`: {source}")]
    SinkWriteFailed {
        sink: String,
        #[source]
        source: std::io::Error,
    },

    /// A sink could not be prepared (log directory or file creation).
    #[error("failed to open sink `{sink}`: {source}")]
    SinkOpenFailed {
        sink: String,
        #[source]
        source: std::io::Error,
    },

    /// Construction parameters were rejected.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
}

impl HeraldError {
    pub fn unknown_level(index: i64) -> Self {
        Self::UnknownLevel(index)
    }

    pub fn sink_write(sink: impl Into<String>, source: std::io::Error) -> Self {
        Self::SinkWriteFailed {
            sink: sink.into(),
            source,
        }
    }

    pub fn sink_open(sink: impl Into<String>, source: std::io::Error) -> Self {
        Self::SinkOpenFailed {
            sink: sink.into(),
            source,
        }
    }

    pub fn invalid_config(msg: impl Into<String>) -> Self {
        Self::InvalidConfig(msg.into())
    }
}
