//! `herald-core` — building blocks shared by the logger and the event bus.
//!
//! This crate contains **pure** primitives (no I/O): severity levels, event
//! spec parsing, event records and the error model.

pub mod error;
pub mod level;
pub mod record;

pub use error::{HeraldError, HeraldResult};
pub use level::{EventSpec, Level, LevelColor, level_color, level_name};
pub use record::{EventData, EventRecord, TIMESTAMP_FORMAT, format_timestamp};
