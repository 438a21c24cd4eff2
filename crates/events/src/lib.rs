//! In-process event dispatch with leveled logging and bounded history.

pub mod bus;
pub mod config;
pub mod history;
pub mod registry;

pub use bus::{EXCEPTION_EVENT, EventBus};
pub use config::{BusConfig, DEFAULT_LOG_DIR};
pub use history::{DEFAULT_HARD_CAP, DEFAULT_LOOKBACK, DEFAULT_RETAIN, HistoryRing};
pub use registry::{Callback, CallbackFailure, CallbackResult, Subscriber, SubscriberRegistry};

pub use herald_core::{EventData, EventRecord, EventSpec, HeraldError, HeraldResult, Level};
