//! Synchronous, name-addressed publish/subscribe.
//!
//! Publishing an event:
//!
//! ```text
//! publish(spec, data) → Logger (parse, filter, write) → HistoryRing → SubscriberRegistry
//!                                                                        └─ each callback, in order
//! ```
//!
//! The level filter gates everything: an event below the logger's minimum
//! level is neither written, recorded nor dispatched.
//!
//! ## Failures
//!
//! - Sink write failures abort the publish and are returned to the caller.
//! - Callback failures (an `Err` or a panic) are caught per callback and
//!   re-published as `EXCEPTION:ERROR` with `{message, file, line}` data.
//!   Later callbacks still run.
//! - A callback failing while the same thread is already reporting a failure
//!   is only traced, never re-published, so a throwing `EXCEPTION` handler
//!   cannot recurse.
//!
//! ## Locking
//!
//! One mutex guards logger, history and registry. It is released before any
//! callback runs, so callbacks may publish or subscribe on the same bus.

use std::any::Any;
use std::collections::HashSet;
use std::panic::{self, AssertUnwindSafe, Location};
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::thread::{self, ThreadId};

use herald_core::{EventData, EventRecord, EventSpec, HeraldResult, Level};
use herald_observability::Logger;
use serde_json::{Value, json};

use crate::config::BusConfig;
use crate::history::HistoryRing;
use crate::registry::{CallbackFailure, CallbackResult, Subscriber, SubscriberRegistry};

/// Event published when a callback fails.
pub const EXCEPTION_EVENT: &str = "EXCEPTION:ERROR";

#[derive(Debug)]
struct BusState {
    logger: Logger,
    history: HistoryRing,
    registry: SubscriberRegistry,
    /// Threads currently publishing a failure report.
    reporting: HashSet<ThreadId>,
}

impl BusState {
    fn record(&mut self, event_spec: &str, data: EventData) -> HeraldResult<Option<EventRecord>> {
        let record = self.logger.write(event_spec, data)?;
        if let Some(record) = &record {
            self.history.append(record.clone());
        }
        Ok(record)
    }
}

/// In-process event bus.
///
/// Each bus owns its registry and history; independent buses never see each
/// other's subscribers or events.
#[derive(Debug)]
pub struct EventBus {
    state: Mutex<BusState>,
    include_exception_trace: bool,
}

impl EventBus {
    /// File-backed bus built from `config`.
    pub fn new(config: BusConfig) -> HeraldResult<Self> {
        config.validate()?;
        let history = HistoryRing::new(config.history_retain, config.history_hard_cap)?;
        let logger = Logger::open(config.logger_config(), &config.log_dir)?;
        Ok(Self::with_logger(logger, history).with_exception_trace(config.include_exception_trace))
    }

    /// Bus over an already-built logger and history.
    pub fn with_logger(logger: Logger, history: HistoryRing) -> Self {
        Self {
            state: Mutex::new(BusState {
                logger,
                history,
                registry: SubscriberRegistry::new(),
                reporting: HashSet::new(),
            }),
            include_exception_trace: false,
        }
    }

    /// Attach the failure's cause chain to `EXCEPTION:ERROR` data as `trace`.
    pub fn with_exception_trace(mut self, enabled: bool) -> Self {
        self.include_exception_trace = enabled;
        self
    }

    // Callbacks never run under the lock, so a poisoned state is still consistent.
    fn state(&self) -> MutexGuard<'_, BusState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Publish `event_spec` with `data` and return the successful callback results.
    ///
    /// Results are in invocation order; failed callbacks contribute nothing.
    pub fn publish(&self, event_spec: &str, data: EventData) -> HeraldResult<Vec<Value>> {
        let (record, subscribers) = {
            let mut state = self.state();
            let Some(record) = state.record(event_spec, data)? else {
                return Ok(Vec::new());
            };
            let subscribers = state.registry.subscribers_for(record.name()).to_vec();
            (record, subscribers)
        };

        let mut returns = Vec::with_capacity(subscribers.len());
        for subscriber in &subscribers {
            match invoke(subscriber, record.name(), record.data()) {
                Ok(value) => returns.push(value),
                Err(report) => self.report(record.name(), report)?,
            }
        }
        Ok(returns)
    }

    /// Publish with no data.
    pub fn fire(&self, event_spec: &str) -> HeraldResult<Vec<Value>> {
        self.publish(event_spec, EventData::new())
    }

    /// Log and record `event_spec` without dispatching it to subscribers.
    pub fn log(&self, event_spec: &str, data: EventData) -> HeraldResult<Option<EventRecord>> {
        self.state().record(event_spec, data)
    }

    /// Register `callback` for the bare name of `event_spec` (any level suffix is ignored).
    #[track_caller]
    pub fn subscribe<F>(&self, event_spec: &str, callback: F)
    where
        F: Fn(&str, &EventData) -> CallbackResult + Send + Sync + 'static,
    {
        let subscriber = Subscriber::new(callback);
        let name = EventSpec::parse(event_spec).name();
        self.state().registry.subscribe(name, subscriber);
        tracing::debug!(event = name, "subscribed");
    }

    /// Clear every callback registered for `event_spec`'s name.
    pub fn unsubscribe(&self, event_spec: &str) {
        let name = EventSpec::parse(event_spec).name();
        let removed = self.state().registry.unsubscribe(name);
        tracing::debug!(event = name, removed, "unsubscribed");
    }

    /// Drop every subscription when `confirm` is true. History is kept.
    pub fn reset_subscriptions(&self, confirm: bool) {
        if confirm {
            self.state().registry.reset_all();
            tracing::debug!("all subscriptions cleared");
        }
    }

    pub fn subscriber_count(&self, event_spec: &str) -> usize {
        self.state()
            .registry
            .count(EventSpec::parse(event_spec).name())
    }

    /// Whether every name occurred among the last `n` recorded events.
    pub fn did_occur<I, S>(&self, names: I, n: usize) -> bool
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.state().history.did_occur(names, n)
    }

    /// Snapshot of up to the last `n` records, oldest first.
    pub fn history(&self, n: usize) -> Vec<EventRecord> {
        self.state().history.recent(n).cloned().collect()
    }

    pub fn history_len(&self) -> usize {
        self.state().history.len()
    }

    pub fn min_level(&self) -> Level {
        self.state().logger.min_level()
    }

    pub fn set_min_level(&self, level: Level) {
        self.state().logger.set_min_level(level);
    }

    fn report(&self, event: &str, report: FailureReport) -> HeraldResult<()> {
        let Some(_guard) = ReportGuard::enter(self) else {
            tracing::warn!(
                event,
                error = %report.message,
                file = report.file,
                line = report.line,
                "callback failed while reporting a failure; not re-published"
            );
            return Ok(());
        };

        let data = report.into_data(self.include_exception_trace);
        self.publish(EXCEPTION_EVENT, data).map(drop)
    }
}

/// Marks the current thread as reporting a failure for as long as it lives.
struct ReportGuard<'a> {
    bus: &'a EventBus,
    thread: ThreadId,
}

impl<'a> ReportGuard<'a> {
    fn enter(bus: &'a EventBus) -> Option<Self> {
        let thread = thread::current().id();
        bus.state()
            .reporting
            .insert(thread)
            .then_some(Self { bus, thread })
    }
}

impl Drop for ReportGuard<'_> {
    fn drop(&mut self) {
        self.bus.state().reporting.remove(&self.thread);
    }
}

/// What is known about a failed callback.
#[derive(Debug)]
struct FailureReport {
    message: String,
    file: &'static str,
    line: u32,
    trace: Vec<String>,
}

impl FailureReport {
    fn from_failure(failure: CallbackFailure) -> Self {
        let location = failure.location();
        Self {
            message: failure.message(),
            file: location.file(),
            line: location.line(),
            trace: failure.chain(),
        }
    }

    fn from_panic(payload: Box<dyn Any + Send>, subscribed_at: &'static Location<'static>) -> Self {
        let message = payload
            .downcast_ref::<&str>()
            .map(|s| s.to_string())
            .or_else(|| payload.downcast_ref::<String>().cloned())
            .unwrap_or_else(|| "callback panicked".to_string());
        Self {
            trace: vec![message.clone()],
            message,
            file: subscribed_at.file(),
            line: subscribed_at.line(),
        }
    }

    fn into_data(self, include_trace: bool) -> EventData {
        let mut data = EventData::new();
        data.insert("message".into(), json!(self.message));
        data.insert("file".into(), json!(self.file));
        data.insert("line".into(), json!(self.line));
        if include_trace {
            data.insert("trace".into(), json!(self.trace));
        }
        data
    }
}

fn invoke(subscriber: &Subscriber, name: &str, data: &EventData) -> Result<Value, FailureReport> {
    match panic::catch_unwind(AssertUnwindSafe(|| subscriber.call(name, data))) {
        Ok(Ok(value)) => Ok(value),
        Ok(Err(failure)) => Err(FailureReport::from_failure(failure)),
        Err(payload) => Err(FailureReport::from_panic(payload, subscriber.subscribed_at())),
    }
}
