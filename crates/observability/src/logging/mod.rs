//! Leveled event logger with thread, master and console sinks.
//!
//! The logger is the gate for everything downstream: a record that does not
//! pass the minimum level is never built, so it never reaches history or
//! subscribers either.

mod format;
mod sink;

pub use format::{colorize, format_line};
pub use sink::{ConsoleSink, FileSink, LogSink, MemorySink};

use std::fs;
use std::path::Path;

use herald_core::{EventData, EventRecord, EventSpec, HeraldError, HeraldResult, Level};

/// File name of the shared log inside the log directory.
pub const MASTER_LOG: &str = "master.log";

/// Logger settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoggerConfig {
    /// Logical stream identifier; tags every record and names the thread log.
    pub thread: String,
    /// Records below this level are dropped.
    pub min_level: Level,
    /// Echo lines to the console sink.
    pub console: bool,
    /// Also append lines to the master sink.
    pub master: bool,
    /// Colour console lines by level.
    pub color: bool,
}

impl LoggerConfig {
    pub fn new(thread: impl Into<String>) -> Self {
        Self {
            thread: thread.into(),
            min_level: Level::Debug,
            console: true,
            master: false,
            color: true,
        }
    }

    pub fn with_min_level(mut self, level: Level) -> Self {
        self.min_level = level;
        self
    }

    pub fn with_console(mut self, enabled: bool) -> Self {
        self.console = enabled;
        self
    }

    pub fn with_master(mut self, enabled: bool) -> Self {
        self.master = enabled;
        self
    }

    pub fn with_color(mut self, enabled: bool) -> Self {
        self.color = enabled;
        self
    }
}

/// Formats, filters and routes event records to sinks.
pub struct Logger {
    config: LoggerConfig,
    thread_sink: Box<dyn LogSink>,
    master_sink: Option<Box<dyn LogSink>>,
    console_sink: Option<Box<dyn LogSink>>,
}

impl std::fmt::Debug for Logger {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Logger")
            .field("config", &self.config)
            .field("thread_sink", &self.thread_sink.name())
            .field("master_sink", &self.master_sink.as_ref().map(|s| s.name()))
            .field("console_sink", &self.console_sink.as_ref().map(|s| s.name()))
            .finish()
    }
}

impl Logger {
    /// Logger writing to `thread_sink` only; attach the others with the `with_*` methods.
    pub fn new(config: LoggerConfig, thread_sink: impl LogSink + 'static) -> Self {
        Self {
            config,
            thread_sink: Box::new(thread_sink),
            master_sink: None,
            console_sink: None,
        }
    }

    /// File-backed logger rooted at `log_dir`.
    ///
    /// Creates the directory, `<thread>.log` and `master.log` (the latter even
    /// when master logging is off), and attaches stdout when console logging
    /// is enabled. A thread name containing a path separator is rejected.
    pub fn open(config: LoggerConfig, log_dir: impl AsRef<Path>) -> HeraldResult<Self> {
        if config.thread.contains(['/', '\\']) {
            return Err(HeraldError::invalid_config(format!(
                "thread `{}` must not contain path separators",
                config.thread
            )));
        }
        let log_dir = log_dir.as_ref();
        fs::create_dir_all(log_dir)
            .map_err(|e| HeraldError::sink_open(log_dir.display().to_string(), e))?;

        let thread_sink = FileSink::create(log_dir.join(format!("{}.log", config.thread)))?;
        let master_sink = FileSink::create(log_dir.join(MASTER_LOG))?;
        let console = config.console;

        let mut logger = Self::new(config, thread_sink).with_master_sink(master_sink);
        if console {
            logger = logger.with_console_sink(ConsoleSink::new());
        }
        tracing::debug!(log_dir = %log_dir.display(), "opened file-backed logger");
        Ok(logger)
    }

    pub fn with_master_sink(mut self, sink: impl LogSink + 'static) -> Self {
        self.master_sink = Some(Box::new(sink));
        self
    }

    pub fn with_console_sink(mut self, sink: impl LogSink + 'static) -> Self {
        self.console_sink = Some(Box::new(sink));
        self
    }

    pub fn config(&self) -> &LoggerConfig {
        &self.config
    }

    pub fn thread(&self) -> &str {
        &self.config.thread
    }

    pub fn min_level(&self) -> Level {
        self.config.min_level
    }

    pub fn set_min_level(&mut self, level: Level) {
        self.config.min_level = level;
    }

    /// Whether an event at `level` passes the filter.
    pub fn enabled(&self, level: Level) -> bool {
        level >= self.config.min_level
    }

    /// Log `event_spec` with `data`.
    ///
    /// Returns `Ok(None)` when the event is below the minimum level. Otherwise
    /// the line goes to the console (if enabled), the thread sink, then the
    /// master sink (if enabled); the first sink failure is returned as
    /// [`HeraldError::SinkWriteFailed`].
    pub fn write(&self, event_spec: &str, data: EventData) -> HeraldResult<Option<EventRecord>> {
        let spec = EventSpec::parse(event_spec);
        if !self.enabled(spec.level()) {
            return Ok(None);
        }

        let record = EventRecord::new(spec.name(), data, self.config.thread.as_str());
        let line = format_line(&record, spec.level());

        if self.config.console {
            if let Some(console) = &self.console_sink {
                let out = if self.config.color {
                    colorize(&line, spec.level())
                } else {
                    line.clone()
                };
                append(console.as_ref(), &out)?;
            }
        }

        append(self.thread_sink.as_ref(), &line)?;

        if self.config.master {
            if let Some(master) = &self.master_sink {
                append(master.as_ref(), &line)?;
            }
        }

        Ok(Some(record))
    }
}

fn append(sink: &dyn LogSink, line: &str) -> HeraldResult<()> {
    sink.append(line)
        .map_err(|e| HeraldError::sink_write(sink.name(), e))
}
