//! Bus construction parameters.

use std::path::PathBuf;

use herald_core::{HeraldError, HeraldResult, Level};
use herald_observability::LoggerConfig;

use crate::history::{DEFAULT_HARD_CAP, DEFAULT_RETAIN};

/// Default directory for thread and master logs.
pub const DEFAULT_LOG_DIR: &str = "./tmp/logs";

/// Event bus configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BusConfig {
    /// Logical stream identifier; names `<log_dir>/<thread>.log`.
    pub thread: String,
    pub min_level: Level,
    pub console: bool,
    pub master: bool,
    pub color: bool,
    pub log_dir: PathBuf,
    /// Attach the failure's cause chain to `EXCEPTION:ERROR` data.
    pub include_exception_trace: bool,
    pub history_retain: usize,
    pub history_hard_cap: usize,
}

impl BusConfig {
    pub fn new(thread: impl Into<String>) -> Self {
        Self {
            thread: thread.into(),
            min_level: Level::Debug,
            console: true,
            master: false,
            color: true,
            log_dir: PathBuf::from(DEFAULT_LOG_DIR),
            include_exception_trace: false,
            history_retain: DEFAULT_RETAIN,
            history_hard_cap: DEFAULT_HARD_CAP,
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

    pub fn with_log_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.log_dir = dir.into();
        self
    }

    pub fn with_exception_trace(mut self, enabled: bool) -> Self {
        self.include_exception_trace = enabled;
        self
    }

    pub fn with_history(mut self, retain: usize, hard_cap: usize) -> Self {
        self.history_retain = retain;
        self.history_hard_cap = hard_cap;
        self
    }

    /// Settings handed to the logger.
    pub fn logger_config(&self) -> LoggerConfig {
        LoggerConfig::new(self.thread.clone())
            .with_min_level(self.min_level)
            .with_console(self.console)
            .with_master(self.master)
            .with_color(self.color)
    }

    pub fn validate(&self) -> HeraldResult<()> {
        if self.thread.trim().is_empty() {
            return Err(HeraldError::invalid_config("thread must not be empty"));
        }
        if self.thread.contains(['/', '\\']) {
            return Err(HeraldError::invalid_config(format!(
                "thread `{}` must not contain path separators",
                self.thread
            )));
        }
        if self.history_retain > self.history_hard_cap {
            return Err(HeraldError::invalid_config(format!(
                "history retain ({}) exceeds hard cap ({})",
                self.history_retain, self.history_hard_cap
            )));
        }
        Ok(())
    }

    /// Defaults overridden by `HERALD_*` environment variables.
    ///
    /// | variable                  | field                     |
    /// |---------------------------|---------------------------|
    /// | `HERALD_LOG_LEVEL`        | `min_level` (name or 0-5) |
    /// | `HERALD_LOG_DIR`          | `log_dir`                 |
    /// | `HERALD_CONSOLE`          | `console`                 |
    /// | `HERALD_MASTER`           | `master`                  |
    /// | `HERALD_COLOR`            | `color`                   |
    /// | `HERALD_TRACE_EXCEPTIONS` | `include_exception_trace` |
    /// | `HERALD_HISTORY_RETAIN`   | `history_retain`          |
    /// | `HERALD_HISTORY_CAP`      | `history_hard_cap`        |
    pub fn from_env(thread: impl Into<String>) -> HeraldResult<Self> {
        Self::from_lookup(thread, |key| std::env::var(key).ok())
    }

    /// Like [`Self::from_env`], reading variables through `lookup`.
    pub fn from_lookup(
        thread: impl Into<String>,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> HeraldResult<Self> {
        let mut config = Self::new(thread);

        if let Some(raw) = lookup("HERALD_LOG_LEVEL") {
            config.min_level = parse_level(&raw)?;
        }
        if let Some(raw) = lookup("HERALD_LOG_DIR") {
            config.log_dir = PathBuf::from(raw);
        }
        if let Some(raw) = lookup("HERALD_CONSOLE") {
            config.console = parse_flag("HERALD_CONSOLE", &raw)?;
        }
        if let Some(raw) = lookup("HERALD_MASTER") {
            config.master = parse_flag("HERALD_MASTER", &raw)?;
        }
        if let Some(raw) = lookup("HERALD_COLOR") {
            config.color = parse_flag("HERALD_COLOR", &raw)?;
        }
        if let Some(raw) = lookup("HERALD_TRACE_EXCEPTIONS") {
            config.include_exception_trace = parse_flag("HERALD_TRACE_EXCEPTIONS", &raw)?;
        }
        if let Some(raw) = lookup("HERALD_HISTORY_RETAIN") {
            config.history_retain = parse_count("HERALD_HISTORY_RETAIN", &raw)?;
        }
        if let Some(raw) = lookup("HERALD_HISTORY_CAP") {
            config.history_hard_cap = parse_count("HERALD_HISTORY_CAP", &raw)?;
        }

        config.validate()?;
        Ok(config)
    }
}

fn parse_level(raw: &str) -> HeraldResult<Level> {
    let raw = raw.trim();
    match raw.parse::<i64>() {
        Ok(index) => Level::from_index(index),
        Err(_) => raw.to_uppercase().parse(),
    }
}

fn parse_flag(key: &str, raw: &str) -> HeraldResult<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        other => Err(HeraldError::invalid_config(format!(
            "{key}: expected a boolean, got `{other}`"
        ))),
    }
}

fn parse_count(key: &str, raw: &str) -> HeraldResult<usize> {
    raw.trim().parse().map_err(|e| {
        HeraldError::invalid_config(format!("{key}: expected a count, got `{raw}` ({e})"))
    })
}
