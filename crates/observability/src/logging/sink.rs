//! Append-only line sinks.

use std::fs::{self, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use herald_core::{HeraldError, HeraldResult};

/// An append-only, line-oriented output destination.
///
/// Lines are passed fully formatted, including the trailing newline.
/// Implementations must never truncate what was written before.
pub trait LogSink: Send + Sync {
    /// Name used in error reports.
    fn name(&self) -> &str;

    fn append(&self, line: &str) -> io::Result<()>;
}

impl<S> LogSink for Arc<S>
where
    S: LogSink + ?Sized,
{
    fn name(&self) -> &str {
        (**self).name()
    }

    fn append(&self, line: &str) -> io::Result<()> {
        (**self).append(line)
    }
}

/// Appends lines to a file, opening it for every write.
#[derive(Debug, Clone)]
pub struct FileSink {
    path: PathBuf,
    name: String,
}

impl FileSink {
    /// Sink for `path`; nothing is touched on disk until the first append.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let name = path.display().to_string();
        Self { path, name }
    }

    /// Sink for `path`, creating parent directories and an empty file up front.
    pub fn create(path: impl Into<PathBuf>) -> HeraldResult<Self> {
        let sink = Self::new(path);
        if let Some(parent) = sink.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|e| HeraldError::sink_open(&sink.name, e))?;
        }
        OpenOptions::new()
            .create(true)
            .append(true)
            .open(&sink.path)
            .map_err(|e| HeraldError::sink_open(&sink.name, e))?;
        Ok(sink)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl LogSink for FileSink {
    fn name(&self) -> &str {
        &self.name
    }

    fn append(&self, line: &str) -> io::Result<()> {
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;
        file.write_all(line.as_bytes())
    }
}

/// Writes lines to standard output.
#[derive(Debug, Default, Clone, Copy)]
pub struct ConsoleSink;

impl ConsoleSink {
    pub fn new() -> Self {
        Self
    }
}

impl LogSink for ConsoleSink {
    fn name(&self) -> &str {
        "stdout"
    }

    fn append(&self, line: &str) -> io::Result<()> {
        let mut out = io::stdout().lock();
        out.write_all(line.as_bytes())?;
        out.flush()
    }
}

/// Keeps lines in memory. Share it through an `Arc` to read back what was logged.
#[derive(Debug)]
pub struct MemorySink {
    name: String,
    lines: Mutex<Vec<String>>,
}

impl MemorySink {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            lines: Mutex::new(Vec::new()),
        }
    }

    /// Snapshot of every line appended so far.
    pub fn lines(&self) -> Vec<String> {
        self.lines
            .lock()
            .map(|lines| lines.clone())
            .unwrap_or_default()
    }

    pub fn last(&self) -> Option<String> {
        self.lines.lock().ok().and_then(|lines| lines.last().cloned())
    }

    pub fn len(&self) -> usize {
        self.lines.lock().map(|lines| lines.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl LogSink for MemorySink {
    fn name(&self) -> &str {
        &self.name
    }

    fn append(&self, line: &str) -> io::Result<()> {
        let mut lines = self
            .lines
            .lock()
            .map_err(|_| io::Error::other("memory sink poisoned"))?;
        lines.push(line.to_string());
        Ok(())
    }
}
