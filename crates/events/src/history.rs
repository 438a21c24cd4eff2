//! Bounded in-memory history of accepted events.

use std::collections::{HashSet, VecDeque};

use herald_core::{EventRecord, HeraldError, HeraldResult};

/// Records kept after a trim.
pub const DEFAULT_RETAIN: usize = 100;
/// Length that triggers a trim.
pub const DEFAULT_HARD_CAP: usize = 200;
/// How far back `did_occur` looks by default.
pub const DEFAULT_LOOKBACK: usize = 100;

/// Append-only buffer of recent records, oldest at the head.
///
/// The buffer grows freely up to `hard_cap`. The append that pushes it past
/// `hard_cap` drops the oldest records so that exactly `retain` remain; it is
/// never emptied outright.
#[derive(Debug, Clone)]
pub struct HistoryRing {
    records: VecDeque<EventRecord>,
    retain: usize,
    hard_cap: usize,
}

impl Default for HistoryRing {
    fn default() -> Self {
        Self {
            records: VecDeque::new(),
            retain: DEFAULT_RETAIN,
            hard_cap: DEFAULT_HARD_CAP,
        }
    }
}

impl HistoryRing {
    pub fn new(retain: usize, hard_cap: usize) -> HeraldResult<Self> {
        if retain > hard_cap {
            return Err(HeraldError::invalid_config(format!(
                "history retain ({retain}) exceeds hard cap ({hard_cap})"
            )));
        }
        Ok(Self {
            records: VecDeque::with_capacity(hard_cap.saturating_add(1).min(1024)),
            retain,
            hard_cap,
        })
    }

    pub fn retain(&self) -> usize {
        self.retain
    }

    pub fn hard_cap(&self) -> usize {
        self.hard_cap
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Add a record at the tail, then trim.
    pub fn append(&mut self, record: EventRecord) {
        self.records.push_back(record);
        self.trim();
    }

    /// Drop `len - retain` records from the head once `len > hard_cap`.
    pub fn trim(&mut self) {
        let len = self.records.len();
        if len > self.hard_cap {
            let excess = len - self.retain;
            self.records.drain(..excess);
        }
    }

    /// Up to the last `n` records, oldest first.
    pub fn recent(&self, n: usize) -> impl DoubleEndedIterator<Item = &EventRecord> + '_ {
        let skip = self.records.len().saturating_sub(n);
        self.records.iter().skip(skip)
    }

    pub fn last(&self) -> Option<&EventRecord> {
        self.records.back()
    }

    pub fn iter(&self) -> impl DoubleEndedIterator<Item = &EventRecord> + '_ {
        self.records.iter()
    }

    /// Whether every name in `names` is the bare name of at least one of the
    /// last `n` records. Matching is exact and case-sensitive; an empty
    /// `names` is trivially true.
    pub fn did_occur<I, S>(&self, names: I, n: usize) -> bool
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let seen: HashSet<&str> = self.recent(n).map(EventRecord::name).collect();
        names.into_iter().all(|name| seen.contains(name.as_ref()))
    }
}
