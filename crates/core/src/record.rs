//! Event records: the unit written to sinks and kept in history.

use chrono::{DateTime, Local, TimeZone};
use serde::{Deserialize, Serialize};

/// Event payload: an insertion-ordered string → JSON value map.
pub type EventData = serde_json::Map<String, serde_json::Value>;

/// Timestamp layout used for records and log lines (microsecond precision).
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.6f%z";

/// Format a point in time the way records carry it.
pub fn format_timestamp<Tz>(at: &DateTime<Tz>) -> String
where
    Tz: TimeZone,
    Tz::Offset: core::fmt::Display,
{
    at.format(TIMESTAMP_FORMAT).to_string()
}

/// An accepted event, immutable once created.
///
/// `name` is the bare name (no level suffix) exactly as published, and
/// `thread` is the logical stream that produced it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventRecord {
    name: String,
    data: EventData,
    timestamp: String,
    thread: String,
}

impl EventRecord {
    /// Create a record stamped with the current local time.
    pub fn new(name: impl Into<String>, data: EventData, thread: impl Into<String>) -> Self {
        Self::at(name, data, thread, format_timestamp(&Local::now()))
    }

    /// Create a record with an explicit timestamp.
    pub fn at(
        name: impl Into<String>,
        data: EventData,
        thread: impl Into<String>,
        timestamp: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            data,
            timestamp: timestamp.into(),
            thread: thread.into(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn data(&self) -> &EventData {
        &self.data
    }

    pub fn timestamp(&self) -> &str {
        &self.timestamp
    }

    pub fn thread(&self) -> &str {
        &self.thread
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{FixedOffset, NaiveDate};
    use serde_json::json;

    #[test]
    fn timestamp_has_microseconds_and_offset() {
        let offset = FixedOffset::east_opt(2 * 3600).unwrap();
        let at = NaiveDate::from_ymd_opt(2024, 3, 9)
            .unwrap()
            .and_hms_micro_opt(7, 5, 1, 42)
            .unwrap()
            .and_local_timezone(offset)
            .unwrap();

        assert_eq!(format_timestamp(&at), "2024-03-09T07:05:01.000042+0200");
    }

    #[test]
    fn new_stamps_current_time() {
        let record = EventRecord::new("BOOT", EventData::new(), "main");
        let parsed = DateTime::parse_from_str(record.timestamp(), TIMESTAMP_FORMAT);
        assert!(parsed.is_ok(), "unparseable timestamp {}", record.timestamp());
        assert_eq!(record.thread(), "main");
    }

    #[test]
    fn data_keeps_insertion_order() {
        let mut data = EventData::new();
        data.insert("zeta".into(), json!(1));
        data.insert("alpha".into(), json!(2));

        let record = EventRecord::at("ORDER", data, "t", "ts");
        let keys: Vec<_> = record.data().keys().cloned().collect();
        assert_eq!(keys, vec!["zeta", "alpha"]);
    }
}
