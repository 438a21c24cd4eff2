//! Log line layout.

use herald_core::{EventRecord, Level};

/// Separator between line fields.
const SEP: &str = " - ";

/// Render a record as one log line:
///
/// `<timestamp> - <LEVEL> - <thread> - <name>[ - <json(data)>]\n`
///
/// The data segment is left out entirely when the record carries no data.
pub fn format_line(record: &EventRecord, level: Level) -> String {
    let mut line = format!(
        "{ts}{SEP}{level}{SEP}{thread}{SEP}{name}",
        ts = record.timestamp(),
        thread = record.thread(),
        name = record.name(),
    );
    if !record.data().is_empty() {
        line.push_str(SEP);
        line.push_str(&serde_json::Value::Object(record.data().clone()).to_string());
    }
    line.push('\n');
    line
}

/// Wrap a formatted line in the level's console colour.
///
/// The trailing newline stays outside the escape sequence so the reset code
/// lands on the same terminal line.
pub fn colorize(line: &str, level: Level) -> String {
    match line.strip_suffix('\n') {
        Some(body) => format!("{}\n", level.color().paint(body)),
        None => level.color().paint(line),
    }
}
