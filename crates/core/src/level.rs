//! Severity levels and level-qualified event names (`NAME` / `NAME:LEVEL`).

use core::fmt;
use core::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{HeraldError, HeraldResult};

/// Severity of an event, ascending.
///
/// The numeric value is the level index used for filtering; a record passes
/// the filter when `level >= min_level`.
#[derive(
    Debug, Copy, Clone, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "UPPERCASE")]
pub enum Level {
    Verbose = 0,
    #[default]
    Debug = 1,
    Info = 2,
    Warning = 3,
    Error = 4,
    Critical = 5,
}

impl Level {
    /// All levels, indexed by their numeric value.
    pub const ALL: [Level; 6] = [
        Level::Verbose,
        Level::Debug,
        Level::Info,
        Level::Warning,
        Level::Error,
        Level::Critical,
    ];

    /// Look up a level by numeric index.
    pub fn from_index(index: i64) -> HeraldResult<Self> {
        usize::try_from(index)
            .ok()
            .and_then(|i| Self::ALL.get(i).copied())
            .ok_or_else(|| HeraldError::unknown_level(index))
    }

    pub fn index(self) -> u8 {
        self as u8
    }

    /// Symbolic name as it appears in event specs and log lines.
    pub fn name(self) -> &'static str {
        match self {
            Level::Verbose => "VERBOSE",
            Level::Debug => "DEBUG",
            Level::Info => "INFO",
            Level::Warning => "WARNING",
            Level::Error => "ERROR",
            Level::Critical => "CRITICAL",
        }
    }

    /// Console colour for this level.
    pub fn color(self) -> LevelColor {
        match self {
            Level::Verbose => LevelColor::Gray,
            Level::Debug => LevelColor::Cyan,
            Level::Info => LevelColor::Green,
            Level::Warning => LevelColor::Yellow,
            Level::Error => LevelColor::Magenta,
            Level::Critical => LevelColor::Red,
        }
    }
}

impl fmt::Display for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Level {
    type Err = HeraldError;

    /// Exact, case-sensitive match on the symbolic name.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|level| level.name() == s)
            .ok_or_else(|| HeraldError::invalid_config(format!("unrecognized level name `{s}`")))
    }
}

/// Fixed console palette.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum LevelColor {
    Gray,
    Cyan,
    Green,
    Yellow,
    Magenta,
    Red,
}

impl LevelColor {
    pub fn name(self) -> &'static str {
        match self {
            LevelColor::Gray => "gray",
            LevelColor::Cyan => "cyan",
            LevelColor::Green => "green",
            LevelColor::Yellow => "yellow",
            LevelColor::Magenta => "magenta",
            LevelColor::Red => "red",
        }
    }

    /// SGR parameters used inside `ESC[...m`.
    pub fn ansi_code(self) -> &'static str {
        match self {
            LevelColor::Gray => "0;37",
            LevelColor::Cyan => "0;36",
            LevelColor::Green => "0;32",
            LevelColor::Yellow => "0;33",
            LevelColor::Magenta => "0;35",
            LevelColor::Red => "0;31",
        }
    }

    /// Wrap `line` in this colour, resetting afterwards.
    pub fn paint(self, line: &str) -> String {
        format!("\x1b[{}m{}\x1b[0m", self.ansi_code(), line)
    }
}

/// Symbolic name for a numeric level.
pub fn level_name(index: i64) -> HeraldResult<&'static str> {
    Level::from_index(index).map(Level::name)
}

/// Console colour for a numeric level.
pub fn level_color(index: i64) -> HeraldResult<LevelColor> {
    Level::from_index(index).map(Level::color)
}

/// A parsed event spec: bare name plus level.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct EventSpec<'a> {
    name: &'a str,
    level: Level,
}

impl<'a> EventSpec<'a> {
    /// Parse `NAME` or `NAME:LEVEL`.
    ///
    /// - No colon: level is [`Level::Debug`].
    /// - A colon at position 0 is not a separator; `":INFO"` is a bare name.
    /// - The level is the segment between the first and second colon; anything
    ///   further is ignored.
    /// - An unrecognized level falls back to [`Level::Debug`].
    pub fn parse(spec: &'a str) -> Self {
        match spec.find(':') {
            Some(pos) if pos > 0 => {
                let name = &spec[..pos];
                let suffix = spec[pos + 1..].split(':').next().unwrap_or_default();
                let level = suffix.parse().unwrap_or_else(|_| {
                    tracing::debug!(spec, suffix, "unrecognized level suffix, using DEBUG");
                    Level::Debug
                });
                Self { name, level }
            }
            _ => Self {
                name: spec,
                level: Level::Debug,
            },
        }
    }

    pub fn name(&self) -> &'a str {
        self.name
    }

    pub fn level(&self) -> Level {
        self.level
    }

    /// Registry key for this spec's name.
    pub fn key(&self) -> String {
        self.name.to_uppercase()
    }
}
