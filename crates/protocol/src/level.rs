use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize};

use crate::constants::{
    LEVEL_ALL, LEVEL_DEBUG, LEVEL_ERROR, LEVEL_INFO, LEVEL_LOG, LEVEL_TRACE, LEVEL_WARN,
    level_bit,
};

/// Console logging level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Level {
    #[default]
    Log,
    Info,
    Warn,
    Error,
    Debug,
    Trace,
}

impl Level {
    /// Every level, in the order consoles conventionally list them.
    pub const ALL: [Level; 6] = [
        Level::Log,
        Level::Info,
        Level::Warn,
        Level::Error,
        Level::Debug,
        Level::Trace,
    ];

    /// Wire name of the level.
    pub fn as_str(self) -> &'static str {
        match self {
            Level::Log => "log",
            Level::Info => "info",
            Level::Warn => "warn",
            Level::Error => "error",
            Level::Debug => "debug",
            Level::Trace => "trace",
        }
    }

    /// Bitmask bit of the level.
    pub fn bit(self) -> u32 {
        match self {
            Level::Log => LEVEL_LOG,
            Level::Info => LEVEL_INFO,
            Level::Warn => LEVEL_WARN,
            Level::Error => LEVEL_ERROR,
            Level::Debug => LEVEL_DEBUG,
            Level::Trace => LEVEL_TRACE,
        }
    }

    /// Level for a single bitmask bit.
    pub fn from_bit(bit: u32) -> Option<Level> {
        Level::ALL.into_iter().find(|l| l.bit() == bit)
    }
}

impl fmt::Display for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Returned when a string names no known level.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown console level: {0}")]
pub struct UnknownLevel(pub String);

impl FromStr for Level {
    type Err = UnknownLevel;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Level::from_bit(level_bit(s)).ok_or_else(|| UnknownLevel(s.to_owned()))
    }
}

/// Deserializes a level, reading anything unrecognised as [`Level::Log`].
///
/// Hosts route unknown levels to their generic log method, so an envelope
/// from a newer producer is still displayed rather than rejected.
pub fn deserialize_lenient<'de, D>(deserializer: D) -> Result<Level, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<serde_json::Value>::deserialize(deserializer)?;
    Ok(raw
        .as_ref()
        .and_then(serde_json::Value::as_str)
        .and_then(|s| s.parse().ok())
        .unwrap_or_default())
}

/// Set of levels stored as a bitmask.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct LevelMask(u32);

impl LevelMask {
    /// Mask covering every level.
    pub const ALL: LevelMask = LevelMask(LEVEL_ALL);

    /// Mask covering no level.
    pub const NONE: LevelMask = LevelMask(0);

    /// Wraps a raw bitmask, discarding unknown bits.
    pub fn from_bits(bits: u32) -> Self {
        Self(bits & LEVEL_ALL)
    }

    /// Raw bitmask.
    pub fn bits(self) -> u32 {
        self.0
    }

    pub fn contains(self, level: Level) -> bool {
        self.0 & level.bit() != 0
    }

    pub fn insert(&mut self, level: Level) {
        self.0 |= level.bit();
    }

    pub fn is_empty(self) -> bool {
        self.0 == 0
    }

    /// Levels in the mask, in [`Level::ALL`] order.
    pub fn iter(self) -> impl Iterator<Item = Level> {
        Level::ALL.into_iter().filter(move |l| self.contains(*l))
    }
}

impl FromIterator<Level> for LevelMask {
    fn from_iter<I: IntoIterator<Item = Level>>(iter: I) -> Self {
        let mut mask = LevelMask::NONE;
        for level in iter {
            mask.insert(level);
        }
        mask
    }
}

impl<'a> FromIterator<&'a Level> for LevelMask {
    fn from_iter<I: IntoIterator<Item = &'a Level>>(iter: I) -> Self {
        iter.into_iter().copied().collect()
    }
}
