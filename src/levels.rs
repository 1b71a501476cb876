//! Severity scale and level sets.
//!
//! The scale is fixed and ordinal: `Trace < Debug < Info < Warn < Error <
//! Fatal`. Rules carry a [`LevelMask`] over these six ordinals rather than a
//! minimum threshold, so disjoint selections (`levels = "Debug, Error"`) are
//! representable.

use std::fmt;
use std::str::FromStr;

use bitflags::bitflags;
use serde::Serialize;

/// Log event severity, ordered from most to least verbose.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub enum Level {
    Trace,
    Debug,
    Info,
    Warn,
    Error,
    Fatal,
}

impl Level {
    /// All levels, in ordinal order.
    pub const ALL: [Level; 6] = [
        Level::Trace,
        Level::Debug,
        Level::Info,
        Level::Warn,
        Level::Error,
        Level::Fatal,
    ];

    /// Position on the severity scale, `0` for `Trace` through `5` for `Fatal`.
    pub fn ordinal(self) -> u8 {
        self as u8
    }

    pub fn from_ordinal(ordinal: u8) -> Option<Level> {
        Level::ALL.get(usize::from(ordinal)).copied()
    }

    pub fn name(self) -> &'static str {
        match self {
            Level::Trace => "Trace",
            Level::Debug => "Debug",
            Level::Info => "Info",
            Level::Warn => "Warn",
            Level::Error => "Error",
            Level::Fatal => "Fatal",
        }
    }
}

impl Default for Level {
    fn default() -> Self {
        Level::Trace
    }
}

impl fmt::Display for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Level {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let name = s.trim();
        for level in Level::ALL {
            if name.eq_ignore_ascii_case(level.name()) {
                return Ok(level);
            }
        }
        Err(format!("unknown level '{name}'"))
    }
}

bitflags! {
    /// Set of enabled severities, one bit per ordinal.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct LevelMask: u8 {
        const TRACE = 1 << 0;
        const DEBUG = 1 << 1;
        const INFO  = 1 << 2;
        const WARN  = 1 << 3;
        const ERROR = 1 << 4;
        const FATAL = 1 << 5;
    }
}

impl LevelMask {
    /// Mask enabling exactly one level.
    pub fn from_level(level: Level) -> LevelMask {
        LevelMask::from_bits_truncate(1 << level.ordinal())
    }

    /// Mask enabling every ordinal between `min` and `max` inclusive.
    ///
    /// An inverted range (`min > max`) yields the empty mask.
    pub fn from_range(min: Level, max: Level) -> LevelMask {
        let mut mask = LevelMask::empty();
        for level in Level::ALL {
            if level >= min && level <= max {
                mask |= LevelMask::from_level(level);
            }
        }
        mask
    }

    pub fn contains_level(self, level: Level) -> bool {
        self.contains(LevelMask::from_level(level))
    }

    /// Enabled levels in ordinal order.
    pub fn levels(self) -> Vec<Level> {
        Level::ALL
            .into_iter()
            .filter(|l| self.contains_level(*l))
            .collect()
    }
}

impl fmt::Display for LevelMask {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let names: Vec<&str> = self.levels().into_iter().map(Level::name).collect();
        f.write_str(&names.join(", "))
    }
}
