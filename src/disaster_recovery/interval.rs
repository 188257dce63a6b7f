//! Replication scheduling intervals, encoded on the wire as
//! `"<integer><unit>"` with unit one of `m`, `h`, `d`.

use std::fmt::{self, Display};
use std::str::FromStr;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

pub const SECONDS_PER_MINUTE: u64 = 60;
pub const SECONDS_PER_HOUR: u64 = 3_600;
pub const SECONDS_PER_DAY: u64 = 86_400;

#[derive(Deserialize, Serialize, Clone, Copy, Debug, Default, JsonSchema, PartialEq, Eq)]
pub enum TimeUnit {
    #[default]
    Minutes,
    Hours,
    Days,
}

impl TimeUnit {
    pub fn suffix(&self) -> char {
        match self {
            TimeUnit::Minutes => 'm',
            TimeUnit::Hours => 'h',
            TimeUnit::Days => 'd',
        }
    }

    fn from_suffix(c: char) -> Option<TimeUnit> {
        match c {
            'm' => Some(TimeUnit::Minutes),
            'h' => Some(TimeUnit::Hours),
            'd' => Some(TimeUnit::Days),
            _ => None,
        }
    }

    pub fn as_secs(&self) -> u64 {
        match self {
            TimeUnit::Minutes => SECONDS_PER_MINUTE,
            TimeUnit::Hours => SECONDS_PER_HOUR,
            TimeUnit::Days => SECONDS_PER_DAY,
        }
    }
}

/// A scheduling interval as an explicit value rather than a raw string.
/// `parse` and `Display` round-trip: `parse(x.to_string()) == x`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct SyncInterval {
    pub amount: u64,
    pub unit: TimeUnit,
}

#[derive(Debug, PartialEq, Eq)]
pub struct ParseIntervalError {
    input: String,
}

impl Display for ParseIntervalError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "invalid scheduling interval {:?}: expected \"<integer><m|h|d>\"",
            self.input
        )
    }
}

impl std::error::Error for ParseIntervalError {}

impl SyncInterval {
    pub const fn new(amount: u64, unit: TimeUnit) -> Self {
        SyncInterval { amount, unit }
    }

    /// Lenient parse, mirroring how the status projector must treat data
    /// already admitted to the cluster: the leading digit run becomes the
    /// amount (0 when absent) and the first recognized unit letter after it
    /// becomes the unit (minutes when absent). Never fails.
    pub fn parse(input: &str) -> SyncInterval {
        let digits: String = input.chars().take_while(|c| c.is_ascii_digit()).collect();
        let amount = digits.parse().unwrap_or(0);
        let unit = input[digits.len()..]
            .chars()
            .find_map(TimeUnit::from_suffix)
            .unwrap_or_default();
        SyncInterval { amount, unit }
    }

    /// Strict parse for admission-time validation: the whole input must be
    /// a digit run followed by exactly one unit letter.
    pub fn parse_strict(input: &str) -> Result<SyncInterval, ParseIntervalError> {
        let err = || ParseIntervalError {
            input: input.to_string(),
        };
        let digits: String = input.chars().take_while(|c| c.is_ascii_digit()).collect();
        if digits.is_empty() {
            return Err(err());
        }
        let mut rest = input[digits.len()..].chars();
        let unit = rest
            .next()
            .and_then(TimeUnit::from_suffix)
            .ok_or_else(err)?;
        if rest.next().is_some() {
            return Err(err());
        }
        let amount = digits.parse().map_err(|_| err())?;
        Ok(SyncInterval { amount, unit })
    }

    pub fn as_secs(&self) -> u64 {
        self.amount * self.unit.as_secs()
    }

    /// A zero interval denotes synchronous replication.
    pub fn is_sync(&self) -> bool {
        self.amount == 0
    }
}

impl FromStr for SyncInterval {
    type Err = ParseIntervalError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        SyncInterval::parse_strict(s)
    }
}

impl Display for SyncInterval {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.amount, self.unit.suffix())
    }
}

impl Serialize for SyncInterval {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for SyncInterval {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Ok(SyncInterval::parse(&raw))
    }
}
