//! Wall-clock timestamp generator.

use super::ValueGenerator;
use chrono::{SecondsFormat, Utc};
use serde_json::Value;
use sim_core::{Result, SimError};
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimestampMode {
    /// RFC 3339 text in UTC
    Iso,
    /// Integer seconds since the Unix epoch
    Unix,
}

impl FromStr for TimestampMode {
    type Err = SimError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "iso" => Ok(TimestampMode::Iso),
            "unix" => Ok(TimestampMode::Unix),
            _ => Err(SimError::payload(
                "timestamp generator mode must be 'iso' or 'unix'",
            )),
        }
    }
}

#[derive(Debug, Clone)]
pub struct TimestampGenerator {
    mode: TimestampMode,
}

impl TimestampGenerator {
    pub fn new(mode: TimestampMode) -> Self {
        Self { mode }
    }
}

impl ValueGenerator for TimestampGenerator {
    fn next_value(&mut self) -> Result<Value> {
        let now = Utc::now();
        Ok(match self.mode {
            TimestampMode::Iso => Value::String(now.to_rfc3339_opts(SecondsFormat::Micros, false)),
            TimestampMode::Unix => Value::from(now.timestamp()),
        })
    }
}
