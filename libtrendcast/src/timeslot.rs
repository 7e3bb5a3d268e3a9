//! Wall-clock time slots for the post queue
//!
//! Scheduled times are zero-padded `HH:MM` strings, so lexicographic order
//! and chronological order coincide and the due-item query can compare
//! slots directly in SQL.

use std::fmt;
use std::str::FromStr;

use chrono::{FixedOffset, Timelike, Utc};
use serde::{Deserialize, Serialize};

use crate::error::TrendcastError;

/// A validated `HH:MM` 24-hour time of day.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct HhMm(String);

impl HhMm {
    pub fn new(hour: u8, minute: u8) -> Result<Self, TrendcastError> {
        if hour > 23 || minute > 59 {
            return Err(TrendcastError::InvalidInput(format!(
                "Time slot {:02}:{:02} is out of range",
                hour, minute
            )));
        }
        Ok(Self(format!("{:02}:{:02}", hour, minute)))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The current slot in UTC.
    pub fn now_utc() -> Self {
        Self::now_with_offset(0)
    }

    /// The current slot at the given offset east of UTC, in minutes.
    ///
    /// An offset outside the valid range falls back to UTC.
    pub fn now_with_offset(offset_minutes: i32) -> Self {
        let time = match FixedOffset::east_opt(offset_minutes.saturating_mul(60)) {
            Some(offset) => Utc::now().with_timezone(&offset).time(),
            None => Utc::now().time(),
        };
        Self(format!("{:02}:{:02}", time.hour(), time.minute()))
    }
}

impl FromStr for HhMm {
    type Err = TrendcastError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || {
            TrendcastError::InvalidInput(format!("Invalid time slot '{}', expected HH:MM", s))
        };

        let (h, m) = s.split_once(':').ok_or_else(invalid)?;
        if h.len() != 2 || m.len() != 2 {
            return Err(invalid());
        }
        let hour: u8 = h.parse().map_err(|_| invalid())?;
        let minute: u8 = m.parse().map_err(|_| invalid())?;
        Self::new(hour, minute).map_err(|_| invalid())
    }
}

impl fmt::Display for HhMm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
