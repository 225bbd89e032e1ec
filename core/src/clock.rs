//! The evaluation clock — the single injected "as of" date.
//!
//! RULE: Nothing in the engine reads the wall clock.
//! Every public entry point takes an `AsOf`, and every period,
//! due date and trend month is derived from it.

use crate::error::{EngineError, EngineResult};
use chrono::{Datelike, Months, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Earliest and latest years an `AsOf` may carry. The window leaves
/// room for the year-plus offsets the resolver and the trend apply.
pub const MIN_YEAR: i32 = 1900;
pub const MAX_YEAR: i32 = 9000;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "NaiveDate", into = "NaiveDate")]
pub struct AsOf(NaiveDate);

impl AsOf {
    /// Validate a calendar date as an evaluation date.
    pub fn new(date: NaiveDate) -> EngineResult<Self> {
        if !(MIN_YEAR..=MAX_YEAR).contains(&date.year()) {
            return Err(EngineError::DateOutOfRange { date });
        }
        Ok(Self(date))
    }

    pub fn from_ymd(year: i32, month: u32, day: u32) -> EngineResult<Self> {
        let date = NaiveDate::from_ymd_opt(year, month, day).ok_or_else(|| {
            EngineError::InvalidDate { value: format!("{year:04}-{month:02}-{day:02}") }
        })?;
        Self::new(date)
    }

    /// Parse `YYYY-MM-DD`. Malformed input is rejected, never clamped.
    pub fn parse(value: &str) -> EngineResult<Self> {
        let date = NaiveDate::parse_from_str(value.trim(), "%Y-%m-%d")
            .map_err(|_| EngineError::InvalidDate { value: value.to_string() })?;
        Self::new(date)
    }

    /// Today's date in UTC. Only the runner uses this, as a default.
    pub fn today_utc() -> EngineResult<Self> {
        Self::new(Utc::now().date_naive())
    }

    pub fn date(&self) -> NaiveDate {
        self.0
    }

    pub fn year(&self) -> i32 {
        self.0.year()
    }

    pub fn month(&self) -> u32 {
        self.0.month()
    }

    /// First day of the as-of month.
    pub fn month_start(&self) -> NaiveDate {
        self.0.with_day(1).unwrap_or(self.0)
    }

    /// The same day-of-month `n` months earlier, clamped to the
    /// target month's length (Mar 31 → Feb 29 in a leap year).
    pub fn months_back(&self, n: u32) -> EngineResult<Self> {
        let date = self
            .0
            .checked_sub_months(Months::new(n))
            .ok_or(EngineError::DateArithmeticOverflow { from: self.0, op: "months_back" })?;
        Self::new(date)
    }

    /// `YYYY-MM` label of the as-of month.
    pub fn month_label(&self) -> String {
        month_label(self.0)
    }
}

/// `YYYY-MM` label of any calendar month, in or out of the window.
pub fn month_label(date: NaiveDate) -> String {
    format!("{:04}-{:02}", date.year(), date.month())
}

impl TryFrom<NaiveDate> for AsOf {
    type Error = EngineError;

    fn try_from(date: NaiveDate) -> EngineResult<Self> {
        Self::new(date)
    }
}

impl From<AsOf> for NaiveDate {
    fn from(as_of: AsOf) -> Self {
        as_of.0
    }
}

impl fmt::Display for AsOf {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.format("%Y-%m-%d"))
    }
}
