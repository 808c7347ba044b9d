use chrono::{DateTime, Datelike, NaiveDate, NaiveDateTime, TimeDelta, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PeriodParseError {
    #[error("period '{0}' must start with YYYY-MM")]
    Format(String),
    #[error("period '{0}' has month out of range")]
    Month(String),
}

/// A calendar month. Raw values are only ever compared within one period.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Period {
    year: i32,
    month: u32,
}

impl Period {
    pub fn new(year: i32, month: u32) -> Option<Self> {
        if (1..=12).contains(&month) {
            Some(Self { year, month })
        } else {
            None
        }
    }

    /// The month containing today's date (UTC).
    pub fn current() -> Self {
        Self::of_date(Utc::now().date_naive())
    }

    pub fn year(&self) -> i32 {
        self.year
    }

    pub fn month(&self) -> u32 {
        self.month
    }

    fn of_date(date: NaiveDate) -> Self {
        Self {
            year: date.year(),
            month: date.month(),
        }
    }
}

/// Date columns come back as local midnight rendered in UTC, e.g.
/// "2023-12-31T21:00:00.000Z" for 2024-01-01 on a UTC+3 server. Rounding to
/// the nearest day recovers the stored date for any offset within 12 hours.
fn parse_timestamp(s: &str) -> Result<Period, PeriodParseError> {
    let instant = match DateTime::parse_from_rfc3339(s) {
        Ok(dt) => dt.with_timezone(&Utc).naive_utc(),
        // no offset: already the stored wall-clock time
        Err(_) => NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S%.f")
            .map_err(|_| PeriodParseError::Format(s.to_string()))?,
    };
    Ok(Period::of_date((instant + TimeDelta::hours(12)).date()))
}

impl fmt::Display for Period {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04}-{:02}", self.year, self.month)
    }
}

/// Accepts "2024-01", "2024-01-01" and full timestamps such as
/// "2024-01-01T00:00:00.000Z". Dates only count by their YYYY-MM; timestamps
/// are first rounded to the nearest day.
impl FromStr for Period {
    type Err = PeriodParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s.contains('T') {
            return parse_timestamp(s);
        }
        let head = s
            .get(..7)
            .ok_or_else(|| PeriodParseError::Format(s.to_string()))?;
        if s.len() > 7 && !s[7..].starts_with('-') {
            return Err(PeriodParseError::Format(s.to_string()));
        }
        let (year, month) = head
            .split_once('-')
            .ok_or_else(|| PeriodParseError::Format(s.to_string()))?;
        if year.len() != 4 || month.len() != 2 {
            return Err(PeriodParseError::Format(s.to_string()));
        }
        let year: i32 = year
            .parse()
            .map_err(|_| PeriodParseError::Format(s.to_string()))?;
        let month: u32 = month
            .parse()
            .map_err(|_| PeriodParseError::Format(s.to_string()))?;
        Period::new(year, month).ok_or_else(|| PeriodParseError::Month(s.to_string()))
    }
}

impl TryFrom<String> for Period {
    type Error = PeriodParseError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Period> for String {
    fn from(period: Period) -> Self {
        period.to_string()
    }
}
