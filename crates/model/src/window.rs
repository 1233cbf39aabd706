use chrono::{Days, Months, NaiveDate};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// An inclusive pair of calendar dates addressed by one slice.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateWindow {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl DateWindow {
    pub fn new(start: NaiveDate, end: NaiveDate) -> Self {
        Self { start, end }
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        self.start <= date && date <= self.end
    }
}

impl fmt::Display for DateWindow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}..{}", self.start, self.end)
    }
}

/// Calendar-aware stride between window starts.
///
/// Month and year steps clamp to the end of shorter months, so a window
/// starting on Jan 31 steps to Feb 28/29.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WindowStep {
    Days(u32),
    Weeks(u32),
    Months(u32),
    Years(u32),
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum StepParseError {
    #[error("step `{0}` must start with `P`")]
    MissingPrefix(String),

    #[error("step `{0}` has no duration designator (expected D, W, M or Y)")]
    MissingDesignator(String),

    #[error("step `{0}` has an invalid quantity")]
    InvalidQuantity(String),

    #[error("step `{0}` must advance by at least one day")]
    Zero(String),
}

impl WindowStep {
    /// Next window start after a window beginning on `date`.
    pub fn advance(&self, date: NaiveDate) -> NaiveDate {
        let stepped = match *self {
            WindowStep::Days(n) => date.checked_add_days(Days::new(n as u64)),
            WindowStep::Weeks(n) => date.checked_add_days(Days::new(7 * n as u64)),
            WindowStep::Months(n) => date.checked_add_months(Months::new(n)),
            WindowStep::Years(n) => date.checked_add_months(Months::new(12 * n)),
        };
        stepped.unwrap_or(NaiveDate::MAX)
    }
}

impl FromStr for WindowStep {
    type Err = StepParseError;

    /// Parses the single-designator subset of ISO 8601 durations: `P1M`,
    /// `P30D`, `P2W`, `P1Y`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let body = s
            .strip_prefix('P')
            .ok_or_else(|| StepParseError::MissingPrefix(s.to_string()))?;
        let designator = body
            .chars()
            .last()
            .ok_or_else(|| StepParseError::MissingDesignator(s.to_string()))?;
        let quantity: u32 = body[..body.len() - designator.len_utf8()]
            .parse()
            .map_err(|_| StepParseError::InvalidQuantity(s.to_string()))?;
        if quantity == 0 {
            return Err(StepParseError::Zero(s.to_string()));
        }
        match designator {
            'D' => Ok(WindowStep::Days(quantity)),
            'W' => Ok(WindowStep::Weeks(quantity)),
            'M' => Ok(WindowStep::Months(quantity)),
            'Y' => Ok(WindowStep::Years(quantity)),
            _ => Err(StepParseError::MissingDesignator(s.to_string())),
        }
    }
}

impl fmt::Display for WindowStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WindowStep::Days(n) => write!(f, "P{n}D"),
            WindowStep::Weeks(n) => write!(f, "P{n}W"),
            WindowStep::Months(n) => write!(f, "P{n}M"),
            WindowStep::Years(n) => write!(f, "P{n}Y"),
        }
    }
}
