//! Season identifiers.
//!
//! Seasons are identified internally by the 8-character concatenation of the
//! starting and ending years ("20232024"); the advanced-stats feed addresses
//! the same season by its 4-digit starting year.

use crate::error::{PuckError, Result};
use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// First season with advanced shot-tracking data.
pub const FIRST_TRACKED_SEASON: u16 = 2007;

/// Type-safe wrapper for a season, stored as its starting year.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Season(pub u16);

impl Season {
    pub fn new(start_year: u16) -> Self {
        Self(start_year)
    }

    pub fn start_year(&self) -> u16 {
        self.0
    }

    /// The 8-digit internal code, e.g. `"20232024"`.
    pub fn code(&self) -> String {
        format!("{}{}", self.0, self.0 + 1)
    }

    /// Parse an 8-digit code back into a season. The first four characters
    /// carry the starting year; the trailing four are redundant.
    pub fn from_code(code: &str) -> Option<Self> {
        if code.len() < 4 {
            return None;
        }
        code[..4].parse().ok().map(Self)
    }

    /// Display form used in report headers, e.g. `"2023-24"`.
    pub fn display(&self) -> String {
        format!("{}-{:02}", self.0, (self.0 + 1) % 100)
    }

    /// The season in progress (or most recently completed) on `today`.
    /// A new season is considered started in September.
    pub fn current(today: NaiveDate) -> Self {
        let year = today.year() as u16;
        if today.month() >= 9 {
            Self(year)
        } else {
            Self(year - 1)
        }
    }

    /// Nominal opening day of the season, October 1 of the starting year.
    pub fn start_date(&self) -> NaiveDate {
        NaiveDate::from_ymd_opt(self.0 as i32, 10, 1).unwrap_or_default()
    }
}

impl fmt::Display for Season {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

impl FromStr for Season {
    type Err = PuckError;

    fn from_str(s: &str) -> Result<Self> {
        if s.len() == 8 {
            return Season::from_code(s).ok_or_else(|| PuckError::InvalidDate {
                value: s.to_string(),
            });
        }
        s.parse()
            .map(Season)
            .map_err(|_| PuckError::InvalidDate {
                value: s.to_string(),
            })
    }
}

/// All seasons in `[start_year, end_year]`, oldest first.
pub fn seasons_in_range(start_year: u16, end_year: u16) -> Vec<Season> {
    (start_year..=end_year).map(Season).collect()
}
