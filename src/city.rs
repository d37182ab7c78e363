//! Supported-city domain model
//!
//! The assistant covers exactly four cities. City names are accepted
//! case-insensitively and canonicalized to a lowercase key used for archive
//! lookups and model artifact file names. Anything else is a conversational
//! refusal, never a process error.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// One of the four cities the assistant supports
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum City {
    Abidjan,
    Berlin,
    Toronto,
    Kazan,
}

/// Inclusive date span of a city's historical archive coverage
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CoverageRange {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl CoverageRange {
    fn new(start: NaiveDate, end: NaiveDate) -> Self {
        Self { start, end }
    }

    /// Whether a date falls inside the coverage span
    #[must_use]
    pub fn contains(&self, date: NaiveDate) -> bool {
        date >= self.start && date <= self.end
    }
}

// Coverage boundaries are compile-time literals, always valid
fn date(year: i32, month: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(year, month, day).unwrap()
}

impl City {
    /// All supported cities, in the order the tool docstrings list them
    pub const ALL: [City; 4] = [City::Abidjan, City::Berlin, City::Toronto, City::Kazan];

    /// Canonical lowercase key used for lookups and artifact file names
    #[must_use]
    pub fn key(&self) -> &'static str {
        match self {
            City::Abidjan => "abidjan",
            City::Berlin => "berlin",
            City::Toronto => "toronto",
            City::Kazan => "kazan",
        }
    }

    /// Documented historical archive coverage for this city
    #[must_use]
    pub fn coverage(&self) -> CoverageRange {
        match self {
            City::Abidjan => CoverageRange::new(date(1973, 6, 1), date(2023, 9, 5)),
            City::Kazan => CoverageRange::new(date(1881, 1, 1), date(2023, 9, 5)),
            City::Toronto => CoverageRange::new(date(2002, 6, 4), date(2023, 8, 28)),
            City::Berlin => CoverageRange::new(date(1931, 1, 1), date(2023, 9, 3)),
        }
    }

    /// Parse a free-text city name, case-insensitively
    ///
    /// Returns the refusal message for unrecognized input so the LLM layer
    /// can relay it conversationally.
    pub fn parse(input: &str) -> Result<City, String> {
        let normalized = input.trim().to_lowercase();
        match normalized.as_str() {
            "abidjan" => Ok(City::Abidjan),
            "berlin" => Ok(City::Berlin),
            "toronto" => Ok(City::Toronto),
            "kazan" => Ok(City::Kazan),
            _ => Err(format!("City: {normalized} currently not supported")),
        }
    }
}

impl FromStr for City {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        City::parse(s)
    }
}

impl fmt::Display for City {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}
