//! The `MonthKey` type: a calendar month written as `YYYY-MM`.

use chrono::{Datelike, Months, NaiveDate};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::fmt::{Display, Formatter};
use std::str::FromStr;

/// Identifies one calendar month bucket, e.g. `2024-03`.
///
/// The month is always in `1..=12` and the year in `0..=9999`, so the string form is always
/// exactly seven characters. Ordering is by year, then month. Navigation stops at the ends of that
/// range: `0000-01` has no previous month and `9999-12` has no next one, and both return
/// themselves.
///
/// ```
/// # use budget_ledger::model::MonthKey;
/// # use std::str::FromStr;
/// let key = MonthKey::from_str("2024-01").unwrap();
/// assert_eq!(key.previous().to_string(), "2023-12");
/// assert_eq!(key.display_name(), "January 2024");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct MonthKey {
    year: i32,
    month: u32,
}

impl MonthKey {
    /// Returns `None` if `month` is not in `1..=12` or `year` does not have four digits.
    pub fn new(year: i32, month: u32) -> Option<Self> {
        if (0..=9999).contains(&year) && (1..=12).contains(&month) {
            Some(Self { year, month })
        } else {
            None
        }
    }

    /// The month that contains `date`.
    pub fn from_date(date: NaiveDate) -> Self {
        Self {
            year: date.year().clamp(0, 9999),
            month: date.month(),
        }
    }

    pub fn year(&self) -> i32 {
        self.year
    }

    pub fn month(&self) -> u32 {
        self.month
    }

    /// The month before this one. January rolls back to December of the previous year. `0000-01` is
    /// returned unchanged.
    pub fn previous(&self) -> Self {
        match self.month {
            1 if self.year > 0 => Self {
                year: self.year - 1,
                month: 12,
            },
            1 => *self,
            m => Self {
                year: self.year,
                month: m - 1,
            },
        }
    }

    /// The month after this one. December rolls forward to January of the next year. `9999-12` is
    /// returned unchanged.
    pub fn next(&self) -> Self {
        match self.month {
            12 if self.year < 9999 => Self {
                year: self.year + 1,
                month: 1,
            },
            12 => *self,
            m => Self {
                year: self.year,
                month: m + 1,
            },
        }
    }

    /// The number of days in this month, leap years included.
    pub fn days_in_month(&self) -> u32 {
        self.first_day()
            .and_then(|first| first.checked_add_months(Months::new(1)))
            .and_then(|next| next.pred_opt())
            .map(|last| last.day())
            .unwrap_or(31)
    }

    /// The English long month name and four-digit year, e.g. `March 2024`.
    pub fn display_name(&self) -> String {
        match self.first_day() {
            Some(first) => first.format("%B %Y").to_string(),
            None => self.to_string(),
        }
    }

    fn first_day(&self) -> Option<NaiveDate> {
        NaiveDate::from_ymd_opt(self.year, self.month, 1)
    }
}

impl Display for MonthKey {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{:04}-{:02}", self.year, self.month)
    }
}

/// An error that can occur when parsing a `MonthKey`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MonthKeyError(String);

impl Display for MonthKeyError {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "'{}' is not a month in the form YYYY-MM", self.0)
    }
}

impl std::error::Error for MonthKeyError {}

impl FromStr for MonthKey {
    type Err = MonthKeyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let err = || MonthKeyError(s.to_string());
        let (year, month) = s.split_once('-').ok_or_else(err)?;
        let all_digits = |part: &str, len: usize| {
            part.len() == len && part.bytes().all(|b| b.is_ascii_digit())
        };
        if !all_digits(year, 4) || !all_digits(month, 2) {
            return Err(err());
        }
        let year = year.parse::<i32>().map_err(|_| err())?;
        let month = month.parse::<u32>().map_err(|_| err())?;
        MonthKey::new(year, month).ok_or_else(err)
    }
}

impl Serialize for MonthKey {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for MonthKey {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        MonthKey::from_str(&s).map_err(serde::de::Error::custom)
    }
}
