//! Day classification logic.
//!
//! This module determines whether a shift date falls on a weekend and whether
//! it is one of the caller-supplied holidays. The two flags are independent;
//! the rate resolver gives holidays priority when picking a rate field.

use std::collections::BTreeSet;

use chrono::{DateTime, Datelike, NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

use crate::error::{EngineError, EngineResult};

/// The weekday and holiday flags of a date.
///
/// # Example
///
/// ```
/// use invoice_engine::calculation::{classify_day, HolidaySet};
/// use chrono::NaiveDate;
///
/// let holidays = HolidaySet::from_dates([NaiveDate::from_ymd_opt(2026, 1, 26).unwrap()]);
///
/// // 2026-01-24 is a Saturday
/// let saturday = classify_day(NaiveDate::from_ymd_opt(2026, 1, 24).unwrap(), &holidays);
/// assert!(saturday.is_weekend && !saturday.is_holiday);
///
/// // 2026-01-26 is a Monday and a holiday
/// let monday = classify_day(NaiveDate::from_ymd_opt(2026, 1, 26).unwrap(), &holidays);
/// assert!(!monday.is_weekend && monday.is_holiday);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DayClassification {
    /// Saturday or Sunday.
    pub is_weekend: bool,
    /// Present in the holiday set.
    pub is_holiday: bool,
}

/// A set of holiday dates normalized to calendar-day granularity.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HolidaySet {
    dates: BTreeSet<NaiveDate>,
}

impl HolidaySet {
    /// Builds a set from dates.
    pub fn from_dates<I: IntoIterator<Item = NaiveDate>>(dates: I) -> Self {
        Self {
            dates: dates.into_iter().collect(),
        }
    }

    /// Builds a set from caller-supplied strings.
    ///
    /// Accepts plain `YYYY-MM-DD` dates, RFC 3339 timestamps and naive
    /// `YYYY-MM-DDTHH:MM:SS` timestamps; timestamps are truncated to their
    /// calendar date.
    ///
    /// # Errors
    ///
    /// Returns a validation error on the `holidays` field naming the first
    /// value that could not be parsed.
    pub fn parse<S: AsRef<str>>(values: &[S]) -> EngineResult<Self> {
        let mut dates = BTreeSet::new();
        for value in values {
            let value = value.as_ref();
            let date = parse_calendar_day(value).ok_or_else(|| {
                EngineError::validation("holidays", format!("'{}' is not a date", value))
            })?;
            dates.insert(date);
        }
        Ok(Self { dates })
    }

    /// Returns true if the date is a holiday.
    pub fn contains(&self, date: NaiveDate) -> bool {
        self.dates.contains(&date)
    }

    /// Number of distinct holiday dates.
    pub fn len(&self) -> usize {
        self.dates.len()
    }

    /// Returns true if the set holds no dates.
    pub fn is_empty(&self) -> bool {
        self.dates.is_empty()
    }
}

fn parse_calendar_day(value: &str) -> Option<NaiveDate> {
    let value = value.trim();
    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .ok()
        .or_else(|| {
            DateTime::parse_from_rfc3339(value)
                .ok()
                .map(|dt| dt.date_naive())
        })
        .or_else(|| {
            NaiveDateTime::parse_from_str(value, "%Y-%m-%dT%H:%M:%S")
                .ok()
                .map(|dt| dt.date())
        })
}

/// Classifies a shift date.
///
/// A date is a weekend when its ISO weekday rank (Monday = 1 .. Sunday = 7)
/// is greater than 5.
pub fn classify_day(date: NaiveDate, holidays: &HolidaySet) -> DayClassification {
    DayClassification {
        is_weekend: date.weekday().number_from_monday() > 5,
        is_holiday: holidays.contains(date),
    }
}
