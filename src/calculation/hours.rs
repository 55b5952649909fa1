//! Billable hours calculation.
//!
//! Derives billable hours from a [`Timing`]: an explicit billable-hours value
//! is used verbatim, otherwise hours are computed from the start and end
//! time-of-day with midnight wraparound and break deduction.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::models::Timing;

const MINUTES_PER_DAY: i64 = 24 * 60;

/// The hours derived from a timing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct HoursBreakdown {
    /// Hours to bill, never negative when computed.
    pub billable_hours: Decimal,
    /// Start-to-end duration before break deduction; `None` when the timing
    /// supplied explicit billable hours.
    pub duration_hours: Option<Decimal>,
    /// Break hours (zero when the timing has none).
    pub break_hours: Decimal,
}

impl HoursBreakdown {
    /// The hours that count towards a summary's total hours: the duration,
    /// or the billable hours when no duration was computed.
    pub fn total_hours(&self) -> Decimal {
        self.duration_hours.unwrap_or(self.billable_hours)
    }
}

/// Calculates billable hours for a timing.
///
/// # Behavior
///
/// - `billable_hours` present (including zero): returned verbatim
/// - end before start: the shift crosses midnight and 24 hours are added
/// - break hours (default 0) are subtracted and the result clamped at zero
///
/// # Example
///
/// ```
/// use invoice_engine::calculation::calculate_hours;
/// use invoice_engine::models::Timing;
/// use chrono::NaiveTime;
/// use rust_decimal::Decimal;
///
/// let timing = Timing {
///     start_time: NaiveTime::from_hms_opt(22, 0, 0).unwrap(),
///     end_time: NaiveTime::from_hms_opt(6, 0, 0).unwrap(),
///     billable_hours: None,
///     break_hours: Some(Decimal::new(5, 1)),
/// };
///
/// let hours = calculate_hours(&timing);
/// assert_eq!(hours.duration_hours, Some(Decimal::new(8, 0)));
/// assert_eq!(hours.billable_hours, Decimal::new(75, 1));
/// ```
pub fn calculate_hours(timing: &Timing) -> HoursBreakdown {
    let break_hours = timing.break_hours.unwrap_or(Decimal::ZERO);

    if let Some(explicit) = timing.billable_hours {
        return HoursBreakdown {
            billable_hours: explicit,
            duration_hours: None,
            break_hours,
        };
    }

    let mut minutes = (timing.end_time - timing.start_time).num_minutes();
    if timing.crosses_midnight() {
        minutes += MINUTES_PER_DAY;
    }
    let duration = Decimal::new(minutes, 0) / Decimal::new(60, 0);

    HoursBreakdown {
        billable_hours: duration.saturating_sub(break_hours).max(Decimal::ZERO),
        duration_hours: Some(duration),
        break_hours,
    }
}
