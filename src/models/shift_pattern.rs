//! Shift pattern, timing and rate entry models.
//!
//! A [`ShiftPattern`] is a named template. Per facility it defines a
//! [`Timing`] and a set of facility-scoped [`RateEntry`] values keyed by
//! (facility, role); a second list of role-only entries acts as the fallback
//! when no facility-specific rate matches.

use chrono::NaiveTime;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Start/end/break data for a shift at one facility.
///
/// # Example
///
/// ```
/// use invoice_engine::models::Timing;
/// use chrono::NaiveTime;
/// use rust_decimal::Decimal;
///
/// let night = Timing {
///     start_time: NaiveTime::from_hms_opt(22, 0, 0).unwrap(),
///     end_time: NaiveTime::from_hms_opt(6, 0, 0).unwrap(),
///     billable_hours: None,
///     break_hours: Some(Decimal::new(5, 1)),
/// };
/// assert!(night.crosses_midnight());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Timing {
    /// Time of day the shift starts.
    pub start_time: NaiveTime,
    /// Time of day the shift ends.
    pub end_time: NaiveTime,
    /// Explicit billable hours; when present it overrides the arithmetic.
    #[serde(default)]
    pub billable_hours: Option<Decimal>,
    /// Unpaid break length in hours.
    #[serde(default)]
    pub break_hours: Option<Decimal>,
}

impl Timing {
    /// Returns true if the end time-of-day is before the start time-of-day.
    pub fn crosses_midnight(&self) -> bool {
        self.end_time < self.start_time
    }
}

/// The timing a shift pattern uses at a particular facility.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FacilityTiming {
    /// The facility this timing applies to.
    pub facility_id: String,
    /// The timing itself.
    #[serde(flatten)]
    pub timing: Timing,
}

/// One rate entry: six hourly rates for a role, optionally scoped to a facility.
///
/// Weekday and weekend rates are always present; the holiday rate and every
/// emergency variant are optional and fall back to their non-holiday or
/// non-emergency counterparts when absent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RateEntry {
    /// The facility the entry is scoped to. Ignored for role-only entries.
    #[serde(default)]
    pub facility_id: Option<String>,
    /// The role (user type) the entry applies to, e.g. "senior carer".
    pub user_type: String,
    /// Monday to Friday rate.
    pub weekday_rate: Decimal,
    /// Saturday and Sunday rate.
    pub weekend_rate: Decimal,
    /// Public holiday rate.
    #[serde(default)]
    pub holiday_rate: Option<Decimal>,
    /// Emergency Monday to Friday rate.
    #[serde(default)]
    pub emergency_weekday_rate: Option<Decimal>,
    /// Emergency Saturday and Sunday rate.
    #[serde(default)]
    pub emergency_weekend_rate: Option<Decimal>,
    /// Emergency public holiday rate.
    #[serde(default)]
    pub emergency_holiday_rate: Option<Decimal>,
}

impl RateEntry {
    /// Returns the rate stored in the given field, if the entry defines it.
    pub fn get(&self, field: RateField) -> Option<Decimal> {
        match field {
            RateField::Weekday => Some(self.weekday_rate),
            RateField::Weekend => Some(self.weekend_rate),
            RateField::Holiday => self.holiday_rate,
            RateField::EmergencyWeekday => self.emergency_weekday_rate,
            RateField::EmergencyWeekend => self.emergency_weekend_rate,
            RateField::EmergencyHoliday => self.emergency_holiday_rate,
        }
    }
}

/// Which of the six fields of a [`RateEntry`] a resolved rate came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RateField {
    /// `weekday_rate`
    Weekday,
    /// `weekend_rate`
    Weekend,
    /// `holiday_rate`
    Holiday,
    /// `emergency_weekday_rate`
    EmergencyWeekday,
    /// `emergency_weekend_rate`
    EmergencyWeekend,
    /// `emergency_holiday_rate`
    EmergencyHoliday,
}

/// Which link of the fallback chain produced a rate entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RateSource {
    /// A facility-scoped entry matching facility and role.
    FacilityRate,
    /// A role-only fallback entry.
    UserTypeRate,
}

/// A named template with per-facility timings and billing rates.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShiftPattern {
    /// Unique identifier for the pattern.
    pub id: String,
    /// Display name; also the shift-type key of invoice summaries.
    pub name: String,
    /// Timings per facility.
    #[serde(default)]
    pub timings: Vec<FacilityTiming>,
    /// Facility-scoped rate entries.
    #[serde(default)]
    pub rates: Vec<RateEntry>,
    /// Role-only fallback entries.
    #[serde(default)]
    pub user_type_rates: Vec<RateEntry>,
}

impl ShiftPattern {
    /// Finds the timing for the first candidate facility that has one.
    pub fn timing_for(&self, candidates: &[String]) -> Option<&Timing> {
        candidates.iter().find_map(|facility_id| {
            self.timings
                .iter()
                .find(|t| &t.facility_id == facility_id)
                .map(|t| &t.timing)
        })
    }
}
