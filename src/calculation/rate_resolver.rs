//! Hourly rate resolution.
//!
//! Rates are found by walking an ordered fallback chain of resolver
//! functions over a [`ShiftPattern`]:
//!
//! 1. facility-scoped entries matching a candidate facility and the role
//! 2. role-only (user type) entries
//!
//! The first link returning an entry wins. A field of that entry is then
//! picked from the day classification and the emergency flag. When no link
//! finds an entry, the rate is unresolved and the record is left out of the
//! invoice by the caller.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::models::{FacilityKind, RateEntry, RateField, RateSource, Shift, ShiftPattern};

use super::day_classifier::DayClassification;

/// One link of the fallback chain.
type RateLookup = for<'a> fn(&'a ShiftPattern, &RateQuery<'_>) -> Option<&'a RateEntry>;

/// The fallback chain, tried in order.
const RATE_CHAIN: [(RateSource, RateLookup); 2] = [
    (RateSource::FacilityRate, lookup_facility_rate),
    (RateSource::UserTypeRate, lookup_user_type_rate),
];

/// What a rate is being resolved for.
#[derive(Debug, Clone)]
pub struct RateQuery<'a> {
    /// Normalized role, see [`normalize_role`].
    pub role: &'a str,
    /// Facility ids to try, in order.
    pub facility_candidates: &'a [String],
    /// Weekend and holiday flags of the shift date.
    pub day: DayClassification,
    /// Whether the shift was an emergency booking.
    pub is_emergency: bool,
}

/// A successfully resolved rate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolvedRate {
    /// The hourly rate.
    pub rate: Decimal,
    /// Which link of the chain found the entry.
    pub source: RateSource,
    /// Which field of the entry was used.
    pub field: RateField,
    /// The entry itself.
    pub entry: RateEntry,
}

/// Normalizes a role for rate matching.
///
/// Roles are trimmed and lower-cased, and the `senior_carer` spelling is
/// mapped to `senior carer`.
///
/// # Example
///
/// ```
/// use invoice_engine::calculation::normalize_role;
///
/// assert_eq!(normalize_role("  Nurse "), "nurse");
/// assert_eq!(normalize_role("Senior_Carer"), "senior carer");
/// ```
pub fn normalize_role(role: &str) -> String {
    let role = role.trim().to_lowercase();
    if role == "senior_carer" {
        "senior carer".to_string()
    } else {
        role
    }
}

/// Lists the facility ids a shift's rates and timing may be keyed under.
///
/// A permanent facility only matches its own id. A temporary facility also
/// matches the shift's home id and temporary-home id, in that order.
/// Duplicates are removed.
pub fn facility_candidates(facility_id: &str, kind: FacilityKind, shift: &Shift) -> Vec<String> {
    let mut candidates = vec![facility_id.to_string()];
    if kind == FacilityKind::Temporary {
        for id in [&shift.home_id, &shift.temporary_home_id].into_iter().flatten() {
            if !candidates.contains(id) {
                candidates.push(id.clone());
            }
        }
    }
    candidates
}

fn lookup_facility_rate<'a>(pattern: &'a ShiftPattern, query: &RateQuery<'_>) -> Option<&'a RateEntry> {
    query.facility_candidates.iter().find_map(|facility_id| {
        pattern.rates.iter().find(|entry| {
            entry.facility_id.as_deref() == Some(facility_id.as_str())
                && normalize_role(&entry.user_type) == query.role
        })
    })
}

fn lookup_user_type_rate<'a>(pattern: &'a ShiftPattern, query: &RateQuery<'_>) -> Option<&'a RateEntry> {
    pattern
        .user_type_rates
        .iter()
        .find(|entry| normalize_role(&entry.user_type) == query.role)
}

/// Picks the field of a rate entry for a day and emergency flag.
///
/// Holiday wins when the day is a holiday and the entry defines a holiday
/// rate (emergency-holiday when emergency and defined). Otherwise weekend or
/// weekday by the weekend flag, using the emergency variant when emergency
/// and defined.
pub fn select_rate_field(entry: &RateEntry, day: DayClassification, is_emergency: bool) -> RateField {
    if day.is_holiday && entry.holiday_rate.is_some() {
        if is_emergency && entry.emergency_holiday_rate.is_some() {
            return RateField::EmergencyHoliday;
        }
        return RateField::Holiday;
    }

    let (normal, emergency) = if day.is_weekend {
        (RateField::Weekend, RateField::EmergencyWeekend)
    } else {
        (RateField::Weekday, RateField::EmergencyWeekday)
    };

    if is_emergency && entry.get(emergency).is_some() {
        emergency
    } else {
        normal
    }
}

/// Resolves the hourly rate for a query against a shift pattern.
///
/// Returns `None` when no link of the fallback chain finds an entry.
///
/// # Example
///
/// ```
/// use invoice_engine::calculation::{resolve_rate, DayClassification, RateQuery};
/// use invoice_engine::models::{RateEntry, RateSource, ShiftPattern};
/// use rust_decimal::Decimal;
///
/// let pattern = ShiftPattern {
///     id: "day".to_string(),
///     name: "Day".to_string(),
///     timings: vec![],
///     rates: vec![],
///     user_type_rates: vec![RateEntry {
///         facility_id: None,
///         user_type: "nurse".to_string(),
///         weekday_rate: Decimal::new(20, 0),
///         weekend_rate: Decimal::new(25, 0),
///         holiday_rate: None,
///         emergency_weekday_rate: None,
///         emergency_weekend_rate: None,
///         emergency_holiday_rate: None,
///     }],
/// };
///
/// let candidates = vec!["fac_001".to_string()];
/// let query = RateQuery {
///     role: "nurse",
///     facility_candidates: &candidates,
///     day: DayClassification { is_weekend: true, is_holiday: false },
///     is_emergency: false,
/// };
///
/// let resolved = resolve_rate(&pattern, &query).unwrap();
/// assert_eq!(resolved.rate, Decimal::new(25, 0));
/// assert_eq!(resolved.source, RateSource::UserTypeRate);
/// ```
pub fn resolve_rate(pattern: &ShiftPattern, query: &RateQuery<'_>) -> Option<ResolvedRate> {
    let (source, entry) = RATE_CHAIN
        .iter()
        .find_map(|(source, lookup)| lookup(pattern, query).map(|entry| (*source, entry)))?;

    let field = select_rate_field(entry, query.day, query.is_emergency);
    let rate = entry.get(field)?;

    Some(ResolvedRate {
        rate,
        source,
        field,
        entry: entry.clone(),
    })
}
