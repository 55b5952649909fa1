//! Shift summary aggregation.
//!
//! Accumulates priced records into per-shift-type [`ShiftSummaryBucket`]s and
//! an overall total. Amounts are `rate × billable_hours` with no rounding.

use rust_decimal::Decimal;

use crate::models::{HourBucket, RateField, ShiftSummary, ShiftSummaryBucket};

use super::day_classifier::DayClassification;
use super::hours::HoursBreakdown;
use super::rate_resolver::ResolvedRate;

/// Picks the single hour bucket a record counts towards.
///
/// Priority: holiday, emergency, weekend, weekday.
pub fn classify_bucket(day: DayClassification, is_emergency: bool) -> HourBucket {
    if day.is_holiday {
        HourBucket::Holiday
    } else if is_emergency {
        HourBucket::Emergency
    } else if day.is_weekend {
        HourBucket::Weekend
    } else {
        HourBucket::Weekday
    }
}

/// Builds a [`ShiftSummary`] one record at a time.
///
/// # Example
///
/// ```
/// use invoice_engine::calculation::{
///     calculate_hours, resolve_rate, DayClassification, RateQuery, SummaryAggregator,
/// };
/// use invoice_engine::models::{RateEntry, ShiftPattern, Timing};
/// use chrono::NaiveTime;
/// use rust_decimal::Decimal;
///
/// let pattern = ShiftPattern {
///     id: "day".to_string(),
///     name: "Day".to_string(),
///     timings: vec![],
///     rates: vec![],
///     user_type_rates: vec![RateEntry {
///         facility_id: None,
///         user_type: "carer".to_string(),
///         weekday_rate: Decimal::new(30, 0),
///         weekend_rate: Decimal::new(36, 0),
///         holiday_rate: None,
///         emergency_weekday_rate: None,
///         emergency_weekend_rate: None,
///         emergency_holiday_rate: None,
///     }],
/// };
/// let timing = Timing {
///     start_time: NaiveTime::from_hms_opt(7, 0, 0).unwrap(),
///     end_time: NaiveTime::from_hms_opt(15, 0, 0).unwrap(),
///     billable_hours: None,
///     break_hours: None,
/// };
/// let day = DayClassification { is_weekend: false, is_holiday: false };
/// let candidates = vec!["fac_001".to_string()];
/// let query = RateQuery { role: "carer", facility_candidates: &candidates, day, is_emergency: false };
/// let rate = resolve_rate(&pattern, &query).unwrap();
///
/// let mut aggregator = SummaryAggregator::new();
/// let amount = aggregator.add("Day", &rate, &calculate_hours(&timing), day, false);
///
/// assert_eq!(amount, Some(Decimal::new(240, 0)));
/// assert_eq!(aggregator.total_amount(), Decimal::new(240, 0));
/// ```
#[derive(Debug, Clone, Default)]
pub struct SummaryAggregator {
    summary: ShiftSummary,
    total_amount: Decimal,
}

impl SummaryAggregator {
    /// Creates an empty aggregator.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds one resolved record to the bucket named `shift_type` and returns
    /// the record's amount.
    ///
    /// The bucket's rate fields are taken from the first record that creates
    /// it and are not updated by later records.
    ///
    /// Returns `None` and leaves the aggregator unchanged when the amount or
    /// any running sum would overflow `Decimal`.
    pub fn add(
        &mut self,
        shift_type: &str,
        rate: &ResolvedRate,
        hours: &HoursBreakdown,
        day: DayClassification,
        is_emergency: bool,
    ) -> Option<Decimal> {
        let amount = rate.rate.checked_mul(hours.billable_hours)?;
        let total_amount = self.total_amount.checked_add(amount)?;

        let mut bucket = match self.summary.get(shift_type) {
            Some(existing) => existing.clone(),
            None => first_record_bucket(rate),
        };

        bucket.count = bucket.count.checked_add(1)?;
        bucket.total_hours = bucket.total_hours.checked_add(hours.total_hours())?;
        bucket.billable_hours = bucket.billable_hours.checked_add(hours.billable_hours)?;
        bucket.break_hours = bucket.break_hours.checked_add(hours.break_hours)?;
        let hour_bucket = match classify_bucket(day, is_emergency) {
            HourBucket::Holiday => &mut bucket.holiday_hours,
            HourBucket::Emergency => &mut bucket.emergency_hours,
            HourBucket::Weekend => &mut bucket.weekend_hours,
            HourBucket::Weekday => &mut bucket.weekday_hours,
        };
        *hour_bucket = hour_bucket.checked_add(hours.billable_hours)?;
        bucket.total_amount = bucket.total_amount.checked_add(amount)?;

        self.summary.insert(shift_type.to_string(), bucket);
        self.total_amount = total_amount;

        Some(amount)
    }

    /// Sum of all amounts added so far.
    pub fn total_amount(&self) -> Decimal {
        self.total_amount
    }

    /// The summary built so far.
    pub fn summary(&self) -> &ShiftSummary {
        &self.summary
    }

    /// Consumes the aggregator, returning the summary and total.
    pub fn finish(self) -> (ShiftSummary, Decimal) {
        (self.summary, self.total_amount)
    }
}

fn first_record_bucket(rate: &ResolvedRate) -> ShiftSummaryBucket {
    let entry = &rate.entry;
    let emergency_rate = match rate.field {
        RateField::EmergencyWeekday | RateField::EmergencyWeekend | RateField::EmergencyHoliday => {
            entry.get(rate.field)
        }
        _ => entry.emergency_weekday_rate,
    };

    ShiftSummaryBucket {
        weekday_rate: entry.weekday_rate,
        weekend_rate: entry.weekend_rate,
        holiday_rate: entry.holiday_rate,
        emergency_rate,
        ..Default::default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{RateEntry, RateSource};
    use proptest::prelude::*;
    use std::str::FromStr;

    fn dec(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    fn resolved(rate: &str, field: RateField, weekday: &str, weekend: &str) -> ResolvedRate {
        ResolvedRate {
            rate: dec(rate),
            source: RateSource::UserTypeRate,
            field,
            entry: RateEntry {
                facility_id: None,
                user_type: "nurse".to_string(),
                weekday_rate: dec(weekday),
                weekend_rate: dec(weekend),
                holiday_rate: Some(dec("40")),
                emergency_weekday_rate: Some(dec("35")),
                emergency_weekend_rate: Some(dec("38")),
                emergency_holiday_rate: None,
            },
        }
    }

    fn hours(billable: &str, duration: Option<&str>, brk: &str) -> HoursBreakdown {
        HoursBreakdown {
            billable_hours: dec(billable),
            duration_hours: duration.map(dec),
            break_hours: dec(brk),
        }
    }

    fn day(is_weekend: bool, is_holiday: bool) -> DayClassification {
        DayClassification {
            is_weekend,
            is_holiday,
        }
    }

    #[test]
    fn test_bucket_priority() {
        assert_eq!(classify_bucket(day(true, true), true), HourBucket::Holiday);
        assert_eq!(classify_bucket(day(false, true), false), HourBucket::Holiday);
        assert_eq!(classify_bucket(day(true, false), true), HourBucket::Emergency);
        assert_eq!(classify_bucket(day(true, false), false), HourBucket::Weekend);
        assert_eq!(classify_bucket(day(false, false), false), HourBucket::Weekday);
    }

    #[test]
    fn test_amount_is_rate_times_billable_hours() {
        let mut aggregator = SummaryAggregator::new();
        let amount = aggregator.add(
            "Night",
            &resolved("27.35", RateField::Weekday, "27.35", "31.00"),
            &hours("7.5", Some("8"), "0.5"),
            day(false, false),
            false,
        );
        assert_eq!(amount, Some(dec("205.125")));
        assert_eq!(aggregator.total_amount(), dec("205.125"));
    }

    #[test]
    fn test_overflowing_record_is_refused_and_leaves_totals_untouched() {
        let mut aggregator = SummaryAggregator::new();
        aggregator.add(
            "Day",
            &resolved("20", RateField::Weekday, "20", "25"),
            &hours("8", Some("8"), "0"),
            day(false, false),
            false,
        );

        let mut huge = resolved("20", RateField::Weekday, "20", "25");
        huge.rate = Decimal::MAX;
        let amount = aggregator.add(
            "Day",
            &huge,
            &hours("8", Some("8"), "0"),
            day(false, false),
            false,
        );
        assert_eq!(amount, None);

        // The product fits but the running total does not
        let amount = aggregator.add(
            "Night",
            &huge,
            &hours("1", Some("1"), "0"),
            day(false, false),
            false,
        );
        assert_eq!(amount, None);

        let (summary, total) = aggregator.finish();
        assert_eq!(total, dec("160"));
        assert_eq!(summary.len(), 1);
        assert_eq!(summary["Day"].count, 1);
        assert_eq!(summary["Day"].total_amount, dec("160"));
    }

    #[test]
    fn test_records_accumulate_into_one_bucket() {
        let mut aggregator = SummaryAggregator::new();
        aggregator.add(
            "Day",
            &resolved("20", RateField::Weekday, "20", "25"),
            &hours("7.5", Some("8"), "0.5"),
            day(false, false),
            false,
        );
        aggregator.add(
            "Day",
            &resolved("25", RateField::Weekend, "20", "25"),
            &hours("8", None, "0"),
            day(true, false),
            false,
        );

        let (summary, total) = aggregator.finish();
        let bucket = &summary["Day"];

        assert_eq!(summary.len(), 1);
        assert_eq!(bucket.count, 2);
        assert_eq!(bucket.total_hours, dec("16"));
        assert_eq!(bucket.billable_hours, dec("15.5"));
        assert_eq!(bucket.break_hours, dec("0.5"));
        assert_eq!(bucket.weekday_hours, dec("7.5"));
        assert_eq!(bucket.weekend_hours, dec("8"));
        assert_eq!(bucket.total_amount, dec("350"));
        assert_eq!(total, dec("350"));
    }

    #[test]
    fn test_holiday_emergency_record_only_counts_as_holiday() {
        let mut aggregator = SummaryAggregator::new();
        aggregator.add(
            "Day",
            &resolved("40", RateField::Holiday, "20", "25"),
            &hours("8", Some("8"), "0"),
            day(false, true),
            true,
        );

        let bucket = &aggregator.summary()["Day"];
        assert_eq!(bucket.holiday_hours, dec("8"));
        assert_eq!(bucket.emergency_hours, Decimal::ZERO);
        assert_eq!(bucket.weekday_hours, Decimal::ZERO);
    }

    #[test]
    fn test_bucket_rates_come_from_first_record() {
        let mut aggregator = SummaryAggregator::new();
        aggregator.add(
            "Day",
            &resolved("38", RateField::EmergencyWeekend, "20", "25"),
            &hours("8", Some("8"), "0"),
            day(true, false),
            true,
        );
        aggregator.add(
            "Day",
            &resolved("22", RateField::Weekday, "22", "27"),
            &hours("8", Some("8"), "0"),
            day(false, false),
            false,
        );

        let bucket = &aggregator.summary()["Day"];
        assert_eq!(bucket.weekday_rate, dec("20"));
        assert_eq!(bucket.weekend_rate, dec("25"));
        assert_eq!(bucket.holiday_rate, Some(dec("40")));
        assert_eq!(bucket.emergency_rate, Some(dec("38")));
    }

    #[test]
    fn test_non_emergency_first_record_reports_emergency_weekday_rate() {
        let mut aggregator = SummaryAggregator::new();
        aggregator.add(
            "Day",
            &resolved("20", RateField::Weekday, "20", "25"),
            &hours("8", Some("8"), "0"),
            day(false, false),
            false,
        );
        assert_eq!(aggregator.summary()["Day"].emergency_rate, Some(dec("35")));
    }

    #[test]
    fn test_separate_shift_types_get_separate_buckets() {
        let mut aggregator = SummaryAggregator::new();
        let rate = resolved("20", RateField::Weekday, "20", "25");
        aggregator.add("Day", &rate, &hours("8", Some("8"), "0"), day(false, false), false);
        aggregator.add("Night", &rate, &hours("4", Some("4"), "0"), day(false, false), false);

        let (summary, total) = aggregator.finish();
        assert_eq!(summary.keys().collect::<Vec<_>>(), vec!["Day", "Night"]);
        assert_eq!(summary["Night"].total_amount, dec("80"));
        assert_eq!(total, dec("240"));
    }

    proptest! {
        #[test]
        fn prop_each_record_lands_in_exactly_one_bucket(
            is_weekend in any::<bool>(),
            is_holiday in any::<bool>(),
            is_emergency in any::<bool>(),
            billable_cents in 0i64..2400,
        ) {
            let mut aggregator = SummaryAggregator::new();
            let billable = Decimal::new(billable_cents, 2);
            aggregator.add(
                "Day",
                &resolved("20", RateField::Weekday, "20", "25"),
                &HoursBreakdown { billable_hours: billable, duration_hours: None, break_hours: Decimal::ZERO },
                day(is_weekend, is_holiday),
                is_emergency,
            );
            let bucket = &aggregator.summary()["Day"];
            let buckets = [bucket.weekday_hours, bucket.weekend_hours, bucket.holiday_hours, bucket.emergency_hours];
            prop_assert_eq!(buckets.iter().copied().sum::<Decimal>(), billable);
            if is_holiday {
                prop_assert_eq!(bucket.holiday_hours, billable);
            }
        }
    }
}
