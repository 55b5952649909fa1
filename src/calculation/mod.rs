//! Calculation logic for the invoice engine.
//!
//! This module contains the pure, per-record building blocks of an invoice:
//! hourly rate resolution over an ordered fallback chain, billable hours
//! from shift timing, weekend and holiday day classification, and the
//! per-shift-type summary aggregation.

mod day_classifier;
mod hours;
mod rate_resolver;
mod summary;

pub use day_classifier::{DayClassification, HolidaySet, classify_day};
pub use hours::{HoursBreakdown, calculate_hours};
pub use rate_resolver::{
    RateQuery, ResolvedRate, facility_candidates, normalize_role, resolve_rate, select_rate_field,
};
pub use summary::{SummaryAggregator, classify_bucket};
