//! Calculation result models for the invoice engine.
//!
//! This module contains the [`CalculationResult`] returned by an invoice
//! preview: the per-record breakdown, the records that were skipped and why,
//! the aggregated [`ShiftSummary`] and the total.

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::{FacilitySnapshot, HourBucket, RateField, RateSource, ShiftSummary};

/// How one work record was priced.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecordBreakdown {
    /// The work record.
    pub work_record_id: String,
    /// The shift the record was worked against.
    pub shift_id: String,
    /// Shift date.
    pub date: NaiveDate,
    /// Shift-type name (shift pattern display name).
    pub shift_type: String,
    /// Normalized role used for the rate lookup.
    pub role: String,
    /// Whether the date is a Saturday or Sunday.
    pub is_weekend: bool,
    /// Whether the date is a caller-supplied holiday.
    pub is_holiday: bool,
    /// Whether the shift was an emergency booking.
    pub is_emergency: bool,
    /// The single bucket the hours count towards.
    pub bucket: HourBucket,
    /// Which link of the fallback chain supplied the rate entry.
    pub rate_source: RateSource,
    /// Which field of the entry was used.
    pub rate_field: RateField,
    /// The hourly rate applied.
    pub hourly_rate: Decimal,
    /// Shift duration before break deduction, when it was computed.
    pub duration_hours: Option<Decimal>,
    /// Break hours deducted.
    pub break_hours: Decimal,
    /// Hours billed.
    pub billable_hours: Decimal,
    /// `hourly_rate × billable_hours`.
    pub amount: Decimal,
}

/// Why a work record was left out of a calculation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SkipReason {
    /// The referenced shift does not exist.
    ShiftNotFound,
    /// The shift's pattern does not exist.
    ShiftPatternNotFound,
    /// The pattern has no timing for any candidate facility.
    TimingNotFound,
    /// No rate entry matched the role at any link of the fallback chain.
    RateUnresolved,
    /// The record's amount, or a total it adds to, exceeds the decimal range.
    AmountOverflow,
}

/// A work record that contributed nothing to the total.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SkippedRecord {
    /// The work record.
    pub work_record_id: String,
    /// Why it was skipped.
    pub reason: SkipReason,
}

/// The complete result of an invoice preview.
///
/// Nothing in it is persisted; the caller normally feeds `summary`,
/// `total_amount` and `work_record_ids` into invoice creation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CalculationResult {
    /// Unique identifier for this calculation.
    pub calculation_id: Uuid,
    /// When the calculation was performed.
    pub timestamp: DateTime<Utc>,
    /// The version of the engine that performed the calculation.
    pub engine_version: String,
    /// The billing agency.
    pub agency_id: String,
    /// The billed facility as resolved at calculation time.
    pub facility: FacilitySnapshot,
    /// First day of the billing period (inclusive).
    pub start_date: NaiveDate,
    /// Last day of the billing period (inclusive).
    pub end_date: NaiveDate,
    /// Per-record pricing, in processing order.
    pub records: Vec<RecordBreakdown>,
    /// Records excluded from the summary and total.
    pub skipped: Vec<SkippedRecord>,
    /// Per-shift-type aggregate.
    pub summary: ShiftSummary,
    /// Sum of all record amounts.
    pub total_amount: Decimal,
    /// Ids of the records included in the total.
    pub work_record_ids: Vec<String>,
    /// The calculation duration in microseconds.
    pub duration_us: u64,
}
