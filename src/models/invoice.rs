//! Invoice, invoice status and shift summary models.
//!
//! An [`Invoice`] freezes a [`ShiftSummary`] at creation time. The summary is
//! an owned value; later reads replay it exactly and never consult the live
//! rate tables again.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::FacilitySnapshot;

/// Invoice lifecycle status.
///
/// See [`crate::lifecycle`] for the allowed transitions between statuses.
///
/// # Example
///
/// ```
/// use invoice_engine::models::InvoiceStatus;
///
/// let status: InvoiceStatus = "partially_paid".parse().unwrap();
/// assert_eq!(status, InvoiceStatus::PartiallyPaid);
/// assert_eq!(status.to_string(), "partially_paid");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InvoiceStatus {
    /// Prepared but not sent.
    Draft,
    /// Awaiting the facility's decision.
    Pending,
    /// Sent to the facility.
    Sent,
    /// Accepted by the facility.
    Accepted,
    /// Rejected by the facility.
    Rejected,
    /// Fully paid.
    Paid,
    /// Partly paid.
    PartiallyPaid,
    /// Withdrawn. Terminal.
    Cancelled,
    /// Voided after the fact. Terminal.
    Invalidated,
}

impl InvoiceStatus {
    /// Every status, in declaration order.
    pub const ALL: [InvoiceStatus; 9] = [
        InvoiceStatus::Draft,
        InvoiceStatus::Pending,
        InvoiceStatus::Sent,
        InvoiceStatus::Accepted,
        InvoiceStatus::Rejected,
        InvoiceStatus::Paid,
        InvoiceStatus::PartiallyPaid,
        InvoiceStatus::Cancelled,
        InvoiceStatus::Invalidated,
    ];

    /// Returns the status name as used in storage and JSON.
    pub fn as_str(&self) -> &'static str {
        match self {
            InvoiceStatus::Draft => "draft",
            InvoiceStatus::Pending => "pending",
            InvoiceStatus::Sent => "sent",
            InvoiceStatus::Accepted => "accepted",
            InvoiceStatus::Rejected => "rejected",
            InvoiceStatus::Paid => "paid",
            InvoiceStatus::PartiallyPaid => "partially_paid",
            InvoiceStatus::Cancelled => "cancelled",
            InvoiceStatus::Invalidated => "invalidated",
        }
    }
}

impl fmt::Display for InvoiceStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for InvoiceStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        InvoiceStatus::ALL
            .into_iter()
            .find(|status| status.as_str() == s)
            .ok_or_else(|| format!("unknown invoice status '{}'", s))
    }
}

/// The single hour bucket a record's hours are classified into.
///
/// Priority is holiday, then emergency, then weekend, then weekday.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HourBucket {
    /// Monday to Friday, not emergency, not holiday.
    Weekday,
    /// Saturday or Sunday, not emergency, not holiday.
    Weekend,
    /// Caller-supplied holiday.
    Holiday,
    /// Emergency shift that is not on a holiday.
    Emergency,
}

/// Aggregated hours and amounts for one shift type within an invoice.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShiftSummaryBucket {
    /// Number of records aggregated.
    pub count: u32,
    /// Sum of shift durations before break deduction.
    pub total_hours: Decimal,
    /// Sum of billable hours.
    pub billable_hours: Decimal,
    /// Sum of break hours.
    pub break_hours: Decimal,
    /// Billable hours classified as weekday.
    pub weekday_hours: Decimal,
    /// Billable hours classified as weekend.
    pub weekend_hours: Decimal,
    /// Billable hours classified as holiday.
    pub holiday_hours: Decimal,
    /// Billable hours classified as emergency.
    pub emergency_hours: Decimal,
    /// Weekday rate of the first record in the bucket.
    pub weekday_rate: Decimal,
    /// Weekend rate of the first record in the bucket.
    pub weekend_rate: Decimal,
    /// Holiday rate of the first record in the bucket, if defined.
    pub holiday_rate: Option<Decimal>,
    /// Emergency rate of the first record in the bucket, if defined.
    pub emergency_rate: Option<Decimal>,
    /// Sum of record amounts.
    pub total_amount: Decimal,
}

/// Shift summary keyed by shift-type name.
pub type ShiftSummary = BTreeMap<String, ShiftSummaryBucket>;

/// Returns the sum of bucket totals of a summary, or `None` if the sum
/// overflows `Decimal`.
pub fn summary_total(summary: &ShiftSummary) -> Option<Decimal> {
    summary
        .values()
        .try_fold(Decimal::ZERO, |total, bucket| total.checked_add(bucket.total_amount))
}

/// An invoice from an agency to a facility for a set of work records.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Invoice {
    /// Unique identifier.
    pub id: Uuid,
    /// Human-facing number, `INV-YYMM-####`.
    pub invoice_number: String,
    /// The billing agency.
    pub agency_id: String,
    /// The billed facility.
    pub facility_id: String,
    /// Facility details frozen at creation time.
    pub facility: FacilitySnapshot,
    /// First day of the billing period (inclusive).
    pub start_date: NaiveDate,
    /// Last day of the billing period (inclusive).
    pub end_date: NaiveDate,
    /// Invoice total; equals the sum of the summary buckets.
    pub total_amount: Decimal,
    /// Work records on this invoice. Never changes after creation.
    pub work_record_ids: Vec<String>,
    /// Frozen per-shift-type summary.
    pub shift_summary: ShiftSummary,
    /// Lifecycle status.
    pub status: InvoiceStatus,
    /// When the invoice was created.
    pub created_at: DateTime<Utc>,
    /// When the status last changed.
    pub updated_at: DateTime<Utc>,
}

impl Invoice {
    /// Returns true if the invoice references the given work record.
    pub fn references(&self, work_record_id: &str) -> bool {
        self.work_record_ids.iter().any(|id| id == work_record_id)
    }
}
