//! Work record (timesheet) and shift models.
//!
//! A [`WorkRecord`] is an approved record of hours worked against a scheduled
//! [`Shift`]. It carries two independent status fields: its own approval
//! [`WorkRecordStatus`] and its [`RecordInvoiceStatus`] which tracks where it
//! is in the billing lifecycle.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Approval status of a work record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WorkRecordStatus {
    /// Submitted by the worker, awaiting approval.
    Submitted,
    /// Approved by the facility; eligible for invoicing.
    Approved,
    /// Rejected by the facility.
    Rejected,
}

/// Billing status of a work record, independent of its approval status.
///
/// # Example
///
/// ```
/// use invoice_engine::models::RecordInvoiceStatus;
///
/// assert!(RecordInvoiceStatus::None.is_invoiceable());
/// assert!(!RecordInvoiceStatus::PendingInvoice.is_invoiceable());
/// ```
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecordInvoiceStatus {
    /// Not on any invoice.
    #[default]
    None,
    /// On an invoice that has not been accepted yet.
    PendingInvoice,
    /// On an accepted invoice.
    Invoiced,
    /// On a paid invoice.
    Paid,
}

impl RecordInvoiceStatus {
    /// Returns true if a record in this status may be picked up by a preview.
    pub fn is_invoiceable(&self) -> bool {
        matches!(self, RecordInvoiceStatus::None)
    }

    /// Returns the status name as used in storage and JSON.
    pub fn as_str(&self) -> &'static str {
        match self {
            RecordInvoiceStatus::None => "none",
            RecordInvoiceStatus::PendingInvoice => "pending_invoice",
            RecordInvoiceStatus::Invoiced => "invoiced",
            RecordInvoiceStatus::Paid => "paid",
        }
    }
}

/// A scheduled work slot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Shift {
    /// Unique identifier for the shift.
    pub id: String,
    /// The calendar date the shift starts on.
    pub date: NaiveDate,
    /// Whether the shift was booked as an emergency.
    #[serde(default)]
    pub is_emergency: bool,
    /// The shift pattern defining timing and rates.
    pub shift_pattern_id: String,
    /// The permanent facility (home) the shift is for, if any.
    #[serde(default)]
    pub home_id: Option<String>,
    /// The temporary/unclaimed facility the shift is for, if any.
    #[serde(default)]
    pub temporary_home_id: Option<String>,
}

impl Shift {
    /// Returns true if the shift is booked against the given facility, either
    /// as its home or as its temporary home.
    pub fn is_for_facility(&self, facility_id: &str) -> bool {
        self.home_id.as_deref() == Some(facility_id)
            || self.temporary_home_id.as_deref() == Some(facility_id)
    }
}

/// A timesheet: hours worked by one worker on one shift, supplied by an agency.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkRecord {
    /// Unique identifier for the work record.
    pub id: String,
    /// The shift this record was worked against.
    pub shift_id: String,
    /// The worker who did the work.
    pub worker_id: String,
    /// The worker's role (user type) at the time of the shift, e.g. "nurse".
    pub worker_role: String,
    /// The agency that supplied the worker.
    pub agency_id: String,
    /// Approval status.
    pub status: WorkRecordStatus,
    /// Billing status.
    #[serde(default)]
    pub invoice_status: RecordInvoiceStatus,
    /// The invoice this record is stamped with, if any.
    #[serde(default)]
    pub invoice_id: Option<Uuid>,
    /// The number of the invoice this record is stamped with, if any.
    #[serde(default)]
    pub invoice_number: Option<String>,
}

impl WorkRecord {
    /// Returns true if the record is approved and not already on an invoice.
    ///
    /// A record reverted to `none` by a rejection still carries the rejected
    /// invoice's stamp and is not billable until that invoice is deleted.
    pub fn is_billable(&self) -> bool {
        self.status == WorkRecordStatus::Approved
            && self.invoice_status.is_invoiceable()
            && self.invoice_id.is_none()
    }

    /// Stamps the record with an invoice and moves it to `pending_invoice`.
    pub fn attach_to_invoice(&mut self, invoice_id: Uuid, invoice_number: &str) {
        self.invoice_status = RecordInvoiceStatus::PendingInvoice;
        self.invoice_id = Some(invoice_id);
        self.invoice_number = Some(invoice_number.to_string());
    }

    /// Removes the invoice stamp and resets the billing status.
    pub fn detach_from_invoice(&mut self) {
        self.invoice_status = RecordInvoiceStatus::None;
        self.invoice_id = None;
        self.invoice_number = None;
    }
}
