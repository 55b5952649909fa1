//! Backing store and organization directory traits.
//!
//! The engine reaches persistent state only through [`BillingStore`] and
//! organizations only through [`OrgDirectory`]. Every write the engine makes
//! is a single trait call, and implementations must apply each call
//! atomically: the duplicate-reference check of [`BillingStore::insert_invoice`],
//! the compare-and-set of [`BillingStore::apply_transition`] and the record
//! resets of [`BillingStore::delete_invoice`] never interleave with another
//! write.
//!
//! [`MemoryStore`] implements both traits over one `RwLock`.

mod memory;

pub use memory::MemoryStore;

use chrono::{DateTime, NaiveDate, Utc};
use uuid::Uuid;

use crate::error::EngineResult;
use crate::lifecycle::Transition;
use crate::models::{
    Invoice, InvoiceStatus, Organization, Shift, ShiftPattern, WorkRecord, WorkRecordStatus,
};

/// Looks up agencies and facilities owned by the identity provider.
pub trait OrgDirectory: Send + Sync {
    /// Looks up an agency.
    fn agency(&self, agency_id: &str) -> EngineResult<Option<Organization>>;

    /// Looks up a verified (permanent) facility.
    fn facility(&self, facility_id: &str) -> EngineResult<Option<Organization>>;

    /// Looks up a temporary/unclaimed facility.
    fn temporary_facility(&self, facility_id: &str) -> EngineResult<Option<Organization>>;
}

/// Selects the work records an invoice preview prices.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BillableRecordQuery<'a> {
    /// Records supplied by this agency.
    pub agency_id: &'a str,
    /// Records whose shift's home or temporary home is this facility.
    pub facility_id: &'a str,
    /// Shift date lower bound (inclusive).
    pub start_date: NaiveDate,
    /// Shift date upper bound (inclusive).
    pub end_date: NaiveDate,
}

impl<'a> BillableRecordQuery<'a> {
    /// The query every work record on `invoice` must satisfy.
    pub fn for_invoice(invoice: &'a Invoice) -> Self {
        Self {
            agency_id: &invoice.agency_id,
            facility_id: &invoice.facility_id,
            start_date: invoice.start_date,
            end_date: invoice.end_date,
        }
    }

    /// Returns true if a record and its shift satisfy the query.
    ///
    /// The record must also be billable: approved and not on an invoice.
    pub fn matches(&self, record: &WorkRecord, shift: &Shift) -> bool {
        self.exclusion(record, shift).is_none()
    }

    /// Returns why a record and its shift fall outside the query, or `None`
    /// if they match.
    pub fn exclusion(&self, record: &WorkRecord, shift: &Shift) -> Option<&'static str> {
        if record.agency_id != self.agency_id {
            Some("belongs to another agency")
        } else if record.status != WorkRecordStatus::Approved {
            Some("is not approved")
        } else if !record.is_billable() {
            Some("is already on an invoice")
        } else if !shift.is_for_facility(self.facility_id) {
            Some("was not worked at this facility")
        } else if shift.date < self.start_date || shift.date > self.end_date {
            Some("is outside the billing period")
        } else {
            None
        }
    }
}

/// The result of [`BillingStore::apply_transition`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransitionOutcome {
    /// The invoice after the status write.
    pub invoice: Invoice,
    /// Referenced work records that no longer exist and were not updated.
    pub missing_records: Vec<String>,
}

/// Shift, work record and invoice persistence.
pub trait BillingStore: Send + Sync {
    /// Looks up a shift pattern.
    fn shift_pattern(&self, pattern_id: &str) -> EngineResult<Option<ShiftPattern>>;

    /// Looks up a shift.
    fn shift(&self, shift_id: &str) -> EngineResult<Option<Shift>>;

    /// Looks up a work record.
    fn work_record(&self, work_record_id: &str) -> EngineResult<Option<WorkRecord>>;

    /// Returns the billable records matching a query, ordered by shift date
    /// then record id.
    fn billable_records(&self, query: &BillableRecordQuery<'_>) -> EngineResult<Vec<WorkRecord>>;

    /// Looks up an invoice.
    fn invoice(&self, invoice_id: Uuid) -> EngineResult<Option<Invoice>>;

    /// Persists a new invoice and stamps its work records `pending_invoice`.
    ///
    /// # Errors
    ///
    /// - [`EngineError::WorkRecordNotFound`](crate::error::EngineError::WorkRecordNotFound)
    ///   if a referenced record does not exist
    /// - [`EngineError::DuplicateInvoiceReference`](crate::error::EngineError::DuplicateInvoiceReference)
    ///   if a referenced record is on another stored invoice
    /// - [`EngineError::Validation`](crate::error::EngineError::Validation)
    ///   if a referenced record does not satisfy
    ///   [`BillableRecordQuery::for_invoice`]
    /// - [`EngineError::DuplicateInvoiceNumber`](crate::error::EngineError::DuplicateInvoiceNumber)
    ///   if the invoice number is taken
    fn insert_invoice(&self, invoice: Invoice) -> EngineResult<Invoice>;

    /// Writes `transition.to` if the invoice is still in `transition.from`,
    /// together with the transition's record effect.
    ///
    /// # Errors
    ///
    /// - [`EngineError::InvoiceNotFound`](crate::error::EngineError::InvoiceNotFound)
    /// - [`EngineError::InvalidTransition`](crate::error::EngineError::InvalidTransition)
    ///   if the invoice's status changed since the caller read it
    fn apply_transition(
        &self,
        invoice_id: Uuid,
        transition: &Transition,
        at: DateTime<Utc>,
    ) -> EngineResult<TransitionOutcome>;

    /// Removes an invoice whose status is one of `deletable` and resets its
    /// work records to `none`, clearing their invoice stamp.
    ///
    /// # Errors
    ///
    /// - [`EngineError::InvoiceNotFound`](crate::error::EngineError::InvoiceNotFound)
    /// - [`EngineError::InvoiceNotDeletable`](crate::error::EngineError::InvoiceNotDeletable)
    fn delete_invoice(&self, invoice_id: Uuid, deletable: &[InvoiceStatus]) -> EngineResult<Invoice>;
}
