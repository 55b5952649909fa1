//! Core data models for the invoice engine.
//!
//! This module contains all the domain models used throughout the engine.

mod calculation_result;
mod invoice;
mod organization;
mod shift_pattern;
mod work_record;

pub use calculation_result::{CalculationResult, RecordBreakdown, SkipReason, SkippedRecord};
pub use invoice::{
    HourBucket, Invoice, InvoiceStatus, ShiftSummary, ShiftSummaryBucket, summary_total,
};
pub use organization::{FacilityKind, FacilitySnapshot, Organization};
pub use shift_pattern::{FacilityTiming, RateEntry, RateField, RateSource, ShiftPattern, Timing};
pub use work_record::{RecordInvoiceStatus, Shift, WorkRecord, WorkRecordStatus};
