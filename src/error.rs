//! Error types for the invoice engine.
//!
//! This module provides strongly-typed errors using the `thiserror` crate
//! for every failure the engine can report. Each error belongs to one
//! [`ErrorKind`]; see [`EngineError::kind`].

use thiserror::Error;
use uuid::Uuid;

use crate::models::InvoiceStatus;

/// The broad category an [`EngineError`] belongs to.
///
/// Callers use the kind to decide how to report an error (e.g. which HTTP
/// status to answer with) without matching every variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Bad input rejected before any state change.
    Validation,
    /// A referenced entity does not exist.
    NotFound,
    /// The request conflicts with current state; the caller must change it.
    Conflict,
    /// A state change happened but a follow-up write did not.
    PartialFailure,
    /// The configuration could not be loaded.
    Configuration,
    /// The backing store or an outbound queue is unavailable.
    Infrastructure,
}

/// The main error type for the invoice engine.
///
/// # Example
///
/// ```
/// use invoice_engine::error::EngineError;
///
/// let error = EngineError::FacilityNotFound {
///     facility_id: "fac_404".to_string(),
/// };
/// assert_eq!(error.to_string(), "Facility not found: fac_404");
/// ```
#[derive(Debug, Error)]
pub enum EngineError {
    /// Configuration file was not found at the specified path.
    #[error("Configuration file not found: {path}")]
    ConfigNotFound {
        /// The path that was not found.
        path: String,
    },

    /// Configuration file could not be parsed.
    #[error("Failed to parse configuration file '{path}': {message}")]
    ConfigParseError {
        /// The path to the file that failed to parse.
        path: String,
        /// A description of the parse error.
        message: String,
    },

    /// A request field failed validation.
    #[error("Invalid field '{field}': {message}")]
    Validation {
        /// The offending field.
        field: String,
        /// What was wrong with it.
        message: String,
    },

    /// The agency is unknown to the organization directory.
    #[error("Agency not found: {agency_id}")]
    AgencyNotFound {
        /// The agency id that was looked up.
        agency_id: String,
    },

    /// Neither the permanent nor the temporary facility collection knows the id.
    #[error("Facility not found: {facility_id}")]
    FacilityNotFound {
        /// The facility id that was looked up.
        facility_id: String,
    },

    /// No invoice exists with the given id.
    #[error("Invoice not found: {invoice_id}")]
    InvoiceNotFound {
        /// The invoice id that was looked up.
        invoice_id: Uuid,
    },

    /// A work record referenced by a request does not exist.
    #[error("Work record not found: {work_record_id}")]
    WorkRecordNotFound {
        /// The work record id that was looked up.
        work_record_id: String,
    },

    /// One or more work records already belong to a non-deleted invoice.
    #[error(
        "Work records already invoiced: {} (on {})",
        work_record_ids.join(", "),
        invoice_numbers.join(", ")
    )]
    DuplicateInvoiceReference {
        /// The conflicting work record ids.
        work_record_ids: Vec<String>,
        /// Numbers of the invoices already holding them.
        invoice_numbers: Vec<String>,
    },

    /// A generated invoice number is already taken.
    #[error("Invoice number already in use: {invoice_number}")]
    DuplicateInvoiceNumber {
        /// The number that collided.
        invoice_number: String,
    },

    /// The requested status change is not in the transition table.
    #[error("Invalid status transition from '{current}' to '{requested}'")]
    InvalidTransition {
        /// The invoice's current status.
        current: InvoiceStatus,
        /// The status that was requested.
        requested: InvoiceStatus,
    },

    /// The invoice is in a status that neither permits deletion nor cancellation.
    #[error("Invoice in status '{status}' cannot be deleted")]
    InvoiceNotDeletable {
        /// The invoice's current status.
        status: InvoiceStatus,
    },

    /// The invoice status was written but some work records could not be updated.
    #[error(
        "Invoice {invoice_id} moved to '{status}' but work records were not updated: {}",
        missing_records.join(", ")
    )]
    PartialFailure {
        /// The invoice whose status changed.
        invoice_id: Uuid,
        /// The status that was written.
        status: InvoiceStatus,
        /// Work records that could not be synchronized.
        missing_records: Vec<String>,
    },

    /// The backing store could not be used.
    #[error("Backing store unavailable: {message}")]
    StoreUnavailable {
        /// A description of the store failure.
        message: String,
    },

    /// An outbound queue rejected a message.
    #[error("Queue unavailable: {message}")]
    QueueUnavailable {
        /// A description of the queue failure.
        message: String,
    },
}

impl EngineError {
    /// Shorthand for a [`EngineError::Validation`] error.
    pub fn validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        EngineError::Validation {
            field: field.into(),
            message: message.into(),
        }
    }

    /// Returns the category of this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            EngineError::Validation { .. } => ErrorKind::Validation,
            EngineError::AgencyNotFound { .. }
            | EngineError::FacilityNotFound { .. }
            | EngineError::InvoiceNotFound { .. }
            | EngineError::WorkRecordNotFound { .. } => ErrorKind::NotFound,
            EngineError::DuplicateInvoiceReference { .. }
            | EngineError::DuplicateInvoiceNumber { .. }
            | EngineError::InvalidTransition { .. }
            | EngineError::InvoiceNotDeletable { .. } => ErrorKind::Conflict,
            EngineError::PartialFailure { .. } => ErrorKind::PartialFailure,
            EngineError::ConfigNotFound { .. } | EngineError::ConfigParseError { .. } => {
                ErrorKind::Configuration
            }
            EngineError::StoreUnavailable { .. }
            | EngineError::QueueUnavailable { .. } => ErrorKind::Infrastructure,
        }
    }
}

/// A type alias for Results that return EngineError.
pub type EngineResult<T> = Result<T, EngineError>;
