//! Inputs and outputs of the invoice operations.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::models::{Invoice, ShiftSummary};

/// Parameters of an invoice preview.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PreviewRequest {
    /// The billing agency.
    pub agency_id: String,
    /// The billed facility (permanent or temporary).
    pub facility_id: String,
    /// First shift date to include.
    pub start_date: NaiveDate,
    /// Last shift date to include.
    pub end_date: NaiveDate,
    /// Holiday dates or timestamps; only their calendar day is used.
    #[serde(default)]
    pub holidays: Vec<String>,
}

/// Parameters of invoice creation, normally copied from a preview.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreateInvoiceRequest {
    /// The billing agency.
    pub agency_id: String,
    /// The billed facility (permanent or temporary).
    pub facility_id: String,
    /// First day of the billing period.
    pub start_date: NaiveDate,
    /// Last day of the billing period.
    pub end_date: NaiveDate,
    /// Work records to put on the invoice.
    pub work_record_ids: Vec<String>,
    /// Invoice total; must equal the sum of the summary buckets.
    pub total_amount: Decimal,
    /// Shift summary to freeze onto the invoice.
    pub summary: ShiftSummary,
}

/// What [`delete_invoice`](super::InvoiceEngine::delete_invoice) did.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum DeleteOutcome {
    /// The invoice was removed and its records released.
    Deleted,
    /// The invoice could not be removed and was cancelled instead.
    Cancelled {
        /// The cancelled invoice.
        invoice: Invoice,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_preview_request_holidays_default_to_empty() {
        let request: PreviewRequest = serde_json::from_str(
            r#"{"agency_id":"agency_001","facility_id":"fac_001","start_date":"2026-01-01","end_date":"2026-01-31"}"#,
        )
        .unwrap();
        assert!(request.holidays.is_empty());
    }

    #[test]
    fn test_deleted_outcome_json() {
        let json = serde_json::to_string(&DeleteOutcome::Deleted).unwrap();
        assert_eq!(json, r#"{"outcome":"deleted"}"#);
    }
}
