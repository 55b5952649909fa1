//! Request types for the invoice engine API.
//!
//! Preview and creation bodies are the engine's own
//! [`PreviewRequest`](crate::invoicing::PreviewRequest) and
//! [`CreateInvoiceRequest`](crate::invoicing::CreateInvoiceRequest); the
//! bodies here exist only for the HTTP surface.

use serde::{Deserialize, Serialize};

use crate::models::InvoiceStatus;

/// Request body for `POST /invoices/:id/status`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatusChangeRequest {
    /// The status to move the invoice to.
    pub status: InvoiceStatus,
}

/// Request body for `POST /invoices/:id/pdf`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PdfRequest {
    /// Whether to include the per-record breakdown.
    #[serde(default)]
    pub include_detailed: bool,
    /// The user asking for the PDF.
    pub requested_by: String,
}
