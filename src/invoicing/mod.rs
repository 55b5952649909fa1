//! Invoice orchestration.
//!
//! [`InvoiceEngine`] ties the calculation pipeline, the lifecycle table, the
//! backing store and the outbound channels together into the six invoice
//! operations.

mod engine;
mod number;
mod request;

pub use engine::InvoiceEngine;
pub use number::{format_invoice_number, InvoiceNumberGenerator};
pub use request::{CreateInvoiceRequest, DeleteOutcome, PreviewRequest};
