//! PDF generation job requests.
//!
//! The engine never renders PDFs; it only enqueues a request and returns.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use uuid::Uuid;

use super::OutboundError;

/// A request to render an invoice as PDF.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PdfJobRequest {
    /// Job identifier.
    pub job_id: Uuid,
    /// The invoice to render.
    pub invoice_id: Uuid,
    /// Whether to include the per-record breakdown.
    pub include_detailed: bool,
    /// The user who asked for it.
    pub requested_by: String,
    /// When it was requested.
    pub requested_at: DateTime<Utc>,
}

/// Accepts PDF job requests without waiting for completion.
pub trait PdfJobQueue: Send + Sync {
    /// Enqueues a job.
    fn enqueue(&self, request: PdfJobRequest) -> Result<(), OutboundError>;
}

/// A [`PdfJobQueue`] backed by an unbounded channel.
#[derive(Debug, Clone)]
pub struct ChannelPdfQueue {
    sender: mpsc::UnboundedSender<PdfJobRequest>,
}

impl ChannelPdfQueue {
    /// Creates a queue and the receiving end its worker reads from.
    pub fn channel() -> (Self, mpsc::UnboundedReceiver<PdfJobRequest>) {
        let (sender, receiver) = mpsc::unbounded_channel();
        (Self { sender }, receiver)
    }
}

impl PdfJobQueue for ChannelPdfQueue {
    fn enqueue(&self, request: PdfJobRequest) -> Result<(), OutboundError> {
        self.sender
            .send(request)
            .map_err(|_| OutboundError::ChannelClosed { channel: "pdf" })
    }
}
