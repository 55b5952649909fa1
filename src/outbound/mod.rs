//! Outbound side effects: notifications and PDF job requests.
//!
//! Both are modelled as messages pushed onto a channel so that their delivery
//! can never be confused with the success of the state change that caused
//! them. The engine talks to the [`Notifier`] and [`PdfJobQueue`] traits; the
//! channel-backed implementations hand out the receiving ends to whatever
//! worker delivers the messages.

mod notification;
mod pdf;

pub use notification::{Notification, Notifier, OutboxNotifier, Recipient};
pub use pdf::{ChannelPdfQueue, PdfJobQueue, PdfJobRequest};

use thiserror::Error;

/// An outbound message could not be handed off.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum OutboundError {
    /// The receiving side of the channel is gone.
    #[error("{channel} channel is closed")]
    ChannelClosed {
        /// Which channel was closed.
        channel: &'static str,
    },
    /// The collaborator refused the message.
    #[error("{channel} rejected the message: {message}")]
    Rejected {
        /// Which channel refused.
        channel: &'static str,
        /// Why it refused.
        message: String,
    },
}
