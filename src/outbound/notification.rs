//! Invoice notifications and the outbox notifier.

use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use uuid::Uuid;

use crate::lifecycle::{NotificationKind, NotifyParty};
use crate::models::InvoiceStatus;

use super::OutboundError;

/// Who a notification goes to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Recipient {
    /// Agency or facility.
    pub party: NotifyParty,
    /// The organization id.
    pub id: String,
    /// Display name.
    pub name: String,
    /// Email address, when the directory has one.
    pub email: Option<String>,
}

/// A notification about an invoice status change.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notification {
    /// What happened.
    pub kind: NotificationKind,
    /// The invoice concerned.
    pub invoice_id: Uuid,
    /// The invoice's number.
    pub invoice_number: String,
    /// The status the invoice moved to.
    pub status: InvoiceStatus,
    /// Who is told.
    pub recipient: Recipient,
}

/// Delivers notifications. Implementations must not block.
pub trait Notifier: Send + Sync {
    /// Hands a notification off for delivery.
    fn notify(&self, notification: Notification) -> Result<(), OutboundError>;
}

/// A [`Notifier`] that pushes onto an unbounded in-process outbox channel.
///
/// # Example
///
/// ```
/// use invoice_engine::outbound::OutboxNotifier;
///
/// let (notifier, mut outbox) = OutboxNotifier::channel();
/// drop(notifier);
/// assert!(outbox.try_recv().is_err());
/// ```
#[derive(Debug, Clone)]
pub struct OutboxNotifier {
    sender: mpsc::UnboundedSender<Notification>,
}

impl OutboxNotifier {
    /// Creates a notifier and the receiving end of its outbox.
    pub fn channel() -> (Self, mpsc::UnboundedReceiver<Notification>) {
        let (sender, receiver) = mpsc::unbounded_channel();
        (Self { sender }, receiver)
    }
}

impl Notifier for OutboxNotifier {
    fn notify(&self, notification: Notification) -> Result<(), OutboundError> {
        self.sender
            .send(notification)
            .map_err(|_| OutboundError::ChannelClosed {
                channel: "notification",
            })
    }
}
