//! Invoice status lifecycle.
//!
//! The state machine is the data table [`TRANSITIONS`]: one row per allowed
//! (from, to) pair, each carrying the [`TransitionEffect`] that must be
//! applied alongside the status write. Any pair missing from the table is an
//! [`EngineError::InvalidTransition`].
//!
//! `cancelled` and `invalidated` have no outbound rows and are terminal.

use serde::{Deserialize, Serialize};

use crate::error::{EngineError, EngineResult};
use crate::models::{InvoiceStatus, RecordInvoiceStatus};

use InvoiceStatus::{
    Accepted, Cancelled, Draft, Invalidated, Paid, PartiallyPaid, Pending, Rejected, Sent,
};

/// What happens to the work records referenced by the invoice.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecordEffect {
    /// Records keep their current billing status.
    Keep,
    /// Records move to the given billing status.
    Set(RecordInvoiceStatus),
}

/// Who is told about the transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NotifyParty {
    /// The billing agency.
    Agency,
    /// The billed facility.
    Facility,
}

/// The event a notification reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationKind {
    /// The facility accepted the invoice.
    InvoiceAccepted,
    /// The facility rejected the invoice.
    InvoiceRejected,
    /// The invoice was paid.
    InvoicePaid,
}

/// Side effects applied together with a status change.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TransitionEffect {
    /// Work record billing status change.
    pub records: RecordEffect,
    /// Notification to dispatch after the write, if any.
    pub notify: Option<(NotifyParty, NotificationKind)>,
}

/// One allowed transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Transition {
    /// Current status.
    pub from: InvoiceStatus,
    /// Requested status.
    pub to: InvoiceStatus,
    /// What the transition does besides writing the status.
    pub effect: TransitionEffect,
}

const NO_EFFECT: TransitionEffect = TransitionEffect {
    records: RecordEffect::Keep,
    notify: None,
};

const ACCEPT: TransitionEffect = TransitionEffect {
    records: RecordEffect::Set(RecordInvoiceStatus::Invoiced),
    notify: Some((NotifyParty::Agency, NotificationKind::InvoiceAccepted)),
};

const REJECT: TransitionEffect = TransitionEffect {
    records: RecordEffect::Set(RecordInvoiceStatus::None),
    notify: Some((NotifyParty::Agency, NotificationKind::InvoiceRejected)),
};

const PAY: TransitionEffect = TransitionEffect {
    records: RecordEffect::Keep,
    notify: Some((NotifyParty::Facility, NotificationKind::InvoicePaid)),
};

const fn row(from: InvoiceStatus, to: InvoiceStatus, effect: TransitionEffect) -> Transition {
    Transition { from, to, effect }
}

/// Every allowed status transition.
pub const TRANSITIONS: [Transition; 17] = [
    row(Draft, Sent, NO_EFFECT),
    row(Draft, Invalidated, NO_EFFECT),
    row(Sent, Pending, NO_EFFECT),
    row(Sent, Invalidated, NO_EFFECT),
    row(Pending, Accepted, ACCEPT),
    row(Pending, Rejected, REJECT),
    row(Pending, Cancelled, NO_EFFECT),
    row(Accepted, Paid, PAY),
    row(Accepted, Invalidated, NO_EFFECT),
    row(Accepted, Cancelled, NO_EFFECT),
    row(Rejected, Pending, NO_EFFECT),
    row(Rejected, Cancelled, NO_EFFECT),
    row(Paid, Invalidated, NO_EFFECT),
    row(Paid, Cancelled, NO_EFFECT),
    row(PartiallyPaid, Paid, PAY),
    row(PartiallyPaid, Invalidated, NO_EFFECT),
    row(PartiallyPaid, Cancelled, NO_EFFECT),
];

/// Looks up the transition from `current` to `requested`.
///
/// # Errors
///
/// Returns [`EngineError::InvalidTransition`] when the pair is not in
/// [`TRANSITIONS`].
///
/// # Example
///
/// ```
/// use invoice_engine::lifecycle::{transition, RecordEffect};
/// use invoice_engine::models::{InvoiceStatus, RecordInvoiceStatus};
///
/// let accept = transition(InvoiceStatus::Pending, InvoiceStatus::Accepted).unwrap();
/// assert_eq!(accept.effect.records, RecordEffect::Set(RecordInvoiceStatus::Invoiced));
///
/// assert!(transition(InvoiceStatus::Pending, InvoiceStatus::Paid).is_err());
/// ```
pub fn transition(current: InvoiceStatus, requested: InvoiceStatus) -> EngineResult<Transition> {
    TRANSITIONS
        .iter()
        .find(|t| t.from == current && t.to == requested)
        .copied()
        .ok_or(EngineError::InvalidTransition { current, requested })
}

/// Returns the statuses reachable from `status` in one step.
pub fn allowed_targets(status: InvoiceStatus) -> Vec<InvoiceStatus> {
    TRANSITIONS
        .iter()
        .filter(|t| t.from == status)
        .map(|t| t.to)
        .collect()
}

/// Returns true if no transition leaves `status`.
pub fn is_terminal(status: InvoiceStatus) -> bool {
    !TRANSITIONS.iter().any(|t| t.from == status)
}
