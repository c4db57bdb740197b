use crate::domain::payment::{EventSignature, PaymentId, PaymentStatus};
use chrono::{DateTime, Utc};
use serde::Serialize;

/// An out-of-band, at-least-once, possibly reordered message asserting a
/// payment's status as of `event_timestamp` (event-generation time, not
/// receipt time).
#[derive(Debug, Clone, PartialEq)]
pub struct NotificationEvent {
    pub payment_id: PaymentId,
    pub status: PaymentStatus,
    pub event_timestamp: DateTime<Utc>,
    /// Provider signature. Carried through untouched; verification is a
    /// separate collaborator not wired in yet.
    pub auth_token: Option<String>,
    pub reason: Option<String>,
}

impl NotificationEvent {
    pub fn signature(&self) -> EventSignature {
        EventSignature {
            status: self.status,
            event_timestamp: self.event_timestamp,
        }
    }
}

/// Outcome of applying one notification. `out_of_order` and `duplicate` are
/// informational, not errors: the delivery is acknowledged but did not
/// mutate state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ReconcileResult {
    pub applied: bool,
    pub out_of_order: bool,
    pub duplicate: bool,
}

impl ReconcileResult {
    pub fn applied() -> Self {
        Self {
            applied: true,
            out_of_order: false,
            duplicate: false,
        }
    }

    pub fn out_of_order() -> Self {
        Self {
            applied: false,
            out_of_order: true,
            duplicate: false,
        }
    }

    pub fn duplicate() -> Self {
        Self {
            applied: false,
            out_of_order: false,
            duplicate: true,
        }
    }
}
