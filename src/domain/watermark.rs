//! Notification ordering policy.
//!
//! The watermark is the `event_timestamp` of the most recently applied
//! notification. A notification mutates the payment iff its timestamp is
//! strictly greater than the watermark and it is not an exact retransmission
//! of an already-applied delivery. This makes the effective state a function
//! of the *set* of delivered notifications, independent of delivery order.
//!
//! All logic here is pure; the reconciler owns the read-compare-write cycle.

use crate::domain::notification::NotificationEvent;
use crate::domain::payment::Payment;
use serde::{Deserialize, Serialize};

/// What a later-timestamped notification may do to a payment that already
/// reached a terminal status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OverridePolicy {
    /// The provider's latest word wins: a later `declined`/`expired` event
    /// overrides an earlier `approved`. Default.
    #[default]
    ProviderLatestWins,
    /// A terminal status is frozen; later events are reported out-of-order.
    PreserveTerminal,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WatermarkDecision {
    Apply,
    OutOfOrder,
    Duplicate,
}

/// Decides what one notification does to one payment.
///
/// Duplicate detection runs first: an exact retransmission is reported as
/// such without re-evaluating ordering.
pub fn evaluate(
    payment: &Payment,
    event: &NotificationEvent,
    policy: OverridePolicy,
) -> WatermarkDecision {
    if payment.seen_signatures.contains(&event.signature()) {
        return WatermarkDecision::Duplicate;
    }
    if event.event_timestamp <= payment.last_event_at {
        return WatermarkDecision::OutOfOrder;
    }
    if policy == OverridePolicy::PreserveTerminal && payment.status.is_terminal() {
        return WatermarkDecision::OutOfOrder;
    }
    WatermarkDecision::Apply
}
