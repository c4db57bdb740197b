use crate::config::EngineConfig;
use crate::domain::notification::{NotificationEvent, ReconcileResult};
use crate::domain::ports::{CasOutcome, PaymentStoreRef};
use crate::domain::watermark::{self, OverridePolicy, WatermarkDecision};
use crate::error::{PaymentError, Result};
use tracing::{info, warn};

/// Bound on compare-and-swap retries under contention for one payment.
/// Every conflict means another writer made progress, so the bound is only
/// reachable when more writers than this race one payment at once.
const MAX_CAS_RETRIES: u32 = 32;

/// Applies inbound status notifications under the ordering and
/// duplicate-suppression rules.
///
/// The read-compare-write cycle for one payment is serialized through the
/// store's revision CAS: a conflicting concurrent write forces a re-read and
/// re-evaluation, so the effective state is a function of the set of
/// delivered notifications, not their delivery order. Notifications for
/// different payments proceed in parallel.
#[derive(Clone)]
pub struct Reconciler {
    payments: PaymentStoreRef,
    policy: OverridePolicy,
}

impl Reconciler {
    pub fn new(payments: PaymentStoreRef, config: &EngineConfig) -> Self {
        Self {
            payments,
            policy: config.override_policy,
        }
    }

    /// Applies one notification. `Duplicate` and `OutOfOrder` outcomes are
    /// acknowledgements, not errors; `NotFound` means the notification
    /// references a payment this engine never created — it is surfaced and
    /// never originates a placeholder record.
    pub async fn apply(&self, event: &NotificationEvent) -> Result<ReconcileResult> {
        for _ in 0..MAX_CAS_RETRIES {
            let payment = self
                .payments
                .get(&event.payment_id)
                .await?
                .ok_or_else(|| PaymentError::NotFound(event.payment_id.to_string()))?;

            match watermark::evaluate(&payment, event, self.policy) {
                WatermarkDecision::Duplicate => {
                    warn!(
                        payment_id = %payment.id,
                        status = %event.status,
                        event_ts = %event.event_timestamp,
                        "duplicate notification suppressed"
                    );
                    return Ok(ReconcileResult::duplicate());
                }
                WatermarkDecision::OutOfOrder => {
                    warn!(
                        payment_id = %payment.id,
                        status = %event.status,
                        event_ts = %event.event_timestamp,
                        watermark = %payment.last_event_at,
                        "out-of-order notification ignored"
                    );
                    return Ok(ReconcileResult::out_of_order());
                }
                WatermarkDecision::Apply => {
                    let mut updated = payment.clone();
                    updated.apply_event(event);
                    match self
                        .payments
                        .compare_and_swap(payment.revision, updated)
                        .await?
                    {
                        CasOutcome::Swapped => {
                            info!(
                                payment_id = %payment.id,
                                status = %event.status,
                                event_ts = %event.event_timestamp,
                                "notification applied"
                            );
                            return Ok(ReconcileResult::applied());
                        }
                        // Lost the race for this payment; re-read and
                        // re-evaluate against the new watermark.
                        CasOutcome::Conflict => continue,
                    }
                }
            }
        }
        Err(PaymentError::ContentionExhausted(MAX_CAS_RETRIES))
    }
}
