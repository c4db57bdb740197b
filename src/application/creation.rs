use crate::config::EngineConfig;
use crate::domain::payment::{IdempotencyKey, Payment, PaymentDraft, PaymentId};
use crate::domain::ports::{ClaimOutcome, IdempotencyIndexRef, PaymentStoreRef};
use crate::error::{PaymentError, Result};
use chrono::Utc;
use std::time::Duration;
use tracing::{debug, info};

/// Retries bridging the winner's claim-to-insert window on the loser side.
const CLAIM_READ_RETRIES: u32 = 16;

/// Validates and atomically creates-or-returns a payment for a creation key.
///
/// The idempotency claim is the linearization point: of any number of
/// concurrent creations with the same key, exactly one claim wins and inserts
/// the record; every loser observes the winner's id and returns its record.
#[derive(Clone)]
pub struct CreationService {
    payments: PaymentStoreRef,
    index: IdempotencyIndexRef,
    config: EngineConfig,
}

impl CreationService {
    pub fn new(
        payments: PaymentStoreRef,
        index: IdempotencyIndexRef,
        config: EngineConfig,
    ) -> Self {
        Self {
            payments,
            index,
            config,
        }
    }

    /// Creates a payment, or returns the existing one for an already-claimed
    /// key. The boolean is `true` only when a new record was allocated.
    pub async fn create(
        &self,
        draft: PaymentDraft,
        creation_key: IdempotencyKey,
    ) -> Result<(Payment, bool)> {
        let now = Utc::now();
        let id = PaymentId::generate();
        let expires_at = now + self.config.idempotency_ttl();

        match self.index.claim(&creation_key, &id, expires_at, now).await? {
            ClaimOutcome::Claimed => {
                let payment = Payment::new(
                    id,
                    draft,
                    creation_key,
                    now,
                    self.config.seen_signature_capacity,
                );
                self.payments.insert(payment.clone()).await?;
                info!(payment_id = %payment.id, "payment created");
                Ok((payment, true))
            }
            ClaimOutcome::Existing(winner_id) => {
                // A concurrent winner may still be between its claim and its
                // insert; retry the read briefly before giving up.
                for _ in 0..CLAIM_READ_RETRIES {
                    if let Some(existing) = self.payments.get(&winner_id).await? {
                        debug!(payment_id = %existing.id, "idempotent replay, returning existing payment");
                        return Ok((existing, false));
                    }
                    tokio::time::sleep(Duration::from_millis(2)).await;
                }
                Err(PaymentError::ContentionExhausted(CLAIM_READ_RETRIES))
            }
        }
    }
}
