use crate::domain::payment::{IdempotencyKey, Payment, PaymentId};
use crate::error::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::sync::Arc;

pub type PaymentStoreRef = Arc<dyn PaymentStore>;
pub type IdempotencyIndexRef = Arc<dyn IdempotencyIndex>;

/// Outcome of a revision compare-and-swap.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CasOutcome {
    Swapped,
    /// The stored revision no longer matches; the caller must re-read.
    Conflict,
}

/// Outcome of an idempotency claim.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClaimOutcome {
    /// The key was free (or expired) and now maps to the caller's id.
    Claimed,
    /// An unexpired entry already maps the key to this payment.
    Existing(PaymentId),
}

/// Keyed storage for payment records.
///
/// All mutation goes through `insert` and `compare_and_swap`; there is no
/// blind overwrite. Reads return a consistent snapshot of one record.
#[async_trait]
pub trait PaymentStore: Send + Sync {
    /// Inserts a new record. Fails if the id is already present.
    async fn insert(&self, payment: Payment) -> Result<()>;

    async fn get(&self, id: &PaymentId) -> Result<Option<Payment>>;

    /// Writes `updated` only if the stored revision still equals
    /// `expected_revision`; the stored record then carries
    /// `expected_revision + 1`.
    async fn compare_and_swap(
        &self,
        expected_revision: u64,
        updated: Payment,
    ) -> Result<CasOutcome>;

    async fn all(&self) -> Result<Vec<Payment>>;

    async fn count(&self) -> Result<usize>;
}

/// `creation_key -> payment_id` mapping with expiry.
///
/// `claim` is the creation linearization point: exactly one of any number of
/// concurrent claims for the same unexpired key wins. Callers supply `now` so
/// expiry stays deterministic under test.
#[async_trait]
pub trait IdempotencyIndex: Send + Sync {
    /// Atomically claims `key` for `payment_id` unless an unexpired entry
    /// already exists.
    async fn claim(
        &self,
        key: &IdempotencyKey,
        payment_id: &PaymentId,
        expires_at: DateTime<Utc>,
        now: DateTime<Utc>,
    ) -> Result<ClaimOutcome>;

    async fn get(&self, key: &IdempotencyKey, now: DateTime<Utc>) -> Result<Option<PaymentId>>;
}
