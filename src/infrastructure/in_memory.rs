use crate::domain::payment::{IdempotencyEntry, IdempotencyKey, Payment, PaymentId};
use crate::domain::ports::{CasOutcome, ClaimOutcome, IdempotencyIndex, PaymentStore};
use crate::error::{PaymentError, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

/// A thread-safe in-memory store for payment records.
///
/// Uses `Arc<RwLock<HashMap<PaymentId, Payment>>>` for shared concurrent
/// access; the write lock is the critical section that makes
/// `compare_and_swap` atomic. Ideal for tests and single-process deployments.
#[derive(Default, Clone)]
pub struct InMemoryPaymentStore {
    payments: Arc<RwLock<HashMap<PaymentId, Payment>>>,
}

impl InMemoryPaymentStore {
    /// Creates a new, empty in-memory payment store.
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl PaymentStore for InMemoryPaymentStore {
    async fn insert(&self, payment: Payment) -> Result<()> {
        let mut payments = self.payments.write().await;
        if payments.contains_key(&payment.id) {
            return Err(PaymentError::InternalError(Box::new(std::io::Error::other(
                format!("payment id collision: {}", payment.id),
            ))));
        }
        payments.insert(payment.id.clone(), payment);
        Ok(())
    }

    async fn get(&self, id: &PaymentId) -> Result<Option<Payment>> {
        let payments = self.payments.read().await;
        Ok(payments.get(id).cloned())
    }

    async fn compare_and_swap(
        &self,
        expected_revision: u64,
        mut updated: Payment,
    ) -> Result<CasOutcome> {
        let mut payments = self.payments.write().await;
        match payments.get_mut(&updated.id) {
            Some(current) if current.revision == expected_revision => {
                updated.revision = expected_revision + 1;
                *current = updated;
                Ok(CasOutcome::Swapped)
            }
            Some(_) => Ok(CasOutcome::Conflict),
            None => Err(PaymentError::NotFound(updated.id.to_string())),
        }
    }

    async fn all(&self) -> Result<Vec<Payment>> {
        let payments = self.payments.read().await;
        Ok(payments.values().cloned().collect())
    }

    async fn count(&self) -> Result<usize> {
        let payments = self.payments.read().await;
        Ok(payments.len())
    }
}

/// A thread-safe in-memory idempotency index.
///
/// The write lock makes `claim` a single check-and-insert critical section;
/// expired entries are treated as absent and re-claimable.
#[derive(Default, Clone)]
pub struct InMemoryIdempotencyIndex {
    entries: Arc<RwLock<HashMap<IdempotencyKey, IdempotencyEntry>>>,
}

impl InMemoryIdempotencyIndex {
    /// Creates a new, empty in-memory index.
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl IdempotencyIndex for InMemoryIdempotencyIndex {
    async fn claim(
        &self,
        key: &IdempotencyKey,
        payment_id: &PaymentId,
        expires_at: DateTime<Utc>,
        now: DateTime<Utc>,
    ) -> Result<ClaimOutcome> {
        let mut entries = self.entries.write().await;
        if let Some(entry) = entries.get(key)
            && !entry.is_expired(now)
        {
            return Ok(ClaimOutcome::Existing(entry.payment_id.clone()));
        }
        entries.insert(
            key.clone(),
            IdempotencyEntry {
                payment_id: payment_id.clone(),
                expires_at,
            },
        );
        Ok(ClaimOutcome::Claimed)
    }

    async fn get(&self, key: &IdempotencyKey, now: DateTime<Utc>) -> Result<Option<PaymentId>> {
        let entries = self.entries.read().await;
        Ok(entries
            .get(key)
            .filter(|entry| !entry.is_expired(now))
            .map(|entry| entry.payment_id.clone()))
    }
}
