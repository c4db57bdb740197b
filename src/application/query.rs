use crate::domain::payment::{Payment, PaymentId};
use crate::domain::ports::PaymentStoreRef;
use crate::error::{PaymentError, Result};
use serde::Serialize;
use std::time::Duration;

/// Read-only view used for health reporting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct EngineStats {
    pub payments_count: usize,
}

/// Read-only status lookup used by polling clients.
///
/// Reports current state only; it never blocks waiting for a future state.
#[derive(Clone)]
pub struct QueryService {
    payments: PaymentStoreRef,
}

impl QueryService {
    pub fn new(payments: PaymentStoreRef) -> Self {
        Self { payments }
    }

    pub async fn get(&self, id: &PaymentId) -> Result<Payment> {
        self.payments
            .get(id)
            .await?
            .ok_or_else(|| PaymentError::NotFound(id.to_string()))
    }

    /// Same as [`get`](Self::get), but bounds the store read with a
    /// caller-supplied deadline for polling loops that cannot wait on a slow
    /// backend.
    pub async fn get_with_deadline(&self, id: &PaymentId, deadline: Duration) -> Result<Payment> {
        tokio::time::timeout(deadline, self.get(id))
            .await
            .map_err(|_| PaymentError::DeadlineExceeded)?
    }

    pub async fn all(&self) -> Result<Vec<Payment>> {
        self.payments.all().await
    }

    pub async fn stats(&self) -> Result<EngineStats> {
        Ok(EngineStats {
            payments_count: self.payments.count().await?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::payment::{
        Amount, Currency, CustomerDetails, IdempotencyKey, PaymentDraft, PaymentMethod,
    };
    use crate::domain::ports::PaymentStore;
    use crate::infrastructure::in_memory::InMemoryPaymentStore;
    use chrono::Utc;
    use rust_decimal_macros::dec;
    use std::sync::Arc;

    fn sample_payment() -> Payment {
        let draft = PaymentDraft {
            amount: Amount::new(dec!(50000)).unwrap(),
            currency: Currency::new("COP").unwrap(),
            payment_method: PaymentMethod::Card,
            bank: None,
            customer: CustomerDetails::new("ana@example.com", "Ana", "CC-123").unwrap(),
            redirect_url: "https://merchant.example.com/return".to_string(),
        };
        Payment::new(
            PaymentId::generate(),
            draft,
            IdempotencyKey::new("k1").unwrap(),
            Utc::now(),
            8,
        )
    }

    #[tokio::test]
    async fn test_get_returns_stored_payment() {
        let store: PaymentStoreRef = Arc::new(InMemoryPaymentStore::new());
        let payment = sample_payment();
        store.insert(payment.clone()).await.unwrap();

        let service = QueryService::new(store);
        let found = service.get(&payment.id).await.unwrap();
        assert_eq!(found, payment);

        let stats = service.stats().await.unwrap();
        assert_eq!(stats.payments_count, 1);
    }

    #[tokio::test]
    async fn test_get_unknown_is_not_found() {
        let service = QueryService::new(Arc::new(InMemoryPaymentStore::new()));
        let err = service
            .get(&PaymentId::new("pay_0000000000000000"))
            .await
            .unwrap_err();
        assert!(matches!(err, PaymentError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_get_with_deadline_returns_promptly() {
        let store: PaymentStoreRef = Arc::new(InMemoryPaymentStore::new());
        let payment = sample_payment();
        store.insert(payment.clone()).await.unwrap();

        let service = QueryService::new(store);
        let found = service
            .get_with_deadline(&payment.id, Duration::from_millis(100))
            .await
            .unwrap();
        assert_eq!(found.id, payment.id);
    }
}
