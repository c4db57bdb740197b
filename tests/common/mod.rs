#![allow(dead_code)]

use chrono::{DateTime, Duration, Utc};
use payrec::application::creation::CreationService;
use payrec::application::query::QueryService;
use payrec::application::reconciler::Reconciler;
use payrec::config::EngineConfig;
use payrec::domain::notification::NotificationEvent;
use payrec::domain::payment::{Payment, PaymentId, PaymentMethod, PaymentStatus};
use payrec::domain::ports::{IdempotencyIndexRef, PaymentStoreRef};
use payrec::infrastructure::in_memory::{InMemoryIdempotencyIndex, InMemoryPaymentStore};
use payrec::interfaces::api::{CreatePaymentRequest, CustomerData};
use std::sync::Arc;

pub struct TestEngine {
    pub creation: CreationService,
    pub reconciler: Reconciler,
    pub query: QueryService,
    pub payments: PaymentStoreRef,
    pub index: IdempotencyIndexRef,
}

pub fn engine() -> TestEngine {
    engine_with(EngineConfig::default())
}

pub fn engine_with(config: EngineConfig) -> TestEngine {
    let payments: PaymentStoreRef = Arc::new(InMemoryPaymentStore::new());
    let index: IdempotencyIndexRef = Arc::new(InMemoryIdempotencyIndex::new());
    TestEngine {
        creation: CreationService::new(payments.clone(), index.clone(), config.clone()),
        reconciler: Reconciler::new(payments.clone(), &config),
        query: QueryService::new(payments.clone()),
        payments,
        index,
    }
}

/// A valid PSE creation request in the shape the checkout collaborator sends.
pub fn pse_request(key: &str) -> CreatePaymentRequest {
    CreatePaymentRequest {
        amount: "50000".to_string(),
        currency: "COP".to_string(),
        payment_method: PaymentMethod::Pse,
        bank: Some("001".to_string()),
        customer: CustomerData {
            email: "ana.gomez@example.com".to_string(),
            name: "Ana Gomez".to_string(),
            document: "CC-1234567".to_string(),
        },
        redirect_url: "https://merchant.example.com/return".to_string(),
        idempotency_key: Some(key.to_string()),
    }
}

pub async fn create(engine: &TestEngine, key: &str) -> Payment {
    let (draft, key) = pse_request(key).validate(None).unwrap();
    let (payment, _) = engine.creation.create(draft, key).await.unwrap();
    payment
}

/// Event timestamp `secs` seconds past the payment's creation watermark.
pub fn after(payment: &Payment, secs: i64) -> DateTime<Utc> {
    payment.created_at + Duration::seconds(secs)
}

pub fn event_at(id: &PaymentId, status: PaymentStatus, at: DateTime<Utc>) -> NotificationEvent {
    NotificationEvent {
        payment_id: id.clone(),
        status,
        event_timestamp: at,
        auth_token: Some("t=123,v1=deadbeef".to_string()),
        reason: None,
    }
}
