mod common;

use common::{create, engine, engine_with, pse_request};
use payrec::config::EngineConfig;
use payrec::domain::payment::PaymentStatus;
use payrec::error::PaymentError;
use std::collections::HashSet;
use std::time::Duration;

#[tokio::test]
async fn test_same_key_resolves_to_same_payment() {
    let engine = engine();

    let first = create(&engine, "k1").await;
    assert_eq!(first.status, PaymentStatus::Pending);

    let (draft, key) = pse_request("k1").validate(None).unwrap();
    let (second, is_new) = engine.creation.create(draft, key).await.unwrap();

    assert!(!is_new);
    assert_eq!(second.id, first.id);
    assert_eq!(engine.query.stats().await.unwrap().payments_count, 1);
}

#[tokio::test]
async fn test_validation_failures_create_nothing() {
    let engine = engine();

    let mut bad_amount = pse_request("k1");
    bad_amount.amount = "-100".to_string();
    assert!(matches!(
        bad_amount.validate(None),
        Err(PaymentError::ValidationError(_))
    ));

    let mut bad_currency = pse_request("k2");
    bad_currency.currency = "PESOS".to_string();
    assert!(bad_currency.validate(None).is_err());

    let mut blank_customer = pse_request("k3");
    blank_customer.customer.document = String::new();
    assert!(blank_customer.validate(None).is_err());

    let mut blank_redirect = pse_request("k4");
    blank_redirect.redirect_url = "  ".to_string();
    assert!(blank_redirect.validate(None).is_err());

    assert_eq!(engine.query.stats().await.unwrap().payments_count, 0);
}

#[tokio::test]
async fn test_concurrent_creates_share_one_payment() {
    let engine = engine();
    let (draft, key) = pse_request("race").validate(None).unwrap();

    let mut handles = Vec::new();
    for _ in 0..16 {
        let creation = engine.creation.clone();
        let draft = draft.clone();
        let key = key.clone();
        handles.push(tokio::spawn(async move { creation.create(draft, key).await }));
    }

    let mut ids = HashSet::new();
    let mut fresh = 0;
    for handle in handles {
        let (payment, is_new) = handle.await.unwrap().unwrap();
        ids.insert(payment.id);
        if is_new {
            fresh += 1;
        }
    }

    assert_eq!(ids.len(), 1);
    assert_eq!(fresh, 1);
    assert_eq!(engine.query.stats().await.unwrap().payments_count, 1);
}

#[tokio::test]
async fn test_expired_key_allocates_a_new_payment() {
    let engine = engine_with(EngineConfig {
        idempotency_ttl_secs: 0,
        ..EngineConfig::default()
    });

    let first = create(&engine, "k1").await;
    tokio::time::sleep(Duration::from_millis(5)).await;
    let second = create(&engine, "k1").await;

    assert_ne!(first.id, second.id);
    assert_eq!(engine.query.stats().await.unwrap().payments_count, 2);
}

#[tokio::test]
async fn test_query_returns_current_state_promptly() {
    let engine = engine();
    let payment = create(&engine, "k1").await;

    let found = engine.query.get(&payment.id).await.unwrap();
    assert_eq!(found.id, payment.id);
    assert_eq!(found.status, PaymentStatus::Pending);

    let bounded = engine
        .query
        .get_with_deadline(&payment.id, Duration::from_millis(50))
        .await
        .unwrap();
    assert_eq!(bounded.id, payment.id);

    let missing = engine
        .query
        .get(&payrec::domain::payment::PaymentId::new("pay_ffffffffffffffff"))
        .await;
    assert!(matches!(missing, Err(PaymentError::NotFound(_))));
}
