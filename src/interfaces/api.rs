//! Wire-facing DTOs. The HTTP layer is an external collaborator; these types
//! define the shapes it exchanges with the engine and the validation that
//! turns them into domain values.

use crate::domain::notification::NotificationEvent;
use crate::domain::payment::{
    Amount, Currency, CustomerDetails, IdempotencyKey, Payment, PaymentDraft, PaymentId,
    PaymentMethod, PaymentStatus,
};
use crate::error::{PaymentError, Result};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CustomerData {
    pub email: String,
    pub name: String,
    pub document: String,
}

/// Request to create a payment. `payment_method` membership in the allowed
/// set is enforced by the enum at deserialization time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CreatePaymentRequest {
    /// Payment amount, decimal string.
    pub amount: String,
    /// ISO currency code.
    pub currency: String,
    pub payment_method: PaymentMethod,
    #[serde(default)]
    pub bank: Option<String>,
    pub customer: CustomerData,
    pub redirect_url: String,
    #[serde(default)]
    pub idempotency_key: Option<String>,
}

impl CreatePaymentRequest {
    /// Validates the request into a domain draft plus the effective creation
    /// key: `key_override` (the transport header) wins over the body field,
    /// and a key is generated when neither is present.
    pub fn validate(self, key_override: Option<String>) -> Result<(PaymentDraft, IdempotencyKey)> {
        let amount: Decimal = self
            .amount
            .trim()
            .parse()
            .map_err(|_| PaymentError::ValidationError(format!("invalid amount: {:?}", self.amount)))?;
        let amount = Amount::new(amount)?;
        let currency = Currency::new(&self.currency)?;
        let customer =
            CustomerDetails::new(&self.customer.email, &self.customer.name, &self.customer.document)?;
        if self.redirect_url.trim().is_empty() {
            return Err(PaymentError::ValidationError(
                "redirect_url must not be empty".to_string(),
            ));
        }

        let key = match key_override.or(self.idempotency_key) {
            Some(raw) => IdempotencyKey::new(raw)?,
            None => IdempotencyKey::generate(),
        };

        Ok((
            PaymentDraft {
                amount,
                currency,
                payment_method: self.payment_method,
                bank: self.bank,
                customer,
                redirect_url: self.redirect_url,
            },
            key,
        ))
    }
}

/// Response after a creation call, for both first-time creation and
/// idempotent replay. `redirect_url` is the provider's hosted portal link.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PaymentResponse {
    pub payment_id: PaymentId,
    pub status: PaymentStatus,
    pub redirect_url: Option<String>,
    pub amount: Amount,
    pub currency: Currency,
    pub created_at: DateTime<Utc>,
}

impl PaymentResponse {
    pub fn from_payment(payment: &Payment, portal_base_url: &str) -> Self {
        Self {
            payment_id: payment.id.clone(),
            status: payment.status,
            redirect_url: Some(format!("{portal_base_url}/pay/{}", payment.id)),
            amount: payment.amount,
            currency: payment.currency.clone(),
            created_at: payment.created_at,
        }
    }
}

/// Webhook notification from the payment provider. `signature` is carried
/// through unverified; the verification collaborator is not wired in yet.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WebhookPayload {
    pub payment_id: String,
    pub status: PaymentStatus,
    /// RFC 3339 event-generation time.
    pub timestamp: String,
    #[serde(default)]
    pub signature: Option<String>,
    /// Provider reason for declined/expired payments.
    #[serde(default)]
    pub reason: Option<String>,
}

impl WebhookPayload {
    /// Parses the payload into a domain event; a malformed timestamp is a
    /// `ValidationError`.
    pub fn into_event(self) -> Result<NotificationEvent> {
        let event_timestamp = DateTime::parse_from_rfc3339(&self.timestamp)
            .map_err(|e| {
                PaymentError::ValidationError(format!(
                    "invalid webhook timestamp {:?}: {e}",
                    self.timestamp
                ))
            })?
            .with_timezone(&Utc);
        Ok(NotificationEvent {
            payment_id: PaymentId::new(self.payment_id),
            status: self.status,
            event_timestamp,
            auth_token: self.signature,
            reason: self.reason,
        })
    }
}

/// Read-only view returned by status queries.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PaymentView {
    pub payment_id: PaymentId,
    pub status: PaymentStatus,
    pub amount: Amount,
    pub currency: Currency,
    pub redirect_url: Option<String>,
    pub created_at: DateTime<Utc>,
    pub last_event_at: DateTime<Utc>,
    pub applied_event_count: u64,
}

impl From<Payment> for PaymentView {
    fn from(payment: Payment) -> Self {
        Self {
            payment_id: payment.id,
            status: payment.status,
            amount: payment.amount,
            currency: payment.currency,
            redirect_url: Some(payment.redirect_url),
            created_at: payment.created_at,
            last_event_at: payment.last_event_at,
            applied_event_count: payment.applied_event_count,
        }
    }
}
