use crate::domain::notification::NotificationEvent;
use crate::error::PaymentError;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::fmt;
use uuid::Uuid;

/// Opaque payment identifier: `pay_` followed by 16 hex characters.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PaymentId(String);

impl PaymentId {
    pub fn generate() -> Self {
        let hex = Uuid::new_v4().simple().to_string();
        Self(format!("pay_{}", &hex[..16]))
    }

    pub fn new(raw: impl Into<String>) -> Self {
        Self(raw.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PaymentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Client-supplied token that makes repeated creation requests resolve to a
/// single payment.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct IdempotencyKey(String);

impl IdempotencyKey {
    pub fn new(raw: impl Into<String>) -> Result<Self, PaymentError> {
        let raw = raw.into();
        if raw.trim().is_empty() {
            return Err(PaymentError::ValidationError(
                "idempotency key must not be empty".to_string(),
            ));
        }
        Ok(Self(raw))
    }

    /// Fallback for requests that carry no key of their own.
    pub fn generate() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for IdempotencyKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Positive monetary amount. The engine validates it but performs no
/// arithmetic on it.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Amount(Decimal);

impl Amount {
    pub fn new(value: Decimal) -> Result<Self, PaymentError> {
        if value > Decimal::ZERO {
            Ok(Self(value))
        } else {
            Err(PaymentError::ValidationError(
                "amount must be positive".to_string(),
            ))
        }
    }

    pub fn value(&self) -> Decimal {
        self.0
    }
}

impl TryFrom<Decimal> for Amount {
    type Error = PaymentError;

    fn try_from(value: Decimal) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl fmt::Display for Amount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// ISO 4217 currency code, stored uppercase. Opaque beyond validation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Currency(String);

impl Currency {
    pub fn new(code: &str) -> Result<Self, PaymentError> {
        let code = code.trim();
        if code.len() != 3 || !code.chars().all(|c| c.is_ascii_alphabetic()) {
            return Err(PaymentError::ValidationError(format!(
                "invalid currency code: {code:?}"
            )));
        }
        Ok(Self(code.to_ascii_uppercase()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Currency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum PaymentMethod {
    Pse,
    Pix,
    Oxxo,
    Card,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PaymentStatus {
    Pending,
    Approved,
    Declined,
    Expired,
}

impl PaymentStatus {
    /// Every status except `Pending` is terminal by default. Whether a
    /// later-timestamped notification may still override a terminal status
    /// is decided by [`crate::domain::watermark::OverridePolicy`].
    pub fn is_terminal(&self) -> bool {
        !matches!(self, Self::Pending)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Approved => "approved",
            Self::Declined => "declined",
            Self::Expired => "expired",
        }
    }
}

impl fmt::Display for PaymentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Customer details captured at creation time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CustomerDetails {
    pub email: String,
    pub name: String,
    pub document: String,
}

impl CustomerDetails {
    pub fn new(email: &str, name: &str, document: &str) -> Result<Self, PaymentError> {
        for (field, value) in [("email", email), ("name", name), ("document", document)] {
            if value.trim().is_empty() {
                return Err(PaymentError::ValidationError(format!(
                    "customer {field} must not be empty"
                )));
            }
        }
        Ok(Self {
            email: email.to_string(),
            name: name.to_string(),
            document: document.to_string(),
        })
    }
}

/// Identity of one notification delivery: the asserted status together with
/// its event-generation timestamp. Two deliveries with the same signature are
/// exact retransmissions.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventSignature {
    pub status: PaymentStatus,
    pub event_timestamp: DateTime<Utc>,
}

/// Fixed-capacity ring of recently applied event signatures.
///
/// Suppresses exact duplicate deliveries without unbounded growth; once full,
/// the oldest signature is evicted. Signatures older than the watermark are
/// already rejected by the ordering rule, so a small window is enough.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SeenSignatures {
    capacity: usize,
    entries: VecDeque<EventSignature>,
}

impl SeenSignatures {
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            capacity: capacity.max(1),
            entries: VecDeque::new(),
        }
    }

    pub fn contains(&self, signature: &EventSignature) -> bool {
        self.entries.contains(signature)
    }

    pub fn record(&mut self, signature: EventSignature) {
        if self.entries.len() == self.capacity {
            self.entries.pop_front();
        }
        self.entries.push_back(signature);
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Validated creation input, produced from the request DTO.
#[derive(Debug, Clone, PartialEq)]
pub struct PaymentDraft {
    pub amount: Amount,
    pub currency: Currency,
    pub payment_method: PaymentMethod,
    pub bank: Option<String>,
    pub customer: CustomerDetails,
    pub redirect_url: String,
}

/// A payment record.
///
/// Created once by the creation service, mutated only by the reconciler, and
/// never deleted by the engine itself. `last_event_at` is the watermark: it
/// only advances, regardless of notification delivery order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Payment {
    pub id: PaymentId,
    pub status: PaymentStatus,
    pub amount: Amount,
    pub currency: Currency,
    pub payment_method: PaymentMethod,
    pub bank: Option<String>,
    pub customer: CustomerDetails,
    pub redirect_url: String,
    pub creation_key: IdempotencyKey,
    /// Provider-supplied reason for the latest declined/expired status.
    pub status_reason: Option<String>,
    pub created_at: DateTime<Utc>,
    /// Timestamp of the most recently applied notification; creation time
    /// until one is applied.
    pub last_event_at: DateTime<Utc>,
    /// Number of notifications that changed observable state.
    pub applied_event_count: u64,
    pub seen_signatures: SeenSignatures,
    /// Storage revision backing compare-and-swap updates.
    pub revision: u64,
}

impl Payment {
    pub fn new(
        id: PaymentId,
        draft: PaymentDraft,
        creation_key: IdempotencyKey,
        created_at: DateTime<Utc>,
        signature_capacity: usize,
    ) -> Self {
        Self {
            id,
            status: PaymentStatus::Pending,
            amount: draft.amount,
            currency: draft.currency,
            payment_method: draft.payment_method,
            bank: draft.bank,
            customer: draft.customer,
            redirect_url: draft.redirect_url,
            creation_key,
            status_reason: None,
            created_at,
            last_event_at: created_at,
            applied_event_count: 0,
            seen_signatures: SeenSignatures::with_capacity(signature_capacity),
            revision: 0,
        }
    }

    /// Applies a notification unconditionally: status, reason, watermark,
    /// applied counter, and the signature ring. Whether the event *should*
    /// apply is decided beforehand by [`crate::domain::watermark::evaluate`].
    pub fn apply_event(&mut self, event: &NotificationEvent) {
        self.status = event.status;
        self.status_reason = event.reason.clone();
        self.last_event_at = event.event_timestamp;
        self.applied_event_count += 1;
        self.seen_signatures.record(event.signature());
    }
}

/// One idempotency index entry: `creation_key -> payment_id` until expiry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IdempotencyEntry {
    pub payment_id: PaymentId,
    pub expires_at: DateTime<Utc>,
}

impl IdempotencyEntry {
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.expires_at <= now
    }
}
