use crate::domain::payment::PaymentStatus;
use crate::error::{PaymentError, Result};
use crate::interfaces::api::CreatePaymentRequest;
use serde::Deserialize;
use std::io::{BufRead, BufReader, Read};

/// A webhook line in a replay stream.
///
/// Provider webhooks carry the gateway's `payment_id`, but replay fixtures
/// are written before any id exists, so a record may instead reference the
/// payment through the `creation_key` used to create it; the CLI resolves
/// that through the idempotency index.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct WebhookRecord {
    #[serde(default)]
    pub payment_id: Option<String>,
    #[serde(default)]
    pub creation_key: Option<String>,
    pub status: PaymentStatus,
    pub timestamp: String,
    #[serde(default)]
    pub signature: Option<String>,
    #[serde(default)]
    pub reason: Option<String>,
}

/// One line of a replay stream, dispatched on the `op` tag.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "op", rename_all = "lowercase")]
pub enum ReplayRecord {
    Create(CreatePaymentRequest),
    Webhook(WebhookRecord),
}

/// Reads replay records from a JSON-lines source.
///
/// Wraps any `Read` and yields one `Result<ReplayRecord>` per non-empty
/// line, so large streams are processed without loading them into memory.
pub struct ReplayReader<R: Read> {
    reader: BufReader<R>,
}

impl<R: Read> ReplayReader<R> {
    /// Creates a new `ReplayReader` from any `Read` source (e.g., File, Stdin).
    pub fn new(source: R) -> Self {
        Self {
            reader: BufReader::new(source),
        }
    }

    /// Returns an iterator that lazily reads and deserializes records.
    pub fn records(self) -> impl Iterator<Item = Result<ReplayRecord>> {
        self.reader
            .lines()
            .filter(|line| match line {
                Ok(content) => !content.trim().is_empty(),
                Err(_) => true,
            })
            .map(|line| {
                let line = line?;
                serde_json::from_str(&line).map_err(PaymentError::from)
            })
    }
}
