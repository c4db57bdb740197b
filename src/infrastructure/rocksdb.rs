use crate::domain::payment::{IdempotencyEntry, IdempotencyKey, Payment, PaymentId};
use crate::domain::ports::{CasOutcome, ClaimOutcome, IdempotencyIndex, PaymentStore};
use crate::error::{PaymentError, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rocksdb::{ColumnFamilyDescriptor, DB, Options};
use std::path::Path;
use std::sync::{Arc, Mutex};

/// Column Family for payment records.
pub const CF_PAYMENTS: &str = "payments";
/// Column Family for idempotency entries.
pub const CF_IDEMPOTENCY: &str = "idempotency";

/// A persistent store implementation using RocksDB.
///
/// Serves both the `PaymentStore` and `IdempotencyIndex` ports from separate
/// Column Families. RocksDB has no native compare-and-swap, so the
/// read-modify-write sections (`insert`, `compare_and_swap`, `claim`) are
/// serialized through a short-held mutex; all operations inside it are
/// synchronous, so the lock never spans an await point.
///
/// `Clone` shares the underlying `Arc<DB>` and the guard.
#[derive(Clone)]
pub struct RocksDBStore {
    db: Arc<DB>,
    write_guard: Arc<Mutex<()>>,
}

impl RocksDBStore {
    /// Opens or creates a RocksDB instance at the specified path, ensuring
    /// both column families exist.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let mut opts = Options::default();
        opts.create_if_missing(true);
        opts.create_missing_column_families(true);

        let cf_payments = ColumnFamilyDescriptor::new(CF_PAYMENTS, Options::default());
        let cf_idempotency = ColumnFamilyDescriptor::new(CF_IDEMPOTENCY, Options::default());

        let db = DB::open_cf_descriptors(&opts, path, vec![cf_payments, cf_idempotency])?;

        Ok(Self {
            db: Arc::new(db),
            write_guard: Arc::new(Mutex::new(())),
        })
    }

    fn cf_handle(&self, name: &str) -> Result<&rocksdb::ColumnFamily> {
        self.db.cf_handle(name).ok_or_else(|| {
            PaymentError::InternalError(Box::new(std::io::Error::other(format!(
                "column family not found: {name}"
            ))))
        })
    }

    fn lock_writes(&self) -> Result<std::sync::MutexGuard<'_, ()>> {
        self.write_guard.lock().map_err(|_| {
            PaymentError::InternalError(Box::new(std::io::Error::other(
                "store write guard poisoned",
            )))
        })
    }

    fn encode<T: serde::Serialize>(value: &T) -> Result<Vec<u8>> {
        serde_json::to_vec(value).map_err(PaymentError::from)
    }

    fn decode<T: serde::de::DeserializeOwned>(bytes: &[u8]) -> Result<T> {
        serde_json::from_slice(bytes).map_err(PaymentError::from)
    }

    fn read_payment(&self, id: &PaymentId) -> Result<Option<Payment>> {
        let cf = self.cf_handle(CF_PAYMENTS)?;
        match self.db.get_cf(cf, id.as_str().as_bytes())? {
            Some(bytes) => Ok(Some(Self::decode(&bytes)?)),
            None => Ok(None),
        }
    }
}

#[async_trait]
impl PaymentStore for RocksDBStore {
    async fn insert(&self, payment: Payment) -> Result<()> {
        let _guard = self.lock_writes()?;
        if self.read_payment(&payment.id)?.is_some() {
            return Err(PaymentError::InternalError(Box::new(std::io::Error::other(
                format!("payment id collision: {}", payment.id),
            ))));
        }
        let cf = self.cf_handle(CF_PAYMENTS)?;
        self.db
            .put_cf(cf, payment.id.as_str().as_bytes(), Self::encode(&payment)?)?;
        Ok(())
    }

    async fn get(&self, id: &PaymentId) -> Result<Option<Payment>> {
        self.read_payment(id)
    }

    async fn compare_and_swap(
        &self,
        expected_revision: u64,
        mut updated: Payment,
    ) -> Result<CasOutcome> {
        let _guard = self.lock_writes()?;
        let current = self
            .read_payment(&updated.id)?
            .ok_or_else(|| PaymentError::NotFound(updated.id.to_string()))?;
        if current.revision != expected_revision {
            return Ok(CasOutcome::Conflict);
        }
        updated.revision = expected_revision + 1;
        let cf = self.cf_handle(CF_PAYMENTS)?;
        self.db
            .put_cf(cf, updated.id.as_str().as_bytes(), Self::encode(&updated)?)?;
        Ok(CasOutcome::Swapped)
    }

    async fn all(&self) -> Result<Vec<Payment>> {
        let cf = self.cf_handle(CF_PAYMENTS)?;
        let mut payments = Vec::new();
        for item in self.db.iterator_cf(cf, rocksdb::IteratorMode::Start) {
            let (_key, value) = item?;
            payments.push(Self::decode(&value)?);
        }
        Ok(payments)
    }

    async fn count(&self) -> Result<usize> {
        let cf = self.cf_handle(CF_PAYMENTS)?;
        Ok(self.db.iterator_cf(cf, rocksdb::IteratorMode::Start).count())
    }
}

#[async_trait]
impl IdempotencyIndex for RocksDBStore {
    async fn claim(
        &self,
        key: &IdempotencyKey,
        payment_id: &PaymentId,
        expires_at: DateTime<Utc>,
        now: DateTime<Utc>,
    ) -> Result<ClaimOutcome> {
        let _guard = self.lock_writes()?;
        let cf = self.cf_handle(CF_IDEMPOTENCY)?;
        if let Some(bytes) = self.db.get_cf(cf, key.as_str().as_bytes())? {
            let entry: IdempotencyEntry = Self::decode(&bytes)?;
            if !entry.is_expired(now) {
                return Ok(ClaimOutcome::Existing(entry.payment_id));
            }
        }
        let entry = IdempotencyEntry {
            payment_id: payment_id.clone(),
            expires_at,
        };
        self.db
            .put_cf(cf, key.as_str().as_bytes(), Self::encode(&entry)?)?;
        Ok(ClaimOutcome::Claimed)
    }

    async fn get(&self, key: &IdempotencyKey, now: DateTime<Utc>) -> Result<Option<PaymentId>> {
        let cf = self.cf_handle(CF_IDEMPOTENCY)?;
        match self.db.get_cf(cf, key.as_str().as_bytes())? {
            Some(bytes) => {
                let entry: IdempotencyEntry = Self::decode(&bytes)?;
                Ok((!entry.is_expired(now)).then_some(entry.payment_id))
            }
            None => Ok(None),
        }
    }
}
