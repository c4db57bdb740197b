use thiserror::Error;

pub type Result<T> = std::result::Result<T, PaymentError>;

#[derive(Error, Debug)]
pub enum PaymentError {
    #[error("validation error: {0}")]
    ValidationError(String),
    #[error("payment not found: {0}")]
    NotFound(String),
    #[error("storage contention not resolved after {0} attempts")]
    ContentionExhausted(u32),
    #[error("query deadline exceeded")]
    DeadlineExceeded,
    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),
    #[error("CSV error: {0}")]
    CsvError(#[from] csv::Error),
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
    #[cfg(feature = "storage-rocksdb")]
    #[error("storage error: {0}")]
    StorageError(#[from] rocksdb::Error),
    #[error("internal error: {0}")]
    InternalError(Box<dyn std::error::Error + Send + Sync>),
}
