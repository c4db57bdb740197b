//! Application layer containing the core business logic orchestration.
//!
//! Three services share the storage ports: the creation service owns the
//! idempotent create path, the reconciler applies webhook notifications
//! under the watermark rule, and the query service serves status lookups.

pub mod creation;
pub mod query;
pub mod reconciler;
