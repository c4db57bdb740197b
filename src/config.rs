use crate::domain::watermark::OverridePolicy;
use crate::error::{PaymentError, Result};
use chrono::Duration;
use serde::Deserialize;
use std::path::Path;

/// Engine tuning knobs, loadable from a TOML file. Every field has a default
/// so a partial (or absent) config is valid.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct EngineConfig {
    /// How long an idempotency key pins its payment id.
    pub idempotency_ttl_secs: i64,
    /// Capacity of the per-payment duplicate-suppression ring.
    pub seen_signature_capacity: usize,
    /// Base URL of the provider's hosted payment portal.
    pub portal_base_url: String,
    /// What a later-timestamped event may do to a terminal status.
    pub override_policy: OverridePolicy,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            idempotency_ttl_secs: 86_400,
            seen_signature_capacity: 32,
            portal_base_url: "https://banco-azul.example.com".to_string(),
            override_policy: OverridePolicy::default(),
        }
    }
}

impl EngineConfig {
    pub fn from_toml_file(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)?;
        toml::from_str(&raw)
            .map_err(|e| PaymentError::ValidationError(format!("invalid config file: {e}")))
    }

    pub fn idempotency_ttl(&self) -> Duration {
        Duration::seconds(self.idempotency_ttl_secs)
    }
}
