//! Configuration loading and representation.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, ensure};
use serde::{Deserialize, Serialize};

use everglow_orders::RequesterPolicies;

use crate::retry::{DEFAULT_BASE_DELAY, DEFAULT_MAX_DELAY, DEFAULT_MAX_WRITE_ATTEMPTS, RetryPolicy};
use crate::store::{InMemoryTableStore, JsonFileTableStore, StoreError, TableStore};

pub const ENV_STORE_DIR: &str = "EVERGLOW_STORE_DIR";
pub const ENV_MAX_WRITE_ATTEMPTS: &str = "EVERGLOW_MAX_WRITE_ATTEMPTS";
pub const ENV_RETRY_BASE_DELAY_MS: &str = "EVERGLOW_RETRY_BASE_DELAY_MS";
pub const ENV_LOG: &str = "EVERGLOW_LOG";

/// Which backend plays the external store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum StoreBackend {
    /// Process-local tables; contents are lost on exit.
    Memory,
    /// One JSON file per table under `path`.
    JsonDir { path: PathBuf },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DeskConfig {
    pub store: StoreBackend,
    /// Read-decide-write attempts per table before giving up with
    /// `StoreUnavailable`.
    pub max_write_attempts: u32,
    /// First backoff ceiling after a lost race; doubles per attempt.
    pub retry_base_delay_ms: u64,
    pub retry_max_delay_ms: u64,
    /// `tracing` filter directive handed to the subscriber.
    pub log_filter: String,
    pub requester_policies: RequesterPolicies,
}

impl Default for DeskConfig {
    fn default() -> Self {
        Self {
            store: StoreBackend::Memory,
            max_write_attempts: DEFAULT_MAX_WRITE_ATTEMPTS,
            retry_base_delay_ms: millis(DEFAULT_BASE_DELAY),
            retry_max_delay_ms: millis(DEFAULT_MAX_DELAY),
            log_filter: "info".to_string(),
            requester_policies: RequesterPolicies::default(),
        }
    }
}

impl DeskConfig {
    /// Load from process environment variables.
    pub fn from_env() -> anyhow::Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load from an arbitrary key lookup (environment, test maps).
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> anyhow::Result<Self> {
        let mut config = Self::default();

        match lookup(ENV_STORE_DIR).filter(|v| !v.trim().is_empty()) {
            Some(dir) => config.store = StoreBackend::JsonDir { path: dir.into() },
            None => {
                tracing::warn!("{ENV_STORE_DIR} not set; using in-memory tables (lost on exit)");
            }
        }

        if let Some(raw) = lookup(ENV_MAX_WRITE_ATTEMPTS) {
            config.max_write_attempts = raw
                .trim()
                .parse()
                .with_context(|| format!("{ENV_MAX_WRITE_ATTEMPTS} must be a positive integer, got '{raw}'"))?;
        }

        if let Some(raw) = lookup(ENV_RETRY_BASE_DELAY_MS) {
            config.retry_base_delay_ms = raw
                .trim()
                .parse()
                .with_context(|| format!("{ENV_RETRY_BASE_DELAY_MS} must be a whole number of milliseconds, got '{raw}'"))?;
            config.retry_max_delay_ms = config.retry_max_delay_ms.max(config.retry_base_delay_ms);
        }

        if let Some(filter) = lookup(ENV_LOG).filter(|v| !v.trim().is_empty()) {
            config.log_filter = filter;
        }

        config.validate()
    }

    /// Load from a JSON document; missing keys take their defaults.
    pub fn from_json_file(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("reading config {}", path.display()))?;
        let config: Self = serde_json::from_str(&text)
            .with_context(|| format!("parsing config {}", path.display()))?;
        config.validate()
    }

    fn validate(self) -> anyhow::Result<Self> {
        ensure!(
            self.max_write_attempts >= 1,
            "max_write_attempts must be at least 1"
        );
        ensure!(
            self.retry_max_delay_ms >= self.retry_base_delay_ms,
            "retry_max_delay_ms must not be below retry_base_delay_ms"
        );
        Ok(self)
    }

    /// Conflict retry settings shared by every service.
    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy {
            max_attempts: self.max_write_attempts,
            base_delay: Duration::from_millis(self.retry_base_delay_ms),
            max_delay: Duration::from_millis(self.retry_max_delay_ms),
        }
    }

    /// Build the configured store backend.
    pub fn open_store(&self) -> Result<Arc<dyn TableStore>, StoreError> {
        match &self.store {
            StoreBackend::Memory => Ok(Arc::new(InMemoryTableStore::new())),
            StoreBackend::JsonDir { path } => Ok(Arc::new(JsonFileTableStore::open(path.clone())?)),
        }
    }
}

fn millis(d: Duration) -> u64 {
    u64::try_from(d.as_millis()).unwrap_or(u64::MAX)
}
