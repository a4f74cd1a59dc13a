//! Runtime configuration
//!
//! Collects the tunables of the ledger in one place. The CLI maps its flags
//! onto [`LedgerConfig`]; embedding services can build one directly. The
//! page size is not configurable; it is the fixed
//! [`DEFAULT_PAGE_SIZE`](crate::types::DEFAULT_PAGE_SIZE).

use crate::core::pagination::{EnrichmentPolicy, DEFAULT_WALLET_KEY_FIELD};
use crate::core::settlement::DEFAULT_MAX_SETTLE_ATTEMPTS;
use tracing::warn;

/// Ledger configuration
#[derive(Clone, Debug, PartialEq)]
pub struct LedgerConfig {
    /// Worker threads for the async runtime
    pub worker_threads: usize,
    /// Compare-and-set attempts per settle call
    pub max_settle_attempts: usize,
    /// Behavior when enriching a listed record fails
    pub enrichment_policy: EnrichmentPolicy,
    /// Record field used as the wallet key during enrichment
    pub wallet_key_field: String,
}

impl Default for LedgerConfig {
    fn default() -> Self {
        Self {
            worker_threads: num_cpus::get(),
            max_settle_attempts: DEFAULT_MAX_SETTLE_ATTEMPTS,
            enrichment_policy: EnrichmentPolicy::default(),
            wallet_key_field: DEFAULT_WALLET_KEY_FIELD.to_string(),
        }
    }
}

impl LedgerConfig {
    /// Create a config, replacing invalid values with defaults
    ///
    /// Zero counts and an empty key field fall back to the default and log a
    /// warning.
    pub fn new(
        worker_threads: usize,
        max_settle_attempts: usize,
        enrichment_policy: EnrichmentPolicy,
        wallet_key_field: &str,
    ) -> Self {
        let default = Self::default();

        let worker_threads = if worker_threads == 0 {
            warn!(
                "Invalid worker_threads ({}), using default ({})",
                worker_threads, default.worker_threads
            );
            default.worker_threads
        } else {
            worker_threads
        };

        let max_settle_attempts = if max_settle_attempts == 0 {
            warn!(
                "Invalid max_settle_attempts ({}), using default ({})",
                max_settle_attempts, default.max_settle_attempts
            );
            default.max_settle_attempts
        } else {
            max_settle_attempts
        };

        let wallet_key_field = if wallet_key_field.is_empty() {
            warn!(
                "Empty wallet_key_field, using default ({})",
                default.wallet_key_field
            );
            default.wallet_key_field
        } else {
            wallet_key_field.to_string()
        };

        Self {
            worker_threads,
            max_settle_attempts,
            enrichment_policy,
            wallet_key_field,
        }
    }
}
