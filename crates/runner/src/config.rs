//! Daemon configuration, loaded from TOML.

use mintline_engine::EngineConfig;
use mintline_reconcile::ReconcileConfig;
use mintline_types::WalletAddress;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// Top-level daemon configuration.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct RunnerConfig {
    /// Storage backend settings.
    pub store: StoreSection,
    /// Chain gateway endpoints.
    pub chains: ChainsSection,
    /// Allocation engine tunables.
    pub engine: EngineSection,
    /// Delegated-signer guard; omit to disable it.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub signer: Option<SignerSection>,
    /// Reconciliation poller tunables.
    pub reconcile: ReconcileSection,
}

/// Storage backend settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreSection {
    /// RocksDB directory.
    pub path: PathBuf,
}

impl Default for StoreSection {
    fn default() -> Self {
        Self {
            path: PathBuf::from("mintline-db"),
        }
    }
}

/// Chain gateway endpoints.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ChainsSection {
    /// Indexer/broadcast gateway for the commit/reveal chain.
    pub commit_reveal_endpoint: String,
    /// Indexer/broadcast gateway for the submit/confirm chain.
    pub submit_confirm_endpoint: String,
    /// Inscription-construction service.
    pub encoder_endpoint: String,
}

impl Default for ChainsSection {
    fn default() -> Self {
        Self {
            commit_reveal_endpoint: "http://127.0.0.1:3080".into(),
            submit_confirm_endpoint: "http://127.0.0.1:3081".into(),
            encoder_endpoint: "http://127.0.0.1:3082".into(),
        }
    }
}

/// Allocation engine tunables.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineSection {
    /// Reservation TTL in seconds.
    pub reservation_ttl_secs: u64,
    /// Payment expiry window in seconds.
    pub payment_expiry_secs: u64,
    /// Admin wallets seeded into the store on first start.
    pub admin_wallets: Vec<String>,
}

impl Default for EngineSection {
    fn default() -> Self {
        Self {
            reservation_ttl_secs: 90,
            payment_expiry_secs: 3600,
            admin_wallets: Vec::new(),
        }
    }
}

/// Delegated-signer guard settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SignerSection {
    /// 32-byte signing seed, hex.
    pub seed_hex: String,
}

/// Reconciliation poller tunables.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ReconcileSection {
    /// Poll loop interval in seconds.
    pub poll_interval_secs: u64,
    /// Minimum record age before the first poll, seconds.
    pub min_age_secs: u64,
    /// Per-record recheck cooldown, seconds.
    pub recheck_cooldown_secs: u64,
    /// Age at which transaction-less records are abandoned, seconds.
    pub drop_age_secs: u64,
    /// Maximum records examined per run.
    pub max_items_per_run: usize,
    /// Consecutive not-found polls before a record is failed.
    pub max_poll_attempts: u32,
    /// Confirmation depth at which a payment grants its credits.
    pub payment_confirmations: u64,
}

impl Default for ReconcileSection {
    fn default() -> Self {
        let d = ReconcileConfig::default();
        Self {
            poll_interval_secs: d.poll_interval.as_secs(),
            min_age_secs: d.min_age.as_secs(),
            recheck_cooldown_secs: d.recheck_cooldown.as_secs(),
            drop_age_secs: d.drop_age.as_secs(),
            max_items_per_run: d.max_items_per_run,
            max_poll_attempts: d.max_poll_attempts,
            payment_confirmations: d.payment_confirmations,
        }
    }
}

impl RunnerConfig {
    /// Parse from TOML text.
    pub fn from_toml(text: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(text)
    }

    /// Render the default configuration as TOML, for `sample-config`.
    pub fn sample_toml() -> String {
        // Defaults always serialize.
        toml::to_string_pretty(&Self::default()).unwrap_or_default()
    }

    /// The engine configuration this selects.
    pub fn engine_config(&self) -> EngineConfig {
        EngineConfig::default()
            .with_reservation_ttl(Duration::from_secs(self.engine.reservation_ttl_secs))
            .with_payment_expiry(Duration::from_secs(self.engine.payment_expiry_secs))
            .with_admin_seed(
                self.engine
                    .admin_wallets
                    .iter()
                    .map(WalletAddress::new)
                    .collect(),
            )
    }

    /// The reconciler configuration this selects.
    pub fn reconcile_config(&self) -> ReconcileConfig {
        ReconcileConfig {
            poll_interval: Duration::from_secs(self.reconcile.poll_interval_secs),
            min_age: Duration::from_secs(self.reconcile.min_age_secs),
            recheck_cooldown: Duration::from_secs(self.reconcile.recheck_cooldown_secs),
            drop_age: Duration::from_secs(self.reconcile.drop_age_secs),
            max_items_per_run: self.reconcile.max_items_per_run,
            max_poll_attempts: self.reconcile.max_poll_attempts,
            payment_confirmations: self.reconcile.payment_confirmations,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sample_config_round_trips() {
        let sample = RunnerConfig::sample_toml();
        let parsed = RunnerConfig::from_toml(&sample).unwrap();
        assert_eq!(parsed.engine.reservation_ttl_secs, 90);
        assert!(parsed.signer.is_none());
    }

    #[test]
    fn test_partial_config_fills_defaults() {
        let parsed = RunnerConfig::from_toml(
            r#"
            [engine]
            reservation_ttl_secs = 120
            admin_wallets = ["bc1qadmin"]

            [signer]
            seed_hex = "0707070707070707070707070707070707070707070707070707070707070707"
            "#,
        )
        .unwrap();
        assert_eq!(parsed.engine.reservation_ttl_secs, 120);
        assert_eq!(parsed.reconcile.max_items_per_run, 50);
        assert!(parsed.signer.is_some());

        let engine = parsed.engine_config();
        assert_eq!(engine.reservation_ttl, Duration::from_secs(120));
        assert_eq!(engine.admin_seed.len(), 1);
    }
}
