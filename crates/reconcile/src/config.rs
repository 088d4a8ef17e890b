//! Reconciler configuration.

use std::time::Duration;

/// Tunables for the reconciliation poller.
#[derive(Debug, Clone)]
pub struct ReconcileConfig {
    /// How often the poll loop fires.
    pub poll_interval: Duration,

    /// Records younger than this are skipped; their transaction may not
    /// have propagated to the indexer yet.
    pub min_age: Duration,

    /// Minimum time between two chain queries for the same record.
    pub recheck_cooldown: Duration,

    /// Non-terminal records with no transaction on the wire are abandoned
    /// after this age.
    pub drop_age: Duration,

    /// Maximum records examined per run, to bound indexer load.
    pub max_items_per_run: usize,

    /// Consecutive not-found polls before a record is failed.
    pub max_poll_attempts: u32,

    /// Confirmation depth at which a payment grants its credits.
    pub payment_confirmations: u64,
}

impl Default for ReconcileConfig {
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_secs(30),
            min_age: Duration::from_secs(60),
            recheck_cooldown: Duration::from_secs(30),
            drop_age: Duration::from_secs(24 * 3600),
            max_items_per_run: 50,
            max_poll_attempts: 20,
            payment_confirmations: 1,
        }
    }
}

impl ReconcileConfig {
    /// Configuration with every gate open, for tests that drive the
    /// reconciler manually.
    pub fn eager() -> Self {
        Self {
            poll_interval: Duration::from_millis(10),
            min_age: Duration::ZERO,
            recheck_cooldown: Duration::ZERO,
            ..Self::default()
        }
    }

    /// Set the poll interval.
    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    /// Set the minimum record age before polling.
    pub fn with_min_age(mut self, min_age: Duration) -> Self {
        self.min_age = min_age;
        self
    }

    /// Set the per-record recheck cooldown.
    pub fn with_recheck_cooldown(mut self, cooldown: Duration) -> Self {
        self.recheck_cooldown = cooldown;
        self
    }

    /// Set the not-found retry ceiling.
    pub fn with_max_poll_attempts(mut self, attempts: u32) -> Self {
        self.max_poll_attempts = attempts;
        self
    }
}
