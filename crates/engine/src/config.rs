//! Engine configuration.

use mintline_types::WalletAddress;
use std::time::Duration;

/// Tunables for the allocation engine.
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// How long a reservation holds its item before lapsing unsigned.
    pub reservation_ttl: Duration,

    /// How long a registered payment may stay unconfirmed before it is
    /// marked expired.
    pub payment_expiry: Duration,

    /// Admin wallets written to the store on first start, when the stored
    /// admin set is empty. Bootstrap only; the store is authoritative.
    pub admin_seed: Vec<WalletAddress>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            reservation_ttl: Duration::from_secs(90),
            payment_expiry: Duration::from_secs(3600),
            admin_seed: Vec::new(),
        }
    }
}

impl EngineConfig {
    /// Set the reservation TTL.
    pub fn with_reservation_ttl(mut self, ttl: Duration) -> Self {
        self.reservation_ttl = ttl;
        self
    }

    /// Set the payment expiry window.
    pub fn with_payment_expiry(mut self, expiry: Duration) -> Self {
        self.payment_expiry = expiry;
        self
    }

    /// Set the bootstrap admin wallets.
    pub fn with_admin_seed(mut self, wallets: Vec<WalletAddress>) -> Self {
        self.admin_seed = wallets;
        self
    }
}
