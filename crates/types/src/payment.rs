//! Pre-paid credit payments: an adjacent ledger sharing the poll-and-finalize
//! pattern with mint records, but with additive (not unique-item) semantics.

use crate::{Amount, PaymentId, Timestamp, TxId, WalletAddress};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Lifecycle status of a pending payment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentStatus {
    /// Waiting for the payment transaction to confirm.
    Pending,
    /// Confirmed; credits were granted. Terminal.
    Completed,
    /// The transaction errored or was dropped. Terminal.
    Failed,
    /// No confirmation arrived before the expiry deadline. Terminal.
    Expired,
}

impl PaymentStatus {
    /// Whether this status can never change again.
    pub fn is_terminal(&self) -> bool {
        !matches!(self, PaymentStatus::Pending)
    }
}

impl fmt::Display for PaymentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            PaymentStatus::Pending => "pending",
            PaymentStatus::Completed => "completed",
            PaymentStatus::Failed => "failed",
            PaymentStatus::Expired => "expired",
        };
        f.write_str(s)
    }
}

/// A claimed credits purchase awaiting on-chain verification.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PendingPayment {
    /// Identifier.
    pub id: PaymentId,
    /// Paying wallet.
    pub wallet: WalletAddress,
    /// Amount the transaction must transfer.
    pub expected_amount: Amount,
    /// Expected currency/network tag ("btc", "sol", ...).
    pub network: String,
    /// Credits granted when the payment completes.
    pub credits: u64,
    /// Current status.
    pub status: PaymentStatus,
    /// The transaction the buyer claims pays for this.
    pub observed_txid: Option<TxId>,
    /// Last confirmation depth observed by the poller.
    pub confirmations: u64,
    /// When the poller last queried chain state.
    pub last_checked: Option<Timestamp>,
    /// Creation time.
    pub created_at: Timestamp,
    /// Deadline after which an unconfirmed payment is marked expired.
    pub expires_at: Timestamp,
}

impl PendingPayment {
    /// Whether the record can never change again.
    pub fn is_terminal(&self) -> bool {
        self.status.is_terminal()
    }

    /// Whether the expiry deadline has passed.
    pub fn is_past_deadline(&self, now: Timestamp) -> bool {
        now >= self.expires_at
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_only_pending_is_mutable() {
        assert!(!PaymentStatus::Pending.is_terminal());
        assert!(PaymentStatus::Completed.is_terminal());
        assert!(PaymentStatus::Failed.is_terminal());
        assert!(PaymentStatus::Expired.is_terminal());
    }
}
