//! Whitelists and per-wallet allocations.

use crate::{WalletAddress, WhitelistId};
use serde::{Deserialize, Serialize};

/// A named set of wallet allocations a phase may require membership in.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Whitelist {
    /// Identifier.
    pub id: WhitelistId,
    /// Display name.
    pub name: String,
}

/// One wallet's allocation within a whitelist.
///
/// Remaining allocation is tracked independently of any phase-level
/// per-wallet cap.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WhitelistEntry {
    /// Owning whitelist.
    pub whitelist: WhitelistId,
    /// The wallet this entry belongs to.
    pub wallet: WalletAddress,
    /// Total slots granted to this wallet.
    pub allocation: u32,
    /// Slots consumed so far; incremented at reservation success and
    /// decremented on rollback, mirroring the phase counter.
    pub minted_count: u32,
}

impl WhitelistEntry {
    /// Create an entry with nothing consumed yet.
    pub fn new(whitelist: WhitelistId, wallet: WalletAddress, allocation: u32) -> Self {
        Self {
            whitelist,
            wallet,
            allocation,
            minted_count: 0,
        }
    }

    /// Slots this wallet can still reserve.
    pub fn remaining(&self) -> u32 {
        self.allocation.saturating_sub(self.minted_count)
    }
}
