//! Allocation rejection taxonomy.

use thiserror::Error;

/// Typed, non-retriable allocation rejections.
///
/// Each variant is an expected, user-facing outcome of `reserve`, distinct
/// from transient errors: retrying with the same input will fail the same
/// way until conditions change (a new phase opens, capacity is returned to
/// the pool, or a different wallet is used).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum AllocationError {
    /// No phase is currently eligible for this collection.
    #[error("minting is closed: no eligible phase")]
    PhaseClosed,

    /// The phase requires whitelist membership and this wallet has no
    /// remaining whitelist allocation.
    #[error("whitelist allocation exhausted for this wallet")]
    WhitelistExhausted,

    /// The wallet reached the phase's per-wallet mint limit.
    #[error("per-wallet mint limit reached")]
    WalletLimitReached,

    /// The phase's allocation cap is exhausted.
    #[error("phase allocation exhausted")]
    AllocationExhausted,

    /// Every inventory item is minted or actively reserved.
    #[error("no inventory available")]
    NoInventoryAvailable,
}
