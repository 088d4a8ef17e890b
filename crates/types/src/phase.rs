//! Sale phases and their status transition table.

use crate::{Amount, CollectionId, PhaseId, Timestamp, WhitelistId};
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Administrative status of a phase.
///
/// Status edits go through [`PhaseStatus::can_transition_to`]; illegal
/// transitions are rejected, never silently coerced.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PhaseStatus {
    /// Being set up, not yet visible to the scheduler.
    Draft,
    /// Published, waiting for its window to open.
    Scheduled,
    /// Eligible for minting (subject to its time window).
    Active,
    /// Temporarily withheld from the scheduler.
    Paused,
    /// Finished; terminal.
    Completed,
    /// Abandoned; terminal.
    Cancelled,
}

impl PhaseStatus {
    /// Whether this status can never change again.
    pub fn is_terminal(&self) -> bool {
        matches!(self, PhaseStatus::Completed | PhaseStatus::Cancelled)
    }

    /// Whether the scheduler may select a phase in this status.
    pub fn is_schedulable(&self) -> bool {
        matches!(self, PhaseStatus::Scheduled | PhaseStatus::Active)
    }

    /// The status transition table.
    pub fn can_transition_to(&self, next: PhaseStatus) -> bool {
        use PhaseStatus::*;
        matches!(
            (self, next),
            (Draft, Scheduled | Active | Cancelled)
                | (Scheduled, Active | Paused | Cancelled)
                | (Active, Paused | Completed | Cancelled)
                | (Paused, Active | Completed | Cancelled)
        )
    }
}

impl fmt::Display for PhaseStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            PhaseStatus::Draft => "draft",
            PhaseStatus::Scheduled => "scheduled",
            PhaseStatus::Active => "active",
            PhaseStatus::Paused => "paused",
            PhaseStatus::Completed => "completed",
            PhaseStatus::Cancelled => "cancelled",
        };
        f.write_str(s)
    }
}

/// Rejected phase status edit.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("illegal phase transition {from} -> {to}")]
pub struct PhaseTransitionError {
    /// Status the phase was in.
    pub from: PhaseStatus,
    /// Status the edit asked for.
    pub to: PhaseStatus,
}

/// A time-boxed sale window with its own price, caps, and optional whitelist.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MintPhase {
    /// Identifier.
    pub id: PhaseId,
    /// Owning collection.
    pub collection: CollectionId,
    /// Scheduler ordering; lower positions win ties.
    pub position: u32,
    /// Window open time.
    pub start_time: Timestamp,
    /// Window close time; `None` means open-ended.
    pub end_time: Option<Timestamp>,
    /// Mint price per item.
    pub price: Amount,
    /// Minimum acceptable fee rate (commit/reveal chain only).
    pub fee_rate_min: Option<u64>,
    /// Maximum acceptable fee rate (commit/reveal chain only).
    pub fee_rate_max: Option<u64>,
    /// Cap on mints per wallet in this phase.
    pub max_per_wallet: Option<u32>,
    /// Cap on mints per transaction.
    pub max_per_tx: Option<u32>,
    /// Total slots available to this phase; `None` means uncapped.
    pub allocation: Option<u32>,
    /// Running slot counter. Incremented optimistically at reservation
    /// success, decremented when the underlying transaction fails or the
    /// reservation expires.
    pub minted_count: u32,
    /// Whitelist gating this phase, if any.
    pub whitelist: Option<WhitelistId>,
    /// Treat the phase as ended once its allocation is exhausted, even if
    /// its time window has not elapsed.
    pub end_on_allocation: bool,
    /// Administrative status.
    pub status: PhaseStatus,
}

impl MintPhase {
    /// Whether `now` falls inside the phase's time window.
    pub fn window_contains(&self, now: Timestamp) -> bool {
        if now < self.start_time {
            return false;
        }
        match self.end_time {
            Some(end) => now < end,
            None => true,
        }
    }

    /// Slots still available, `None` when uncapped.
    pub fn allocation_remaining(&self) -> Option<u32> {
        self.allocation
            .map(|cap| cap.saturating_sub(self.minted_count))
    }

    /// Whether the allocation cap has been reached.
    pub fn is_allocation_exhausted(&self) -> bool {
        matches!(self.allocation_remaining(), Some(0))
    }
}
