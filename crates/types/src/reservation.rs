//! Reservations: the concurrency-control primitive.

use crate::{CollectionId, ItemId, PhaseId, ReservationId, Timestamp, WalletAddress};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Lifecycle status of a reservation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReservationStatus {
    /// Holding an item, waiting for the buyer's transaction.
    Reserved,
    /// The tied mint transaction finalized; terminal.
    Completed,
    /// Rolled back because the transaction failed; terminal.
    Cancelled,
    /// The hold timed out unsigned; terminal.
    Expired,
}

impl ReservationStatus {
    /// Whether this status can never change again.
    pub fn is_terminal(&self) -> bool {
        !matches!(self, ReservationStatus::Reserved)
    }
}

impl fmt::Display for ReservationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ReservationStatus::Reserved => "reserved",
            ReservationStatus::Completed => "completed",
            ReservationStatus::Cancelled => "cancelled",
            ReservationStatus::Expired => "expired",
        };
        f.write_str(s)
    }
}

/// A short-lived exclusive hold on one inventory item for one wallet.
///
/// At most one reservation per item may be in `Reserved` or `Completed`
/// status at any time; the allocation guard enforces this under the
/// collection lock.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Reservation {
    /// Identifier.
    pub id: ReservationId,
    /// Owning collection.
    pub collection: CollectionId,
    /// The item being held.
    pub item: ItemId,
    /// The wallet holding it.
    pub wallet: WalletAddress,
    /// The phase the hold was granted under, if any.
    pub phase: Option<PhaseId>,
    /// Current status.
    pub status: ReservationStatus,
    /// When the hold was granted.
    pub reserved_at: Timestamp,
    /// When the hold lapses if no transaction is attached.
    pub expires_at: Timestamp,
    /// When the hold converted to a completed mint.
    pub completed_at: Option<Timestamp>,
}

impl Reservation {
    /// Whether this reservation still blocks its item.
    ///
    /// A `Reserved` row past its TTL is inert for allocation purposes even
    /// before the sweep physically expires it.
    pub fn is_active(&self, now: Timestamp) -> bool {
        match self.status {
            ReservationStatus::Reserved => now < self.expires_at,
            ReservationStatus::Completed => true,
            ReservationStatus::Cancelled | ReservationStatus::Expired => false,
        }
    }

    /// Whether this row counts against per-wallet limits.
    pub fn counts_against_wallet(&self, now: Timestamp) -> bool {
        self.is_active(now)
    }

    /// Whether the hold has lapsed but not yet been swept.
    pub fn is_lapsed(&self, now: Timestamp) -> bool {
        self.status == ReservationStatus::Reserved && now >= self.expires_at
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn reservation(status: ReservationStatus) -> Reservation {
        Reservation {
            id: ReservationId(1),
            collection: CollectionId(1),
            item: ItemId::new(CollectionId(1), 0),
            wallet: WalletAddress::new("w1"),
            phase: Some(PhaseId(1)),
            status,
            reserved_at: Timestamp::from_millis(0),
            expires_at: Timestamp::from_millis(60_000),
            completed_at: None,
        }
    }

    #[test]
    fn test_reserved_past_ttl_is_inert() {
        let r = reservation(ReservationStatus::Reserved);
        assert!(r.is_active(Timestamp::from_millis(59_999)));
        assert!(!r.is_active(Timestamp::from_millis(60_000)));
        assert!(r.is_lapsed(Timestamp::from_millis(60_000)));
    }

    #[test]
    fn test_completed_stays_active_forever() {
        let r = reservation(ReservationStatus::Completed);
        assert!(r.is_active(Timestamp::from_millis(u64::MAX)));
        assert!(!r.is_lapsed(Timestamp::from_millis(u64::MAX)));
    }

    #[test]
    fn test_terminal_failures_release_the_item() {
        for status in [ReservationStatus::Cancelled, ReservationStatus::Expired] {
            let r = reservation(status);
            assert!(!r.is_active(Timestamp::from_millis(0)));
            assert!(status.is_terminal());
        }
    }
}
