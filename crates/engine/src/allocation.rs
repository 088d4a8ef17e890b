//! Allocation guard and reservation manager.
//!
//! `reserve` runs the five preconditions and the item pick as one atomic
//! unit under the collection lock, then applies the optimistic counter
//! increments. `sweep_expired_reservations` and `release_slot` are the
//! symmetric rollback path: every increment a reservation performed is
//! matched by exactly one decrement when it expires or its transaction
//! fails.

use crate::schedule;
use crate::{Engine, EngineError, ReserveError};
use mintline_store::StoreError;
use mintline_types::{
    AllocationError, CollectionId, ItemId, PhaseId, Reservation, ReservationId, ReservationStatus,
    Timestamp, WalletAddress,
};
use std::collections::HashSet;
use tracing::{info, warn};

/// Outcome counts of one expiry sweep.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct SweepReport {
    /// Open reservations examined.
    pub examined: usize,
    /// Holds released back to the pool.
    pub expired: usize,
}

impl Engine {
    /// Reserve one inventory item for a wallet.
    ///
    /// Preconditions, checked atomically per collection:
    ///
    /// 1. a phase is current (and, if `phase_hint` is given, it is that one)
    /// 2. whitelist allocation remains, when the phase requires membership
    /// 3. the wallet is under the phase's per-wallet limit
    /// 4. the phase's allocation cap is not exhausted
    /// 5. an unminted, unheld item exists
    ///
    /// On success the lowest-sequence free item is held, the phase counter
    /// (and whitelist counter) are incremented optimistically so concurrent
    /// reservers see reduced capacity immediately, and the reservation is
    /// returned with its TTL set.
    pub fn reserve(
        &self,
        collection: CollectionId,
        wallet: &WalletAddress,
        phase_hint: Option<PhaseId>,
    ) -> Result<Reservation, ReserveError> {
        let lock = self.locks.for_collection(collection);
        let _guard = lock.lock();
        let now = self.clock.now();

        if self.store.collection(collection)?.is_none() {
            return Err(ReserveError::UnknownCollection(collection));
        }

        let phases = self.store.phases_for_collection(collection)?;
        let Some(current) = schedule::current_phase(&phases, now) else {
            return Err(AllocationError::PhaseClosed.into());
        };
        if let Some(hint) = phase_hint {
            if hint != current.id {
                return Err(AllocationError::PhaseClosed.into());
            }
        }
        let mut phase = current.clone();

        let mut whitelist_entry = None;
        if let Some(whitelist) = phase.whitelist {
            match self.store.whitelist_entry(whitelist, wallet)? {
                Some(entry) if entry.remaining() > 0 => whitelist_entry = Some(entry),
                _ => return Err(AllocationError::WhitelistExhausted.into()),
            }
        }

        let reservations = self.store.reservations_for_collection(collection)?;

        if let Some(cap) = phase.max_per_wallet {
            let held = reservations
                .iter()
                .filter(|r| {
                    r.phase == Some(phase.id)
                        && &r.wallet == wallet
                        && r.counts_against_wallet(now)
                })
                .count();
            if held as u32 >= cap {
                return Err(AllocationError::WalletLimitReached.into());
            }
        }

        if phase.is_allocation_exhausted() {
            return Err(AllocationError::AllocationExhausted.into());
        }

        // Deterministic lowest-sequence pick. Lapsed holds no longer block,
        // unless a broadcast transaction keeps them owned by the poller.
        let mut held_items: HashSet<ItemId> = HashSet::new();
        for r in &reservations {
            if r.is_active(now) {
                held_items.insert(r.item);
            } else if r.status == ReservationStatus::Reserved && self.hold_is_protected(r.id)? {
                held_items.insert(r.item);
            }
        }
        let item = self
            .store
            .items_for_collection(collection)?
            .into_iter()
            .find(|i| !i.minted && !held_items.contains(&i.id));
        let Some(item) = item else {
            return Err(AllocationError::NoInventoryAvailable.into());
        };

        // Counters before the reservation row: a crash in between leaks one
        // slot until reconciliation, but can never over-admit.
        phase.minted_count += 1;
        self.store.put_phase(&phase)?;
        if let Some(mut entry) = whitelist_entry {
            entry.minted_count += 1;
            self.store.put_whitelist_entry(&entry)?;
        }

        let reservation = Reservation {
            id: ReservationId::generate(),
            collection,
            item: item.id,
            wallet: wallet.clone(),
            phase: Some(phase.id),
            status: ReservationStatus::Reserved,
            reserved_at: now,
            expires_at: now.saturating_add(self.config.reservation_ttl),
            completed_at: None,
        };
        self.store.put_reservation(&reservation)?;

        info!(
            reservation = %reservation.id,
            item = %item.id,
            wallet = %wallet,
            phase = %phase.id,
            "reserved inventory item"
        );
        Ok(reservation)
    }

    /// Expire lapsed holds and return their slots to the pool.
    ///
    /// Idempotent and safe to run concurrently with itself: each release is
    /// re-checked under the collection lock and guarded by the hold still
    /// being in `Reserved` status. Holds with a broadcast transaction
    /// attached are left for the reconciliation poller.
    pub fn sweep_expired_reservations(&self) -> Result<SweepReport, EngineError> {
        let mut report = SweepReport::default();
        for stale in self.store.open_reservations()? {
            let lock = self.locks.for_collection(stale.collection);
            let _guard = lock.lock();
            let now = self.clock.now();

            let Some(reservation) = self.store.reservation(stale.id)? else {
                continue;
            };
            report.examined += 1;
            if !reservation.is_lapsed(now) {
                continue;
            }
            if let Some(record) = self.store.record_for_reservation(reservation.id)? {
                if record.is_terminal() || record.lifecycle.broadcast_txid().is_some() {
                    continue;
                }
            }
            self.release_slot(reservation, ReservationStatus::Expired)?;
            report.expired += 1;
        }
        Ok(report)
    }

    /// Whether a hold's mint attempt has a transaction on the wire.
    ///
    /// Such holds survive TTL lapse: the reconciliation poller owns them
    /// until the record reaches a terminal state, so the item must not be
    /// resold underneath a commit that is already broadcast or confirmed.
    pub(crate) fn hold_is_protected(
        &self,
        reservation: ReservationId,
    ) -> Result<bool, StoreError> {
        Ok(match self.store.record_for_reservation(reservation)? {
            Some(record) => {
                !record.is_terminal() && record.lifecycle.broadcast_txid().is_some()
            }
            None => false,
        })
    }

    /// Release a hold and roll back its counter increments.
    ///
    /// Caller holds the collection lock. A no-op when the reservation is
    /// already terminal, so firing a rollback twice never double-decrements.
    pub(crate) fn release_slot(
        &self,
        mut reservation: Reservation,
        to: ReservationStatus,
    ) -> Result<(), StoreError> {
        debug_assert!(to == ReservationStatus::Expired || to == ReservationStatus::Cancelled);
        if reservation.status.is_terminal() {
            return Ok(());
        }
        reservation.status = to;
        self.store.put_reservation(&reservation)?;

        if let Some(phase_id) = reservation.phase {
            if let Some(mut phase) = self.store.phase(phase_id)? {
                phase.minted_count = phase.minted_count.saturating_sub(1);
                self.store.put_phase(&phase)?;
                if let Some(whitelist) = phase.whitelist {
                    if let Some(mut entry) =
                        self.store.whitelist_entry(whitelist, &reservation.wallet)?
                    {
                        entry.minted_count = entry.minted_count.saturating_sub(1);
                        self.store.put_whitelist_entry(&entry)?;
                    }
                }
            }
        }

        warn!(
            reservation = %reservation.id,
            item = %reservation.item,
            status = %to,
            "released reservation, slot returned to pool"
        );
        Ok(())
    }

    /// Complete a hold and flag its item minted.
    ///
    /// Caller holds the collection lock. The item flag flips here and
    /// nowhere else; it never flips back. A released reservation stays
    /// released: terminal states never mutate further, even when the mint
    /// landed on-chain after the hold was given up.
    pub(crate) fn finalize_slot(
        &self,
        mut reservation: Reservation,
        item: ItemId,
        now: Timestamp,
    ) -> Result<(), StoreError> {
        match reservation.status {
            ReservationStatus::Reserved => {
                reservation.status = ReservationStatus::Completed;
                reservation.completed_at = Some(now);
                self.store.put_reservation(&reservation)?;
            }
            ReservationStatus::Completed => {}
            ReservationStatus::Expired | ReservationStatus::Cancelled => {
                warn!(
                    reservation = %reservation.id,
                    item = %item,
                    status = %reservation.status,
                    "mint completed against a released reservation"
                );
            }
        }
        if let Some(mut row) = self.store.item(item)? {
            if !row.minted {
                row.minted = true;
                self.store.put_item(&row)?;
            }
        }
        info!(reservation = %reservation.id, item = %item, "mint finalized");
        Ok(())
    }
}
