//! Record transition entry points for the reconciliation poller.
//!
//! Every transition is guarded by the record's current lifecycle status, so
//! replaying a poll outcome is harmless: a transition that already happened
//! reports `Ok(false)` and changes nothing. Terminal records never regress.

use crate::{Engine, EngineError};
use mintline_types::{
    CommitRevealStatus, Lifecycle, MintRecord, MintRecordId, ReservationStatus,
    SubmitConfirmStatus,
};
use tracing::{info, warn};

impl Engine {
    /// Advance a commit/reveal record from `commit_broadcast` to
    /// `commit_confirmed`.
    ///
    /// Returns `Ok(false)` when the record is not in `commit_broadcast`.
    pub fn mark_commit_confirmed(&self, record: MintRecordId) -> Result<bool, EngineError> {
        let mut row = self.load_record(record)?;
        let now = self.clock.now();
        match &mut row.lifecycle {
            Lifecycle::CommitReveal(state)
                if state.status == CommitRevealStatus::CommitBroadcast =>
            {
                state.status = CommitRevealStatus::CommitConfirmed;
                state.commit_confirmed_at = Some(now);
            }
            _ => return Ok(false),
        }
        row.updated_at = now;
        self.store.put_record(&row)?;
        info!(record = %row.id, "commit confirmed");
        Ok(true)
    }

    /// Drive a record to its success terminal state.
    ///
    /// Completes the reservation and flags the inventory item minted in the
    /// same locked section. Returns `Ok(false)` when the record is already
    /// terminal. A reservation that was already released is not resurrected.
    pub fn complete_record(&self, record: MintRecordId) -> Result<bool, EngineError> {
        let probe = self.load_record(record)?;
        let lock = self.locks.for_collection(probe.collection);
        let _guard = lock.lock();

        let mut row = self.load_record(record)?;
        if row.is_terminal() {
            return Ok(false);
        }
        let now = self.clock.now();
        match &mut row.lifecycle {
            Lifecycle::CommitReveal(state) => {
                state.status = CommitRevealStatus::Completed;
                state.reveal_confirmed_at = Some(now);
            }
            Lifecycle::SubmitConfirm(state) => {
                state.status = SubmitConfirmStatus::Confirmed;
                state.confirmed_at = Some(now);
            }
        }
        row.updated_at = now;

        let item = match row.item {
            Some(item) => Some(item),
            None => {
                // Chain-native sequential allocation: the chain chose the
                // item, bind the lowest unflagged one.
                let next = self
                    .store
                    .items_for_collection(row.collection)?
                    .into_iter()
                    .find(|i| !i.minted)
                    .map(|i| i.id);
                if next.is_none() {
                    warn!(record = %row.id, "completed record has no unflagged item to bind");
                }
                row.item = next;
                next
            }
        };
        self.store.put_record(&row)?;

        match (self.store.reservation(row.reservation)?, item) {
            (Some(reservation), Some(item)) => self.finalize_slot(reservation, item, now)?,
            (Some(mut reservation), None) => {
                if reservation.status == ReservationStatus::Reserved {
                    reservation.status = ReservationStatus::Completed;
                    reservation.completed_at = Some(now);
                    self.store.put_reservation(&reservation)?;
                }
            }
            (None, _) => {}
        }

        info!(record = %row.id, state = %row.lifecycle, "mint record completed");
        Ok(true)
    }

    /// Drive a record to its failure terminal state and roll back its
    /// reservation.
    ///
    /// Returns `Ok(false)` when the record is already terminal; the rollback
    /// then does not run again.
    pub fn fail_record(&self, record: MintRecordId, reason: &str) -> Result<bool, EngineError> {
        let probe = self.load_record(record)?;
        let lock = self.locks.for_collection(probe.collection);
        let _guard = lock.lock();

        let mut row = self.load_record(record)?;
        if row.is_terminal() {
            return Ok(false);
        }
        let now = self.clock.now();
        match &mut row.lifecycle {
            Lifecycle::CommitReveal(state) => state.status = CommitRevealStatus::Failed,
            Lifecycle::SubmitConfirm(state) => state.status = SubmitConfirmStatus::Failed,
        }
        row.error = Some(reason.to_string());
        row.updated_at = now;
        self.store.put_record(&row)?;

        if let Some(reservation) = self.store.reservation(row.reservation)? {
            self.release_slot(reservation, ReservationStatus::Cancelled)?;
        }

        warn!(record = %row.id, reason, "mint record failed");
        Ok(true)
    }

    /// Record the outcome of one chain poll.
    ///
    /// `confirmations` is `Some` when the transaction was found (resets the
    /// absent-poll counter) and `None` when it was not (increments it).
    /// Returns the updated absent-poll count so the caller can apply its
    /// retry ceiling.
    pub fn note_poll(
        &self,
        record: MintRecordId,
        confirmations: Option<u64>,
    ) -> Result<u32, EngineError> {
        let mut row = self.load_record(record)?;
        row.last_checked = Some(self.clock.now());
        match confirmations {
            Some(depth) => {
                row.confirmations = depth;
                row.poll_attempts = 0;
            }
            None => row.poll_attempts += 1,
        }
        row.updated_at = self.clock.now();
        self.store.put_record(&row)?;
        Ok(row.poll_attempts)
    }

    /// Fetch one record for status queries.
    pub(crate) fn load_record(&self, id: MintRecordId) -> Result<MintRecord, EngineError> {
        self.store
            .record(id)?
            .ok_or(EngineError::UnknownRecord(id))
    }
}
