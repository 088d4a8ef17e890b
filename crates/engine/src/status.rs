//! Buyer-facing status queries.

use crate::{Engine, EngineError};
use mintline_types::{
    ContentId, ItemId, Lifecycle, MintRecordId, ReservationId, ReservationStatus, Timestamp, TxId,
};
use serde::Serialize;

/// A point-in-time view of one reservation and its mint attempt.
///
/// Derived entirely from stored rows; safe to poll.
#[derive(Debug, Clone, Serialize)]
pub struct StatusReport {
    /// Reservation id.
    pub reservation: ReservationId,
    /// Effective reservation status. A lapsed hold reports `expired` even
    /// before the sweep has materialized it.
    pub status: ReservationStatus,
    /// The held item.
    pub item: ItemId,
    /// When the hold lapses, for countdown display.
    pub expires_at: Timestamp,
    /// Lifecycle state label, when a mint attempt exists.
    pub state: Option<&'static str>,
    /// The transaction currently being polled, if any.
    pub txid: Option<TxId>,
    /// Last confirmation depth the poller observed.
    pub confirmations: u64,
    /// Content id, once the reveal is constructed.
    pub content_id: Option<ContentId>,
    /// Failure payload, when the attempt failed.
    pub error: Option<String>,
}

impl Engine {
    /// Report the state of one reservation and its mint attempt.
    pub fn reservation_status(&self, id: ReservationId) -> Result<StatusReport, EngineError> {
        let reservation = self
            .store
            .reservation(id)?
            .ok_or(EngineError::UnknownReservation(id))?;
        let now = self.clock.now();

        let status = if reservation.is_lapsed(now) {
            ReservationStatus::Expired
        } else {
            reservation.status
        };

        let mut report = StatusReport {
            reservation: reservation.id,
            status,
            item: reservation.item,
            expires_at: reservation.expires_at,
            state: None,
            txid: None,
            confirmations: 0,
            content_id: None,
            error: None,
        };

        if let Some(record) = self.store.record_for_reservation(id)? {
            report.state = Some(record.lifecycle.state_label());
            report.txid = record.lifecycle.in_flight_txid().cloned();
            report.confirmations = record.confirmations;
            report.error = record.error.clone();
            if let Lifecycle::CommitReveal(state) = &record.lifecycle {
                report.content_id = state.content_id.clone();
                // Terminal success keeps pointing at the reveal.
                if report.txid.is_none() && record.lifecycle.is_success() {
                    report.txid = state.reveal_txid.clone();
                }
            }
            if let Lifecycle::SubmitConfirm(state) = &record.lifecycle {
                if report.txid.is_none() && record.lifecycle.is_success() {
                    report.txid = state.signature.clone();
                }
            }
            // A hold with a live mint attempt does not report expired.
            if !record.is_terminal() && record.lifecycle.in_flight_txid().is_some() {
                report.status = reservation.status;
            }
        }

        Ok(report)
    }

    /// Report status by mint record id instead of reservation id.
    pub fn record_status(&self, id: MintRecordId) -> Result<StatusReport, EngineError> {
        let record = self.load_record(id)?;
        self.reservation_status(record.reservation)
    }
}
