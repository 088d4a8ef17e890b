//! Phase scheduler: which sale phase is eligible right now.

use mintline_types::{MintPhase, PhaseStatus, PhaseTransitionError, Timestamp};

/// Select the current phase for a collection.
///
/// Among phases whose window contains `now` and whose status is schedulable
/// (`scheduled` or `active`), the lowest position wins. An
/// allocation-exhausted phase with `end_on_allocation` set is treated as
/// ended even inside its time window and the search falls through to the
/// next phase; without that flag the exhausted phase still claims its
/// window, so `reserve` can report `ALLOCATION_EXHAUSTED` rather than
/// `PHASE_CLOSED`.
///
/// `phases` must be sorted by position, as `phases_for_collection` returns
/// them. Returns `None` when minting is closed.
pub fn current_phase(phases: &[MintPhase], now: Timestamp) -> Option<&MintPhase> {
    phases
        .iter()
        .filter(|p| p.status.is_schedulable() && p.window_contains(now))
        .find(|p| !(p.end_on_allocation && p.is_allocation_exhausted()))
}

/// Validate a phase status edit against the transition table.
pub fn validate_transition(
    from: PhaseStatus,
    to: PhaseStatus,
) -> Result<(), PhaseTransitionError> {
    if from.can_transition_to(to) {
        Ok(())
    } else {
        Err(PhaseTransitionError { from, to })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mintline_types::{Amount, CollectionId, PhaseId};

    fn phase(position: u32, start: u64, end: Option<u64>) -> MintPhase {
        MintPhase {
            id: PhaseId(position as u64 + 1),
            collection: CollectionId(1),
            position,
            start_time: Timestamp::from_millis(start),
            end_time: end.map(Timestamp::from_millis),
            price: Amount(1_000),
            fee_rate_min: None,
            fee_rate_max: None,
            max_per_wallet: None,
            max_per_tx: None,
            allocation: None,
            minted_count: 0,
            whitelist: None,
            end_on_allocation: false,
            status: PhaseStatus::Active,
        }
    }

    #[test]
    fn test_no_phase_outside_all_windows() {
        let phases = vec![phase(0, 1_000, Some(2_000))];
        assert!(current_phase(&phases, Timestamp::from_millis(500)).is_none());
        assert!(current_phase(&phases, Timestamp::from_millis(2_000)).is_none());
    }

    #[test]
    fn test_lowest_position_wins_overlap() {
        let phases = vec![phase(0, 0, Some(10_000)), phase(1, 0, None)];
        let current = current_phase(&phases, Timestamp::from_millis(5_000)).unwrap();
        assert_eq!(current.position, 0);
    }

    #[test]
    fn test_exhausted_phase_with_end_on_allocation_falls_through() {
        let mut first = phase(0, 0, Some(10_000));
        first.allocation = Some(5);
        first.minted_count = 5;
        first.end_on_allocation = true;
        let phases = [first, phase(1, 0, None)];

        let current = current_phase(&phases, Timestamp::from_millis(1_000)).unwrap();
        assert_eq!(current.position, 1);
    }

    #[test]
    fn test_exhausted_phase_without_flag_still_claims_window() {
        let mut first = phase(0, 0, Some(10_000));
        first.allocation = Some(5);
        first.minted_count = 5;
        let phases = [first, phase(1, 0, None)];

        // The buyer gets this phase (and an allocation-exhausted rejection)
        // instead of silently minting from the next phase.
        let current = current_phase(&phases, Timestamp::from_millis(1_000)).unwrap();
        assert_eq!(current.position, 0);
    }

    #[test]
    fn test_unschedulable_statuses_are_skipped() {
        for status in [
            PhaseStatus::Draft,
            PhaseStatus::Paused,
            PhaseStatus::Completed,
            PhaseStatus::Cancelled,
        ] {
            let mut p = phase(0, 0, None);
            p.status = status;
            assert!(current_phase(&[p], Timestamp::from_millis(1)).is_none());
        }
    }

    #[test]
    fn test_validate_transition() {
        assert!(validate_transition(PhaseStatus::Draft, PhaseStatus::Scheduled).is_ok());
        let err =
            validate_transition(PhaseStatus::Completed, PhaseStatus::Active).unwrap_err();
        assert_eq!(err.from, PhaseStatus::Completed);
        assert_eq!(err.to, PhaseStatus::Active);
    }
}
