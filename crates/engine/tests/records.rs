//! Poller-facing record transitions: idempotency, rollback, and the
//! terminal-state guarantees.

use mintline_test_helpers::{harness, Harness};
use mintline_types::{
    Amount, ChainModel, Clock, CommitRevealState, CommitRevealStatus, Lifecycle, MintRecord,
    MintRecordId, Reservation, ReservationStatus, SubmitConfirmState, TxId, WalletAddress,
};

fn seeded_record(h: &Harness, reservation: &Reservation, lifecycle: Lifecycle) -> MintRecord {
    let now = h.clock.now();
    let record = MintRecord {
        id: MintRecordId::generate(),
        collection: reservation.collection,
        item: Some(reservation.item),
        reservation: reservation.id,
        minter: reservation.wallet.clone(),
        recipient: reservation.wallet.clone(),
        phase: reservation.phase,
        price: Amount(10_000),
        error: None,
        lifecycle,
        confirmations: 0,
        poll_attempts: 0,
        last_checked: None,
        created_at: now,
        updated_at: now,
    };
    h.engine.store().put_record(&record).unwrap();
    record
}

fn broadcast_commit_lifecycle() -> Lifecycle {
    let mut state = CommitRevealState::new();
    state.status = CommitRevealStatus::CommitBroadcast;
    state.commit_txid = Some(TxId::new("commit-tx"));
    Lifecycle::CommitReveal(state)
}

#[test]
fn test_mark_commit_confirmed_once() {
    let h = harness();
    let collection = h.seed_collection(ChainModel::CommitReveal, 1);
    h.seed_open_phase(collection.id);
    let reservation = h
        .engine
        .reserve(collection.id, &WalletAddress::new("w1"), None)
        .unwrap();
    let record = seeded_record(&h, &reservation, broadcast_commit_lifecycle());

    assert!(h.engine.mark_commit_confirmed(record.id).unwrap());
    // Replay is a no-op.
    assert!(!h.engine.mark_commit_confirmed(record.id).unwrap());

    let row = h.engine.store().record(record.id).unwrap().unwrap();
    assert_eq!(row.lifecycle.state_label(), "commit_confirmed");
}

#[test]
fn test_complete_record_flags_item_and_reservation() {
    let h = harness();
    let collection = h.seed_collection(ChainModel::CommitReveal, 1);
    h.seed_open_phase(collection.id);
    let reservation = h
        .engine
        .reserve(collection.id, &WalletAddress::new("w1"), None)
        .unwrap();
    let record = seeded_record(&h, &reservation, broadcast_commit_lifecycle());

    assert!(h.engine.complete_record(record.id).unwrap());
    assert!(!h.engine.complete_record(record.id).unwrap());

    let item = h.engine.store().item(reservation.item).unwrap().unwrap();
    assert!(item.minted);
    assert_eq!(
        h.reservation(reservation.id).status,
        ReservationStatus::Completed
    );
}

#[tokio::test]
async fn test_completed_record_never_resurrects_released_hold() {
    let h = harness();
    let collection = h.seed_collection(ChainModel::SubmitConfirm, 1);
    h.seed_open_phase(collection.id);
    let wallet = WalletAddress::new("w1");
    let r = h.engine.reserve(collection.id, &wallet, None).unwrap();
    let record = h
        .engine
        .submit_mint(r.id, wallet, b"signed-tx", None)
        .await
        .unwrap();

    // The hold was released while the transaction was in flight.
    let mut row = h.reservation(r.id);
    row.status = ReservationStatus::Expired;
    h.engine.store().put_reservation(&row).unwrap();

    assert!(h.engine.complete_record(record.id).unwrap());

    // The mint lands on the item, but the released hold stays released.
    assert_eq!(h.reservation(r.id).status, ReservationStatus::Expired);
    let item = h.engine.store().item(r.item).unwrap().unwrap();
    assert!(item.minted);
}

#[test]
fn test_fail_record_rolls_back_exactly_once() {
    let h = harness();
    let collection = h.seed_collection(ChainModel::SubmitConfirm, 2);
    let phase = h.seed_phase(collection.id, |spec| spec.allocation = Some(5));
    let reservation = h
        .engine
        .reserve(collection.id, &WalletAddress::new("w1"), None)
        .unwrap();
    let record = seeded_record(
        &h,
        &reservation,
        Lifecycle::SubmitConfirm(SubmitConfirmState::new()),
    );
    assert_eq!(h.phase(phase.id).minted_count, 1);

    assert!(h.engine.fail_record(record.id, "dropped from mempool").unwrap());
    assert_eq!(h.phase(phase.id).minted_count, 0);
    assert_eq!(
        h.reservation(reservation.id).status,
        ReservationStatus::Cancelled
    );

    // Replaying the failure must not decrement again.
    assert!(!h.engine.fail_record(record.id, "again").unwrap());
    assert_eq!(h.phase(phase.id).minted_count, 0);

    let row = h.engine.store().record(record.id).unwrap().unwrap();
    assert_eq!(row.error.as_deref(), Some("dropped from mempool"));
}

#[test]
fn test_terminal_record_never_regresses() {
    let h = harness();
    let collection = h.seed_collection(ChainModel::CommitReveal, 1);
    h.seed_open_phase(collection.id);
    let reservation = h
        .engine
        .reserve(collection.id, &WalletAddress::new("w1"), None)
        .unwrap();
    let record = seeded_record(&h, &reservation, broadcast_commit_lifecycle());

    assert!(h.engine.complete_record(record.id).unwrap());
    assert!(!h.engine.fail_record(record.id, "late failure").unwrap());
    assert!(!h.engine.mark_commit_confirmed(record.id).unwrap());

    let row = h.engine.store().record(record.id).unwrap().unwrap();
    assert!(row.lifecycle.is_success());
}

#[test]
fn test_note_poll_counts_absences() {
    let h = harness();
    let collection = h.seed_collection(ChainModel::CommitReveal, 1);
    h.seed_open_phase(collection.id);
    let reservation = h
        .engine
        .reserve(collection.id, &WalletAddress::new("w1"), None)
        .unwrap();
    let record = seeded_record(&h, &reservation, broadcast_commit_lifecycle());

    assert_eq!(h.engine.note_poll(record.id, None).unwrap(), 1);
    assert_eq!(h.engine.note_poll(record.id, None).unwrap(), 2);
    // A sighting resets the absence counter.
    assert_eq!(h.engine.note_poll(record.id, Some(3)).unwrap(), 0);

    let row = h.engine.store().record(record.id).unwrap().unwrap();
    assert_eq!(row.confirmations, 3);
    assert!(row.last_checked.is_some());
}
