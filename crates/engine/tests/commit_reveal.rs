//! Commit/reveal driver behavior: idempotent broadcasts, the persisted
//! reveal template, and the state guards.

use mintline_engine::SubmitError;
use mintline_test_helpers::harness;
use mintline_types::{
    ChainModel, CommitRevealStatus, ContentId, Lifecycle, ReservationStatus, WalletAddress,
};
use std::time::Duration;

#[tokio::test]
async fn test_commit_then_reveal_happy_path() {
    let h = harness();
    let collection = h.seed_collection(ChainModel::CommitReveal, 1);
    h.seed_open_phase(collection.id);
    let wallet = WalletAddress::new("w1");
    let reservation = h.engine.reserve(collection.id, &wallet, None).unwrap();

    let record = h
        .engine
        .submit_commit(reservation.id, wallet.clone(), b"commit-bytes")
        .await
        .unwrap();
    assert_eq!(record.lifecycle.state_label(), "commit_broadcast");
    let commit_txid = record.lifecycle.in_flight_txid().unwrap().clone();

    assert!(h.engine.mark_commit_confirmed(record.id).unwrap());

    let outcome = h.engine.submit_reveal(reservation.id).await.unwrap();
    assert_ne!(outcome.txid, commit_txid);

    let row = h.engine.store().record(record.id).unwrap().unwrap();
    assert_eq!(row.lifecycle.state_label(), "reveal_broadcast");
    assert_eq!(row.lifecycle.in_flight_txid(), Some(&outcome.txid));
}

#[tokio::test]
async fn test_commit_resubmission_returns_existing_record() {
    let h = harness();
    let collection = h.seed_collection(ChainModel::CommitReveal, 1);
    h.seed_open_phase(collection.id);
    let wallet = WalletAddress::new("w1");
    let reservation = h.engine.reserve(collection.id, &wallet, None).unwrap();

    let first = h
        .engine
        .submit_commit(reservation.id, wallet.clone(), b"commit-bytes")
        .await
        .unwrap();
    let second = h
        .engine
        .submit_commit(reservation.id, wallet.clone(), b"commit-bytes")
        .await
        .unwrap();

    assert_eq!(first.id, second.id);
    assert_eq!(
        first.lifecycle.in_flight_txid(),
        second.lifecycle.in_flight_txid()
    );
    assert_eq!(h.chain.broadcasts().len(), 1);
}

#[tokio::test]
async fn test_reveal_is_idempotent() {
    let h = harness();
    let collection = h.seed_collection(ChainModel::CommitReveal, 1);
    h.seed_open_phase(collection.id);
    let wallet = WalletAddress::new("w1");
    let reservation = h.engine.reserve(collection.id, &wallet, None).unwrap();
    let record = h
        .engine
        .submit_commit(reservation.id, wallet.clone(), b"commit-bytes")
        .await
        .unwrap();
    h.engine.mark_commit_confirmed(record.id).unwrap();

    let first = h.engine.submit_reveal(reservation.id).await.unwrap();
    let broadcasts_after_first = h.chain.broadcasts().len();
    let second = h.engine.submit_reveal(reservation.id).await.unwrap();

    assert_eq!(first, second);
    assert_eq!(h.chain.broadcasts().len(), broadcasts_after_first);
}

#[tokio::test]
async fn test_reveal_before_confirm_is_rejected() {
    let h = harness();
    let collection = h.seed_collection(ChainModel::CommitReveal, 1);
    h.seed_open_phase(collection.id);
    let wallet = WalletAddress::new("w1");
    let reservation = h.engine.reserve(collection.id, &wallet, None).unwrap();
    h.engine
        .submit_commit(reservation.id, wallet.clone(), b"commit-bytes")
        .await
        .unwrap();

    let err = h.engine.submit_reveal(reservation.id).await.unwrap_err();
    assert!(matches!(
        err,
        SubmitError::InvalidState {
            expected: "commit_confirmed",
            found: "commit_broadcast",
        }
    ));
}

#[tokio::test]
async fn test_reveal_resumes_from_persisted_template() {
    let h = harness();
    let collection = h.seed_collection(ChainModel::CommitReveal, 1);
    h.seed_open_phase(collection.id);
    let wallet = WalletAddress::new("w1");
    let reservation = h.engine.reserve(collection.id, &wallet, None).unwrap();
    let record = h
        .engine
        .submit_commit(reservation.id, wallet.clone(), b"commit-bytes")
        .await
        .unwrap();
    h.engine.mark_commit_confirmed(record.id).unwrap();

    // Simulate a crash after template persistence, before broadcast.
    let mut row = h.engine.store().record(record.id).unwrap().unwrap();
    if let Lifecycle::CommitReveal(state) = &mut row.lifecycle {
        state.status = CommitRevealStatus::RevealCreated;
        state.reveal_raw = Some(hex::encode(b"persisted-reveal"));
        state.content_id = Some(ContentId::new("deadbeefi0"));
        state.reveal_pubkey = Some("aa".repeat(32));
    }
    h.engine.store().put_record(&row).unwrap();

    let outcome = h.engine.submit_reveal(reservation.id).await.unwrap();
    assert_eq!(outcome.content_id.as_str(), "deadbeefi0");
    assert_eq!(
        h.chain.broadcasts().last(),
        Some(&mintline_chain::MockChain::txid_for(b"persisted-reveal"))
    );
}

#[tokio::test]
async fn test_commit_on_lapsed_hold_is_rejected() {
    let h = harness();
    let collection = h.seed_collection(ChainModel::CommitReveal, 1);
    h.seed_open_phase(collection.id);
    let wallet = WalletAddress::new("w1");
    let reservation = h.engine.reserve(collection.id, &wallet, None).unwrap();

    h.clock.advance(Duration::from_secs(3600));
    let err = h
        .engine
        .submit_commit(reservation.id, wallet, b"commit-bytes")
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        SubmitError::ReservationNotActive {
            status: ReservationStatus::Expired
        }
    ));
}

#[tokio::test]
async fn test_commit_on_submit_confirm_collection_is_rejected() {
    let h = harness();
    let collection = h.seed_collection(ChainModel::SubmitConfirm, 1);
    h.seed_open_phase(collection.id);
    let wallet = WalletAddress::new("w1");
    let reservation = h.engine.reserve(collection.id, &wallet, None).unwrap();

    let err = h
        .engine
        .submit_commit(reservation.id, wallet, b"commit-bytes")
        .await
        .unwrap_err();
    assert!(matches!(err, SubmitError::WrongChainModel));
}
