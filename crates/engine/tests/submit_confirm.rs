//! Submit/confirm driver behavior and the delegated-signer guard.

use mintline_engine::SubmitError;
use mintline_test_helpers::{harness, harness_with_signer};
use mintline_types::{ChainModel, WalletAddress};

#[tokio::test]
async fn test_submit_mint_without_guard() {
    let h = harness();
    let collection = h.seed_collection(ChainModel::SubmitConfirm, 1);
    h.seed_open_phase(collection.id);
    let wallet = WalletAddress::new("w1");
    let reservation = h.engine.reserve(collection.id, &wallet, None).unwrap();

    let record = h
        .engine
        .submit_mint(reservation.id, wallet, b"signed-tx", None)
        .await
        .unwrap();
    assert_eq!(record.lifecycle.state_label(), "confirming");
    assert!(record.lifecycle.in_flight_txid().is_some());
}

#[tokio::test]
async fn test_submit_mint_is_idempotent() {
    let h = harness();
    let collection = h.seed_collection(ChainModel::SubmitConfirm, 1);
    h.seed_open_phase(collection.id);
    let wallet = WalletAddress::new("w1");
    let reservation = h.engine.reserve(collection.id, &wallet, None).unwrap();

    let first = h
        .engine
        .submit_mint(reservation.id, wallet.clone(), b"signed-tx", None)
        .await
        .unwrap();
    let second = h
        .engine
        .submit_mint(reservation.id, wallet, b"signed-tx", None)
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
async fn test_guard_requires_authorization() {
    let h = harness_with_signer();
    let collection = h.seed_collection(ChainModel::SubmitConfirm, 1);
    h.seed_open_phase(collection.id);
    let wallet = WalletAddress::new("w1");
    let reservation = h.engine.reserve(collection.id, &wallet, None).unwrap();

    let err = h
        .engine
        .submit_mint(reservation.id, wallet, b"signed-tx", None)
        .await
        .unwrap_err();
    assert!(matches!(err, SubmitError::AuthorizationMissing));
}

#[tokio::test]
async fn test_guard_accepts_issued_authorization() {
    let h = harness_with_signer();
    let collection = h.seed_collection(ChainModel::SubmitConfirm, 1);
    h.seed_open_phase(collection.id);
    let wallet = WalletAddress::new("w1");
    let reservation = h.engine.reserve(collection.id, &wallet, None).unwrap();

    let authorization = h.engine.authorize_mint(reservation.id).unwrap();
    let record = h
        .engine
        .submit_mint(reservation.id, wallet, b"signed-tx", Some(&authorization))
        .await
        .unwrap();
    assert_eq!(record.lifecycle.state_label(), "confirming");
}

#[tokio::test]
async fn test_guard_rejects_authorization_for_other_reservation() {
    let h = harness_with_signer();
    let collection = h.seed_collection(ChainModel::SubmitConfirm, 2);
    h.seed_open_phase(collection.id);
    let w1 = WalletAddress::new("w1");
    let w2 = WalletAddress::new("w2");
    let r1 = h.engine.reserve(collection.id, &w1, None).unwrap();
    let r2 = h.engine.reserve(collection.id, &w2, None).unwrap();

    // Authorization for r1 must not open r2.
    let authorization = h.engine.authorize_mint(r1.id).unwrap();
    let err = h
        .engine
        .submit_mint(r2.id, w2, b"signed-tx", Some(&authorization))
        .await
        .unwrap_err();
    assert!(matches!(err, SubmitError::AuthorizationInvalid));
}

#[tokio::test]
async fn test_authorize_without_signer_is_unavailable() {
    let h = harness();
    let collection = h.seed_collection(ChainModel::SubmitConfirm, 1);
    h.seed_open_phase(collection.id);
    let reservation = h
        .engine
        .reserve(collection.id, &WalletAddress::new("w1"), None)
        .unwrap();

    let err = h.engine.authorize_mint(reservation.id).unwrap_err();
    assert!(matches!(err, SubmitError::AuthorizationUnavailable));
}

#[tokio::test]
async fn test_submit_mint_on_commit_reveal_collection_is_rejected() {
    let h = harness();
    let collection = h.seed_collection(ChainModel::CommitReveal, 1);
    h.seed_open_phase(collection.id);
    let wallet = WalletAddress::new("w1");
    let reservation = h.engine.reserve(collection.id, &wallet, None).unwrap();

    let err = h
        .engine
        .submit_mint(reservation.id, wallet, b"signed-tx", None)
        .await
        .unwrap_err();
    assert!(matches!(err, SubmitError::WrongChainModel));
}
