//! Pre-paid credit payments: grant-exactly-once and additive balances.

use mintline_test_helpers::harness;
use mintline_types::{Amount, PaymentStatus, WalletAddress};

#[test]
fn test_complete_payment_grants_credits_once() {
    let h = harness();
    let wallet = WalletAddress::new("payer");
    let payment = h
        .engine
        .register_payment(wallet.clone(), Amount(50_000), "btc", 100, None)
        .unwrap();

    assert!(h.engine.complete_payment(payment.id).unwrap());
    assert_eq!(h.engine.credits(&wallet).unwrap(), 100);

    // Replaying the completion grants nothing further.
    assert!(!h.engine.complete_payment(payment.id).unwrap());
    assert_eq!(h.engine.credits(&wallet).unwrap(), 100);
}

#[test]
fn test_credits_are_additive_across_payments() {
    let h = harness();
    let wallet = WalletAddress::new("payer");
    for _ in 0..2 {
        let payment = h
            .engine
            .register_payment(wallet.clone(), Amount(50_000), "btc", 40, None)
            .unwrap();
        h.engine.complete_payment(payment.id).unwrap();
    }
    assert_eq!(h.engine.credits(&wallet).unwrap(), 80);
}

#[test]
fn test_closed_payment_grants_nothing() {
    let h = harness();
    let wallet = WalletAddress::new("payer");
    let payment = h
        .engine
        .register_payment(wallet.clone(), Amount(50_000), "btc", 100, None)
        .unwrap();

    assert!(h
        .engine
        .close_payment(payment.id, PaymentStatus::Expired)
        .unwrap());
    assert_eq!(h.engine.credits(&wallet).unwrap(), 0);
    // A terminal payment cannot be completed afterwards.
    assert!(!h.engine.complete_payment(payment.id).unwrap());
}
