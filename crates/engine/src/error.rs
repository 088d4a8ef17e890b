//! Engine error types.

use mintline_chain::ChainError;
use mintline_store::StoreError;
use mintline_types::{
    AllocationError, CollectionId, MintRecordId, PaymentId, PhaseId, PhaseTransitionError,
    ReservationId, ReservationStatus,
};
use thiserror::Error;

/// Errors from `reserve`.
#[derive(Debug, Error)]
pub enum ReserveError {
    /// Typed, non-retriable allocation rejection.
    #[error(transparent)]
    Allocation(#[from] AllocationError),

    /// The collection does not exist.
    #[error("unknown collection {0}")]
    UnknownCollection(CollectionId),

    /// Storage failed.
    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Errors from the transaction submission paths.
#[derive(Debug, Error)]
pub enum SubmitError {
    /// The reservation does not exist.
    #[error("unknown reservation {0}")]
    UnknownReservation(ReservationId),

    /// The reservation no longer holds its item.
    #[error("reservation is {status}, not holding an item")]
    ReservationNotActive {
        /// Effective status (a lapsed hold reports as expired).
        status: ReservationStatus,
    },

    /// The record is not in the state this operation requires.
    #[error("lifecycle is {found}, expected {expected}")]
    InvalidState {
        /// State the operation requires.
        expected: &'static str,
        /// State the record is in.
        found: &'static str,
    },

    /// The collection mints on the other chain model.
    #[error("operation does not apply to this collection's chain model")]
    WrongChainModel,

    /// The record carries no bound inventory item where one is required.
    #[error("no inventory item bound to this record")]
    MissingItem,

    /// The delegated-signer guard is enabled and no authorization was
    /// supplied.
    #[error("mint authorization required")]
    AuthorizationMissing,

    /// The supplied authorization does not verify.
    #[error("mint authorization invalid")]
    AuthorizationInvalid,

    /// No delegated signer is configured.
    #[error("no delegated signer configured")]
    AuthorizationUnavailable,

    /// Chain I/O failed.
    #[error(transparent)]
    Chain(#[from] ChainError),

    /// Storage failed.
    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Errors from admin operations.
#[derive(Debug, Error)]
pub enum AdminError {
    /// The phase status edit is not in the transition table.
    #[error(transparent)]
    Transition(#[from] PhaseTransitionError),

    /// The collection does not exist.
    #[error("unknown collection {0}")]
    UnknownCollection(CollectionId),

    /// The phase does not exist.
    #[error("unknown phase {0}")]
    UnknownPhase(PhaseId),

    /// Storage failed.
    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Errors from queries and sweeps.
#[derive(Debug, Error)]
pub enum EngineError {
    /// The reservation does not exist.
    #[error("unknown reservation {0}")]
    UnknownReservation(ReservationId),

    /// The record does not exist.
    #[error("unknown mint record {0}")]
    UnknownRecord(MintRecordId),

    /// The payment does not exist.
    #[error("unknown payment {0}")]
    UnknownPayment(PaymentId),

    /// Storage failed.
    #[error(transparent)]
    Store(#[from] StoreError),
}
