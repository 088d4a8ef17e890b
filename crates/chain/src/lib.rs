//! Chain-facing interfaces for the Mintline allocation engine.
//!
//! The engine consumes chain state through three narrow traits:
//!
//! - [`ChainClient`] - transaction status queries and raw broadcast
//! - [`ContentEncoder`] - commit inspection and reveal construction
//!   (commit/reveal model only)
//! - [`DelegatedSigner`] - the process-held authorization key that gates
//!   direct on-chain mints
//!
//! Both chain models go through the same [`ChainClient`] abstraction; the
//! report shape (`found` / `confirmed` / `finalized` / `error`) is the
//! lowest common denominator of the two indexers.
//!
//! [`MockChain`] and [`MockEncoder`] provide scriptable in-memory
//! implementations for tests and simulation; [`HttpChainClient`] talks JSON
//! over HTTP for production.

mod client;
mod encoder;
mod error;
mod http;
mod mock;
mod signer;

pub use client::ChainClient;
pub use encoder::{ContentEncoder, RevealRequest, RevealTemplate};
pub use error::ChainError;
pub use http::{HttpChainClient, HttpContentEncoder};
pub use mock::{MockChain, MockEncoder};
pub use signer::{AgentAuthorization, AgentVerifier, DelegatedSigner, EphemeralKey};
