//! Delegated signer: the anti-bypass authorization key.
//!
//! When the guard is enabled, every submit/confirm mint must carry an
//! authorization produced by this process-held key, so an out-of-band
//! client cannot mint by going around the allocation engine. The key is
//! loaded once at startup from configuration and never exported.

use ed25519_dalek::{Signature, Signer, SigningKey, Verifier, VerifyingKey};
use mintline_types::{ReservationId, WalletAddress};
use rand::rngs::OsRng;

const AUTHORIZATION_DOMAIN: &[u8] = b"mintline/agent-authorization/v1";

fn authorization_message(reservation: ReservationId, minter: &WalletAddress) -> Vec<u8> {
    let mut message =
        Vec::with_capacity(AUTHORIZATION_DOMAIN.len() + 16 + minter.as_str().len());
    message.extend_from_slice(AUTHORIZATION_DOMAIN);
    message.extend_from_slice(&reservation.0.to_be_bytes());
    message.extend_from_slice(minter.as_str().as_bytes());
    message
}

/// An agent signature binding one reservation to one minter wallet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AgentAuthorization(pub [u8; 64]);

impl AgentAuthorization {
    /// Hex encoding for transport.
    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }

    /// Parse from hex.
    pub fn from_hex(s: &str) -> Option<Self> {
        let bytes = hex::decode(s).ok()?;
        let arr: [u8; 64] = bytes.try_into().ok()?;
        Some(Self(arr))
    }
}

/// The process-held delegated signing key.
pub struct DelegatedSigner {
    key: SigningKey,
}

impl DelegatedSigner {
    /// Load the signer from a 32-byte seed.
    pub fn from_seed(seed: &[u8; 32]) -> Self {
        Self {
            key: SigningKey::from_bytes(seed),
        }
    }

    /// Authorize a mint for one reservation and minter wallet.
    pub fn authorize(
        &self,
        reservation: ReservationId,
        minter: &WalletAddress,
    ) -> AgentAuthorization {
        let message = authorization_message(reservation, minter);
        let signature = self.key.sign(&message);
        AgentAuthorization(signature.to_bytes())
    }

    /// The verification half, safe to hand to request handlers.
    pub fn verifier(&self) -> AgentVerifier {
        AgentVerifier {
            key: self.key.verifying_key(),
        }
    }
}

/// Verifies agent authorizations without holding the signing key.
#[derive(Debug, Clone)]
pub struct AgentVerifier {
    key: VerifyingKey,
}

impl AgentVerifier {
    /// Check an authorization against a reservation and minter wallet.
    pub fn verify(
        &self,
        reservation: ReservationId,
        minter: &WalletAddress,
        authorization: &AgentAuthorization,
    ) -> bool {
        let message = authorization_message(reservation, minter);
        let signature = Signature::from_bytes(&authorization.0);
        self.key.verify(&message, &signature).is_ok()
    }
}

/// An ephemeral key pair generated for one reveal transaction.
pub struct EphemeralKey {
    key: SigningKey,
}

impl EphemeralKey {
    /// Generate a fresh pair.
    pub fn generate() -> Self {
        Self {
            key: SigningKey::generate(&mut OsRng),
        }
    }

    /// Hex public key, persisted on the mint record.
    pub fn public_hex(&self) -> String {
        hex::encode(self.key.verifying_key().to_bytes())
    }
}
