//! # Domain Entities
//!
//! Core data structures for delegation links and their signatures.

use super::value_objects::{Address, U256};
use crate::errors::SignatureError;
use serde::{Deserialize, Serialize};

/// Length of a wire signature: `r (32) || s (32) || v (1)`.
pub const SIGNATURE_LENGTH: usize = 65;

// =============================================================================
// ECDSA SIGNATURE (secp256k1)
// =============================================================================

/// Recoverable ECDSA signature on the secp256k1 curve.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EcdsaSignature {
    /// R component (32 bytes)
    pub r: [u8; 32],
    /// S component (32 bytes)
    pub s: [u8; 32],
    /// Recovery ID (0, 1, 27, or 28)
    pub v: u8,
}

impl EcdsaSignature {
    /// Decode the 65-byte `r || s || v` wire form.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, SignatureError> {
        if bytes.len() != SIGNATURE_LENGTH {
            return Err(SignatureError::InvalidLength(bytes.len()));
        }

        let mut r = [0u8; 32];
        let mut s = [0u8; 32];
        r.copy_from_slice(&bytes[..32]);
        s.copy_from_slice(&bytes[32..64]);

        Ok(Self { r, s, v: bytes[64] })
    }

    /// Encode to the 65-byte wire form.
    #[must_use]
    pub fn to_bytes(&self) -> [u8; SIGNATURE_LENGTH] {
        let mut out = [0u8; SIGNATURE_LENGTH];
        out[..32].copy_from_slice(&self.r);
        out[32..64].copy_from_slice(&self.s);
        out[64] = self.v;
        out
    }
}

// =============================================================================
// DELEGATION RECORDS
// =============================================================================

/// A cold wallet and the hot wallet acting on its behalf.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DelegationLink {
    /// The authoritative owner.
    pub cold: Address,
    /// The delegate.
    pub hot: Address,
}

/// A `(cold, nonce)` pair that has already authorized a change.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ConsumedNonce {
    /// The cold wallet the nonce is scoped to.
    pub cold: Address,
    /// The nonce value.
    pub nonce: U256,
}
