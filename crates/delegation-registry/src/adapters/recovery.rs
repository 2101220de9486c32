//! # secp256k1 Signer Recovery
//!
//! Default [`SignerRecovery`] backed by the domain ECDSA logic.

use crate::domain::ecdsa::{self, RecoveryPolicy};
use crate::domain::entities::EcdsaSignature;
use crate::domain::value_objects::{Address, Hash};
use crate::errors::SignatureError;
use crate::ports::outbound::SignerRecovery;

/// Recovers signers from 65-byte `r || s || v` signatures.
#[derive(Debug, Clone, Copy, Default)]
pub struct Secp256k1Recovery {
    policy: RecoveryPolicy,
}

impl Secp256k1Recovery {
    /// Create a recovery adapter with the default (strict low-S) policy.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a recovery adapter with an explicit policy.
    #[must_use]
    pub fn with_policy(policy: RecoveryPolicy) -> Self {
        Self { policy }
    }

    /// The active policy.
    #[must_use]
    pub fn policy(&self) -> RecoveryPolicy {
        self.policy
    }
}

impl SignerRecovery for Secp256k1Recovery {
    fn recover_signer(
        &self,
        message_hash: &Hash,
        signature: &[u8],
    ) -> Result<Address, SignatureError> {
        let signature = EcdsaSignature::from_bytes(signature)?;
        ecdsa::recover_with_policy(message_hash, &signature, self.policy)
    }
}
