//! # Error Types
//!
//! Every rejection is synchronous and all-or-nothing: a call that returns
//! one of these errors has committed nothing.

use crate::domain::value_objects::{Address, U256};
use thiserror::Error;

// =============================================================================
// SIGNATURE ERRORS
// =============================================================================

/// Errors raised while decoding a signature or recovering its signer.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum SignatureError {
    /// Signature is not `r || s || v` (65 bytes).
    #[error("invalid signature length: expected 65 bytes, got {0}")]
    InvalidLength(usize),

    /// R or S is zero or not below the curve order.
    #[error("invalid signature format")]
    InvalidFormat,

    /// S is in the upper half of the curve order (EIP-2).
    #[error("malleable signature (high S value)")]
    MalleableSignature,

    /// v is not one of the accepted recovery ids.
    #[error("invalid recovery ID: {0}")]
    InvalidRecoveryId(u8),

    /// No public key could be recovered from the signature.
    #[error("failed to recover public key")]
    RecoveryFailed,
}

// =============================================================================
// DELEGATION ERRORS
// =============================================================================

/// Errors from the registry's activation protocols.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum DelegationError {
    /// The `(cold, nonce)` pair already authorized a change.
    #[error("nonce {nonce} already consumed for {cold}")]
    ReplayedNonce {
        /// Cold wallet the nonce is scoped to.
        cold: Address,
        /// The reused nonce.
        nonce: U256,
    },

    /// The signature recovers to someone other than the claimed cold wallet.
    ///
    /// The nonce is left unconsumed.
    #[error("signer mismatch: expected {expected}, recovered {actual}")]
    SignerMismatch {
        /// The claimed cold wallet.
        expected: Address,
        /// The address the signature recovers to.
        actual: Address,
    },

    /// The signature could not be decoded or recovered.
    #[error("invalid signature: {0}")]
    InvalidSignature(#[from] SignatureError),
}

// =============================================================================
// LEDGER ERRORS
// =============================================================================

/// Errors signalled by the external asset ledger.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum LedgerError {
    /// Owner lookup for a token that was never minted.
    #[error("token {token_id} does not exist in asset {asset}")]
    NonexistentToken {
        /// Asset contract queried.
        asset: Address,
        /// Token id queried.
        token_id: U256,
    },

    /// Batch query with `owners.len() != ids.len()`.
    #[error("batch length mismatch: {owners} owners, {ids} ids")]
    LengthMismatch {
        /// Number of owners supplied.
        owners: usize,
        /// Number of ids supplied.
        ids: usize,
    },

    /// The ledger could not be reached or rejected the call.
    #[error("ledger unavailable: {0}")]
    Unavailable(String),
}

/// Errors surfaced by the ownership proxy.
///
/// The proxy is transparent: ledger failures pass through untouched.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ProxyError {
    /// Error raised by the ledger itself.
    #[error(transparent)]
    Ledger(#[from] LedgerError),
}

// =============================================================================
// SNAPSHOT ERRORS
// =============================================================================

/// Errors raised when restoring state from a [`DelegationSnapshot`].
///
/// [`DelegationSnapshot`]: crate::domain::state::DelegationSnapshot
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum SnapshotError {
    /// A forward link points at the null identity.
    #[error("forward link for {cold} points at the null identity")]
    NullHotWallet {
        /// Cold wallet of the offending link.
        cold: Address,
    },

    /// A reverse link is keyed by the null identity.
    #[error("reverse link keyed by the null identity (cold {cold})")]
    NullReverseKey {
        /// Cold wallet the entry points at.
        cold: Address,
    },

    /// The same cold wallet appears in more than one forward link.
    #[error("duplicate forward link for {cold}")]
    DuplicateLink {
        /// The repeated cold wallet.
        cold: Address,
    },

    /// The same hot wallet appears in more than one reverse link.
    #[error("duplicate reverse link for {hot}")]
    DuplicateReverseLink {
        /// The repeated hot wallet.
        hot: Address,
    },

    /// A reverse link `hot -> cold` without the forward link `cold -> hot`.
    #[error("reverse link {hot} -> {cold} has no matching forward link")]
    OrphanedReverseLink {
        /// Hot wallet of the reverse entry.
        hot: Address,
        /// Cold wallet it claims to act for.
        cold: Address,
    },
}

impl DelegationError {
    /// Short label used in logs and statistics.
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            Self::ReplayedNonce { .. } => "replayed_nonce",
            Self::SignerMismatch { .. } => "signer_mismatch",
            Self::InvalidSignature(_) => "invalid_signature",
        }
    }
}
