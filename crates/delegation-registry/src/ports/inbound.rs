//! # Inbound Ports (Driving Ports / API)
//!
//! The surface external callers use. Implementations must be thread-safe.

use crate::domain::value_objects::{Address, U256};
use crate::errors::{DelegationError, ProxyError};

/// Delegation registry API.
pub trait DelegationApi: Send + Sync {
    /// Point the caller's delegation at `hot` (null clears it).
    ///
    /// `caller` is the identity already authenticated by the calling
    /// context; no further proof is required.
    fn set_hot_wallet_direct(&self, caller: Address, hot: Address);

    /// Point `cold`'s delegation at `hot` using an offline signature over
    /// `(nonce, hot)`.
    ///
    /// # Errors
    /// * `ReplayedNonce` - `(cold, nonce)` was already consumed
    /// * `SignerMismatch` - the signature recovers to someone else
    /// * `InvalidSignature` - the signature is malformed
    fn set_hot_wallet_by_signature(
        &self,
        cold: Address,
        hot: Address,
        nonce: U256,
        signature: &[u8],
    ) -> Result<(), DelegationError>;

    /// Hot wallet registered for `cold`, or null.
    fn get_hot_wallet(&self, cold: Address) -> Address;

    /// Cold wallet `hot` acts for, or null.
    fn get_cold_wallet(&self, hot: Address) -> Address;

    /// Whether `(cold, nonce)` has already been used.
    fn is_nonce_consumed(&self, cold: Address, nonce: U256) -> bool;
}

/// Ownership resolution API.
///
/// Balance queries resolve hot wallets to their cold wallet; owner queries
/// resolve cold wallets to their hot wallet.
pub trait OwnershipApi: Send + Sync {
    /// Balance of `owner` (or the cold wallet it acts for).
    fn balance_of(&self, asset: Address, owner: Address) -> Result<U256, ProxyError>;

    /// Balance of `owner` (or the cold wallet it acts for) for token `id`.
    fn balance_of_id(&self, asset: Address, owner: Address, id: U256)
        -> Result<U256, ProxyError>;

    /// Effective owner of `token_id`: the true owner's hot wallet if set.
    fn owner_of(&self, asset: Address, token_id: U256) -> Result<Address, ProxyError>;

    /// Batch balance with per-entry substitution, order preserved.
    fn balance_of_batch(
        &self,
        asset: Address,
        owners: &[Address],
        ids: &[U256],
    ) -> Result<Vec<U256>, ProxyError>;
}
