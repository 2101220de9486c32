//! # Outbound Ports (Driven Ports / SPI)
//!
//! Dependencies the registry and proxy need from the host:
//! - Signer recovery (the cryptographic primitive)
//! - The asset ledger (source of truth for ownership)
//! - Notification delivery

use crate::domain::value_objects::{Address, Hash, U256};
use crate::errors::{LedgerError, SignatureError};
use crate::events::DelegationChanged;
use std::sync::Arc;

// =============================================================================
// SIGNER RECOVERY
// =============================================================================

/// Recovers the identity that produced a signature over a prehash.
pub trait SignerRecovery: Send + Sync {
    /// Recover the signer of `message_hash`.
    ///
    /// # Errors
    /// Any [`SignatureError`] for signatures that cannot be decoded or
    /// recovered. A well-formed signature by the wrong key is NOT an error
    /// here; it simply recovers to a different address.
    fn recover_signer(&self, message_hash: &Hash, signature: &[u8])
        -> Result<Address, SignatureError>;
}

// =============================================================================
// ASSET LEDGER
// =============================================================================

/// The external ledger holding true ownership and balances.
///
/// Every query is addressed to an asset contract.
pub trait AssetLedger: Send + Sync {
    /// Balance of `owner` in a single-id asset.
    fn balance_of(&self, asset: Address, owner: Address) -> Result<U256, LedgerError>;

    /// Balance of `owner` for token `id` in a multi-id asset.
    fn balance_of_id(&self, asset: Address, owner: Address, id: U256)
        -> Result<U256, LedgerError>;

    /// True owner of `token_id`.
    fn owner_of(&self, asset: Address, token_id: U256) -> Result<Address, LedgerError>;

    /// Balances for `(owners[i], ids[i])` pairs, in input order.
    ///
    /// Length validation is the ledger's responsibility.
    fn balance_of_batch(
        &self,
        asset: Address,
        owners: &[Address],
        ids: &[U256],
    ) -> Result<Vec<U256>, LedgerError>;
}

impl<L: AssetLedger + ?Sized> AssetLedger for Arc<L> {
    fn balance_of(&self, asset: Address, owner: Address) -> Result<U256, LedgerError> {
        (**self).balance_of(asset, owner)
    }

    fn balance_of_id(
        &self,
        asset: Address,
        owner: Address,
        id: U256,
    ) -> Result<U256, LedgerError> {
        (**self).balance_of_id(asset, owner, id)
    }

    fn owner_of(&self, asset: Address, token_id: U256) -> Result<Address, LedgerError> {
        (**self).owner_of(asset, token_id)
    }

    fn balance_of_batch(
        &self,
        asset: Address,
        owners: &[Address],
        ids: &[U256],
    ) -> Result<Vec<U256>, LedgerError> {
        (**self).balance_of_batch(asset, owners, ids)
    }
}

// =============================================================================
// NOTIFICATIONS
// =============================================================================

/// Receives [`DelegationChanged`] for each committed update.
///
/// `publish` runs while the registry holds the store's write lock, so events
/// arrive in commit order. Implementations must not call back into the
/// registry or the store.
pub trait DelegationEventSink: Send + Sync {
    /// Deliver one notification. Delivery cannot fail the update.
    fn publish(&self, event: &DelegationChanged);
}

impl<E: DelegationEventSink + ?Sized> DelegationEventSink for Arc<E> {
    fn publish(&self, event: &DelegationChanged) {
        (**self).publish(event);
    }
}
