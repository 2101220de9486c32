//! # Ledger Adapter
//!
//! In-memory asset ledger for testing and local wiring.
//! Production deployments implement [`AssetLedger`] against the real ledger.

use crate::domain::value_objects::{Address, U256};
use crate::errors::LedgerError;
use crate::ports::outbound::AssetLedger;
use parking_lot::RwLock;
use std::collections::HashMap;

/// In-memory ledger covering single-id, unique-token and multi-id assets.
#[derive(Debug, Default)]
pub struct InMemoryAssetLedger {
    /// (asset, owner) -> balance
    balances: RwLock<HashMap<(Address, Address), U256>>,
    /// (asset, token id) -> owner
    owners: RwLock<HashMap<(Address, U256), Address>>,
    /// (asset, owner, id) -> balance
    id_balances: RwLock<HashMap<(Address, Address, U256), U256>>,
}

impl InMemoryAssetLedger {
    /// Create an empty ledger.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the single-id balance of `owner`.
    pub fn set_balance(&self, asset: Address, owner: Address, balance: U256) {
        self.balances.write().insert((asset, owner), balance);
    }

    /// Set the multi-id balance of `owner` for `id`.
    pub fn set_balance_of_id(&self, asset: Address, owner: Address, id: U256, balance: U256) {
        self.id_balances.write().insert((asset, owner, id), balance);
    }

    /// Assign `token_id` to `owner`, adjusting both owners' balances.
    pub fn assign_token(&self, asset: Address, token_id: U256, owner: Address) {
        let previous = self.owners.write().insert((asset, token_id), owner);

        let mut balances = self.balances.write();
        if let Some(previous) = previous {
            if let Some(balance) = balances.get_mut(&(asset, previous)) {
                *balance = balance.saturating_sub(U256::one());
            }
        }
        let balance = balances.entry((asset, owner)).or_default();
        *balance = balance.saturating_add(U256::one());
    }
}

impl AssetLedger for InMemoryAssetLedger {
    fn balance_of(&self, asset: Address, owner: Address) -> Result<U256, LedgerError> {
        Ok(self
            .balances
            .read()
            .get(&(asset, owner))
            .copied()
            .unwrap_or_default())
    }

    fn balance_of_id(
        &self,
        asset: Address,
        owner: Address,
        id: U256,
    ) -> Result<U256, LedgerError> {
        Ok(self
            .id_balances
            .read()
            .get(&(asset, owner, id))
            .copied()
            .unwrap_or_default())
    }

    fn owner_of(&self, asset: Address, token_id: U256) -> Result<Address, LedgerError> {
        self.owners
            .read()
            .get(&(asset, token_id))
            .copied()
            .ok_or(LedgerError::NonexistentToken { asset, token_id })
    }

    fn balance_of_batch(
        &self,
        asset: Address,
        owners: &[Address],
        ids: &[U256],
    ) -> Result<Vec<U256>, LedgerError> {
        if owners.len() != ids.len() {
            return Err(LedgerError::LengthMismatch {
                owners: owners.len(),
                ids: ids.len(),
            });
        }

        let balances = self.id_balances.read();
        Ok(owners
            .iter()
            .zip(ids)
            .map(|(&owner, &id)| {
                balances
                    .get(&(asset, owner, id))
                    .copied()
                    .unwrap_or_default()
            })
            .collect())
    }
}
