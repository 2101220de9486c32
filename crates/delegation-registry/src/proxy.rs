//! # Ownership Resolution Proxy
//!
//! Implements [`OwnershipApi`] by rewriting identities around calls to the
//! external [`AssetLedger`].
//!
//! | Query | Substitution |
//! |-------|--------------|
//! | `balance_of`, `balance_of_id` | hot -> cold, before the call |
//! | `balance_of_batch` | hot -> cold per entry against one state, before the call |
//! | `owner_of` | cold -> hot, after the call |
//!
//! Balances of a hot wallet are never added to its cold wallet's: a
//! delegated hot wallet's own holdings are invisible through this path.
//! The proxy holds no state and caches nothing.

use crate::domain::value_objects::{Address, U256};
use crate::errors::ProxyError;
use crate::ports::inbound::OwnershipApi;
use crate::ports::outbound::AssetLedger;
use crate::store::DelegationStore;
use std::sync::Arc;
use tracing::{debug, instrument};

/// Ownership proxy over a ledger and the shared delegation store.
pub struct OwnershipProxy<L: AssetLedger> {
    store: Arc<DelegationStore>,
    ledger: L,
}

impl<L: AssetLedger> OwnershipProxy<L> {
    /// Create a proxy reading delegations from `store`.
    pub fn new(store: Arc<DelegationStore>, ledger: L) -> Self {
        Self { store, ledger }
    }

    /// The wrapped ledger.
    pub fn ledger(&self) -> &L {
        &self.ledger
    }

    /// Identity to query balances with: the cold wallet `owner` acts for,
    /// or `owner` itself.
    fn balance_identity(&self, owner: Address) -> Address {
        match self.store.cold_wallet(owner).non_zero() {
            Some(cold) => {
                debug!(hot = %owner, cold = %cold, "Resolved hot wallet to cold wallet");
                cold
            }
            None => owner,
        }
    }
}

impl<L: AssetLedger> OwnershipApi for OwnershipProxy<L> {
    #[instrument(skip_all, fields(asset = %asset, owner = %owner))]
    fn balance_of(&self, asset: Address, owner: Address) -> Result<U256, ProxyError> {
        let owner = self.balance_identity(owner);
        Ok(self.ledger.balance_of(asset, owner)?)
    }

    #[instrument(skip_all, fields(asset = %asset, owner = %owner, id = %id))]
    fn balance_of_id(
        &self,
        asset: Address,
        owner: Address,
        id: U256,
    ) -> Result<U256, ProxyError> {
        let owner = self.balance_identity(owner);
        Ok(self.ledger.balance_of_id(asset, owner, id)?)
    }

    #[instrument(skip_all, fields(asset = %asset, token_id = %token_id))]
    fn owner_of(&self, asset: Address, token_id: U256) -> Result<Address, ProxyError> {
        let owner = self.ledger.owner_of(asset, token_id)?;

        match self.store.hot_wallet(owner).non_zero() {
            Some(hot) => {
                debug!(cold = %owner, hot = %hot, "Resolved owner to hot wallet");
                Ok(hot)
            }
            None => Ok(owner),
        }
    }

    #[instrument(skip_all, fields(asset = %asset, entries = owners.len()))]
    fn balance_of_batch(
        &self,
        asset: Address,
        owners: &[Address],
        ids: &[U256],
    ) -> Result<Vec<U256>, ProxyError> {
        let resolved: Vec<Address> = owners
            .iter()
            .zip(self.store.cold_wallets(owners))
            .map(|(&owner, cold)| cold.non_zero().unwrap_or(owner))
            .collect();
        debug!(
            substituted = resolved.iter().zip(owners).filter(|(r, o)| r != o).count(),
            "Resolved batch owners"
        );

        Ok(self.ledger.balance_of_batch(asset, &resolved, ids)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::InMemoryAssetLedger;
    use crate::errors::LedgerError;
    use parking_lot::Mutex;

    fn addr(byte: u8) -> Address {
        Address::new([byte; 20])
    }

    const ASSET: Address = Address::new([0xAA; 20]);

    /// Ledger that records the owners it was asked about.
    #[derive(Default)]
    struct SpyLedger {
        seen: Mutex<Vec<Address>>,
    }

    impl AssetLedger for SpyLedger {
        fn balance_of(&self, _: Address, owner: Address) -> Result<U256, LedgerError> {
            self.seen.lock().push(owner);
            Ok(U256::zero())
        }

        fn balance_of_id(&self, _: Address, owner: Address, _: U256) -> Result<U256, LedgerError> {
            self.seen.lock().push(owner);
            Ok(U256::zero())
        }

        fn owner_of(&self, _: Address, _: U256) -> Result<Address, LedgerError> {
            Err(LedgerError::Unavailable("spy".into()))
        }

        fn balance_of_batch(
            &self,
            _: Address,
            owners: &[Address],
            ids: &[U256],
        ) -> Result<Vec<U256>, LedgerError> {
            self.seen.lock().extend_from_slice(owners);
            Ok(vec![U256::zero(); ids.len()])
        }
    }

    fn linked_store(cold: Address, hot: Address) -> Arc<DelegationStore> {
        let store = Arc::new(DelegationStore::new());
        store.update(|state| state.apply_link(cold, hot));
        store
    }

    #[test]
    fn test_balance_forwards_cold_identity() {
        let proxy = OwnershipProxy::new(linked_store(addr(1), addr(2)), SpyLedger::default());

        proxy.balance_of(ASSET, addr(2)).unwrap();
        proxy.balance_of(ASSET, addr(1)).unwrap();
        proxy.balance_of(ASSET, addr(3)).unwrap();
        proxy.balance_of_id(ASSET, addr(2), U256::one()).unwrap();

        assert_eq!(
            *proxy.ledger().seen.lock(),
            vec![addr(1), addr(1), addr(3), addr(1)]
        );
    }

    #[test]
    fn test_batch_substitutes_each_entry() {
        let proxy = OwnershipProxy::new(linked_store(addr(1), addr(2)), SpyLedger::default());

        let out = proxy
            .balance_of_batch(
                ASSET,
                &[addr(3), addr(2), addr(4), addr(2)],
                &[U256::one(); 4],
            )
            .unwrap();

        assert_eq!(out.len(), 4);
        assert_eq!(
            *proxy.ledger().seen.lock(),
            vec![addr(3), addr(1), addr(4), addr(1)]
        );
    }

    #[test]
    fn test_owner_of_returns_hot_wallet() {
        let ledger = InMemoryAssetLedger::new();
        ledger.assign_token(ASSET, U256::from(7), addr(1));
        ledger.assign_token(ASSET, U256::from(8), addr(5));

        let proxy = OwnershipProxy::new(linked_store(addr(1), addr(2)), ledger);
        assert_eq!(proxy.owner_of(ASSET, U256::from(7)).unwrap(), addr(2));
        assert_eq!(proxy.owner_of(ASSET, U256::from(8)).unwrap(), addr(5));
    }

    #[test]
    fn test_taken_over_hot_resolves_to_new_cold() {
        // Cold 1 delegates to 9, then cold 2 claims 9 as well.
        let store = linked_store(addr(1), addr(9));
        store.update(|state| state.apply_link(addr(2), addr(9)));

        let ledger = InMemoryAssetLedger::new();
        ledger.assign_token(ASSET, U256::from(7), addr(1));
        ledger.assign_token(ASSET, U256::from(8), addr(2));
        ledger.set_balance(ASSET, addr(1), U256::from(10));
        ledger.set_balance(ASSET, addr(2), U256::from(20));
        let proxy = OwnershipProxy::new(store, ledger);

        // Balances follow the newest reverse link.
        assert_eq!(proxy.balance_of(ASSET, addr(9)).unwrap(), U256::from(20));
        // Both colds still forward their tokens' ownership to 9.
        assert_eq!(proxy.owner_of(ASSET, U256::from(7)).unwrap(), addr(9));
        assert_eq!(proxy.owner_of(ASSET, U256::from(8)).unwrap(), addr(9));
    }

    #[test]
    fn test_ledger_errors_pass_through() {
        let proxy = OwnershipProxy::new(Arc::new(DelegationStore::new()), SpyLedger::default());
        assert_eq!(
            proxy.owner_of(ASSET, U256::one()),
            Err(ProxyError::Ledger(LedgerError::Unavailable("spy".into())))
        );
    }
}
