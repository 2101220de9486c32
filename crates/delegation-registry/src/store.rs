//! # Delegation Store
//!
//! The single owned home of delegation state, shared by the registry and
//! the proxy through an `Arc`.
//!
//! The write lock is the transaction boundary: a mutation holds it for its
//! whole check-verify-commit sequence, so two updates never interleave and
//! a rejected update leaves nothing behind.

use crate::domain::state::{DelegationSnapshot, DelegationState};
use crate::domain::value_objects::{Address, U256};
use crate::errors::SnapshotError;
use parking_lot::RwLock;

/// Lock-guarded delegation state.
#[derive(Debug, Default)]
pub struct DelegationStore {
    state: RwLock<DelegationState>,
}

impl DelegationStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Restore a store from a previously exported snapshot.
    ///
    /// # Errors
    /// [`SnapshotError`] if the snapshot's maps are inconsistent.
    pub fn from_snapshot(snapshot: DelegationSnapshot) -> Result<Self, SnapshotError> {
        Ok(Self {
            state: RwLock::new(DelegationState::from_snapshot(snapshot)?),
        })
    }

    /// Export the current state.
    #[must_use]
    pub fn snapshot(&self) -> DelegationSnapshot {
        self.state.read().snapshot()
    }

    /// Hot wallet registered for `cold`, or null.
    #[must_use]
    pub fn hot_wallet(&self, cold: Address) -> Address {
        self.state.read().hot_wallet(cold)
    }

    /// Cold wallet `hot` acts for, or null.
    #[must_use]
    pub fn cold_wallet(&self, hot: Address) -> Address {
        self.state.read().cold_wallet(hot)
    }

    /// Cold wallet of each entry in `hots`, in order, read under one guard.
    #[must_use]
    pub fn cold_wallets(&self, hots: &[Address]) -> Vec<Address> {
        let state = self.state.read();
        hots.iter().map(|&hot| state.cold_wallet(hot)).collect()
    }

    /// Whether `(cold, nonce)` has been consumed.
    #[must_use]
    pub fn is_nonce_consumed(&self, cold: Address, nonce: U256) -> bool {
        self.state.read().is_nonce_consumed(cold, nonce)
    }

    /// Number of active delegations.
    #[must_use]
    pub fn link_count(&self) -> usize {
        self.state.read().link_count()
    }

    /// Apply an infallible mutation under the write lock.
    ///
    /// Anything `f` does, including publishing, happens before another
    /// writer can observe the state.
    pub(crate) fn update<T>(&self, f: impl FnOnce(&mut DelegationState) -> T) -> T {
        f(&mut self.state.write())
    }

    /// Run `f` with exclusive access to the state.
    ///
    /// `f` must perform every check before its first write.
    pub(crate) fn transact<T, E>(
        &self,
        f: impl FnOnce(&mut DelegationState) -> Result<T, E>,
    ) -> Result<T, E> {
        let mut state = self.state.write();
        f(&mut state)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::entities::DelegationLink;
    use std::sync::Arc;

    fn addr(byte: u8) -> Address {
        Address::new([byte; 20])
    }

    #[test]
    fn test_update_commits() {
        let store = DelegationStore::new();
        store.update(|state| state.apply_link(addr(1), addr(2)));

        assert_eq!(store.hot_wallet(addr(1)), addr(2));
        assert_eq!(store.cold_wallet(addr(2)), addr(1));
        assert_eq!(store.link_count(), 1);
    }

    #[test]
    fn test_rejected_transaction_leaves_state() {
        let store = DelegationStore::new();
        let result: Result<(), &str> = store.transact(|state| {
            if state.is_nonce_consumed(addr(1), U256::one()) {
                return Ok(());
            }
            Err("rejected")
        });

        assert!(result.is_err());
        assert_eq!(store.snapshot(), DelegationSnapshot::default());
    }

    #[test]
    fn test_concurrent_nonce_consumption_is_exclusive() {
        let store = Arc::new(DelegationStore::new());
        let handles: Vec<_> = (0..8)
            .map(|_| {
                let store = Arc::clone(&store);
                std::thread::spawn(move || {
                    store.transact(|state| {
                        if state.is_nonce_consumed(addr(1), U256::from(3)) {
                            return Err(());
                        }
                        state.consume_nonce(addr(1), U256::from(3));
                        Ok(())
                    })
                })
            })
            .collect();

        let successes = handles
            .into_iter()
            .map(|h| h.join().unwrap())
            .filter(Result::is_ok)
            .count();
        assert_eq!(successes, 1);
    }

    #[test]
    fn test_snapshot_restore() {
        let store = DelegationStore::new();
        store.update(|state| {
            state.consume_nonce(addr(1), U256::from(9));
            state.apply_link(addr(1), addr(2))
        });

        let restored = DelegationStore::from_snapshot(store.snapshot()).unwrap();
        assert_eq!(restored.hot_wallet(addr(1)), addr(2));
        assert_eq!(restored.cold_wallet(addr(2)), addr(1));
        assert!(restored.is_nonce_consumed(addr(1), U256::from(9)));
    }

    #[test]
    fn test_restore_rejects_inconsistent_snapshot() {
        let mut snapshot = DelegationSnapshot::default();
        snapshot.reverse_links.push(DelegationLink {
            cold: addr(1),
            hot: addr(2),
        });

        assert_eq!(
            DelegationStore::from_snapshot(snapshot).err(),
            Some(SnapshotError::OrphanedReverseLink {
                hot: addr(2),
                cold: addr(1)
            })
        );
    }

    #[test]
    fn test_cold_wallets_preserves_order() {
        let store = DelegationStore::new();
        store.update(|state| {
            state.apply_link(addr(1), addr(2));
            state.apply_link(addr(3), addr(4))
        });

        assert_eq!(
            store.cold_wallets(&[addr(4), addr(9), addr(2), addr(4)]),
            vec![addr(3), Address::ZERO, addr(1), addr(3)]
        );
        assert!(store.cold_wallets(&[]).is_empty());
    }
}
