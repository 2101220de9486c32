//! # Delegation State
//!
//! The two identity maps and the consumed-nonce set, plus the single
//! procedure allowed to write the maps.
//!
//! ## Invariants
//!
//! | Invariant | Enforcement |
//! |-----------|-------------|
//! | cold → hot is a function | `cold_to_hot` is a map |
//! | hot → cold is a function | `hot_to_cold` is a map; stale entries cleared in `apply_link` |
//! | no reverse entry for the null identity | `apply_link` skips `Address::ZERO` |
//! | a `(cold, nonce)` pair is consumed at most once | `consumed` only grows |
//! | every reverse link has its forward link | `apply_link`; checked in `from_snapshot` |

use super::entities::{ConsumedNonce, DelegationLink};
use super::value_objects::{Address, U256};
use crate::errors::SnapshotError;
use crate::events::DelegationChanged;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};

/// In-memory delegation state.
///
/// Fields are private: the maps are only written through
/// [`DelegationState::apply_link`].
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct DelegationState {
    cold_to_hot: HashMap<Address, Address>,
    hot_to_cold: HashMap<Address, Address>,
    consumed: HashSet<ConsumedNonce>,
}

impl DelegationState {
    /// Create empty state.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Hot wallet registered for `cold`, or the null identity.
    #[must_use]
    pub fn hot_wallet(&self, cold: Address) -> Address {
        self.cold_to_hot.get(&cold).copied().unwrap_or(Address::ZERO)
    }

    /// Cold wallet that `hot` acts for, or the null identity.
    #[must_use]
    pub fn cold_wallet(&self, hot: Address) -> Address {
        self.hot_to_cold.get(&hot).copied().unwrap_or(Address::ZERO)
    }

    /// Whether `(cold, nonce)` has already authorized a change.
    #[must_use]
    pub fn is_nonce_consumed(&self, cold: Address, nonce: U256) -> bool {
        self.consumed.contains(&ConsumedNonce { cold, nonce })
    }

    /// Number of non-null forward links.
    #[must_use]
    pub fn link_count(&self) -> usize {
        self.cold_to_hot.values().filter(|hot| !hot.is_zero()).count()
    }

    /// Mark `(cold, nonce)` as used. Returns false if it already was.
    pub(crate) fn consume_nonce(&mut self, cold: Address, nonce: U256) -> bool {
        self.consumed.insert(ConsumedNonce { cold, nonce })
    }

    /// Point `cold` at `hot`, keeping the reverse map consistent.
    ///
    /// The previous hot wallet's reverse entry is removed if it still
    /// points at `cold`. Setting `hot` to the null identity clears the
    /// delegation.
    pub(crate) fn apply_link(&mut self, cold: Address, hot: Address) -> DelegationChanged {
        let previous_hot = self.cold_to_hot.insert(cold, hot).unwrap_or(Address::ZERO);

        if !previous_hot.is_zero()
            && previous_hot != hot
            && self.hot_to_cold.get(&previous_hot) == Some(&cold)
        {
            self.hot_to_cold.remove(&previous_hot);
        }

        if hot.is_zero() {
            self.cold_to_hot.remove(&cold);
        } else {
            self.hot_to_cold.insert(hot, cold);
        }

        DelegationChanged {
            cold,
            previous_hot,
            hot,
        }
    }

    /// Export a deterministic, serializable copy of the state.
    #[must_use]
    pub fn snapshot(&self) -> DelegationSnapshot {
        let mut links: Vec<DelegationLink> = self
            .cold_to_hot
            .iter()
            .map(|(&cold, &hot)| DelegationLink { cold, hot })
            .collect();
        links.sort_by_key(|link| link.cold);

        let mut reverse_links: Vec<DelegationLink> = self
            .hot_to_cold
            .iter()
            .map(|(&hot, &cold)| DelegationLink { cold, hot })
            .collect();
        reverse_links.sort_by_key(|link| link.hot);

        let mut consumed_nonces: Vec<ConsumedNonce> = self.consumed.iter().copied().collect();
        consumed_nonces.sort();

        DelegationSnapshot {
            links,
            reverse_links,
            consumed_nonces,
        }
    }

    /// Rebuild state from a snapshot.
    ///
    /// Only snapshots that [`DelegationState::snapshot`] could have produced
    /// are accepted: every reverse link must be backed by the matching
    /// forward link, and neither map may hold the null identity as a hot
    /// wallet.
    ///
    /// # Errors
    /// A [`SnapshotError`] naming the first inconsistent entry.
    pub fn from_snapshot(snapshot: DelegationSnapshot) -> Result<Self, SnapshotError> {
        let mut cold_to_hot = HashMap::with_capacity(snapshot.links.len());
        for DelegationLink { cold, hot } in snapshot.links {
            if hot.is_zero() {
                return Err(SnapshotError::NullHotWallet { cold });
            }
            if cold_to_hot.insert(cold, hot).is_some() {
                return Err(SnapshotError::DuplicateLink { cold });
            }
        }

        let mut hot_to_cold = HashMap::with_capacity(snapshot.reverse_links.len());
        for DelegationLink { cold, hot } in snapshot.reverse_links {
            if hot.is_zero() {
                return Err(SnapshotError::NullReverseKey { cold });
            }
            if cold_to_hot.get(&cold) != Some(&hot) {
                return Err(SnapshotError::OrphanedReverseLink { hot, cold });
            }
            if hot_to_cold.insert(hot, cold).is_some() {
                return Err(SnapshotError::DuplicateReverseLink { hot });
            }
        }

        Ok(Self {
            cold_to_hot,
            hot_to_cold,
            consumed: snapshot.consumed_nonces.into_iter().collect(),
        })
    }
}

/// Serializable form of [`DelegationState`] for the host to persist.
#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DelegationSnapshot {
    /// Forward links, sorted by cold wallet.
    pub links: Vec<DelegationLink>,
    /// Reverse links, sorted by hot wallet.
    pub reverse_links: Vec<DelegationLink>,
    /// Consumed nonces, sorted.
    pub consumed_nonces: Vec<ConsumedNonce>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn addr(byte: u8) -> Address {
        Address::new([byte; 20])
    }

    #[test]
    fn test_empty_state_resolves_to_null() {
        let state = DelegationState::new();
        assert_eq!(state.hot_wallet(addr(1)), Address::ZERO);
        assert_eq!(state.cold_wallet(addr(1)), Address::ZERO);
        assert_eq!(state.link_count(), 0);
    }

    #[test]
    fn test_link_sets_both_directions() {
        let mut state = DelegationState::new();
        let change = state.apply_link(addr(1), addr(2));

        assert_eq!(change.previous_hot, Address::ZERO);
        assert_eq!(change.hot, addr(2));
        assert_eq!(state.hot_wallet(addr(1)), addr(2));
        assert_eq!(state.cold_wallet(addr(2)), addr(1));
    }

    #[test]
    fn test_repoint_clears_stale_reverse_link() {
        let mut state = DelegationState::new();
        state.apply_link(addr(1), addr(2));
        let change = state.apply_link(addr(1), addr(3));

        assert_eq!(change.previous_hot, addr(2));
        assert_eq!(state.hot_wallet(addr(1)), addr(3));
        assert_eq!(state.cold_wallet(addr(3)), addr(1));
        assert_eq!(state.cold_wallet(addr(2)), Address::ZERO);
    }

    #[test]
    fn test_clear_to_null() {
        let mut state = DelegationState::new();
        state.apply_link(addr(1), addr(2));
        let change = state.apply_link(addr(1), Address::ZERO);

        assert_eq!(change.previous_hot, addr(2));
        assert_eq!(state.hot_wallet(addr(1)), Address::ZERO);
        assert_eq!(state.cold_wallet(addr(2)), Address::ZERO);
        assert_eq!(state.cold_wallet(Address::ZERO), Address::ZERO);
        assert_eq!(state.link_count(), 0);
    }

    #[test]
    fn test_relink_same_hot_is_idempotent() {
        let mut state = DelegationState::new();
        state.apply_link(addr(1), addr(2));
        let change = state.apply_link(addr(1), addr(2));

        assert_eq!(change.previous_hot, addr(2));
        assert_eq!(state.cold_wallet(addr(2)), addr(1));
    }

    #[test]
    fn test_taken_over_hot_keeps_new_owner() {
        // Cold 1 delegates to 9, then cold 2 claims 9 as well.
        let mut state = DelegationState::new();
        state.apply_link(addr(1), addr(9));
        state.apply_link(addr(2), addr(9));
        assert_eq!(state.cold_wallet(addr(9)), addr(2));

        // Cold 1 moving away must not erase cold 2's reverse link.
        state.apply_link(addr(1), addr(3));
        assert_eq!(state.cold_wallet(addr(9)), addr(2));
        assert_eq!(state.cold_wallet(addr(3)), addr(1));
    }

    #[test]
    fn test_nonce_consumed_once() {
        let mut state = DelegationState::new();
        assert!(!state.is_nonce_consumed(addr(1), U256::from(5)));
        assert!(state.consume_nonce(addr(1), U256::from(5)));
        assert!(!state.consume_nonce(addr(1), U256::from(5)));
        assert!(state.is_nonce_consumed(addr(1), U256::from(5)));

        // Scoped per cold wallet
        assert!(!state.is_nonce_consumed(addr(2), U256::from(5)));
    }

    #[test]
    fn test_snapshot_roundtrip() {
        let mut state = DelegationState::new();
        state.apply_link(addr(1), addr(2));
        state.apply_link(addr(3), addr(4));
        state.apply_link(addr(3), addr(5));
        state.consume_nonce(addr(3), U256::from(77));

        let restored = DelegationState::from_snapshot(state.snapshot()).unwrap();
        assert_eq!(restored, state);
    }

    #[test]
    fn test_snapshot_is_sorted() {
        let mut state = DelegationState::new();
        state.apply_link(addr(9), addr(1));
        state.apply_link(addr(2), addr(8));

        let snapshot = state.snapshot();
        assert_eq!(snapshot.links[0].cold, addr(2));
        assert_eq!(snapshot.reverse_links[0].hot, addr(1));
    }

    #[test]
    fn test_snapshot_after_takeover_restores() {
        let mut state = DelegationState::new();
        state.apply_link(addr(1), addr(9));
        state.apply_link(addr(2), addr(9));
        state.apply_link(addr(2), addr(3));

        let restored = DelegationState::from_snapshot(state.snapshot()).unwrap();
        assert_eq!(restored, state);
    }

    fn link(cold: u8, hot: u8) -> DelegationLink {
        DelegationLink {
            cold: addr(cold),
            hot: addr(hot),
        }
    }

    #[test]
    fn test_restore_rejects_orphaned_reverse_link() {
        // Reverse 2 -> 1 while the forward link says 1 -> 3.
        let snapshot = DelegationSnapshot {
            links: vec![link(1, 3)],
            reverse_links: vec![link(1, 2), link(1, 3)],
            consumed_nonces: vec![],
        };

        assert_eq!(
            DelegationState::from_snapshot(snapshot),
            Err(SnapshotError::OrphanedReverseLink {
                hot: addr(2),
                cold: addr(1)
            })
        );
    }

    #[test]
    fn test_restore_rejects_reverse_link_without_forward() {
        let snapshot = DelegationSnapshot {
            links: vec![],
            reverse_links: vec![link(1, 2)],
            consumed_nonces: vec![],
        };

        assert!(matches!(
            DelegationState::from_snapshot(snapshot),
            Err(SnapshotError::OrphanedReverseLink { .. })
        ));
    }

    #[test]
    fn test_restore_rejects_null_entries() {
        let null_hot = DelegationSnapshot {
            links: vec![link(1, 0)],
            ..DelegationSnapshot::default()
        };
        assert_eq!(
            DelegationState::from_snapshot(null_hot),
            Err(SnapshotError::NullHotWallet { cold: addr(1) })
        );

        let null_key = DelegationSnapshot {
            links: vec![link(1, 2)],
            reverse_links: vec![link(1, 0)],
            consumed_nonces: vec![],
        };
        assert_eq!(
            DelegationState::from_snapshot(null_key),
            Err(SnapshotError::NullReverseKey { cold: addr(1) })
        );
    }

    #[test]
    fn test_restore_rejects_duplicates() {
        let duplicate_cold = DelegationSnapshot {
            links: vec![link(1, 2), link(1, 3)],
            ..DelegationSnapshot::default()
        };
        assert_eq!(
            DelegationState::from_snapshot(duplicate_cold),
            Err(SnapshotError::DuplicateLink { cold: addr(1) })
        );

        let duplicate_hot = DelegationSnapshot {
            links: vec![link(1, 2)],
            reverse_links: vec![link(1, 2), link(1, 2)],
            consumed_nonces: vec![],
        };
        assert_eq!(
            DelegationState::from_snapshot(duplicate_hot),
            Err(SnapshotError::DuplicateReverseLink { hot: addr(2) })
        );
    }
}
