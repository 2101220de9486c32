//! # Delegation Registry Service
//!
//! Application service implementing [`DelegationApi`].
//!
//! ## Activation Protocols
//!
//! | Protocol | Authentication | Nonce |
//! |----------|----------------|-------|
//! | `set_hot_wallet_direct` | caller identity from the host | none |
//! | `set_hot_wallet_by_signature` | recovered signer == `cold` | consumed on success |
//!
//! Both end in the same link update, which is the only writer to the
//! store's maps, and both publish a [`DelegationChanged`] notification.
//! The notification is published under the store's write lock, so the
//! sink sees changes in commit order.

use crate::adapters::{Secp256k1Recovery, TracingEventSink};
use crate::domain::ecdsa::{self, RecoveryPolicy};
use crate::domain::value_objects::{Address, U256};
use crate::errors::DelegationError;
use crate::events::DelegationChanged;
use crate::ports::inbound::DelegationApi;
use crate::ports::outbound::{DelegationEventSink, SignerRecovery};
use crate::store::DelegationStore;
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, info, instrument, warn};

/// Registry configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RegistryConfig {
    /// Reject high-S signatures instead of normalizing them.
    pub reject_malleable_signatures: bool,
    /// Accept `v` of 0/1 as well as 27/28.
    pub accept_raw_recovery_ids: bool,
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self {
            reject_malleable_signatures: true,
            accept_raw_recovery_ids: true,
        }
    }
}

impl RegistryConfig {
    /// Signature recovery policy derived from this config.
    #[must_use]
    pub fn recovery_policy(&self) -> RecoveryPolicy {
        RecoveryPolicy {
            reject_malleable: self.reject_malleable_signatures,
            accept_raw_recovery_ids: self.accept_raw_recovery_ids,
        }
    }
}

/// Counters for the registry service.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct RegistryStats {
    /// Updates through the direct protocol.
    pub direct_updates: u64,
    /// Updates through the signature protocol.
    pub signature_updates: u64,
    /// Signature submissions rejected for a reused nonce.
    pub replayed_nonces: u64,
    /// Signature submissions recovering to the wrong signer.
    pub signer_mismatches: u64,
    /// Signature submissions that could not be decoded or recovered.
    pub invalid_signatures: u64,
}

impl RegistryStats {
    fn record_rejection(&mut self, error: &DelegationError) {
        match error {
            DelegationError::ReplayedNonce { .. } => self.replayed_nonces += 1,
            DelegationError::SignerMismatch { .. } => self.signer_mismatches += 1,
            DelegationError::InvalidSignature(_) => self.invalid_signatures += 1,
        }
    }
}

/// The delegation registry.
pub struct DelegationRegistry<R: SignerRecovery, E: DelegationEventSink> {
    /// Shared delegation state.
    store: Arc<DelegationStore>,
    /// Signer recovery primitive.
    recovery: R,
    /// Notification sink.
    events: E,
    /// Service statistics.
    stats: RwLock<RegistryStats>,
}

impl DelegationRegistry<Secp256k1Recovery, TracingEventSink> {
    /// Registry with secp256k1 recovery configured from `config` and
    /// notifications logged through `tracing`.
    #[must_use]
    pub fn from_config(store: Arc<DelegationStore>, config: &RegistryConfig) -> Self {
        Self::new(
            store,
            Secp256k1Recovery::with_policy(config.recovery_policy()),
            TracingEventSink,
        )
    }
}

impl<R: SignerRecovery, E: DelegationEventSink> DelegationRegistry<R, E> {
    /// Create a registry over `store`.
    pub fn new(store: Arc<DelegationStore>, recovery: R, events: E) -> Self {
        Self {
            store,
            recovery,
            events,
            stats: RwLock::new(RegistryStats::default()),
        }
    }

    /// The shared store this registry writes to.
    #[must_use]
    pub fn store(&self) -> &Arc<DelegationStore> {
        &self.store
    }

    /// Current statistics.
    #[must_use]
    pub fn stats(&self) -> RegistryStats {
        self.stats.read().clone()
    }

    /// Log and publish `change`. Called with the store's write lock held.
    fn publish_change(&self, change: &DelegationChanged) {
        if change.is_cleared() {
            info!(cold = %change.cold, previous_hot = %change.previous_hot, "Delegation cleared");
        } else {
            info!(
                cold = %change.cold,
                previous_hot = %change.previous_hot,
                hot = %change.hot,
                "Delegation set"
            );
        }
        self.events.publish(change);
    }
}

impl<R: SignerRecovery, E: DelegationEventSink> DelegationApi for DelegationRegistry<R, E> {
    #[instrument(skip_all, fields(caller = %caller, hot = %hot))]
    fn set_hot_wallet_direct(&self, caller: Address, hot: Address) {
        self.store.update(|state| {
            let change = state.apply_link(caller, hot);
            self.publish_change(&change);
        });

        self.stats.write().direct_updates += 1;
    }

    #[instrument(skip_all, fields(cold = %cold, hot = %hot, nonce = %nonce))]
    fn set_hot_wallet_by_signature(
        &self,
        cold: Address,
        hot: Address,
        nonce: U256,
        signature: &[u8],
    ) -> Result<(), DelegationError> {
        let message_hash = ecdsa::delegation_message_hash(nonce, hot);

        let result = self.store.transact(|state| {
            if state.is_nonce_consumed(cold, nonce) {
                return Err(DelegationError::ReplayedNonce { cold, nonce });
            }

            let signer = self.recovery.recover_signer(&message_hash, signature)?;
            if signer != cold {
                return Err(DelegationError::SignerMismatch {
                    expected: cold,
                    actual: signer,
                });
            }
            debug!(signer = %signer, "Delegation signature verified");

            state.consume_nonce(cold, nonce);
            let change = state.apply_link(cold, hot);
            self.publish_change(&change);
            Ok(())
        });

        match result {
            Ok(()) => {
                self.stats.write().signature_updates += 1;
                Ok(())
            }
            Err(error) => {
                warn!(kind = error.kind(), %error, "Delegation by signature rejected");
                self.stats.write().record_rejection(&error);
                Err(error)
            }
        }
    }

    fn get_hot_wallet(&self, cold: Address) -> Address {
        self.store.hot_wallet(cold)
    }

    fn get_cold_wallet(&self, hot: Address) -> Address {
        self.store.cold_wallet(hot)
    }

    fn is_nonce_consumed(&self, cold: Address, nonce: U256) -> bool {
        self.store.is_nonce_consumed(cold, nonce)
    }
}
