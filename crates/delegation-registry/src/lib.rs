//! # Delegation Registry
//!
//! Lets a cold wallet delegate to a hot wallet without its key ever
//! touching an online system, and resolves ownership queries through that
//! delegation.
//!
//! ## Architecture
//!
//! This crate follows hexagonal architecture:
//! - **Domain Layer** (`domain/`): Delegation state and signature logic, no I/O
//! - **Ports Layer** (`ports/`): Trait definitions for inbound/outbound interfaces
//! - **Adapters** (`adapters/`): secp256k1 recovery, in-memory ledger, event sinks
//! - **Services** (`registry.rs`, `proxy.rs`): Wire domain logic to ports
//!
//! ## Components
//!
//! | Component | Location | Purpose |
//! |-----------|----------|---------|
//! | Registry | `registry.rs` | Direct and signature activation, cold <-> hot lookup |
//! | Store | `store.rs` | Lock-guarded maps and consumed-nonce set |
//! | Proxy | `proxy.rs` | Identity substitution around ledger queries |
//!
//! ## Outbound Dependencies
//!
//! | Trait | Purpose |
//! |-------|---------|
//! | `SignerRecovery` | Recover who signed a delegation |
//! | `AssetLedger` | Balances and token owners |
//! | `DelegationEventSink` | `DelegationChanged` notifications |
//!
//! ## Usage Example
//!
//! ```ignore
//! use delegation_registry::prelude::*;
//!
//! let store = Arc::new(DelegationStore::new());
//! let registry = DelegationRegistry::from_config(Arc::clone(&store), &RegistryConfig::default());
//! let proxy = OwnershipProxy::new(store, ledger);
//!
//! registry.set_hot_wallet_by_signature(cold, hot, nonce, &signature)?;
//! assert_eq!(proxy.owner_of(asset, token_id)?, hot);
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![allow(clippy::module_name_repetitions)]

pub mod adapters;
pub mod domain;
pub mod errors;
pub mod events;
pub mod ports;
pub mod proxy;
pub mod registry;
pub mod store;

/// Convenient re-exports for common usage.
pub mod prelude {
    pub use crate::domain::ecdsa::{
        address_from_pubkey, delegation_message_hash, keccak256, RecoveryPolicy,
    };
    pub use crate::domain::entities::{ConsumedNonce, DelegationLink, EcdsaSignature};
    pub use crate::domain::state::DelegationSnapshot;
    pub use crate::domain::value_objects::{Address, Hash, U256};

    pub use crate::ports::inbound::{DelegationApi, OwnershipApi};
    pub use crate::ports::outbound::{AssetLedger, DelegationEventSink, SignerRecovery};

    pub use crate::events::DelegationChanged;

    pub use crate::errors::{
        DelegationError, LedgerError, ProxyError, SignatureError, SnapshotError,
    };

    pub use crate::adapters::{
        InMemoryAssetLedger, RecordingEventSink, Secp256k1Recovery, TracingEventSink,
    };

    pub use crate::proxy::OwnershipProxy;
    pub use crate::registry::{DelegationRegistry, RegistryConfig, RegistryStats};
    pub use crate::store::DelegationStore;

    pub use std::sync::Arc;
}

/// Crate version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
