//! # Event Schema
//!
//! Notifications published for external indexers.

use crate::domain::value_objects::Address;
use serde::{Deserialize, Serialize};

/// Emitted on every successful link update, by either activation protocol.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DelegationChanged {
    /// The cold wallet whose delegation changed.
    pub cold: Address,
    /// Hot wallet before the update (null if none).
    pub previous_hot: Address,
    /// Hot wallet after the update (null if cleared).
    pub hot: Address,
}

impl DelegationChanged {
    /// True if this update removed the delegation.
    #[must_use]
    pub fn is_cleared(&self) -> bool {
        self.hot.is_zero()
    }
}

/// Topic names for the host's event bus.
pub mod topics {
    /// Topic carrying [`super::DelegationChanged`].
    pub const DELEGATION_CHANGED: &str = "delegation.changed";
}
