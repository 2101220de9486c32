//! # Notification Sinks
//!
//! [`DelegationEventSink`] adapters: one that logs, one that records.

use crate::events::{topics, DelegationChanged};
use crate::ports::outbound::DelegationEventSink;
use parking_lot::Mutex;
use tracing::info;

/// Logs every notification through `tracing`.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingEventSink;

impl DelegationEventSink for TracingEventSink {
    fn publish(&self, event: &DelegationChanged) {
        info!(
            topic = topics::DELEGATION_CHANGED,
            cold = %event.cold,
            previous_hot = %event.previous_hot,
            hot = %event.hot,
            "Delegation changed"
        );
    }
}

/// Keeps every notification in memory, in publication order.
#[derive(Debug, Default)]
pub struct RecordingEventSink {
    events: Mutex<Vec<DelegationChanged>>,
}

impl RecordingEventSink {
    /// Create an empty recorder.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// All notifications seen so far.
    #[must_use]
    pub fn events(&self) -> Vec<DelegationChanged> {
        self.events.lock().clone()
    }

    /// Remove and return all recorded notifications.
    pub fn drain(&self) -> Vec<DelegationChanged> {
        std::mem::take(&mut *self.events.lock())
    }
}

impl DelegationEventSink for RecordingEventSink {
    fn publish(&self, event: &DelegationChanged) {
        self.events.lock().push(*event);
    }
}
