//! # Adapters Module
//!
//! Infrastructure adapters implementing the outbound ports.

pub mod ledger;
pub mod recovery;
pub mod sinks;

pub use ledger::InMemoryAssetLedger;
pub use recovery::Secp256k1Recovery;
pub use sinks::{RecordingEventSink, TracingEventSink};
