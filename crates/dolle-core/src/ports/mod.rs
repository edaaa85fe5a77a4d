//! Ports - trait definitions for external dependencies.
//! These are the "interfaces" that infrastructure must implement.

mod counter_store;
mod generator;
mod ledger;

pub use counter_store::CounterStore;
pub use generator::{ArtifactRelay, Destination, ImageGenerator};
pub use ledger::{LedgerStream, UsageLedger};
