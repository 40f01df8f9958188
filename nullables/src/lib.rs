//! Nullable infrastructure for deterministic testing.
//!
//! All external collaborators of the engine (clock, ledger, delegation store,
//! cache, vote history, supply and participation sources) are abstracted behind
//! traits. This crate provides in-memory implementations that:
//! - Return deterministic values
//! - Can be controlled programmatically (time, outages, latency)
//! - Never touch the filesystem or network
//!
//! Usage: swap real implementations for nullables in tests and local runs.

pub mod cache;
pub mod clock;
pub mod delegation;
pub mod faults;
pub mod history;
pub mod ledger;
pub mod sources;

pub use cache::NullCache;
pub use clock::NullClock;
pub use delegation::NullDelegationStore;
pub use faults::Faults;
pub use history::NullHistoryStore;
pub use ledger::NullLedger;
pub use sources::{NullParticipation, NullSupply};
