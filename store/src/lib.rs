//! Abstract collaborator traits for the Civitas engine.
//!
//! Every backend (on-chain reader, database, Redis, in-memory for testing)
//! implements these traits. The engine depends only on the traits, and every
//! method is async so callers can bound each call with a timeout.

pub mod cache;
pub mod delegation;
pub mod error;
pub mod history;
pub mod sources;
pub mod stake;

pub use cache::KvCache;
pub use delegation::DelegationStore;
pub use error::StoreError;
pub use history::VoteHistoryStore;
pub use sources::{ParticipationScore, ParticipationSource, SupplySource};
pub use stake::StakeReader;
