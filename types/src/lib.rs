//! Fundamental types for the Civitas voting-power engine.
//!
//! This crate defines the core types shared across every other crate in the workspace:
//! addresses, proposal ids, timestamps and clocks, staking positions, computed voting
//! power, vote records, and the integer math the power computation is built on.

pub mod address;
pub mod error;
pub mod math;
pub mod power;
pub mod staking;
pub mod time;
pub mod vote;

pub use address::{Address, ProposalId};
pub use error::TypesError;
pub use math::{isqrt, mul_div_floor, mul_div_rem, BPS_DENOMINATOR};
pub use power::VotingPower;
pub use staking::StakingPosition;
pub use time::{Clock, SystemClock, Timestamp};
pub use vote::{VoteRecord, VotingMethod};
