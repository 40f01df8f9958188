//! Errors raised while constructing core types.

use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum TypesError {
    #[error("invalid address: {0:?}")]
    InvalidAddress(String),

    #[error("staking position amount must be greater than zero")]
    ZeroAmount,

    #[error("lockup period overflows the timestamp range")]
    LockupOverflow,
}
