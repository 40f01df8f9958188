//! Pre-built [`tracing::Span`] constructors for engine operations.
//!
//! Consistent span names and field sets make it easy to filter and correlate
//! traces for a single address across power, delegation and vote handling.

use civitas_types::{Address, ProposalId};
use tracing::{info_span, Span};

/// Span covering one voting-power computation.
pub fn power_span(address: &Address) -> Span {
    info_span!("voting_power", address = %address)
}

/// Span covering a delegation change. `to` is None for undelegation.
pub fn delegation_span(from: &Address, to: Option<&Address>) -> Span {
    match to {
        Some(to) => info_span!("delegate", from = %from, to = %to),
        None => info_span!("undelegate", from = %from),
    }
}

/// Span covering an eligibility check or vote submission.
pub fn vote_span(address: &Address, proposal: &ProposalId) -> Span {
    info_span!("vote", address = %address, proposal = %proposal)
}

/// Span covering one epoch's token distribution.
pub fn distribution_span(epoch: u64) -> Span {
    info_span!("distribution", epoch = %epoch)
}
