//! Proportional token distribution over an epoch's participation scores.
//!
//! Pure and deterministic: the same inputs always yield the same allocation,
//! independent of input order.

use civitas_store::ParticipationScore;
use civitas_types::{mul_div_rem, Address};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// What to do with the tokens integer truncation leaves over.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RemainderPolicy {
    /// Keep the leftover undistributed and report it in [`Distribution::remainder`].
    /// It is not carried into the next epoch.
    #[default]
    Retain,
    /// Hand leftover tokens out one at a time, largest truncated fraction first
    /// (ties broken by address), so the whole budget is allocated.
    LargestRemainder,
}

/// Outcome of one epoch's distribution.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Distribution {
    pub epoch: u64,
    pub allocations: BTreeMap<Address, u128>,
    pub distributed: u128,
    /// Tokens of the budget that were not allocated.
    pub remainder: u128,
}

impl Distribution {
    fn empty(epoch: u64, total_tokens: u128) -> Self {
        Self {
            epoch,
            allocations: BTreeMap::new(),
            distributed: 0,
            remainder: total_tokens,
        }
    }
}

/// Smallest right shift that lets every score, shifted, sum without overflow.
fn score_shift(participants: &[ParticipationScore]) -> u32 {
    (0..u128::BITS)
        .find(|shift| {
            participants
                .iter()
                .try_fold(0u128, |acc, p| acc.checked_add(p.score >> shift))
                .is_some()
        })
        .unwrap_or(u128::BITS - 1)
}

/// Split `total_tokens` across participants in proportion to their scores.
///
/// Each share is `floor(total_tokens * score / total_score)`. Repeated addresses
/// have their scores summed. A zero total score yields an empty allocation.
///
/// Scores whose sum would overflow `u128` are all shifted right by the same
/// amount first, so the shares stay proportional and never exceed the budget.
pub fn compute_distribution(
    epoch: u64,
    participants: &[ParticipationScore],
    total_tokens: u128,
    policy: RemainderPolicy,
) -> Distribution {
    let shift = score_shift(participants);
    let mut scores: BTreeMap<&Address, u128> = BTreeMap::new();
    for p in participants {
        // cannot overflow: the shifted total fits
        *scores.entry(&p.address).or_default() += p.score >> shift;
    }
    let total_score: u128 = scores.values().sum();
    if total_score == 0 {
        return Distribution::empty(epoch, total_tokens);
    }

    let mut allocations = BTreeMap::new();
    let mut fractions = Vec::with_capacity(scores.len());
    let mut distributed: u128 = 0;
    for (address, score) in scores {
        let (share, frac) = mul_div_rem(total_tokens, score, total_score);
        distributed += share;
        allocations.insert(address.clone(), share);
        fractions.push((frac, address));
    }

    if policy == RemainderPolicy::LargestRemainder {
        let leftover = total_tokens - distributed;
        // Stable sort keeps address order among equal fractions.
        fractions.sort_by(|a, b| b.0.cmp(&a.0));
        for (_, address) in fractions.into_iter().take(leftover as usize) {
            if let Some(share) = allocations.get_mut(address) {
                *share += 1;
                distributed += 1;
            }
        }
    }

    Distribution {
        epoch,
        allocations,
        distributed,
        remainder: total_tokens - distributed,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn score(name: &str, score: u128) -> ParticipationScore {
        ParticipationScore {
            address: Address::new(name),
            score,
        }
    }

    #[test]
    fn proportional_shares() {
        let d = compute_distribution(
            1,
            &[score("a", 1), score("b", 3)],
            1_000,
            RemainderPolicy::Retain,
        );
        assert_eq!(d.allocations[&Address::new("a")], 250);
        assert_eq!(d.allocations[&Address::new("b")], 750);
        assert_eq!(d.distributed, 1_000);
        assert_eq!(d.remainder, 0);
    }

    #[test]
    fn zero_total_score_is_empty() {
        let d = compute_distribution(1, &[score("a", 0)], 1_000, RemainderPolicy::Retain);
        assert!(d.allocations.is_empty());
        assert_eq!(d.remainder, 1_000);

        let none = compute_distribution(1, &[], 1_000, RemainderPolicy::LargestRemainder);
        assert!(none.allocations.is_empty());
    }

    #[test]
    fn retain_reports_truncated_remainder() {
        let d = compute_distribution(
            3,
            &[score("a", 1), score("b", 1), score("c", 1)],
            100,
            RemainderPolicy::Retain,
        );
        assert!(d.allocations.values().all(|v| *v == 33));
        assert_eq!(d.distributed, 99);
        assert_eq!(d.remainder, 1);
    }

    #[test]
    fn largest_remainder_allocates_everything() {
        let d = compute_distribution(
            3,
            &[score("a", 1), score("b", 1), score("c", 1)],
            101,
            RemainderPolicy::LargestRemainder,
        );
        // equal fractions: ties go to the lowest addresses
        assert_eq!(d.allocations[&Address::new("a")], 34);
        assert_eq!(d.allocations[&Address::new("b")], 34);
        assert_eq!(d.allocations[&Address::new("c")], 33);
        assert_eq!(d.distributed, 101);
        assert_eq!(d.remainder, 0);
    }

    #[test]
    fn largest_fraction_wins_leftover() {
        // shares: a = 10*2/7 = 2.857, b = 10*5/7 = 7.142
        let d = compute_distribution(
            1,
            &[score("a", 2), score("b", 5)],
            10,
            RemainderPolicy::LargestRemainder,
        );
        assert_eq!(d.allocations[&Address::new("a")], 3);
        assert_eq!(d.allocations[&Address::new("b")], 7);
    }

    #[test]
    fn duplicate_addresses_merge() {
        let d = compute_distribution(
            1,
            &[score("a", 1), score("a", 1), score("b", 2)],
            100,
            RemainderPolicy::Retain,
        );
        assert_eq!(d.allocations.len(), 2);
        assert_eq!(d.allocations[&Address::new("a")], 50);
    }

    #[test]
    fn scores_summing_past_u128_stay_within_budget() {
        let d = compute_distribution(
            1,
            &[score("a", u128::MAX), score("b", u128::MAX)],
            1_000,
            RemainderPolicy::Retain,
        );
        assert_eq!(d.allocations[&Address::new("a")], 500);
        assert_eq!(d.allocations[&Address::new("b")], 500);
        assert_eq!(d.remainder, 0);

        let d = compute_distribution(
            1,
            &[score("a", u128::MAX), score("a", u128::MAX), score("b", u128::MAX / 2)],
            1_001,
            RemainderPolicy::LargestRemainder,
        );
        assert_eq!(d.distributed, 1_001);
        assert!(d.allocations[&Address::new("a")] > d.allocations[&Address::new("b")]);
    }

    #[test]
    fn input_order_does_not_matter() {
        let forward = [score("a", 7), score("b", 11), score("c", 13)];
        let mut backward = forward.clone();
        backward.reverse();
        assert_eq!(
            compute_distribution(9, &forward, 1_000_003, RemainderPolicy::LargestRemainder),
            compute_distribution(9, &backward, 1_000_003, RemainderPolicy::LargestRemainder),
        );
    }
}
