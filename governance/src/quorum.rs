//! Per-category quorum thresholds.

use crate::GovernanceError;
use civitas_types::{mul_div_floor, BPS_DENOMINATOR};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Static mapping `category → fraction of total supply` (basis points).
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuorumTable {
    /// Fraction used for categories missing from `categories`.
    #[serde(default = "default_quorum_bps")]
    pub default_bps: u32,

    #[serde(default = "default_categories")]
    pub categories: BTreeMap<String, u32>,
}

fn default_quorum_bps() -> u32 {
    1_000
}

fn default_categories() -> BTreeMap<String, u32> {
    [
        ("treasury", 1_500),
        ("protocol", 2_000),
        ("community", 1_000),
        ("agro-projects", 1_200),
        ("other", 500),
    ]
    .into_iter()
    .map(|(name, bps)| (name.to_string(), bps))
    .collect()
}

impl Default for QuorumTable {
    fn default() -> Self {
        Self {
            default_bps: default_quorum_bps(),
            categories: default_categories(),
        }
    }
}

impl QuorumTable {
    /// Fraction (bps) that applies to `category`.
    pub fn bps_for(&self, category: &str) -> u32 {
        self.categories
            .get(category)
            .copied()
            .unwrap_or(self.default_bps)
    }

    /// `floor(total_supply * fraction)` for `category`.
    pub fn compute_quorum(&self, category: &str, total_supply: u128) -> u128 {
        mul_div_floor(total_supply, self.bps_for(category) as u128, BPS_DENOMINATOR)
    }

    /// Every fraction must lie in `0..=10000` bps.
    pub fn validate(&self) -> Result<(), GovernanceError> {
        let limit = BPS_DENOMINATOR as u32;
        if self.default_bps > limit {
            return Err(GovernanceError::Config(format!(
                "quorum default_bps {} exceeds {limit}",
                self.default_bps
            )));
        }
        if let Some((name, bps)) = self.categories.iter().find(|(_, bps)| **bps > limit) {
            return Err(GovernanceError::Config(format!(
                "quorum for {name:?} is {bps} bps, exceeds {limit}"
            )));
        }
        Ok(())
    }
}
