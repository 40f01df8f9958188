//! Engine configuration with TOML file support.

use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::distribution::RemainderPolicy;
use crate::quorum::QuorumTable;
use crate::GovernanceError;

/// Tunables of the voting-power engine.
///
/// Can be loaded from a TOML file via [`EngineConfig::from_toml_file`] or
/// built programmatically (e.g. for tests). Every field has a default, so an
/// empty file is a valid configuration.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Minimum adjusted power required to vote.
    #[serde(default = "default_min_voting_power")]
    pub min_voting_power: u64,

    /// Proposal creation requires `min_voting_power * proposal_multiplier`.
    #[serde(default = "default_proposal_multiplier")]
    pub proposal_multiplier: u64,

    /// Maximum lockup bonus in basis points of the staked amount (5000 = +50%).
    #[serde(default = "default_staking_bonus_max_bps")]
    pub staking_bonus_max_bps: u32,

    /// Remaining lockup at which the full bonus applies.
    #[serde(default = "default_max_lockup_secs")]
    pub max_lockup_secs: u64,

    /// Lifetime of a cached voting-power entry.
    #[serde(default = "default_cache_ttl_secs")]
    pub cache_ttl_secs: u64,

    /// Deadline for every ledger, delegation, cache and history call.
    #[serde(default = "default_call_timeout_ms")]
    pub call_timeout_ms: u64,

    /// Hop limit when walking delegation chains.
    #[serde(default = "default_max_delegation_depth")]
    pub max_delegation_depth: usize,

    /// Vote history entries kept per address.
    #[serde(default = "default_history_retention")]
    pub history_retention: usize,

    /// What happens to tokens left over by integer truncation.
    #[serde(default)]
    pub remainder_policy: RemainderPolicy,

    /// Log format: "human" or "json".
    #[serde(default = "default_log_format")]
    pub log_format: String,

    /// Log level filter: "trace", "debug", "info", "warn", "error".
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Quorum fraction per proposal category.
    // Must stay the last field: TOML tables follow plain values.
    #[serde(default)]
    pub quorum: QuorumTable,
}

// ── Serde default helpers ──────────────────────────────────────────────

fn default_min_voting_power() -> u64 {
    100
}

fn default_proposal_multiplier() -> u64 {
    10
}

fn default_staking_bonus_max_bps() -> u32 {
    5_000
}

fn default_max_lockup_secs() -> u64 {
    365 * 24 * 60 * 60
}

fn default_cache_ttl_secs() -> u64 {
    300
}

fn default_call_timeout_ms() -> u64 {
    2_000
}

fn default_max_delegation_depth() -> usize {
    64
}

fn default_history_retention() -> usize {
    100
}

fn default_log_format() -> String {
    "human".to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

// ── Impl ───────────────────────────────────────────────────────────────

impl EngineConfig {
    /// Load configuration from a TOML file.
    pub fn from_toml_file(path: &str) -> Result<Self, GovernanceError> {
        let content =
            std::fs::read_to_string(path).map_err(|e| GovernanceError::Config(e.to_string()))?;
        Self::from_toml_str(&content)
    }

    /// Parse configuration from a TOML string.
    pub fn from_toml_str(s: &str) -> Result<Self, GovernanceError> {
        let config: Self = toml::from_str(s).map_err(|e| GovernanceError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Serialize the configuration to a TOML string.
    pub fn to_toml_string(&self) -> Result<String, GovernanceError> {
        toml::to_string_pretty(self).map_err(|e| GovernanceError::Config(e.to_string()))
    }

    /// Reject values the engine cannot run with.
    pub fn validate(&self) -> Result<(), GovernanceError> {
        if self.max_lockup_secs == 0 {
            return Err(GovernanceError::Config("max_lockup_secs must be positive".into()));
        }
        if self.call_timeout_ms == 0 {
            return Err(GovernanceError::Config("call_timeout_ms must be positive".into()));
        }
        if self.max_delegation_depth == 0 {
            return Err(GovernanceError::Config(
                "max_delegation_depth must be positive".into(),
            ));
        }
        if self.history_retention == 0 {
            return Err(GovernanceError::Config("history_retention must be positive".into()));
        }
        self.quorum.validate()
    }

    pub fn call_timeout(&self) -> Duration {
        Duration::from_millis(self.call_timeout_ms)
    }

    /// Adjusted power needed to vote.
    pub fn vote_threshold(&self) -> u128 {
        self.min_voting_power as u128
    }

    /// Adjusted power needed to create a proposal.
    pub fn proposal_threshold(&self) -> u128 {
        (self.min_voting_power as u128).saturating_mul(self.proposal_multiplier as u128)
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            min_voting_power: default_min_voting_power(),
            proposal_multiplier: default_proposal_multiplier(),
            staking_bonus_max_bps: default_staking_bonus_max_bps(),
            max_lockup_secs: default_max_lockup_secs(),
            cache_ttl_secs: default_cache_ttl_secs(),
            call_timeout_ms: default_call_timeout_ms(),
            max_delegation_depth: default_max_delegation_depth(),
            history_retention: default_history_retention(),
            remainder_policy: RemainderPolicy::default(),
            log_format: default_log_format(),
            log_level: default_log_level(),
            quorum: QuorumTable::default(),
        }
    }
}
