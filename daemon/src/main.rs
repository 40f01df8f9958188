//! civitas: command-line front end for the voting-power engine.

use anyhow::Context;
use civitas_governance::{Collaborators, EngineConfig, GovernanceEngine, RemainderPolicy};
use civitas_nullables::{
    NullCache, NullClock, NullDelegationStore, NullHistoryStore, NullLedger, NullParticipation, NullSupply,
};
use civitas_store::ParticipationScore;
use civitas_types::{Address, Clock, StakingPosition, SystemClock, Timestamp, VotingPower};
use civitas_utils::{format_lockup, init_logging, LogFormat};
use clap::Parser;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::Arc;

#[derive(Parser)]
#[command(name = "civitas", about = "Stake-weighted DAO voting power engine")]
struct Cli {
    /// Path to a TOML configuration file. Missing fields take their defaults.
    #[arg(long, env = "CIVITAS_CONFIG")]
    config: Option<PathBuf>,

    /// Log level: "trace", "debug", "info", "warn", "error". Overrides the config file.
    #[arg(long, env = "CIVITAS_LOG_LEVEL")]
    log_level: Option<String>,

    /// Log format: "human" or "json". Overrides the config file.
    #[arg(long, env = "CIVITAS_LOG_FORMAT")]
    log_format: Option<String>,

    /// Subcommand.
    #[command(subcommand)]
    command: Command,
}

#[derive(clap::Subcommand)]
enum Command {
    /// Print the effective configuration as TOML.
    Config,

    /// Compute the quorum for a proposal category.
    Quorum {
        #[arg(long)]
        category: String,
        /// Total token supply.
        #[arg(long)]
        supply: u128,
    },

    /// Split an epoch's token budget over participation scores.
    Distribute {
        #[arg(long)]
        epoch: u64,
        /// Token budget for the epoch.
        #[arg(long)]
        tokens: u128,
        /// JSON file with `[{"address": ..., "score": ...}]`.
        #[arg(long)]
        scores: PathBuf,
        /// Override the configured remainder policy: "retain" or "largest_remainder".
        #[arg(long)]
        policy: Option<String>,
    },

    /// Compute an address's voting power over staking positions read from a file.
    Power {
        /// JSON file with `[{"owner", "amount", "start_time", "lockup_period_secs"}]`.
        #[arg(long)]
        positions: PathBuf,
        /// Optional JSON file with `[{"from": ..., "to": ...}]` delegation edges.
        #[arg(long)]
        delegations: Option<PathBuf>,
        #[arg(long)]
        address: String,
        /// Evaluate at this Unix time instead of now.
        #[arg(long)]
        at: Option<u64>,
    },
}

#[derive(Deserialize)]
struct PositionInput {
    owner: String,
    amount: u128,
    start_time: u64,
    lockup_period_secs: u64,
}

#[derive(Deserialize)]
struct DelegationInput {
    from: String,
    to: String,
}

#[derive(Serialize)]
struct PowerReport {
    power: VotingPower,
    can_create_proposal: bool,
    lockups: Vec<String>,
}

fn read_json<T: serde::de::DeserializeOwned>(path: &Path) -> anyhow::Result<T> {
    let contents =
        std::fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;
    serde_json::from_str(&contents).with_context(|| format!("parsing {}", path.display()))
}

fn load_config(path: Option<&Path>) -> anyhow::Result<EngineConfig> {
    match path {
        Some(path) => {
            let path_str = path.to_str().context("config path is not valid UTF-8")?;
            EngineConfig::from_toml_file(path_str).with_context(|| format!("loading {}", path.display()))
        }
        None => Ok(EngineConfig::default()),
    }
}

fn in_memory_engine(
    config: EngineConfig,
    clock: Arc<dyn Clock>,
    ledger: Arc<NullLedger>,
    delegations: Arc<NullDelegationStore>,
) -> anyhow::Result<GovernanceEngine> {
    let engine = GovernanceEngine::new(
        config,
        Collaborators {
            stakes: ledger,
            delegations,
            cache: Arc::new(NullCache::new(clock.clone())),
            history: Arc::new(NullHistoryStore::new()),
            supply: Arc::new(NullSupply::new(0)),
            participation: Arc::new(NullParticipation::new()),
            clock,
        },
    )?;
    Ok(engine)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let mut config = load_config(cli.config.as_deref())?;
    if let Some(level) = cli.log_level {
        config.log_level = level;
    }
    if let Some(format) = cli.log_format {
        config.log_format = format;
    }
    let format: LogFormat = config.log_format.parse()?;
    init_logging(format, &config.log_level);

    match cli.command {
        Command::Config => {
            print!("{}", config.to_toml_string()?);
        }

        Command::Quorum { category, supply } => {
            let quorum = config.quorum.compute_quorum(&category, supply);
            tracing::info!(%category, bps = config.quorum.bps_for(&category), "quorum computed");
            println!("{quorum}");
        }

        Command::Distribute {
            epoch,
            tokens,
            scores,
            policy,
        } => {
            if let Some(policy) = policy {
                config.remainder_policy = match policy.as_str() {
                    "retain" => RemainderPolicy::Retain,
                    "largest_remainder" | "largest-remainder" => RemainderPolicy::LargestRemainder,
                    other => anyhow::bail!("unknown remainder policy {other:?}"),
                };
            }
            let scores: Vec<ParticipationScore> = read_json(&scores)?;
            let distribution =
                civitas_governance::compute_distribution(epoch, &scores, tokens, config.remainder_policy);
            tracing::info!(
                epoch,
                participants = distribution.allocations.len(),
                remainder = distribution.remainder,
                "distribution computed"
            );
            println!("{}", serde_json::to_string_pretty(&distribution)?);
        }

        Command::Power {
            positions,
            delegations,
            address,
            at,
        } => {
            let address = Address::parse(address)?;
            let clock: Arc<dyn Clock> = match at {
                Some(secs) => Arc::new(NullClock::new(secs)),
                None => Arc::new(SystemClock),
            };
            let now = clock.now();

            let ledger = Arc::new(NullLedger::new());
            let mut lockups = Vec::new();
            for input in read_json::<Vec<PositionInput>>(&positions)? {
                let position = StakingPosition::new(
                    Address::parse(input.owner)?,
                    input.amount,
                    Timestamp::new(input.start_time),
                    input.lockup_period_secs,
                )?;
                if position.owner == address && position.is_active(now) {
                    lockups.push(format_lockup(position.remaining_lockup(now)));
                }
                ledger.add_position(position);
            }

            let store = Arc::new(NullDelegationStore::new());
            let engine = in_memory_engine(config, clock, ledger, store)?;
            if let Some(path) = delegations {
                for edge in read_json::<Vec<DelegationInput>>(&path)? {
                    let (from, to) = (Address::parse(edge.from)?, Address::parse(edge.to)?);
                    engine
                        .delegate(&from, &to)
                        .await
                        .with_context(|| format!("delegating {from} to {to}"))?;
                }
            }

            let report = PowerReport {
                power: engine.compute_voting_power(&address).await,
                can_create_proposal: engine.can_create_proposal(&address).await,
                lockups,
            };
            println!("{}", serde_json::to_string_pretty(&report)?);
        }
    }

    Ok(())
}
