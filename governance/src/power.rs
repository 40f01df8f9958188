//! Voting power calculation: lockup-weighted stake plus delegated-in stake.

use crate::cache::{CacheError, VotingPowerCache};
use crate::call::bounded;
use crate::config::EngineConfig;
use crate::spans::power_span;
use crate::{GovernanceError, INTEGRITY_TARGET};
use civitas_store::{DelegationStore, StakeReader};
use civitas_types::{mul_div_floor, Address, Clock, StakingPosition, Timestamp, VotingPower, BPS_DENOMINATOR};
use std::collections::HashSet;
use std::ops::AddAssign;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn, Instrument};

/// Publish attempts before a computation falls back to bypassing the cache.
const STALE_RETRIES: usize = 2;

/// Parameters of the power formula.
#[derive(Clone, Debug)]
pub struct PowerParams {
    pub bonus_max_bps: u32,
    pub max_lockup_secs: u64,
    pub max_delegation_depth: usize,
    pub call_timeout: Duration,
}

impl From<&EngineConfig> for PowerParams {
    fn from(config: &EngineConfig) -> Self {
        Self {
            bonus_max_bps: config.staking_bonus_max_bps,
            max_lockup_secs: config.max_lockup_secs,
            max_delegation_depth: config.max_delegation_depth,
            call_timeout: config.call_timeout(),
        }
    }
}

/// Raw and lockup-adjusted stake of one or more positions.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct StakePower {
    pub raw: u128,
    pub adjusted: u128,
}

impl AddAssign for StakePower {
    fn add_assign(&mut self, other: Self) {
        self.raw = self.raw.saturating_add(other.raw);
        self.adjusted = self.adjusted.saturating_add(other.adjusted);
    }
}

/// Bonus earned by `amount` with `remaining` seconds of lockup left.
///
/// Grows linearly with the remaining lockup and saturates at `max_lockup`, where it
/// equals `amount * bonus_max_bps / 10000`.
pub fn lockup_bonus(amount: u128, remaining: u64, bonus_max_bps: u32, max_lockup: u64) -> u128 {
    if max_lockup == 0 {
        return 0;
    }
    let effective = remaining.min(max_lockup) as u128;
    mul_div_floor(
        amount,
        bonus_max_bps as u128 * effective,
        BPS_DENOMINATOR * max_lockup as u128,
    )
}

/// Contribution of a single position at `now`. Inactive positions count for nothing.
pub fn position_power(position: &StakingPosition, now: Timestamp, params: &PowerParams) -> StakePower {
    if !position.is_active(now) {
        return StakePower::default();
    }
    let bonus = lockup_bonus(
        position.amount,
        position.remaining_lockup(now),
        params.bonus_max_bps,
        params.max_lockup_secs,
    );
    StakePower {
        raw: position.amount,
        adjusted: position.amount.saturating_add(bonus),
    }
}

/// Computes [`VotingPower`] records, serving them from the cache when fresh.
pub struct VotingPowerCalculator {
    stakes: Arc<dyn StakeReader>,
    delegations: Arc<dyn DelegationStore>,
    cache: Arc<VotingPowerCache>,
    clock: Arc<dyn Clock>,
    params: PowerParams,
}

impl VotingPowerCalculator {
    pub fn new(
        stakes: Arc<dyn StakeReader>,
        delegations: Arc<dyn DelegationStore>,
        cache: Arc<VotingPowerCache>,
        clock: Arc<dyn Clock>,
        params: PowerParams,
    ) -> Self {
        Self {
            stakes,
            delegations,
            cache,
            clock,
            params,
        }
    }

    pub fn params(&self) -> &PowerParams {
        &self.params
    }

    /// Current voting power of `address`.
    ///
    /// Never fails: if a collaborator errors or times out the zero record is
    /// returned, so callers deny rather than over-grant.
    pub async fn compute_voting_power(&self, address: &Address) -> VotingPower {
        let span = power_span(address);
        async {
            for _ in 0..STALE_RETRIES {
                match self.cached_or_computed(address).await {
                    Ok(power) => return power,
                    Err(GovernanceError::Cache(CacheError::Stale(_))) => continue,
                    Err(e) => return self.fail_closed(address, e),
                }
            }
            debug!(%address, "cache kept going stale; computing without it");
            match self.compute_uncached(address).await {
                Ok(power) => power,
                Err(e) => self.fail_closed(address, e),
            }
        }
        .instrument(span)
        .await
    }

    fn fail_closed(&self, address: &Address, error: GovernanceError) -> VotingPower {
        warn!(%address, %error, "voting power unavailable; using zero");
        VotingPower::zero(address.clone(), self.clock.now())
    }

    async fn cached_or_computed(&self, address: &Address) -> Result<VotingPower, GovernanceError> {
        if let Some(power) = self.cache.get(address).await? {
            return Ok(power);
        }
        let version = self.cache.version(address);
        let power = self.compute_uncached(address).await?;
        match self.cache.publish(&power, version).await {
            Ok(()) => {}
            Err(stale @ CacheError::Stale(_)) => return Err(stale.into()),
            Err(e) => warn!(%address, error = %e, "could not cache voting power"),
        }
        Ok(power)
    }

    /// Compute power straight from the ledger and delegation graph.
    pub async fn compute_uncached(&self, address: &Address) -> Result<VotingPower, GovernanceError> {
        let now = self.clock.now();
        let timeout = self.params.call_timeout;

        let mut total = self.stake_power(address, now).await?;
        total += self.inbound_power(address, now).await?;

        let delegated_to = bounded(timeout, "delegation", self.delegations.get_delegate(address)).await?;
        let delegated_from =
            bounded(timeout, "delegation", self.delegations.get_delegators(address)).await?;

        debug!(%address, raw = total.raw, adjusted = total.adjusted, "voting power computed");
        Ok(VotingPower::from_parts(
            address.clone(),
            total.raw,
            total.adjusted,
            delegated_to,
            delegated_from,
            now,
        ))
    }

    /// Own stake of `address` across its active positions.
    ///
    /// Positions that break the position invariants, or belong to someone else,
    /// are skipped.
    pub async fn stake_power(&self, address: &Address, now: Timestamp) -> Result<StakePower, GovernanceError> {
        let positions = bounded(
            self.params.call_timeout,
            "ledger",
            self.stakes.active_positions(address, now),
        )
        .await?;
        let mut total = StakePower::default();
        for position in &positions {
            if !position.is_well_formed() || position.owner != *address {
                warn!(
                    target: INTEGRITY_TARGET,
                    %address,
                    owner = %position.owner,
                    amount = position.amount,
                    end_time = position.end_time.as_secs(),
                    "malformed staking position ignored"
                );
                continue;
            }
            total += position_power(position, now, &self.params);
        }
        Ok(total)
    }

    /// Stake delegated into `root`, directly or transitively.
    ///
    /// Breadth-first over incoming edges. Every delegator reached counts its own
    /// stake once; a revisit means the graph has a cycle and adds nothing.
    async fn inbound_power(&self, root: &Address, now: Timestamp) -> Result<StakePower, GovernanceError> {
        let timeout = self.params.call_timeout;
        let mut visited = HashSet::from([root.clone()]);
        let mut frontier = vec![root.clone()];
        let mut total = StakePower::default();
        let mut depth = 0;

        while !frontier.is_empty() {
            if depth == self.params.max_delegation_depth {
                let mut dropped = 0;
                for node in &frontier {
                    dropped += bounded(timeout, "delegation", self.delegations.get_delegators(node))
                        .await?
                        .len();
                }
                if dropped > 0 {
                    warn!(
                        target: INTEGRITY_TARGET,
                        %root,
                        depth,
                        dropped,
                        "delegation depth cap reached; deeper delegators ignored"
                    );
                }
                break;
            }
            depth += 1;

            let mut next = Vec::new();
            for node in frontier {
                let delegators = bounded(timeout, "delegation", self.delegations.get_delegators(&node)).await?;
                for delegator in delegators {
                    if !visited.insert(delegator.clone()) {
                        warn!(
                            target: INTEGRITY_TARGET,
                            %root,
                            via = %node,
                            %delegator,
                            "delegation cycle detected; edge skipped"
                        );
                        continue;
                    }
                    total += self.stake_power(&delegator, now).await?;
                    next.push(delegator);
                }
            }
            frontier = next;
        }
        Ok(total)
    }
}

impl std::fmt::Debug for VotingPowerCalculator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("VotingPowerCalculator")
            .field("params", &self.params)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use civitas_nullables::{NullCache, NullClock, NullDelegationStore, NullLedger};
    use std::sync::atomic::{AtomicBool, Ordering};

    const YEAR: u64 = 31_536_000;
    const NOW: u64 = 1_700_000_000;

    fn params() -> PowerParams {
        PowerParams::from(&EngineConfig::default())
    }

    struct Fixture {
        clock: Arc<NullClock>,
        ledger: Arc<NullLedger>,
        delegations: Arc<NullDelegationStore>,
        kv: Arc<NullCache>,
        cache: Arc<VotingPowerCache>,
        calculator: VotingPowerCalculator,
    }

    fn fixture_with(params: PowerParams) -> Fixture {
        let clock = Arc::new(NullClock::new(NOW));
        let ledger = Arc::new(NullLedger::new());
        let delegations = Arc::new(NullDelegationStore::new());
        let kv = Arc::new(NullCache::new(clock.clone()));
        let cache = Arc::new(VotingPowerCache::new(kv.clone(), 300, params.call_timeout));
        let calculator = VotingPowerCalculator::new(
            ledger.clone(),
            delegations.clone(),
            cache.clone(),
            clock.clone(),
            params,
        );
        Fixture {
            clock,
            ledger,
            delegations,
            kv,
            cache,
            calculator,
        }
    }

    fn fixture() -> Fixture {
        fixture_with(params())
    }

    fn stake(owner: &str, amount: u128, lockup: u64) -> StakingPosition {
        StakingPosition::new(Address::new(owner), amount, Timestamp::new(NOW), lockup).unwrap()
    }

    #[test]
    fn bonus_scales_with_remaining_lockup() {
        assert_eq!(lockup_bonus(10_000, YEAR, 5_000, YEAR), 5_000);
        assert_eq!(lockup_bonus(10_000, YEAR / 2, 5_000, YEAR), 2_500);
        assert_eq!(lockup_bonus(10_000, 0, 5_000, YEAR), 0);
    }

    #[test]
    fn bonus_is_capped_at_max_lockup() {
        assert_eq!(lockup_bonus(10_000, 4 * YEAR, 5_000, YEAR), 5_000);
    }

    #[test]
    fn expired_position_has_no_power() {
        let p = stake("a", 1_000, 10);
        let later = Timestamp::new(NOW + 10);
        assert_eq!(position_power(&p, later, &params()), StakePower::default());
    }

    #[tokio::test]
    async fn full_lockup_stake() {
        let f = fixture();
        f.ledger.add_position(stake("x", 10_000, YEAR));
        let power = f.calculator.compute_voting_power(&Address::new("x")).await;
        assert_eq!(power.raw_power, 10_000);
        assert_eq!(power.adjusted_power, 15_000);
        assert_eq!(power.quadratic_power, 122);
        assert_eq!(power.last_calculated, Timestamp::new(NOW));
    }

    #[tokio::test]
    async fn address_without_stake_has_zero_power() {
        let f = fixture();
        let power = f.calculator.compute_voting_power(&Address::new("nobody")).await;
        assert_eq!(power.adjusted_power, 0);
        assert!(power.delegated_from.is_empty());
    }

    #[tokio::test]
    async fn cache_hit_skips_the_ledger() {
        let f = fixture();
        f.ledger.add_position(stake("x", 500, YEAR));
        let x = Address::new("x");
        let first = f.calculator.compute_voting_power(&x).await;
        let reads = f.ledger.read_count();
        let second = f.calculator.compute_voting_power(&x).await;
        assert_eq!(first, second);
        assert_eq!(f.ledger.read_count(), reads);
    }

    #[tokio::test]
    async fn expired_cache_entry_is_recomputed() {
        let f = fixture();
        f.ledger.add_position(stake("x", 500, YEAR));
        let x = Address::new("x");
        f.calculator.compute_voting_power(&x).await;
        let reads = f.ledger.read_count();
        f.clock.advance(301);
        f.calculator.compute_voting_power(&x).await;
        assert!(f.ledger.read_count() > reads);
    }

    #[tokio::test]
    async fn delegated_stake_flows_to_delegate() {
        let f = fixture();
        f.ledger.add_position(stake("x", 10_000, YEAR));
        f.delegations.seed(&Address::new("x"), &Address::new("y"));

        let y = f.calculator.compute_voting_power(&Address::new("y")).await;
        assert_eq!(y.raw_power, 10_000);
        assert_eq!(y.adjusted_power, 15_000);
        assert!(y.delegated_from.contains(&Address::new("x")));

        let x = f.calculator.compute_voting_power(&Address::new("x")).await;
        assert_eq!(x.delegated_to, Some(Address::new("y")));
    }

    #[tokio::test]
    async fn transitive_chain_counts_each_delegator_once() {
        let f = fixture();
        for name in ["a", "b", "c"] {
            f.ledger.add_position(stake(name, 100, 60));
        }
        f.delegations.seed(&Address::new("a"), &Address::new("b"));
        f.delegations.seed(&Address::new("b"), &Address::new("c"));

        let c = f.calculator.compute_voting_power(&Address::new("c")).await;
        assert_eq!(c.raw_power, 300);
        assert_eq!(c.delegated_from.len(), 1);
    }

    #[tokio::test]
    async fn cycle_terminates_and_counts_each_once() {
        let f = fixture();
        for name in ["a", "b", "c"] {
            f.ledger.add_position(stake(name, 100, 60));
        }
        f.delegations.seed(&Address::new("a"), &Address::new("b"));
        f.delegations.seed(&Address::new("b"), &Address::new("c"));
        f.delegations.seed(&Address::new("c"), &Address::new("a"));

        let a = f.calculator.compute_voting_power(&Address::new("a")).await;
        assert_eq!(a.raw_power, 300);
    }

    #[tokio::test]
    async fn depth_cap_drops_distant_delegators() {
        let mut p = params();
        p.max_delegation_depth = 2;
        let f = fixture_with(p);
        let names: Vec<Address> = (0..5).map(|i| Address::new(format!("w{i}"))).collect();
        for name in &names {
            f.ledger.add_position(stake(name.as_str(), 10, 60));
        }
        // w0 -> w1 -> w2 -> w3 -> w4
        for pair in names.windows(2) {
            f.delegations.seed(&pair[0], &pair[1]);
        }
        let root = f.calculator.compute_voting_power(&names[4]).await;
        // own + w3 + w2
        assert_eq!(root.raw_power, 30);
    }

    #[tokio::test]
    async fn ledger_failure_yields_zero() {
        let f = fixture();
        f.ledger.add_position(stake("x", 10_000, YEAR));
        f.ledger.faults.set_unavailable(true);
        let power = f.calculator.compute_voting_power(&Address::new("x")).await;
        assert_eq!(power, VotingPower::zero(Address::new("x"), Timestamp::new(NOW)));
    }

    #[tokio::test]
    async fn slow_ledger_yields_zero() {
        let mut p = params();
        p.call_timeout = Duration::from_millis(20);
        let f = fixture_with(p);
        f.ledger.add_position(stake("x", 10_000, YEAR));
        f.ledger.faults.set_delay(Duration::from_millis(200));
        let power = f.calculator.compute_voting_power(&Address::new("x")).await;
        assert_eq!(power.adjusted_power, 0);
    }

    #[tokio::test]
    async fn cache_outage_fails_closed() {
        let f = fixture();
        f.ledger.add_position(stake("x", 10_000, YEAR));
        f.kv.faults.set_unavailable(true);
        let power = f.calculator.compute_voting_power(&Address::new("x")).await;
        assert_eq!(power.adjusted_power, 0);
    }

    #[tokio::test]
    async fn tampered_positions_are_ignored() {
        let f = fixture();
        f.ledger.add_position(stake("x", 1_000, 60));
        // end_time pushed out to claim a full-year bonus
        let mut stretched = stake("x", 10_000, 60);
        stretched.end_time = Timestamp::new(NOW + YEAR);
        f.ledger.add_position(stretched);
        let mut empty = stake("x", 10_000, YEAR);
        empty.amount = 0;
        f.ledger.add_position(empty);

        let power = f.calculator.compute_voting_power(&Address::new("x")).await;
        assert_eq!(power.raw_power, 1_000);
        assert_eq!(power.adjusted_power, 1_000);
    }

    // ── Racing invalidation ──────────────────────────────────────────────

    #[tokio::test]
    async fn computation_overtaken_by_invalidation_is_redone() {
        let f = fixture();
        let x = Address::new("x");
        f.ledger.add_position(stake("x", 1_000, 60));
        f.kv.faults.set_delay(Duration::from_millis(50));

        // lands while the first result is being written: a new stake arrives
        let racer = {
            let (ledger, cache, x) = (f.ledger.clone(), f.cache.clone(), x.clone());
            tokio::spawn(async move {
                tokio::time::sleep(Duration::from_millis(75)).await;
                ledger.add_position(stake("x", 2_000, 60));
                cache.invalidate(&x).await.unwrap();
            })
        };

        let power = f.calculator.compute_voting_power(&x).await;
        racer.await.unwrap();
        assert_eq!(power.raw_power, 3_000);
        assert_eq!(f.ledger.read_count(), 2);

        // only the recomputed value made it into the cache
        f.kv.faults.set_delay(Duration::ZERO);
        assert_eq!(f.cache.get(&x).await.unwrap().map(|p| p.raw_power), Some(3_000));
    }

    #[tokio::test]
    async fn persistent_invalidation_bypasses_the_cache() {
        let f = fixture();
        let x = Address::new("x");
        f.ledger.add_position(stake("x", 10_000, YEAR));
        f.kv.faults.set_delay(Duration::from_millis(50));

        let stop = Arc::new(AtomicBool::new(false));
        let churn = {
            let (cache, x, stop) = (f.cache.clone(), x.clone(), stop.clone());
            tokio::spawn(async move {
                let mut pending = Vec::new();
                while !stop.load(Ordering::SeqCst) {
                    let (cache, x) = (cache.clone(), x.clone());
                    pending.push(tokio::spawn(async move { cache.invalidate(&x).await }));
                    tokio::time::sleep(Duration::from_millis(10)).await;
                }
                for task in pending {
                    let _ = task.await;
                }
            })
        };

        let power = f.calculator.compute_voting_power(&x).await;
        stop.store(true, Ordering::SeqCst);
        churn.await.unwrap();

        assert_eq!(power.raw_power, 10_000);
        assert_eq!(power.adjusted_power, 15_000);
        // two refused publishes, then one uncached computation
        assert_eq!(f.ledger.read_count(), 3);
        f.kv.faults.set_delay(Duration::ZERO);
        assert!(!f.kv.contains(&VotingPowerCache::key(&x)));
        assert_eq!(f.cache.get(&x).await.unwrap(), None);
    }
}
