//! Staking economy: $MUSEUM locked into a pool earns APY-based rewards,
//! with an early-exit penalty while the lock period is still running.

use crate::error::RewardError;
use serde::{Deserialize, Serialize};
use strum_macros::{Display, EnumString};

/// Staking pool identifiers. The string forms match the `gg`-suffixed
/// values stored in the `user_data.staking_pool` column.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Deserialize, Serialize, Display, EnumString)]
pub enum StakingPool {
    #[serde(rename = "none")]
    #[strum(serialize = "none")]
    None,
    #[serde(rename = "flexible")]
    #[strum(serialize = "flexible")]
    Flexible,
    #[serde(rename = "30gg")]
    #[strum(serialize = "30gg")]
    Days30,
    #[serde(rename = "90gg")]
    #[strum(serialize = "90gg")]
    Days90,
    #[serde(rename = "180gg")]
    #[strum(serialize = "180gg")]
    Days180,
    #[serde(rename = "365gg")]
    #[strum(serialize = "365gg")]
    Days365,
}

#[derive(Copy, Clone, Debug, PartialEq)]
pub struct PoolConfig {
    pub apy: f64,
    pub lock_days: i64,
    pub early_penalty: f64,
}

impl StakingPool {
    /// APY / lock / penalty table. `None` has no configuration: it is the
    /// "not staking" marker, never a pool a user can enter.
    pub fn config(&self) -> Option<PoolConfig> {
        match self {
            StakingPool::None => None,
            StakingPool::Flexible => Some(PoolConfig {
                apy: 0.05,
                lock_days: 0,
                early_penalty: 0.0,
            }),
            StakingPool::Days30 => Some(PoolConfig {
                apy: 0.10,
                lock_days: 30,
                early_penalty: 0.10,
            }),
            StakingPool::Days90 => Some(PoolConfig {
                apy: 0.25,
                lock_days: 90,
                early_penalty: 0.25,
            }),
            StakingPool::Days180 => Some(PoolConfig {
                apy: 0.50,
                lock_days: 180,
                early_penalty: 0.40,
            }),
            StakingPool::Days365 => Some(PoolConfig {
                apy: 0.80,
                lock_days: 365,
                early_penalty: 0.50,
            }),
        }
    }

    pub fn active_pools() -> [StakingPool; 5] {
        [
            StakingPool::Flexible,
            StakingPool::Days30,
            StakingPool::Days90,
            StakingPool::Days180,
            StakingPool::Days365,
        ]
    }
}

/// Reward accrued by `staked_amount` at `apy` over `days` (pro-rated on a
/// 365-day year, floored to whole $MUSEUM).
pub fn staking_rewards(staked_amount: i64, apy: f64, days: f64) -> i64 {
    (staked_amount as f64 * apy * (days / 365.0)).floor() as i64
}

/// One day's compound credit, used by the daily staking job.
pub fn daily_compound(staked_amount: i64, pool: StakingPool) -> i64 {
    match pool.config() {
        Some(config) => staking_rewards(staked_amount, config.apy, 1.0),
        None => 0,
    }
}

/// What an unstake at `days_elapsed` pays out.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize)]
pub struct UnstakeOutcome {
    pub rewards: i64,
    pub penalty: i64,
    pub total_return: i64,
}

/// Validates a stake request against the user's current state.
pub fn validate_stake(
    current_pool: StakingPool,
    current_staked: i64,
    balance: i64,
    requested_pool: StakingPool,
    amount: i64,
) -> Result<PoolConfig, RewardError> {
    if amount <= 0 {
        return Err(RewardError::validation("Stake amount must be positive"));
    }
    let config = requested_pool
        .config()
        .ok_or_else(|| RewardError::validation("Unknown staking pool"))?;
    if current_pool != StakingPool::None && current_staked > 0 {
        return Err(RewardError::conflict(
            "You already have an active stake. Unstake first to change pools.",
        ));
    }
    if balance < amount {
        return Err(RewardError::InsufficientBalance {
            required: amount,
            available: balance,
        });
    }
    Ok(config)
}

/// Computes the payout for unstaking `staked_amount` from `pool` after
/// `days_elapsed` days.
///
/// Rewards always accrue over the full elapsed time. Unstaking before the
/// lock period ends costs `early_penalty` of the computed reward; the
/// principal is never reduced. At exactly the lock boundary, or beyond,
/// no penalty applies.
pub fn unstake_outcome(
    staked_amount: i64,
    pool: StakingPool,
    days_elapsed: f64,
) -> Result<UnstakeOutcome, RewardError> {
    if staked_amount <= 0 {
        return Err(RewardError::validation("No active stake found"));
    }
    let config = pool
        .config()
        .ok_or_else(|| RewardError::validation("No active stake found"))?;

    let mut rewards = staking_rewards(staked_amount, config.apy, days_elapsed);
    let mut penalty = 0;
    if days_elapsed < config.lock_days as f64 {
        penalty = (rewards as f64 * config.early_penalty).floor() as i64;
        rewards -= penalty;
    }

    Ok(UnstakeOutcome {
        rewards,
        penalty,
        total_return: staked_amount + rewards,
    })
}

/// Reward paid by a claim-without-unstaking after `days_elapsed` days.
///
/// Same accrual formula as unstaking, never penalized; the caller resets
/// `staking_started_at` so the claimed period is not counted again.
pub fn claim_rewards(
    staked_amount: i64,
    pool: StakingPool,
    days_elapsed: f64,
) -> Result<i64, RewardError> {
    if staked_amount <= 0 || pool == StakingPool::None {
        return Err(RewardError::validation("No active stake found"));
    }
    let config = pool
        .config()
        .ok_or_else(|| RewardError::validation("No active stake found"))?;
    let rewards = staking_rewards(staked_amount, config.apy, days_elapsed);
    if rewards <= 0 {
        return Err(RewardError::validation("No rewards to claim yet"));
    }
    Ok(rewards)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn pool_table_matches_configuration() {
        let flexible = StakingPool::Flexible.config().unwrap();
        assert_eq!(flexible.apy, 0.05);
        assert_eq!(flexible.lock_days, 0);
        assert_eq!(flexible.early_penalty, 0.0);

        let days365 = StakingPool::Days365.config().unwrap();
        assert_eq!(days365.apy, 0.80);
        assert_eq!(days365.lock_days, 365);
        assert_eq!(days365.early_penalty, 0.50);

        assert!(StakingPool::None.config().is_none());
    }

    #[test]
    fn pool_round_trips_through_column_value() {
        assert_eq!(StakingPool::Days30.to_string(), "30gg");
        assert_eq!(StakingPool::from_str("90gg").unwrap(), StakingPool::Days90);
        assert_eq!(StakingPool::from_str("none").unwrap(), StakingPool::None);
        assert!(StakingPool::from_str("7gg").is_err());
    }

    #[test]
    fn rewards_over_a_full_year_equal_apy() {
        assert_eq!(staking_rewards(1000, 0.10, 365.0), 100);
    }

    #[test]
    fn rewards_are_pro_rated_and_floored() {
        // 1000 * 0.10 * (10/365) = 2.739...
        assert_eq!(staking_rewards(1000, 0.10, 10.0), 2);
        assert_eq!(staking_rewards(0, 0.10, 365.0), 0);
    }

    #[test]
    fn stake_rejected_when_balance_is_short() {
        let result = validate_stake(StakingPool::None, 0, 500, StakingPool::Days30, 1000);
        assert_eq!(
            result.unwrap_err(),
            RewardError::InsufficientBalance {
                required: 1000,
                available: 500
            }
        );
    }

    #[test]
    fn stake_rejected_while_another_stake_is_active() {
        let result = validate_stake(StakingPool::Flexible, 800, 5000, StakingPool::Days30, 1000);
        assert!(matches!(result, Err(RewardError::Conflict(_))));
    }

    #[test]
    fn stake_rejected_for_the_none_pool_and_bad_amounts() {
        assert!(validate_stake(StakingPool::None, 0, 5000, StakingPool::None, 1000).is_err());
        assert!(validate_stake(StakingPool::None, 0, 5000, StakingPool::Days30, 0).is_err());
    }

    #[test]
    fn early_unstake_penalizes_rewards_not_principal() {
        // 10 days into a 30-day lock: rewards = floor(1000 * 0.10 * 10/365) = 2,
        // penalty = floor(2 * 0.10) = 0 -- too small to see, use a larger stake.
        let outcome = unstake_outcome(100_000, StakingPool::Days30, 10.0).unwrap();
        let gross = staking_rewards(100_000, 0.10, 10.0);
        assert_eq!(gross, 273);
        assert_eq!(outcome.penalty, 27);
        assert_eq!(outcome.rewards, 246);
        // principal comes back untouched
        assert_eq!(outcome.total_return, 100_000 + 246);
    }

    #[test]
    fn no_penalty_at_exactly_the_lock_boundary() {
        let outcome = unstake_outcome(1000, StakingPool::Days30, 30.0).unwrap();
        assert_eq!(outcome.penalty, 0);
        assert_eq!(outcome.rewards, staking_rewards(1000, 0.10, 30.0));
    }

    #[test]
    fn no_penalty_beyond_the_lock_period() {
        let outcome = unstake_outcome(1000, StakingPool::Days365, 400.0).unwrap();
        assert_eq!(outcome.penalty, 0);
        assert_eq!(outcome.total_return, 1000 + outcome.rewards);
    }

    #[test]
    fn flexible_pool_never_penalizes() {
        let outcome = unstake_outcome(10_000, StakingPool::Flexible, 1.0).unwrap();
        assert_eq!(outcome.penalty, 0);
    }

    #[test]
    fn unstake_without_a_stake_is_rejected() {
        assert!(unstake_outcome(0, StakingPool::Days30, 10.0).is_err());
        assert!(unstake_outcome(1000, StakingPool::None, 10.0).is_err());
    }

    #[test]
    fn claim_pays_unpenalized_rewards() {
        // claim inside the lock window still pays the full accrued reward
        let claimed = claim_rewards(100_000, StakingPool::Days30, 10.0).unwrap();
        assert_eq!(claimed, staking_rewards(100_000, 0.10, 10.0));
    }

    #[test]
    fn claim_with_nothing_accrued_is_rejected() {
        assert!(claim_rewards(1000, StakingPool::Days30, 0.0).is_err());
        assert!(claim_rewards(0, StakingPool::Days30, 10.0).is_err());
        assert!(claim_rewards(1000, StakingPool::None, 10.0).is_err());
    }

    #[test]
    fn daily_compound_is_one_day_of_apy() {
        // floor(100000 * 0.25 / 365) = 68
        assert_eq!(daily_compound(100_000, StakingPool::Days90), 68);
        assert_eq!(daily_compound(100_000, StakingPool::None), 0);
    }
}
