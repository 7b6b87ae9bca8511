use crate::dto::{
    AuthToken, ClaimOutcome, ClaimRequest, PoolStats, ResponseData, StakeRequest,
    StakingRewardsDetails, UnstakeDetails, UnstakeRequest, DB_ERROR_MESSAGE, RESPONSE_CONFLICT,
    RESPONSE_INTERNAL_ERROR, RESPONSE_OK,
};
use crate::pool::{Db, MuseumConfig};
use museum_reward::staking::{self, StakingPool};
use museum_reward::RewardError;
use rocket::{serde::json::Json, State};
use sea_orm::{ConnectionTrait, Statement};
use sea_orm_rocket::Connection;
use std::collections::HashMap;
use std::str::FromStr;
use tracing::{error, info, warn};

/// Maps the `staking_pool` column value back onto the pool enum. Rows with
/// an unrecognized value are treated as not staking.
fn parse_pool(column_value: &str) -> StakingPool {
    match StakingPool::from_str(column_value) {
        Ok(pool) => pool,
        Err(_) => {
            warn!("Unknown staking_pool value '{}'", column_value);
            StakingPool::None
        }
    }
}

#[get("/staking/pools?<wallet>", format = "application/json")]
pub async fn get_pool_stats(
    conn: Connection<'_, Db>,
    wallet: String,
) -> Json<ResponseData<Vec<PoolStats>>> {
    let db = conn.into_inner();
    let user = match super::find_user(db, &wallet).await {
        Ok(user) => user,
        Err((code, message)) => return Json(ResponseData::new(code, message, None)),
    };

    let rows = match db
        .query_all(Statement::from_string(
            crate::sql_stmt::DB_BACKEND,
            crate::sql_stmt::POOL_TOTALS.to_owned(),
        ))
        .await
    {
        Ok(rows) => rows,
        Err(error) => {
            error!("Error fetching pool totals: {:?}", error);
            return Json(ResponseData::new(
                RESPONSE_INTERNAL_ERROR,
                DB_ERROR_MESSAGE.to_owned(),
                None,
            ));
        }
    };

    let mut totals: HashMap<String, (i64, i64)> = HashMap::new();
    for row in rows {
        let pool: String = match row.try_get("", "staking_pool") {
            Ok(pool) => pool,
            Err(error) => {
                warn!("Could not read staking_pool: {:?}", error);
                continue;
            }
        };
        let user_count: i64 = row.try_get("", "user_count").unwrap_or(0);
        let tvl = match row.try_get::<sea_orm::prelude::Decimal>("", "tvl") {
            Ok(tvl) => tvl.to_string().parse::<i64>().unwrap_or(0),
            Err(error) => {
                warn!("Could not read tvl: {:?}", error);
                0
            }
        };
        totals.insert(pool, (user_count, tvl));
    }

    let user_pool = parse_pool(&user.staking_pool);
    let stats: Vec<PoolStats> = StakingPool::active_pools()
        .iter()
        .map(|pool| {
            // active_pools never includes None, config is always present
            let config = pool.config().unwrap_or(staking::PoolConfig {
                apy: 0.0,
                lock_days: 0,
                early_penalty: 0.0,
            });
            let (user_count, tvl) = totals
                .get(&pool.to_string())
                .copied()
                .unwrap_or((0, 0));
            PoolStats {
                pool: *pool,
                apy: config.apy,
                lock_days: config.lock_days,
                penalty: config.early_penalty,
                tvl,
                user_count,
                user_staked: if user_pool == *pool {
                    user.staking_amount
                } else {
                    0
                },
            }
        })
        .collect();

    Json(ResponseData::new(RESPONSE_OK, "".to_owned(), Some(stats)))
}

#[get("/staking/rewards?<wallet>", format = "application/json")]
pub async fn get_rewards(
    conn: Connection<'_, Db>,
    wallet: String,
) -> Json<ResponseData<StakingRewardsDetails>> {
    let db = conn.into_inner();
    let user = match super::find_user(db, &wallet).await {
        Ok(user) => user,
        Err((code, message)) => return Json(ResponseData::new(code, message, None)),
    };

    let now = chrono::Utc::now().timestamp();
    let details = rewards_summary(&user, now);
    Json(ResponseData::new(RESPONSE_OK, "".to_owned(), Some(details)))
}

/// Accrual summary for a user's current stake. A read-only status query
/// never rejects: a user who is not staking gets a zeroed summary.
fn rewards_summary(
    user: &museum_db_entity::db::user_data::Model,
    now: i64,
) -> StakingRewardsDetails {
    let pool = parse_pool(&user.staking_pool);
    let config = match pool.config() {
        Some(config) if user.staking_amount > 0 => config,
        _ => {
            return StakingRewardsDetails {
                pool: StakingPool::None,
                staked_amount: 0,
                rewards: 0,
                days_staked: 0,
                lock_days: 0,
                can_unstake_without_penalty: true,
                penalty: 0.0,
            }
        }
    };
    let started_at = match user.staking_started_at {
        Some(started_at) => started_at,
        None => {
            warn!("User {} staked without a start timestamp", user.id);
            return StakingRewardsDetails {
                pool,
                staked_amount: user.staking_amount,
                rewards: 0,
                days_staked: 0,
                lock_days: config.lock_days,
                can_unstake_without_penalty: true,
                penalty: config.early_penalty,
            };
        }
    };

    let days = museum_reward::days_elapsed(started_at, now);
    StakingRewardsDetails {
        pool,
        staked_amount: user.staking_amount,
        rewards: staking::staking_rewards(user.staking_amount, config.apy, days),
        days_staked: days.floor() as i64,
        lock_days: config.lock_days,
        can_unstake_without_penalty: days >= config.lock_days as f64,
        penalty: config.early_penalty,
    }
}

/// Moves `amount` from the spendable balance into the requested pool. The
/// UPDATE only matches while the user is not already staking and the
/// balance covers the amount, so a concurrent stake cannot double-debit.
#[post("/staking/stake", format = "application/json", data = "<stake_request>")]
pub async fn stake(
    conn: Connection<'_, Db>,
    museum_config: &State<MuseumConfig>,
    auth_token: AuthToken<'_>,
    stake_request: Json<StakeRequest>,
) -> Json<ResponseData<String>> {
    if let Err((code, message)) =
        super::wallet_auth::authorize(&museum_config.jwt_key, &stake_request.wallet, &auth_token)
            .await
    {
        return Json(ResponseData::new(code, message, None));
    }

    let db = conn.into_inner();
    let user = match super::find_user(db, &stake_request.wallet).await {
        Ok(user) => user,
        Err((code, message)) => return Json(ResponseData::new(code, message, None)),
    };

    if let Err(rejection) = staking::validate_stake(
        parse_pool(&user.staking_pool),
        user.staking_amount,
        user.museum_balance,
        stake_request.pool,
        stake_request.amount,
    ) {
        return Json(ResponseData::rejected(&rejection));
    }

    let now = chrono::Utc::now().timestamp();
    let result = db
        .execute(Statement::from_sql_and_values(
            crate::sql_stmt::DB_BACKEND,
            crate::sql_stmt::STAKE,
            vec![
                user.id.into(),
                stake_request.amount.into(),
                stake_request.pool.to_string().into(),
                now.into(),
            ],
        ))
        .await;

    match result {
        Ok(result) if result.rows_affected() > 0 => {
            info!(
                "User {} staked {} into {}",
                user.id, stake_request.amount, stake_request.pool
            );
            Json(ResponseData::new(
                RESPONSE_OK,
                format!(
                    "Staked {} $MUSEUM into the {} pool",
                    stake_request.amount, stake_request.pool
                ),
                None,
            ))
        }
        Ok(_) => {
            // lost the race, refetch for the real reason
            match super::find_user(db, &stake_request.wallet).await {
                Ok(fresh) => {
                    let rejection = staking::validate_stake(
                        parse_pool(&fresh.staking_pool),
                        fresh.staking_amount,
                        fresh.museum_balance,
                        stake_request.pool,
                        stake_request.amount,
                    )
                    .err()
                    .unwrap_or_else(|| {
                        RewardError::conflict("Stake could not be placed, please retry")
                    });
                    Json(ResponseData::rejected(&rejection))
                }
                Err((code, message)) => Json(ResponseData::new(code, message, None)),
            }
        }
        Err(error) => {
            error!("Error staking for user {}: {:?}", user.id, error);
            Json(ResponseData::new(
                RESPONSE_INTERNAL_ERROR,
                DB_ERROR_MESSAGE.to_owned(),
                None,
            ))
        }
    }
}

/// Returns principal plus accrued rewards to the spendable balance. Leaving
/// before the lock period ends forfeits `early_penalty` of the reward,
/// never any principal.
#[post(
    "/staking/unstake",
    format = "application/json",
    data = "<unstake_request>"
)]
pub async fn unstake(
    conn: Connection<'_, Db>,
    museum_config: &State<MuseumConfig>,
    auth_token: AuthToken<'_>,
    unstake_request: Json<UnstakeRequest>,
) -> Json<ResponseData<UnstakeDetails>> {
    if let Err((code, message)) =
        super::wallet_auth::authorize(&museum_config.jwt_key, &unstake_request.wallet, &auth_token)
            .await
    {
        return Json(ResponseData::new(code, message, None));
    }

    let db = conn.into_inner();
    let user = match super::find_user(db, &unstake_request.wallet).await {
        Ok(user) => user,
        Err((code, message)) => return Json(ResponseData::new(code, message, None)),
    };

    let pool = parse_pool(&user.staking_pool);
    if pool != unstake_request.pool {
        return Json(ResponseData::rejected(&RewardError::validation(
            "No active stake found in this pool",
        )));
    }
    let started_at = match user.staking_started_at {
        Some(started_at) => started_at,
        None => {
            warn!("User {} staked without a start timestamp", user.id);
            return Json(ResponseData::rejected(&RewardError::validation(
                "No active stake found",
            )));
        }
    };

    let now = chrono::Utc::now().timestamp();
    let days = museum_reward::days_elapsed(started_at, now);
    let outcome = match staking::unstake_outcome(user.staking_amount, pool, days) {
        Ok(outcome) => outcome,
        Err(rejection) => return Json(ResponseData::rejected(&rejection)),
    };

    let result = db
        .execute(Statement::from_sql_and_values(
            crate::sql_stmt::DB_BACKEND,
            crate::sql_stmt::UNSTAKE,
            vec![
                user.id.into(),
                pool.to_string().into(),
                user.staking_amount.into(),
                outcome.total_return.into(),
            ],
        ))
        .await;

    match result {
        Ok(result) if result.rows_affected() > 0 => {
            info!(
                "User {} unstaked {} from {} (rewards {}, penalty {})",
                user.id, user.staking_amount, pool, outcome.rewards, outcome.penalty
            );
            Json(ResponseData::new(
                RESPONSE_OK,
                "".to_owned(),
                Some(UnstakeDetails {
                    staked_amount: user.staking_amount,
                    rewards: outcome.rewards,
                    penalty: outcome.penalty,
                    total_return: outcome.total_return,
                }),
            ))
        }
        Ok(_) => Json(ResponseData::new(
            RESPONSE_CONFLICT,
            "Stake changed while unstaking, please retry".to_owned(),
            None,
        )),
        Err(error) => {
            error!("Error unstaking for user {}: {:?}", user.id, error);
            Json(ResponseData::new(
                RESPONSE_INTERNAL_ERROR,
                DB_ERROR_MESSAGE.to_owned(),
                None,
            ))
        }
    }
}

/// Pays out the accrued staking reward without touching the principal and
/// restarts the accrual clock.
#[post("/staking/claim", format = "application/json", data = "<claim_request>")]
pub async fn claim(
    conn: Connection<'_, Db>,
    museum_config: &State<MuseumConfig>,
    auth_token: AuthToken<'_>,
    claim_request: Json<ClaimRequest>,
) -> Json<ResponseData<ClaimOutcome>> {
    if let Err((code, message)) =
        super::wallet_auth::authorize(&museum_config.jwt_key, &claim_request.wallet, &auth_token)
            .await
    {
        return Json(ResponseData::new(code, message, None));
    }

    let db = conn.into_inner();
    let user = match super::find_user(db, &claim_request.wallet).await {
        Ok(user) => user,
        Err((code, message)) => return Json(ResponseData::new(code, message, None)),
    };

    let pool = parse_pool(&user.staking_pool);
    let started_at = match user.staking_started_at {
        Some(started_at) => started_at,
        None => {
            return Json(ResponseData::rejected(&RewardError::validation(
                "No active stake found",
            )))
        }
    };

    let now = chrono::Utc::now().timestamp();
    let days = museum_reward::days_elapsed(started_at, now);
    let rewards = match staking::claim_rewards(user.staking_amount, pool, days) {
        Ok(rewards) => rewards,
        Err(rejection) => return Json(ResponseData::rejected(&rejection)),
    };

    // the old started_at in the WHERE clause makes double claims match
    // zero rows instead of paying twice
    let result = db
        .execute(Statement::from_sql_and_values(
            crate::sql_stmt::DB_BACKEND,
            crate::sql_stmt::CLAIM_STAKING_REWARDS,
            vec![user.id.into(), started_at.into(), rewards.into(), now.into()],
        ))
        .await;

    match result {
        Ok(result) if result.rows_affected() > 0 => {
            info!("User {} claimed {} staking rewards", user.id, rewards);
            Json(ResponseData::new(
                RESPONSE_OK,
                format!("Successfully claimed {} $MUSEUM", rewards),
                Some(ClaimOutcome { rewards }),
            ))
        }
        Ok(_) => Json(ResponseData::new(
            RESPONSE_CONFLICT,
            "Rewards already claimed".to_owned(),
            None,
        )),
        Err(error) => {
            error!("Error claiming staking rewards for {}: {:?}", user.id, error);
            Json(ResponseData::new(
                RESPONSE_INTERNAL_ERROR,
                DB_ERROR_MESSAGE.to_owned(),
                None,
            ))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use museum_db_entity::db::user_data::Model as UserModel;
    use museum_reward::SECONDS_PER_DAY;

    fn user(pool: &str, staked: i64, started_at: Option<i64>) -> UserModel {
        UserModel {
            id: 1,
            wallet_address: "wallet".to_owned(),
            museum_pass_mint: None,
            level: 1,
            xp: 0,
            museum_balance: 0,
            stoned_balance: 0,
            staking_pool: pool.to_owned(),
            staking_amount: staked,
            staking_started_at: started_at,
            created_at: 0,
        }
    }

    #[test]
    fn rewards_summary_without_a_stake_is_zeroed() {
        let summary = rewards_summary(&user("none", 0, None), 1_000_000);
        assert_eq!(summary.pool, StakingPool::None);
        assert_eq!(summary.staked_amount, 0);
        assert_eq!(summary.rewards, 0);
        assert_eq!(summary.days_staked, 0);
        assert!(summary.can_unstake_without_penalty);
    }

    #[test]
    fn rewards_summary_accrues_for_an_active_stake() {
        let started_at = 0;
        let now = 10 * SECONDS_PER_DAY;
        let summary = rewards_summary(&user("30gg", 100_000, Some(started_at)), now);
        assert_eq!(summary.pool, StakingPool::Days30);
        assert_eq!(summary.staked_amount, 100_000);
        assert_eq!(summary.rewards, staking::staking_rewards(100_000, 0.10, 10.0));
        assert_eq!(summary.days_staked, 10);
        assert_eq!(summary.lock_days, 30);
        assert!(!summary.can_unstake_without_penalty);
    }

    #[test]
    fn rewards_summary_is_penalty_free_past_the_lock() {
        let now = 31 * SECONDS_PER_DAY;
        let summary = rewards_summary(&user("30gg", 1000, Some(0)), now);
        assert!(summary.can_unstake_without_penalty);
    }

    #[test]
    fn rewards_summary_tolerates_a_missing_start_timestamp() {
        let summary = rewards_summary(&user("90gg", 5000, None), 1_000_000);
        assert_eq!(summary.pool, StakingPool::Days90);
        assert_eq!(summary.staked_amount, 5000);
        assert_eq!(summary.rewards, 0);
        assert!(summary.can_unstake_without_penalty);
    }
}
