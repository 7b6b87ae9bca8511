use sea_orm::DbBackend;

pub const DB_BACKEND: DbBackend = DbBackend::Postgres;

// Every balance mutation below is a single guarded UPDATE so that two
// concurrent requests for the same user cannot both succeed: the losing
// statement simply matches zero rows.

pub const CLAIM_MINING_REWARDS: &str = r#"UPDATE mining_reward
    SET claimed = TRUE, claimed_at = $2
    WHERE user_id = $1 AND claimed = FALSE
    RETURNING amount"#;

pub const CREDIT_MUSEUM_BALANCE: &str = r#"UPDATE user_data
    SET museum_balance = museum_balance + $2
    WHERE id = $1"#;

pub const UNCLAIMED_MINING_TOTAL: &str = r#"SELECT COALESCE(SUM(amount), 0) AS total_rewards
    FROM mining_reward
    WHERE user_id = $1 AND claimed = FALSE"#;

pub const STAKE: &str = r#"UPDATE user_data
    SET museum_balance = museum_balance - $2,
        staking_pool = $3,
        staking_amount = $2,
        staking_started_at = $4
    WHERE id = $1 AND staking_pool = 'none' AND museum_balance >= $2"#;

pub const UNSTAKE: &str = r#"UPDATE user_data
    SET museum_balance = museum_balance + $4,
        staking_pool = 'none',
        staking_amount = 0,
        staking_started_at = NULL
    WHERE id = $1 AND staking_pool = $2 AND staking_amount = $3"#;

pub const CLAIM_STAKING_REWARDS: &str = r#"UPDATE user_data
    SET museum_balance = museum_balance + $3,
        staking_started_at = $4
    WHERE id = $1 AND staking_pool <> 'none' AND staking_started_at = $2"#;

pub const CONVERT_BALANCE: &str = r#"UPDATE user_data
    SET museum_balance = museum_balance - $2,
        stoned_balance = stoned_balance + $3
    WHERE id = $1 AND museum_balance >= $2"#;

pub const POOL_TOTALS: &str = r#"SELECT staking_pool,
    COUNT(*) AS user_count,
    COALESCE(SUM(staking_amount), 0) AS tvl
    FROM user_data
    WHERE staking_pool <> 'none'
    GROUP BY staking_pool"#;
