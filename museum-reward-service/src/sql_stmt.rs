use sea_orm::DbBackend;

pub const DB_BACKEND: DbBackend = DbBackend::Postgres;

pub const CREDIT_MUSEUM_BALANCE: &str = r#"UPDATE user_data
    SET museum_balance = museum_balance + $2
    WHERE id = $1"#;

/// One day of APY, credited onto the staked principal by the daily job.
pub const COMPOUND_STAKE: &str = r#"UPDATE user_data
    SET staking_amount = staking_amount + $2
    WHERE id = $1 AND staking_pool <> 'none' AND staking_amount > 0"#;
