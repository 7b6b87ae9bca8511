use museum_db_entity::db::user_data::{self, Column as UserColumn};
use museum_reward::staking::{self, StakingPool};
use sea_orm::{
    ColumnTrait, ConnectionTrait, DatabaseConnection, EntityTrait, PaginatorTrait, QueryFilter,
    Statement,
};
use std::str::FromStr;
use tokio::time::{sleep, Duration};
use tracing::{info, warn};

pub async fn execute_daily_tasks(config: &crate::config::Config, db: &DatabaseConnection) {
    let staking_daily_run_hms = match config.staking_daily_run_hms {
        Some(ref v) => v.to_owned(),
        None => "4:0:0".to_owned(),
    };
    let hms: Vec<&str> = staking_daily_run_hms.split(":").collect();
    let hour = u32::from_str_radix(hms[0], 10).unwrap();
    let min = u32::from_str_radix(hms[1], 10).unwrap();
    let sec = u32::from_str_radix(hms[2], 10).unwrap();

    info!("Daily staking task initialized");
    loop {
        wait_until_next_execution(hour, min, sec).await;

        info!("Daily compounding started");
        compound_all_stakes(db, match config.mining_batch_size {
            Some(v) => v,
            None => 500,
        })
        .await;
        info!("Daily compounding completed");
    }
}

/// Credits one day of APY onto every active stake. The credit lands on the
/// principal, so tomorrow's accrual includes today's reward.
pub async fn compound_all_stakes(db: &DatabaseConnection, batch_size: u64) {
    let mut compounded: u64 = 0;
    let mut failed: u64 = 0;

    let mut pages = user_data::Entity::find()
        .filter(UserColumn::StakingPool.ne("none"))
        .filter(UserColumn::StakingAmount.gt(0))
        .paginate(db, batch_size);

    loop {
        let users = match pages.fetch_and_next().await {
            Ok(Some(users)) => users,
            Ok(None) => break,
            Err(error) => {
                warn!("Error fetching stakers: {:?}", error);
                break;
            }
        };
        for user in users {
            let pool = match StakingPool::from_str(&user.staking_pool) {
                Ok(pool) => pool,
                Err(_) => {
                    warn!(
                        "Unknown staking_pool '{}' for user {}",
                        user.staking_pool, user.id
                    );
                    failed += 1;
                    continue;
                }
            };
            let credit = staking::daily_compound(user.staking_amount, pool);
            if credit <= 0 {
                continue;
            }
            let result = db
                .execute(Statement::from_sql_and_values(
                    crate::sql_stmt::DB_BACKEND,
                    crate::sql_stmt::COMPOUND_STAKE,
                    vec![user.id.into(), credit.into()],
                ))
                .await;
            match result {
                Ok(result) if result.rows_affected() > 0 => compounded += 1,
                // user unstaked between the read and the update
                Ok(_) => {}
                Err(error) => {
                    failed += 1;
                    warn!("Compounding failed for user {}: {:?}", user.id, error);
                }
            }
        }
    }

    info!("Compounded {} stakes, {} failures", compounded, failed);
}

async fn wait_until_next_execution(hour: u32, min: u32, sec: u32) {
    use chrono::{Datelike, Local, TimeZone, Timelike};

    let current = Local::now();
    let mut target = Local
        .with_ymd_and_hms(
            current.year(),
            current.month(),
            current.day(),
            hour,
            min,
            sec,
        )
        .unwrap();
    if hour < current.hour()
        || (hour == current.hour() && min < current.minute())
        || (hour == current.hour() && min == current.minute() && sec < current.second())
    {
        target = target
            .checked_add_signed(chrono::Duration::days(1))
            .unwrap();
    }
    let diff = target.timestamp() - current.timestamp();
    sleep(Duration::from_secs(diff.try_into().unwrap())).await;
}
