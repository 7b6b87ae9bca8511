use sea_orm::{ConnectOptions, DatabaseConnection, DbErr};
use serde::Deserialize;
use std::time::Duration;

#[derive(Clone, Deserialize)]
pub struct Config {
    pub database_url: String,
    pub sqlx_max_connections: u32,
    pub sqlx_min_connections: Option<u32>,
    pub sqlx_connect_timeout: Option<u64>,
    pub sqlx_idle_timeout: Option<u64>,
    pub sqlx_max_lifetime: Option<u64>,
    pub sqlx_logging: Option<bool>,
    pub reward_service_sqlx_logging_level: String,
    pub rust_log: String,
    pub reward_service_log: String,
    /// Local wall-clock time the daily staking job runs at, "H:M:S".
    pub staking_daily_run_hms: Option<String>,
    /// Seconds between mining cycles. One hour unless overridden.
    pub mining_cycle_sleep_secs: Option<u64>,
    /// Users credited per batch before yielding.
    pub mining_batch_size: Option<u64>,
}

pub async fn get_db_connection(config: &Config) -> Result<DatabaseConnection, DbErr> {
    let mut options: ConnectOptions = config.database_url.to_owned().into();
    options
        .max_connections(config.sqlx_max_connections)
        .min_connections(match config.sqlx_min_connections {
            Some(v) => v,
            None => 2,
        })
        .connect_timeout(Duration::from_secs(match config.sqlx_connect_timeout {
            Some(v) => v,
            None => 8,
        }))
        .idle_timeout(Duration::from_secs(match config.sqlx_idle_timeout {
            Some(v) => v,
            None => 8,
        }))
        .max_lifetime(Duration::from_secs(match config.sqlx_max_lifetime {
            Some(v) => v,
            None => 8,
        }))
        .sqlx_logging(match config.sqlx_logging {
            Some(v) => v,
            None => false,
        })
        .sqlx_logging_level(
            match config
                .reward_service_sqlx_logging_level
                .parse::<log::LevelFilter>()
            {
                Ok(level) => level,
                Err(_) => log::LevelFilter::Info,
            },
        );

    sea_orm::Database::connect(options).await
}
