mod config;
mod mining;
mod sql_stmt;
mod staking;

use figment::{
    providers::{Format, Toml},
    Figment,
};
use sea_orm::DatabaseConnection;
use std::error::Error;
use std::time::Duration;
use tokio::{task, time::sleep};
use tracing::warn;
use tracing_subscriber::{fmt::format::FmtSpan, EnvFilter};

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    let config: config::Config = Figment::new().merge(Toml::file("App.toml")).extract()?;
    if std::env::var("RUST_LOG").is_err() {
        std::env::set_var("RUST_LOG", &config.rust_log);
    }
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::from_default_env().add_directive(
                format!("museum_reward_service={}", &config.reward_service_log)
                    .parse()
                    .expect("Error parsing directive"),
            ),
        )
        .with_span_events(FmtSpan::FULL)
        .init();

    let db: DatabaseConnection = config::get_db_connection(&config).await?;
    let mining_cycle_sleep_secs = match config.mining_cycle_sleep_secs {
        Some(v) => v,
        None => 3_600,
    };
    let mining_batch_size = match config.mining_batch_size {
        Some(v) => v,
        None => 500,
    };

    task::spawn(async move {
        let config_for_task: config::Config = Figment::new()
            .merge(Toml::file("App.toml"))
            .extract()
            .unwrap();
        let db_for_task: DatabaseConnection =
            config::get_db_connection(&config_for_task).await.unwrap();
        staking::execute_daily_tasks(&config_for_task, &db_for_task).await;
    });

    loop {
        if let Err(error) = mining::process_mining_rewards(&db, mining_batch_size).await {
            warn!("Mining cycle aborted: {:?}", error);
        }
        sleep(Duration::from_secs(mining_cycle_sleep_secs)).await;
    }
}
