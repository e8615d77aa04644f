use anyhow::Context;
use guildfolio::datasource::InjectiveDataSource;
use guildfolio::orchestration::{PortfolioHelper, SnapshotJob};
use guildfolio::{config::Config, db::init_db, DataSource, Repository};
use std::sync::Arc;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing_subscriber::filter::LevelFilter::INFO.into()),
        )
        .init();

    let config = Config::from_env().context("Configuration error")?;

    let pool = init_db(&config.database_path)
        .await
        .with_context(|| format!("Failed to initialize database at {}", config.database_path))?;
    let repo = Arc::new(Repository::new(pool));

    let datasource: Arc<dyn DataSource> = Arc::new(InjectiveDataSource::new(
        config.exchange_api_url.clone(),
        config.chain_api_url.clone(),
        config.price_oracle_url.clone(),
    ));
    let helper = PortfolioHelper::new(datasource, &*repo)
        .await
        .context("Failed to build portfolio helper")?;

    let job = SnapshotJob::new(
        Arc::new(helper),
        repo,
        config.snapshot_concurrency,
        config.snapshot_include_prices,
    );

    tracing::info!(
        interval_secs = config.snapshot_interval.as_secs(),
        concurrency = config.snapshot_concurrency,
        "Starting portfolio snapshot job"
    );

    tokio::select! {
        _ = job.run_forever(config.snapshot_interval) => {}
        res = tokio::signal::ctrl_c() => {
            res.context("Failed to listen for shutdown signal")?;
            tracing::info!("Shutting down");
        }
    }
    Ok(())
}
