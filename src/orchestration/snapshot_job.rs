use crate::db::Repository;
use crate::domain::{Guild, GuildMember};
use crate::error::PortfolioError;
use crate::orchestration::PortfolioHelper;
use futures::stream::{self, StreamExt};
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;

/// Periodically captures and stores a portfolio for every member of every guild.
#[derive(Clone)]
pub struct SnapshotJob {
    helper: Arc<PortfolioHelper>,
    repo: Arc<Repository>,
    concurrency: usize,
    include_prices: bool,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SnapshotRunSummary {
    pub captured: usize,
    pub failed: usize,
}

#[derive(Debug, Error)]
pub enum SnapshotJobError {
    #[error(transparent)]
    Portfolio(#[from] PortfolioError),
    #[error(transparent)]
    Db(#[from] sqlx::Error),
}

impl SnapshotJob {
    pub fn new(
        helper: Arc<PortfolioHelper>,
        repo: Arc<Repository>,
        concurrency: usize,
        include_prices: bool,
    ) -> Self {
        Self {
            helper,
            repo,
            concurrency: concurrency.max(1),
            include_prices,
        }
    }

    /// Capture every member once.
    ///
    /// A failing member is logged and counted; it never aborts the run. Only failures
    /// to list guilds or members are returned as errors.
    pub async fn run_once(&self) -> Result<SnapshotRunSummary, SnapshotJobError> {
        let mut work = Vec::new();
        for guild in self.repo.list_guilds().await? {
            let guild = Arc::new(guild);
            for member in self.repo.list_members(&guild.id).await? {
                work.push((guild.clone(), member));
            }
        }

        let results: Vec<_> = stream::iter(work)
            .map(|(guild, member)| async move {
                let outcome = self.capture_and_store(&guild, &member).await;
                (guild, member, outcome)
            })
            .buffer_unordered(self.concurrency)
            .collect()
            .await;

        let mut summary = SnapshotRunSummary::default();
        for (guild, member, outcome) in results {
            match outcome {
                Ok(_) => summary.captured += 1,
                Err(e) => {
                    tracing::warn!(
                        guild_id = %guild.id,
                        address = %member.address,
                        error = %e,
                        "Portfolio snapshot failed"
                    );
                    summary.failed += 1;
                }
            }
        }

        tracing::info!(
            captured = summary.captured,
            failed = summary.failed,
            "Snapshot run complete"
        );
        Ok(summary)
    }

    /// Run [`SnapshotJob::run_once`] on a fixed period. The first run starts immediately.
    pub async fn run_forever(&self, period: Duration) {
        let mut ticker = tokio::time::interval(period);
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
        loop {
            ticker.tick().await;
            if let Err(e) = self.run_once().await {
                tracing::error!(error = %e, "Snapshot run aborted");
            }
        }
    }

    async fn capture_and_store(
        &self,
        guild: &Guild,
        member: &GuildMember,
    ) -> Result<String, SnapshotJobError> {
        let portfolio = self
            .helper
            .capture_single_member_portfolio(guild, member, self.include_prices)
            .await?;
        Ok(self.repo.insert_account_portfolio(&portfolio).await?)
    }
}
