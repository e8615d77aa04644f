use crate::config::StakingConfig;
use crate::datasource::DataSource;
use crate::db::DenomMapStore;
use crate::domain::{AccountPortfolio, Address, Decimal, Denom, Guild, GuildMember, TimeMs};
use crate::engine::{
    assemble_balances, assemble_bank_balances, compute_margin_holds, compute_unrealized_pnl,
    fetch_normalized_balances, usd_value, DenomPriceResolver, MarketRegistry,
};
use crate::error::{FetchStage, PortfolioError};
use std::sync::Arc;
use tracing::{debug, info};

/// Captures member portfolios from the data source.
///
/// Only constructible with a loaded, non-empty denom map. The map is read once and never
/// refreshed; build a new helper to pick up mapping changes.
#[derive(Debug, Clone)]
pub struct PortfolioHelper {
    datasource: Arc<dyn DataSource>,
    prices: DenomPriceResolver,
}

impl PortfolioHelper {
    pub async fn new(
        datasource: Arc<dyn DataSource>,
        store: &dyn DenomMapStore,
    ) -> Result<Self, PortfolioError> {
        let mapping = store.list_denom_coin_ids().await.map_err(|e| {
            PortfolioError::Configuration(format!("failed to load denom map: {}", e))
        })?;
        let prices = DenomPriceResolver::new(mapping)?;
        info!(denoms = prices.mapped_denoms(), "Portfolio helper ready");
        Ok(Self { datasource, prices })
    }

    pub fn price_resolver(&self) -> &DenomPriceResolver {
        &self.prices
    }

    /// Capture one member's portfolio within a guild's market universe.
    ///
    /// Balances, positions, both order books and wallet balances are fetched concurrently;
    /// the first failure aborts the capture. Prices are resolved for every tracked denom
    /// when `include_prices` is set.
    pub async fn capture_single_member_portfolio(
        &self,
        guild: &Guild,
        member: &GuildMember,
        include_prices: bool,
    ) -> Result<AccountPortfolio, PortfolioError> {
        let registry = MarketRegistry::from_guild(guild);
        let tracked = registry.denoms();
        let denoms: Vec<Denom> = tracked.iter().cloned().collect();
        let spot_market_ids = registry.spot_market_ids();
        let derivative_market_ids = registry.derivative_market_ids();
        let subaccount_id = member.address.default_subaccount_id();
        let ds = self.datasource.as_ref();

        debug!(
            guild_id = %guild.id,
            address = %member.address,
            subaccount_id = %subaccount_id,
            include_prices,
            "Capturing portfolio"
        );

        let (balances, positions, spot_orders, derivative_orders, bank_balances) = tokio::try_join!(
            fetch_normalized_balances(ds, &subaccount_id, &denoms),
            async {
                ds.fetch_positions(&subaccount_id)
                    .await
                    .map_err(PortfolioError::upstream(FetchStage::Positions))
            },
            async {
                ds.fetch_spot_orders(&spot_market_ids, &subaccount_id)
                    .await
                    .map_err(PortfolioError::upstream(FetchStage::SpotOrders))
            },
            async {
                ds.fetch_derivative_orders(&derivative_market_ids, &subaccount_id)
                    .await
                    .map_err(PortfolioError::upstream(FetchStage::DerivativeOrders))
            },
            async {
                ds.fetch_bank_balances(&member.address)
                    .await
                    .map_err(PortfolioError::upstream(FetchStage::BankBalances))
            },
        )?;

        let margin = compute_margin_holds(&registry, &positions, &derivative_orders, &spot_orders)?;
        let pnl = compute_unrealized_pnl(&registry, &positions)?;
        let prices = if include_prices {
            Some(self.prices.resolve(ds, &tracked).await?)
        } else {
            None
        };

        Ok(AccountPortfolio {
            guild_id: guild.id.clone(),
            address: member.address.clone(),
            balances: assemble_balances(balances, &pnl, &margin, prices.as_ref()),
            bank_balances: assemble_bank_balances(bank_balances, &tracked, prices.as_ref())?,
            updated_at: TimeMs::now(),
        })
    }

    /// USD value of the amount an address has delegated in the staking denom.
    pub async fn staking_value_usd(
        &self,
        address: &Address,
        staking: &StakingConfig,
    ) -> Result<Decimal, PortfolioError> {
        let staked = self
            .datasource
            .fetch_staked_amount(address, &staking.denom)
            .await
            .map_err(PortfolioError::upstream(FetchStage::Staking))?;
        if staked.is_zero() {
            return Ok(Decimal::zero());
        }

        let prices = self
            .prices
            .resolve(self.datasource.as_ref(), [&staking.denom])
            .await?;
        let price = prices
            .get(&staking.denom)
            .copied()
            .ok_or_else(|| PortfolioError::MissingMapping(staking.denom.clone()))?;
        usd_value(&staking.denom, staked, staking.decimals, price)
    }
}
