//! USD price resolution for chain denoms.

use crate::datasource::{DataSource, MAX_PRICE_IDS_PER_REQUEST};
use crate::domain::{CoinId, Denom};
use crate::error::{FetchStage, PortfolioError};
use std::collections::{BTreeSet, HashMap};
use tracing::debug;

/// Resolves USD prices for denoms through their price-feed coin ids.
///
/// The denom map is fixed at construction; build a new resolver to pick up changes.
#[derive(Debug, Clone)]
pub struct DenomPriceResolver {
    coin_ids: HashMap<Denom, CoinId>,
}

impl DenomPriceResolver {
    /// Fails with [`PortfolioError::Configuration`] when the mapping is empty.
    pub fn new(mapping: impl IntoIterator<Item = (Denom, CoinId)>) -> Result<Self, PortfolioError> {
        let coin_ids: HashMap<Denom, CoinId> = mapping.into_iter().collect();
        if coin_ids.is_empty() {
            return Err(PortfolioError::Configuration(
                "denom to coin id map is empty, run denom sync first".to_string(),
            ));
        }
        Ok(Self { coin_ids })
    }

    pub fn coin_id(&self, denom: &Denom) -> Option<&CoinId> {
        self.coin_ids.get(denom)
    }

    /// Number of mapped denoms. Never zero.
    pub fn mapped_denoms(&self) -> usize {
        self.coin_ids.len()
    }

    /// Resolve a USD price for every denom, or fail.
    ///
    /// Coin ids are deduplicated and requested in batches of at most
    /// [`MAX_PRICE_IDS_PER_REQUEST`]. A denom without a mapping or a coin the oracle does not
    /// quote aborts the whole resolution; partial price maps are never returned.
    pub async fn resolve<'a>(
        &self,
        datasource: &dyn DataSource,
        denoms: impl IntoIterator<Item = &'a Denom>,
    ) -> Result<HashMap<Denom, f64>, PortfolioError> {
        let mut requested: Vec<(Denom, CoinId)> = Vec::new();
        for denom in denoms {
            let coin_id = self
                .coin_id(denom)
                .ok_or_else(|| PortfolioError::MissingMapping(denom.clone()))?;
            requested.push((denom.clone(), coin_id.clone()));
        }

        let unique: Vec<CoinId> = requested
            .iter()
            .map(|(_, c)| c.clone())
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect();

        let mut quotes: HashMap<CoinId, f64> = HashMap::with_capacity(unique.len());
        for batch in unique.chunks(MAX_PRICE_IDS_PER_REQUEST) {
            debug!(batch_size = batch.len(), "Requesting USD prices");
            let prices = datasource
                .fetch_prices_usd(batch)
                .await
                .map_err(PortfolioError::upstream(FetchStage::Pricing))?;
            quotes.extend(prices.into_iter().map(|p| (p.coin_id, p.price_usd)));
        }

        requested
            .into_iter()
            .map(|(denom, coin_id)| match quotes.get(&coin_id) {
                Some(price) => Ok((denom, *price)),
                None => Err(PortfolioError::PriceNotFound(coin_id)),
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::datasource::MockDataSource;

    fn mapping() -> Vec<(Denom, CoinId)> {
        vec![
            (Denom::new("inj"), CoinId::new("injective-protocol")),
            (Denom::new("usdt"), CoinId::new("tether")),
            (Denom::new("peggy-usdt"), CoinId::new("tether")),
        ]
    }

    #[test]
    fn test_empty_mapping_is_configuration_error() {
        let err = DenomPriceResolver::new(Vec::new()).unwrap_err();
        assert!(matches!(err, PortfolioError::Configuration(_)));
        assert_eq!(DenomPriceResolver::new(mapping()).unwrap().mapped_denoms(), 3);
    }

    #[tokio::test]
    async fn test_resolve_shares_coin_ids_between_denoms() {
        let resolver = DenomPriceResolver::new(mapping()).unwrap();
        let mock = MockDataSource::new()
            .with_price("injective-protocol", 6.0)
            .with_price("tether", 1.0);
        let denoms = vec![
            Denom::new("inj"),
            Denom::new("usdt"),
            Denom::new("peggy-usdt"),
        ];

        let prices = resolver.resolve(&mock, &denoms).await.unwrap();
        assert_eq!(prices.len(), 3);
        assert_eq!(prices[&Denom::new("inj")], 6.0);
        assert_eq!(prices[&Denom::new("peggy-usdt")], 1.0);
        assert_eq!(mock.price_requests(), vec![vec![
            CoinId::new("injective-protocol"),
            CoinId::new("tether"),
        ]]);
    }

    #[tokio::test]
    async fn test_missing_mapping_fails_before_any_oracle_call() {
        let resolver = DenomPriceResolver::new(mapping()).unwrap();
        let mock = MockDataSource::new().with_price("tether", 1.0);
        let denoms = vec![Denom::new("usdt"), Denom::new("weth")];

        let err = resolver.resolve(&mock, &denoms).await.unwrap_err();
        assert!(matches!(err, PortfolioError::MissingMapping(d) if d == Denom::new("weth")));
        assert!(mock.price_requests().is_empty());
    }

    #[tokio::test]
    async fn test_unquoted_coin_is_price_not_found() {
        let resolver = DenomPriceResolver::new(mapping()).unwrap();
        let mock = MockDataSource::new().with_price("tether", 1.0);
        let denoms = vec![Denom::new("inj"), Denom::new("usdt")];

        let err = resolver.resolve(&mock, &denoms).await.unwrap_err();
        assert!(
            matches!(err, PortfolioError::PriceNotFound(c) if c == CoinId::new("injective-protocol"))
        );
    }

    #[tokio::test]
    async fn test_oracle_failure_is_pricing_stage() {
        let resolver = DenomPriceResolver::new(mapping()).unwrap();
        let mock = MockDataSource::new().failing(FetchStage::Pricing);

        let err = resolver
            .resolve(&mock, &[Denom::new("inj")])
            .await
            .unwrap_err();
        assert_eq!(err.stage(), Some(FetchStage::Pricing));
    }
}
