//! Mock data source for testing without network calls.

use super::{DataSource, DataSourceError};
use crate::domain::{
    Address, BankBalance, CoinId, CoinPrice, Decimal, Denom, DerivativeOrder, DerivativePosition,
    MarketId, SpotOrder, SubaccountBalance, SubaccountId,
};
use crate::error::FetchStage;
use async_trait::async_trait;
use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex};

/// Mock data source that returns predefined test data.
///
/// Account data is keyed by subaccount (exchange calls) or address (bank and staking calls)
/// so several members can share one mock.
#[derive(Debug, Clone, Default)]
pub struct MockDataSource {
    balances: HashMap<SubaccountId, Vec<SubaccountBalance>>,
    spot_orders: HashMap<SubaccountId, Vec<SpotOrder>>,
    derivative_orders: HashMap<SubaccountId, Vec<DerivativeOrder>>,
    positions: HashMap<SubaccountId, Vec<DerivativePosition>>,
    bank_balances: HashMap<Address, Vec<BankBalance>>,
    staked: HashMap<Address, Decimal>,
    prices: HashMap<CoinId, f64>,
    failing: HashSet<FetchStage>,
    price_requests: Arc<Mutex<Vec<Vec<CoinId>>>>,
}

impl MockDataSource {
    /// Create a new mock data source with empty data.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_balance(mut self, subaccount_id: &SubaccountId, balance: SubaccountBalance) -> Self {
        self.balances
            .entry(subaccount_id.clone())
            .or_default()
            .push(balance);
        self
    }

    pub fn with_spot_order(mut self, subaccount_id: &SubaccountId, order: SpotOrder) -> Self {
        self.spot_orders
            .entry(subaccount_id.clone())
            .or_default()
            .push(order);
        self
    }

    pub fn with_derivative_order(
        mut self,
        subaccount_id: &SubaccountId,
        order: DerivativeOrder,
    ) -> Self {
        self.derivative_orders
            .entry(subaccount_id.clone())
            .or_default()
            .push(order);
        self
    }

    pub fn with_position(
        mut self,
        subaccount_id: &SubaccountId,
        position: DerivativePosition,
    ) -> Self {
        self.positions
            .entry(subaccount_id.clone())
            .or_default()
            .push(position);
        self
    }

    pub fn with_bank_balance(mut self, address: &Address, balance: BankBalance) -> Self {
        self.bank_balances
            .entry(address.clone())
            .or_default()
            .push(balance);
        self
    }

    pub fn with_staked(mut self, address: &Address, amount: Decimal) -> Self {
        self.staked.insert(address.clone(), amount);
        self
    }

    pub fn with_price(mut self, coin_id: &str, price_usd: f64) -> Self {
        self.prices.insert(CoinId::new(coin_id), price_usd);
        self
    }

    /// Make every call belonging to `stage` fail with a network error.
    pub fn failing(mut self, stage: FetchStage) -> Self {
        self.failing.insert(stage);
        self
    }

    /// Coin ids of every `fetch_prices_usd` call made so far, in call order.
    pub fn price_requests(&self) -> Vec<Vec<CoinId>> {
        self.price_requests
            .lock()
            .map(|requests| requests.clone())
            .unwrap_or_default()
    }

    fn check(&self, stage: FetchStage) -> Result<(), DataSourceError> {
        if self.failing.contains(&stage) {
            return Err(DataSourceError::NetworkError(format!(
                "mock {} unavailable",
                stage
            )));
        }
        Ok(())
    }
}

#[async_trait]
impl DataSource for MockDataSource {
    async fn fetch_subaccount_balances(
        &self,
        subaccount_id: &SubaccountId,
        denoms: &[Denom],
    ) -> Result<Vec<SubaccountBalance>, DataSourceError> {
        self.check(FetchStage::Balances)?;
        Ok(self
            .balances
            .get(subaccount_id)
            .map(|balances| {
                balances
                    .iter()
                    .filter(|b| denoms.contains(&b.denom))
                    .cloned()
                    .collect()
            })
            .unwrap_or_default())
    }

    async fn fetch_spot_orders(
        &self,
        market_ids: &[MarketId],
        subaccount_id: &SubaccountId,
    ) -> Result<Vec<SpotOrder>, DataSourceError> {
        self.check(FetchStage::SpotOrders)?;
        Ok(self
            .spot_orders
            .get(subaccount_id)
            .map(|orders| {
                orders
                    .iter()
                    .filter(|o| market_ids.contains(&o.market_id))
                    .cloned()
                    .collect()
            })
            .unwrap_or_default())
    }

    async fn fetch_derivative_orders(
        &self,
        market_ids: &[MarketId],
        subaccount_id: &SubaccountId,
    ) -> Result<Vec<DerivativeOrder>, DataSourceError> {
        self.check(FetchStage::DerivativeOrders)?;
        Ok(self
            .derivative_orders
            .get(subaccount_id)
            .map(|orders| {
                orders
                    .iter()
                    .filter(|o| market_ids.contains(&o.market_id))
                    .cloned()
                    .collect()
            })
            .unwrap_or_default())
    }

    async fn fetch_positions(
        &self,
        subaccount_id: &SubaccountId,
    ) -> Result<Vec<DerivativePosition>, DataSourceError> {
        self.check(FetchStage::Positions)?;
        Ok(self
            .positions
            .get(subaccount_id)
            .cloned()
            .unwrap_or_default())
    }

    async fn fetch_bank_balances(
        &self,
        address: &Address,
    ) -> Result<Vec<BankBalance>, DataSourceError> {
        self.check(FetchStage::BankBalances)?;
        Ok(self.bank_balances.get(address).cloned().unwrap_or_default())
    }

    async fn fetch_staked_amount(
        &self,
        address: &Address,
        _denom: &Denom,
    ) -> Result<Decimal, DataSourceError> {
        self.check(FetchStage::Staking)?;
        Ok(self.staked.get(address).copied().unwrap_or_default())
    }

    async fn fetch_prices_usd(&self, coin_ids: &[CoinId]) -> Result<Vec<CoinPrice>, DataSourceError> {
        if let Ok(mut requests) = self.price_requests.lock() {
            requests.push(coin_ids.to_vec());
        }
        self.check(FetchStage::Pricing)?;
        Ok(coin_ids
            .iter()
            .filter_map(|id| {
                self.prices.get(id).map(|price| CoinPrice {
                    coin_id: id.clone(),
                    price_usd: *price,
                })
            })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    fn subaccount() -> SubaccountId {
        Address::parse("0x0000000000000000000000000000000000000abc")
            .unwrap()
            .default_subaccount_id()
    }

    #[tokio::test]
    async fn test_mock_balances_filtered_by_denom() {
        let sub = subaccount();
        let mock = MockDataSource::new()
            .with_balance(
                &sub,
                SubaccountBalance::new(
                    Denom::new("inj"),
                    Decimal::from_str("5").unwrap(),
                    Decimal::from_str("4").unwrap(),
                ),
            )
            .with_balance(&sub, SubaccountBalance::zero(Denom::new("atom")));

        let balances = mock
            .fetch_subaccount_balances(&sub, &[Denom::new("inj")])
            .await
            .unwrap();
        assert_eq!(balances.len(), 1);
        assert_eq!(balances[0].denom, Denom::new("inj"));
    }

    #[tokio::test]
    async fn test_mock_prices_omit_unknown_and_record_requests() {
        let mock = MockDataSource::new().with_price("tether", 1.0);
        let prices = mock
            .fetch_prices_usd(&[CoinId::new("tether"), CoinId::new("unknown")])
            .await
            .unwrap();
        assert_eq!(prices.len(), 1);
        assert_eq!(prices[0].price_usd, 1.0);
        assert_eq!(mock.price_requests().len(), 1);
        assert_eq!(mock.price_requests()[0].len(), 2);
    }

    #[tokio::test]
    async fn test_mock_failing_stage() {
        let mock = MockDataSource::new().failing(FetchStage::Positions);
        let err = mock.fetch_positions(&subaccount()).await.unwrap_err();
        assert!(matches!(err, DataSourceError::NetworkError(_)));
        let address = Address::parse("0x0000000000000000000000000000000000000abc").unwrap();
        assert!(mock.fetch_bank_balances(&address).await.is_ok());
    }
}
