//! Data source abstraction for account, exchange and price data.

use crate::domain::{
    Address, BankBalance, CoinId, CoinPrice, Decimal, Denom, DerivativeOrder, DerivativePosition,
    MarketId, SpotOrder, SubaccountBalance, SubaccountId,
};
use async_trait::async_trait;
use std::fmt;

pub mod injective;
pub mod mock;

pub use injective::InjectiveDataSource;
pub use mock::MockDataSource;

/// Upper bound on coin ids per `fetch_prices_usd` call imposed by the price oracle.
pub const MAX_PRICE_IDS_PER_REQUEST: usize = 10;

/// Account/exchange data provider and USD price oracle.
///
/// Implementations must handle retry/backoff and rate limiting. Results may come back in
/// any order and may cover only a subset of what was asked for.
#[async_trait]
pub trait DataSource: Send + Sync + fmt::Debug {
    /// Fetch subaccount deposits restricted to `denoms`.
    async fn fetch_subaccount_balances(
        &self,
        subaccount_id: &SubaccountId,
        denoms: &[Denom],
    ) -> Result<Vec<SubaccountBalance>, DataSourceError>;

    /// Fetch resting spot orders of a subaccount in the given markets.
    async fn fetch_spot_orders(
        &self,
        market_ids: &[MarketId],
        subaccount_id: &SubaccountId,
    ) -> Result<Vec<SpotOrder>, DataSourceError>;

    /// Fetch resting derivative orders of a subaccount in the given markets.
    async fn fetch_derivative_orders(
        &self,
        market_ids: &[MarketId],
        subaccount_id: &SubaccountId,
    ) -> Result<Vec<DerivativeOrder>, DataSourceError>;

    /// Fetch all open derivative positions of a subaccount, in any market.
    async fn fetch_positions(
        &self,
        subaccount_id: &SubaccountId,
    ) -> Result<Vec<DerivativePosition>, DataSourceError>;

    /// Fetch wallet balances of an address.
    async fn fetch_bank_balances(
        &self,
        address: &Address,
    ) -> Result<Vec<BankBalance>, DataSourceError>;

    /// Fetch the total amount of `denom` an address has delegated.
    async fn fetch_staked_amount(
        &self,
        address: &Address,
        denom: &Denom,
    ) -> Result<Decimal, DataSourceError>;

    /// Fetch USD prices for at most [`MAX_PRICE_IDS_PER_REQUEST`] coin ids.
    ///
    /// Coins unknown to the oracle are omitted from the result.
    async fn fetch_prices_usd(&self, coin_ids: &[CoinId]) -> Result<Vec<CoinPrice>, DataSourceError>;
}

/// Error type for data source operations.
#[derive(Debug, Clone)]
pub enum DataSourceError {
    /// Network error (e.g., connection timeout, DNS failure)
    NetworkError(String),
    /// HTTP error (e.g., 429 rate limit, 5xx server error)
    HttpError { status: u16, message: String },
    /// Parsing error (invalid JSON or malformed response)
    ParseError(String),
    /// Rate limit exceeded (caller should implement backoff)
    RateLimited,
    /// Other error
    Other(String),
}

impl fmt::Display for DataSourceError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DataSourceError::NetworkError(msg) => write!(f, "Network error: {}", msg),
            DataSourceError::HttpError { status, message } => {
                write!(f, "HTTP error {}: {}", status, message)
            }
            DataSourceError::ParseError(msg) => write!(f, "Parse error: {}", msg),
            DataSourceError::RateLimited => write!(f, "Rate limited"),
            DataSourceError::Other(msg) => write!(f, "Error: {}", msg),
        }
    }
}

impl std::error::Error for DataSourceError {}
