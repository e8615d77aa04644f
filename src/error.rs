use crate::datasource::DataSourceError;
use crate::domain::{CoinId, Denom};
use std::fmt;
use thiserror::Error;

/// Collaborator call that failed during a capture.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FetchStage {
    Balances,
    Positions,
    SpotOrders,
    DerivativeOrders,
    BankBalances,
    Staking,
    Pricing,
}

impl fmt::Display for FetchStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            FetchStage::Balances => "balance fetch",
            FetchStage::Positions => "position fetch",
            FetchStage::SpotOrders => "spot order fetch",
            FetchStage::DerivativeOrders => "derivative order fetch",
            FetchStage::BankBalances => "bank balance fetch",
            FetchStage::Staking => "staking fetch",
            FetchStage::Pricing => "pricing",
        };
        write!(f, "{}", name)
    }
}

/// Errors that abort a portfolio capture or helper construction.
#[derive(Debug, Error)]
pub enum PortfolioError {
    /// Denom map missing, empty or unloadable. Fix the data and rebuild the helper.
    #[error("Configuration error: {0}")]
    Configuration(String),
    #[error("No coin id mapping for denom {0}")]
    MissingMapping(Denom),
    #[error("Price oracle returned no price for coin {0}")]
    PriceNotFound(CoinId),
    /// Upstream amounts too large to accumulate without losing precision.
    #[error("Decimal overflow computing {what} for {denom}")]
    Overflow { what: &'static str, denom: Denom },
    #[error("Upstream {stage} failed: {source}")]
    UpstreamFetch {
        stage: FetchStage,
        #[source]
        source: DataSourceError,
    },
}

impl PortfolioError {
    pub fn upstream(stage: FetchStage) -> impl FnOnce(DataSourceError) -> PortfolioError {
        move |source| PortfolioError::UpstreamFetch { stage, source }
    }

    /// Stage of a failed collaborator call, if this is an upstream failure.
    pub fn stage(&self) -> Option<FetchStage> {
        match self {
            PortfolioError::UpstreamFetch { stage, .. } => Some(*stage),
            _ => None,
        }
    }

    /// Upstream failures are transient from the caller's point of view; the rest need a data fix.
    pub fn is_retryable(&self) -> bool {
        matches!(self, PortfolioError::UpstreamFetch { .. })
    }
}
