//! Transient exchange records fetched from the account data source.

use crate::domain::{CoinId, Decimal, Denom, MarketId, OrderSide, PositionDirection};
use serde::{Deserialize, Serialize};

/// Subaccount deposit for a single denom.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubaccountBalance {
    pub denom: Denom,
    pub total_balance: Decimal,
    pub available_balance: Decimal,
}

impl SubaccountBalance {
    pub fn new(denom: Denom, total_balance: Decimal, available_balance: Decimal) -> Self {
        Self {
            denom,
            total_balance,
            available_balance,
        }
    }

    pub fn zero(denom: Denom) -> Self {
        Self::new(denom, Decimal::zero(), Decimal::zero())
    }
}

/// Resting spot limit order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpotOrder {
    pub market_id: MarketId,
    pub order_side: OrderSide,
    pub price: Decimal,
    pub unfilled_quantity: Decimal,
}

/// Resting derivative order; only its reserved margin matters here.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DerivativeOrder {
    pub market_id: MarketId,
    pub margin: Decimal,
}

/// Open derivative position.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DerivativePosition {
    pub market_id: MarketId,
    pub direction: PositionDirection,
    pub quantity: Decimal,
    pub margin: Decimal,
    pub entry_price: Decimal,
    pub mark_price: Decimal,
}

/// Wallet (bank module) balance held outside the exchange subaccount.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BankBalance {
    pub denom: Denom,
    pub amount: Decimal,
}

/// USD quote for a price-feed coin.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CoinPrice {
    pub coin_id: CoinId,
    pub price_usd: f64,
}
