//! Margin held against open orders and positions.
//!
//! - Derivative positions and orders hold their margin in the market's quote denom.
//! - Spot buys hold `price * unfilled * (1 + taker_fee)` of the quote denom.
//! - Spot sells hold `unfilled` of the base denom; the inventory itself is the collateral.
//!
//! Records in markets the guild does not track are ignored.

use super::{accumulate, MarketRegistry};
use crate::domain::{Decimal, Denom, DerivativeOrder, DerivativePosition, OrderSide, SpotOrder};
use crate::error::PortfolioError;
use std::collections::HashMap;

const WHAT: &str = "margin hold";

/// Margin held per denom. Fails rather than under-report: a spot sell in a market without a
/// base denom is a `Configuration` error, and amounts that overflow are an `Overflow` error.
pub fn compute_margin_holds(
    registry: &MarketRegistry,
    positions: &[DerivativePosition],
    derivative_orders: &[DerivativeOrder],
    spot_orders: &[SpotOrder],
) -> Result<HashMap<Denom, Decimal>, PortfolioError> {
    let mut holds: HashMap<Denom, Decimal> = HashMap::new();

    for position in positions {
        if let Some(market) = registry.get(&position.market_id) {
            accumulate(&mut holds, &market.quote_denom, position.margin, WHAT)?;
        }
    }

    for order in derivative_orders {
        if let Some(market) = registry.get(&order.market_id) {
            accumulate(&mut holds, &market.quote_denom, order.margin, WHAT)?;
        }
    }

    for order in spot_orders {
        let Some(market) = registry.get(&order.market_id) else {
            continue;
        };
        match order.order_side {
            OrderSide::Buy => {
                let overflow = || PortfolioError::Overflow {
                    what: WHAT,
                    denom: market.quote_denom.clone(),
                };
                let fee_factor = Decimal::one()
                    .checked_add(market.taker_fee_rate)
                    .ok_or_else(overflow)?;
                let hold = order
                    .price
                    .checked_mul(order.unfilled_quantity)
                    .and_then(|notional| notional.checked_mul(fee_factor))
                    .ok_or_else(overflow)?;
                accumulate(&mut holds, &market.quote_denom, hold, WHAT)?;
            }
            OrderSide::Sell => {
                let base = market.base_denom.as_ref().ok_or_else(|| {
                    PortfolioError::Configuration(format!(
                        "spot market {} has no base denom",
                        market.market_id
                    ))
                })?;
                accumulate(&mut holds, base, order.unfilled_quantity, WHAT)?;
            }
        }
    }

    Ok(holds)
}
