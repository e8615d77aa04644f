use super::{accumulate, MarketRegistry};
use crate::domain::{Decimal, Denom, DerivativePosition};
use crate::error::PortfolioError;
use std::collections::HashMap;

/// Unrealized PnL per quote denom: `(mark - entry) * quantity * sign(direction)`.
///
/// Positions are summed, never netted, and positions in untracked markets are ignored.
pub fn compute_unrealized_pnl(
    registry: &MarketRegistry,
    positions: &[DerivativePosition],
) -> Result<HashMap<Denom, Decimal>, PortfolioError> {
    let mut pnl: HashMap<Denom, Decimal> = HashMap::new();
    for position in positions {
        let Some(market) = registry.get(&position.market_id) else {
            continue;
        };
        let contribution = position
            .mark_price
            .checked_sub(position.entry_price)
            .and_then(|diff| diff.checked_mul(position.quantity))
            .and_then(|value| value.checked_mul(position.direction.sign()))
            .ok_or_else(|| PortfolioError::Overflow {
                what: "unrealized pnl",
                denom: market.quote_denom.clone(),
            })?;
        accumulate(&mut pnl, &market.quote_denom, contribution, "unrealized pnl")?;
    }
    Ok(pnl)
}
