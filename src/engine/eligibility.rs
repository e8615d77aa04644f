//! Guild admission requirements evaluated against a priced portfolio.

use super::MarketRegistry;
use crate::domain::{AccountPortfolio, Decimal, Denom, Guild};
use crate::error::PortfolioError;
use serde::Serialize;
use std::collections::BTreeSet;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RequirementKind {
    SpotBase,
    SpotQuote,
    DerivativeQuote,
    Staking,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RequirementCheck {
    pub kind: RequirementKind,
    pub required_usd: Decimal,
    pub actual_usd: Decimal,
    pub met: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EligibilityReport {
    pub checks: Vec<RequirementCheck>,
}

impl EligibilityReport {
    pub fn is_eligible(&self) -> bool {
        self.checks.iter().all(|c| c.met)
    }

    pub fn unmet(&self) -> impl Iterator<Item = &RequirementCheck> {
        self.checks.iter().filter(|c| !c.met)
    }
}

/// USD value of a chain amount of `denom`: `amount / 10^decimals * price`.
pub fn usd_value(
    denom: &Denom,
    amount: Decimal,
    decimals: u32,
    price_usd: f64,
) -> Result<Decimal, PortfolioError> {
    let units = amount.shift_decimals(decimals).ok_or_else(|| {
        PortfolioError::Configuration(format!("unsupported token decimals {}", decimals))
    })?;
    let price = Decimal::from_f64(price_usd)
        .ok_or_else(|| PortfolioError::Configuration(format!("invalid USD price {}", price_usd)))?;
    units.checked_mul(price).ok_or_else(|| PortfolioError::Overflow {
        what: "USD value",
        denom: denom.clone(),
    })
}

/// Check a priced portfolio against the guild's four USD minimums.
///
/// Holdings of a denom are its exchange total plus its wallet balance. A zero requirement
/// is always met.
pub fn evaluate_eligibility(
    guild: &Guild,
    portfolio: &AccountPortfolio,
    staking_usd: Decimal,
) -> Result<EligibilityReport, PortfolioError> {
    let registry = MarketRegistry::from_guild(guild);

    let mut spot_base = BTreeSet::new();
    let mut spot_quote = BTreeSet::new();
    let mut derivative_quote = BTreeSet::new();
    for market in registry.markets() {
        if market.is_perpetual {
            derivative_quote.insert(market.quote_denom.clone());
        } else {
            spot_quote.insert(market.quote_denom.clone());
            spot_base.extend(market.base_denom.iter().cloned());
        }
    }

    let requirements = &guild.requirements;
    let checks = vec![
        check(
            RequirementKind::SpotBase,
            requirements.spot_base_usd,
            holdings_usd(&registry, portfolio, &spot_base)?,
        ),
        check(
            RequirementKind::SpotQuote,
            requirements.spot_quote_usd,
            holdings_usd(&registry, portfolio, &spot_quote)?,
        ),
        check(
            RequirementKind::DerivativeQuote,
            requirements.derivative_quote_usd,
            holdings_usd(&registry, portfolio, &derivative_quote)?,
        ),
        check(RequirementKind::Staking, requirements.staking_usd, staking_usd),
    ];

    Ok(EligibilityReport { checks })
}

fn check(kind: RequirementKind, required_usd: Decimal, actual_usd: Decimal) -> RequirementCheck {
    RequirementCheck {
        kind,
        required_usd,
        actual_usd,
        met: required_usd.is_zero() || actual_usd >= required_usd,
    }
}

fn holdings_usd(
    registry: &MarketRegistry,
    portfolio: &AccountPortfolio,
    denoms: &BTreeSet<Denom>,
) -> Result<Decimal, PortfolioError> {
    let mut total = Decimal::zero();
    for denom in denoms {
        let exchange = portfolio.balance(denom);
        let wallet = portfolio.bank_balance(denom);
        let overflow = || PortfolioError::Overflow {
            what: "USD holdings",
            denom: denom.clone(),
        };
        let amount = exchange
            .map(|b| b.total_balance)
            .unwrap_or_default()
            .checked_add(wallet.map(|b| b.balance).unwrap_or_default())
            .ok_or_else(overflow)?;
        if amount.is_zero() {
            continue;
        }

        let price = exchange
            .and_then(|b| b.price_usd)
            .or_else(|| wallet.and_then(|b| b.price_usd))
            .ok_or_else(|| {
                PortfolioError::Configuration(format!(
                    "portfolio has no USD price for {}",
                    denom
                ))
            })?;
        let decimals = registry
            .token_meta(denom)
            .map(|meta| meta.decimals)
            .ok_or_else(|| {
                PortfolioError::Configuration(format!("no token metadata for {}", denom))
            })?;
        total = total
            .checked_add(usd_value(denom, amount, decimals, price)?)
            .ok_or_else(overflow)?;
    }
    Ok(total)
}
