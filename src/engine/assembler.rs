use crate::domain::{Balance, BankBalance, Decimal, Denom, PortfolioBankBalance, SubaccountBalance};
use crate::error::PortfolioError;
use std::collections::{BTreeSet, HashMap};

/// Merge normalized balances with PnL, margin and optional prices.
///
/// Denoms missing from `pnl` or `margin` get zero. `price_usd` is set only when `prices` is
/// supplied. Output follows the order of `balances`, which itself is unspecified; callers
/// comparing snapshots must sort by denom.
pub fn assemble_balances(
    balances: Vec<SubaccountBalance>,
    pnl: &HashMap<Denom, Decimal>,
    margin: &HashMap<Denom, Decimal>,
    prices: Option<&HashMap<Denom, f64>>,
) -> Vec<Balance> {
    balances
        .into_iter()
        .map(|b| Balance {
            price_usd: prices.and_then(|p| p.get(&b.denom).copied()),
            unrealized_pnl: pnl.get(&b.denom).copied().unwrap_or_default(),
            margin_hold: margin.get(&b.denom).copied().unwrap_or_default(),
            total_balance: b.total_balance,
            available_balance: b.available_balance,
            denom: b.denom,
        })
        .collect()
}

/// Wallet balances restricted to `tracked` denoms, priced from the same map as the exchange
/// balances. Amounts of repeated denoms are added together.
pub fn assemble_bank_balances(
    bank_balances: Vec<BankBalance>,
    tracked: &BTreeSet<Denom>,
    prices: Option<&HashMap<Denom, f64>>,
) -> Result<Vec<PortfolioBankBalance>, PortfolioError> {
    let mut merged: Vec<PortfolioBankBalance> = Vec::new();
    for bank in bank_balances {
        if !tracked.contains(&bank.denom) {
            continue;
        }
        match merged.iter_mut().find(|m| m.denom == bank.denom) {
            Some(existing) => {
                existing.balance = existing.balance.checked_add(bank.amount).ok_or_else(|| {
                    PortfolioError::Overflow {
                        what: "bank balance",
                        denom: bank.denom.clone(),
                    }
                })?;
            }
            None => merged.push(PortfolioBankBalance {
                price_usd: prices.and_then(|p| p.get(&bank.denom).copied()),
                balance: bank.amount,
                denom: bank.denom,
            }),
        }
    }
    Ok(merged)
}
