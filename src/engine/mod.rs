//! Pure portfolio computation: market registry, pricing, balance normalization, margin and
//! PnL accounting, snapshot assembly and eligibility checks.

pub mod assembler;
pub mod balances;
pub mod eligibility;
pub mod margin;
pub mod pnl;
pub mod pricing;
pub mod registry;

pub use assembler::{assemble_balances, assemble_bank_balances};
pub use balances::{fetch_normalized_balances, normalize_balances};
pub use eligibility::{
    evaluate_eligibility, usd_value, EligibilityReport, RequirementCheck, RequirementKind,
};
pub use margin::compute_margin_holds;
pub use pnl::compute_unrealized_pnl;
pub use pricing::DenomPriceResolver;
pub use registry::MarketRegistry;

use crate::domain::{Decimal, Denom};
use crate::error::PortfolioError;
use std::collections::HashMap;

/// Add `amount` to the running total of `denom`, failing instead of panicking on overflow.
fn accumulate(
    totals: &mut HashMap<Denom, Decimal>,
    denom: &Denom,
    amount: Decimal,
    what: &'static str,
) -> Result<(), PortfolioError> {
    let total = totals.entry(denom.clone()).or_default();
    *total = total
        .checked_add(amount)
        .ok_or_else(|| PortfolioError::Overflow {
            what,
            denom: denom.clone(),
        })?;
    Ok(())
}
