//! Account portfolio snapshot, the output of a capture.

use crate::domain::{Address, Decimal, Denom, TimeMs};
use serde::{Deserialize, Serialize};

/// Per-denom exchange balance within a snapshot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Balance {
    pub denom: Denom,
    /// USD price, present only for priced captures.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub price_usd: Option<f64>,
    pub total_balance: Decimal,
    pub available_balance: Decimal,
    pub unrealized_pnl: Decimal,
    pub margin_hold: Decimal,
}

/// Per-denom wallet balance within a snapshot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PortfolioBankBalance {
    pub denom: Denom,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub price_usd: Option<f64>,
    pub balance: Decimal,
}

/// Immutable point-in-time portfolio of one guild member.
///
/// `guild_id` pins the guild at capture time; membership may change afterwards.
/// The order of `balances` and `bank_balances` is unspecified.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AccountPortfolio {
    pub guild_id: String,
    pub address: Address,
    pub balances: Vec<Balance>,
    pub bank_balances: Vec<PortfolioBankBalance>,
    pub updated_at: TimeMs,
}

impl AccountPortfolio {
    pub fn balance(&self, denom: &Denom) -> Option<&Balance> {
        self.balances.iter().find(|b| &b.denom == denom)
    }

    pub fn bank_balance(&self, denom: &Denom) -> Option<&PortfolioBankBalance> {
        self.bank_balances.iter().find(|b| &b.denom == denom)
    }

    /// Balances sorted by denom, for comparisons that must not depend on capture order.
    pub fn sorted_balances(&self) -> Vec<Balance> {
        let mut balances = self.balances.clone();
        balances.sort_by(|a, b| a.denom.cmp(&b.denom));
        balances
    }

    /// True when every balance carries a USD price.
    pub fn is_priced(&self) -> bool {
        self.balances.iter().all(|b| b.price_usd.is_some())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn balance(denom: &str) -> Balance {
        Balance {
            denom: Denom::new(denom),
            price_usd: None,
            total_balance: Decimal::zero(),
            available_balance: Decimal::zero(),
            unrealized_pnl: Decimal::zero(),
            margin_hold: Decimal::zero(),
        }
    }

    #[test]
    fn test_sorted_balances_orders_by_denom() {
        let portfolio = AccountPortfolio {
            guild_id: "g".to_string(),
            address: Address::parse("0x0000000000000000000000000000000000000001").unwrap(),
            balances: vec![balance("usdt"), balance("inj"), balance("peggy")],
            bank_balances: vec![],
            updated_at: TimeMs::new(0),
        };
        let denoms: Vec<String> = portfolio
            .sorted_balances()
            .into_iter()
            .map(|b| b.denom.0)
            .collect();
        assert_eq!(denoms, vec!["inj", "peggy", "usdt"]);
        assert!(portfolio.balance(&Denom::new("inj")).is_some());
        assert!(!portfolio.is_priced());
    }

    #[test]
    fn test_unpriced_balance_omits_price_field() {
        let json = serde_json::to_value(balance("inj")).unwrap();
        assert!(json.get("price_usd").is_none());
        assert_eq!(json["margin_hold"], serde_json::json!("0"));
    }
}
