use crate::datasource::DataSource;
use crate::domain::{Denom, SubaccountBalance, SubaccountId};
use crate::error::{FetchStage, PortfolioError};
use std::collections::{HashMap, HashSet};

/// Fetch subaccount balances for `denoms`, returning exactly one entry per requested denom.
pub async fn fetch_normalized_balances(
    datasource: &dyn DataSource,
    subaccount_id: &SubaccountId,
    denoms: &[Denom],
) -> Result<Vec<SubaccountBalance>, PortfolioError> {
    let fetched = datasource
        .fetch_subaccount_balances(subaccount_id, denoms)
        .await
        .map_err(PortfolioError::upstream(FetchStage::Balances))?;
    Ok(normalize_balances(denoms, fetched))
}

/// Keep one fetched entry per requested denom and add zero entries for the rest.
///
/// Entries for denoms that were not requested are dropped. Output order is unspecified.
pub fn normalize_balances(
    denoms: &[Denom],
    fetched: Vec<SubaccountBalance>,
) -> Vec<SubaccountBalance> {
    let wanted: HashSet<&Denom> = denoms.iter().collect();
    let mut by_denom: HashMap<Denom, SubaccountBalance> = HashMap::with_capacity(denoms.len());
    for balance in fetched {
        if wanted.contains(&balance.denom) && !by_denom.contains_key(&balance.denom) {
            by_denom.insert(balance.denom.clone(), balance);
        }
    }
    for denom in denoms {
        by_denom
            .entry(denom.clone())
            .or_insert_with(|| SubaccountBalance::zero(denom.clone()));
    }
    by_denom.into_values().collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::datasource::MockDataSource;
    use crate::domain::{Address, Decimal};
    use std::str::FromStr;

    fn d(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    fn denoms(names: &[&str]) -> Vec<Denom> {
        names.iter().map(|n| Denom::new(*n)).collect()
    }

    fn sorted(mut balances: Vec<SubaccountBalance>) -> Vec<SubaccountBalance> {
        balances.sort_by(|a, b| a.denom.cmp(&b.denom));
        balances
    }

    #[test]
    fn test_no_balances_yields_one_zero_entry_per_denom() {
        let wanted = denoms(&["inj", "usdt", "weth", "ust"]);
        let balances = normalize_balances(&wanted, Vec::new());
        assert_eq!(balances.len(), wanted.len());
        assert!(balances
            .iter()
            .all(|b| b.total_balance.is_zero() && b.available_balance.is_zero()));
    }

    #[test]
    fn test_fetched_entries_kept_and_gaps_filled() {
        let wanted = denoms(&["inj", "usdt"]);
        let fetched = vec![
            SubaccountBalance::new(Denom::new("usdt"), d("50"), d("40")),
            SubaccountBalance::new(Denom::new("atom"), d("7"), d("7")),
        ];
        let balances = sorted(normalize_balances(&wanted, fetched));
        assert_eq!(
            balances,
            vec![
                SubaccountBalance::zero(Denom::new("inj")),
                SubaccountBalance::new(Denom::new("usdt"), d("50"), d("40")),
            ]
        );
    }

    #[test]
    fn test_duplicate_fetched_denom_keeps_first() {
        let wanted = denoms(&["inj"]);
        let fetched = vec![
            SubaccountBalance::new(Denom::new("inj"), d("1"), d("1")),
            SubaccountBalance::new(Denom::new("inj"), d("2"), d("2")),
        ];
        let balances = normalize_balances(&wanted, fetched);
        assert_eq!(balances.len(), 1);
        assert_eq!(balances[0].total_balance, d("1"));
    }

    #[tokio::test]
    async fn test_fetch_failure_is_balance_stage() {
        let sub = Address::parse("0x00000000000000000000000000000000000000aa")
            .unwrap()
            .default_subaccount_id();
        let mock = MockDataSource::new().failing(FetchStage::Balances);
        let err = fetch_normalized_balances(&mock, &sub, &denoms(&["inj"]))
            .await
            .unwrap_err();
        assert_eq!(err.stage(), Some(FetchStage::Balances));
    }
}
