use crate::domain::{Denom, Guild, Market, MarketId, TokenMeta};
use std::collections::{BTreeSet, HashMap};

/// A guild's tracked markets indexed by id.
#[derive(Debug, Clone, Default)]
pub struct MarketRegistry {
    markets: HashMap<MarketId, Market>,
}

impl MarketRegistry {
    pub fn new(markets: impl IntoIterator<Item = Market>) -> Self {
        Self {
            markets: markets
                .into_iter()
                .map(|m| (m.market_id.clone(), m))
                .collect(),
        }
    }

    pub fn from_guild(guild: &Guild) -> Self {
        Self::new(guild.markets.iter().cloned())
    }

    /// Look up a tracked market. `None` means the market is outside the guild's universe.
    pub fn get(&self, market_id: &MarketId) -> Option<&Market> {
        self.markets.get(market_id)
    }

    pub fn markets(&self) -> impl Iterator<Item = &Market> {
        self.markets.values()
    }

    /// Every base and quote denom of the tracked markets, deduplicated.
    pub fn denoms(&self) -> BTreeSet<Denom> {
        self.markets
            .values()
            .flat_map(|m| m.denoms().cloned())
            .collect()
    }

    pub fn spot_market_ids(&self) -> Vec<MarketId> {
        self.market_ids(false)
    }

    pub fn derivative_market_ids(&self) -> Vec<MarketId> {
        self.market_ids(true)
    }

    fn market_ids(&self, perpetual: bool) -> Vec<MarketId> {
        let mut ids: Vec<MarketId> = self
            .markets
            .values()
            .filter(|m| m.is_perpetual == perpetual)
            .map(|m| m.market_id.clone())
            .collect();
        ids.sort();
        ids
    }

    /// Token metadata for a denom, from whichever tracked market lists it.
    pub fn token_meta(&self, denom: &Denom) -> Option<&TokenMeta> {
        self.markets.values().find_map(|m| {
            if &m.quote_denom == denom {
                Some(&m.quote_token_meta)
            } else if m.base_denom.as_ref() == Some(denom) {
                m.base_token_meta.as_ref()
            } else {
                None
            }
        })
    }
}
