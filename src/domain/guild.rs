//! Guild, market and membership records.

use crate::domain::{Address, Decimal, Denom, MarketId, TimeMs};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Display metadata for a token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenMeta {
    pub name: String,
    pub symbol: String,
    /// Number of decimals between the chain integer amount and one whole token.
    pub decimals: u32,
}

impl TokenMeta {
    pub fn new(name: impl Into<String>, symbol: impl Into<String>, decimals: u32) -> Self {
        Self {
            name: name.into(),
            symbol: symbol.into(),
            decimals,
        }
    }
}

/// A market whose base side does not match its kind.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InvalidMarket {
    #[error("spot market {0} has no base denom")]
    MissingBase(MarketId),
    #[error("perpetual market {0} has a base denom")]
    UnexpectedBase(MarketId),
}

/// A market tracked by a guild.
///
/// Perpetual markets have no base denom; use [`Market::spot`] and [`Market::perpetual`]
/// to construct markets so that invariant holds, and [`Market::validate`] on decoded ones.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Market {
    pub market_id: MarketId,
    pub is_perpetual: bool,
    pub base_denom: Option<Denom>,
    pub base_token_meta: Option<TokenMeta>,
    pub quote_denom: Denom,
    pub quote_token_meta: TokenMeta,
    pub maker_fee_rate: Decimal,
    pub taker_fee_rate: Decimal,
}

impl Market {
    pub fn spot(
        market_id: MarketId,
        base: (Denom, TokenMeta),
        quote: (Denom, TokenMeta),
        maker_fee_rate: Decimal,
        taker_fee_rate: Decimal,
    ) -> Self {
        Self {
            market_id,
            is_perpetual: false,
            base_denom: Some(base.0),
            base_token_meta: Some(base.1),
            quote_denom: quote.0,
            quote_token_meta: quote.1,
            maker_fee_rate,
            taker_fee_rate,
        }
    }

    pub fn perpetual(
        market_id: MarketId,
        quote: (Denom, TokenMeta),
        maker_fee_rate: Decimal,
        taker_fee_rate: Decimal,
    ) -> Self {
        Self {
            market_id,
            is_perpetual: true,
            base_denom: None,
            base_token_meta: None,
            quote_denom: quote.0,
            quote_token_meta: quote.1,
            maker_fee_rate,
            taker_fee_rate,
        }
    }

    /// Check that spot markets carry a base denom with metadata and perpetuals carry none.
    pub fn validate(&self) -> Result<(), InvalidMarket> {
        let (has_denom, has_meta) = (self.base_denom.is_some(), self.base_token_meta.is_some());
        if self.is_perpetual && (has_denom || has_meta) {
            return Err(InvalidMarket::UnexpectedBase(self.market_id.clone()));
        }
        if !self.is_perpetual && !(has_denom && has_meta) {
            return Err(InvalidMarket::MissingBase(self.market_id.clone()));
        }
        Ok(())
    }

    /// Denoms this market contributes to a guild's universe.
    pub fn denoms(&self) -> impl Iterator<Item = &Denom> {
        self.base_denom.iter().chain(std::iter::once(&self.quote_denom))
    }
}

/// USD minimums a member must hold to join a guild.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GuildRequirements {
    pub spot_base_usd: Decimal,
    pub spot_quote_usd: Decimal,
    pub derivative_quote_usd: Decimal,
    pub staking_usd: Decimal,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Guild {
    pub id: String,
    pub name: String,
    pub description: String,
    pub master_address: Address,
    pub requirements: GuildRequirements,
    pub capacity: u32,
    pub member_count: u32,
    pub markets: Vec<Market>,
    pub created_at: TimeMs,
}

impl Guild {
    pub fn is_full(&self) -> bool {
        self.member_count >= self.capacity
    }
}

/// Membership of an address in a guild.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GuildMember {
    pub guild_id: String,
    pub address: Address,
    /// Guild-owned fallback account. Never removed by a leave action.
    pub is_default_member: bool,
    pub since: TimeMs,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn market_id(byte: &str) -> MarketId {
        MarketId::parse(&format!("0x{}", byte.repeat(32))).unwrap()
    }

    #[test]
    fn test_perpetual_market_has_no_base() {
        let market = Market::perpetual(
            market_id("01"),
            (Denom::new("usdt"), TokenMeta::new("Tether", "USDT", 6)),
            Decimal::zero(),
            Decimal::zero(),
        );
        assert!(market.is_perpetual);
        assert!(market.base_denom.is_none());
        assert!(market.base_token_meta.is_none());
        let denoms: Vec<&Denom> = market.denoms().collect();
        assert_eq!(denoms, vec![&Denom::new("usdt")]);
    }

    #[test]
    fn test_spot_market_denoms_base_then_quote() {
        let market = Market::spot(
            market_id("02"),
            (Denom::new("inj"), TokenMeta::new("Injective", "INJ", 18)),
            (Denom::new("usdt"), TokenMeta::new("Tether", "USDT", 6)),
            Decimal::zero(),
            Decimal::zero(),
        );
        let denoms: Vec<&str> = market.denoms().map(|d| d.as_str()).collect();
        assert_eq!(denoms, vec!["inj", "usdt"]);
    }

    #[test]
    fn test_validate_rejects_mismatched_base() {
        let spot = Market::spot(
            market_id("02"),
            (Denom::new("inj"), TokenMeta::new("Injective", "INJ", 18)),
            (Denom::new("usdt"), TokenMeta::new("Tether", "USDT", 6)),
            Decimal::zero(),
            Decimal::zero(),
        );
        assert_eq!(spot.validate(), Ok(()));

        let mut no_base = spot.clone();
        no_base.base_denom = None;
        no_base.base_token_meta = None;
        assert_eq!(
            no_base.validate(),
            Err(InvalidMarket::MissingBase(market_id("02")))
        );

        let mut no_meta = spot.clone();
        no_meta.base_token_meta = None;
        assert_eq!(
            no_meta.validate(),
            Err(InvalidMarket::MissingBase(market_id("02")))
        );

        let mut perp_with_base = spot;
        perp_with_base.is_perpetual = true;
        assert_eq!(
            perp_with_base.validate(),
            Err(InvalidMarket::UnexpectedBase(market_id("02")))
        );
    }
}
