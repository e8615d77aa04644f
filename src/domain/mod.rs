//! Domain types for guild portfolio capture.
//!
//! This module provides:
//! - Lossless numeric handling via Decimal wrapper
//! - Domain primitives: TimeMs, Address, SubaccountId, MarketId, Denom, CoinId
//! - Guild, market and membership records
//! - Exchange records consumed by the portfolio engine
//! - The AccountPortfolio snapshot it produces

pub mod decimal;
pub mod exchange;
pub mod guild;
pub mod portfolio;
pub mod primitives;

pub use decimal::Decimal;
pub use exchange::{
    BankBalance, CoinPrice, DerivativeOrder, DerivativePosition, SpotOrder, SubaccountBalance,
};
pub use guild::{Guild, GuildMember, GuildRequirements, InvalidMarket, Market, TokenMeta};
pub use portfolio::{AccountPortfolio, Balance, PortfolioBankBalance};
pub use primitives::{
    Address, AddressParseError, CoinId, Denom, MarketId, OrderSide, PositionDirection,
    SubaccountId, TimeMs,
};
