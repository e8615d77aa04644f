//! Domain primitives: TimeMs, Address, SubaccountId, MarketId, Denom, CoinId and the
//! order/position direction enums.

use crate::domain::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Time in milliseconds since Unix epoch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct TimeMs(pub i64);

impl TimeMs {
    /// Create a TimeMs from milliseconds.
    pub fn new(ms: i64) -> Self {
        TimeMs(ms)
    }

    /// Current wall-clock time.
    pub fn now() -> Self {
        TimeMs(chrono::Utc::now().timestamp_millis())
    }

    /// Get the underlying milliseconds value.
    pub fn as_ms(&self) -> i64 {
        self.0
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AddressParseError {
    #[error("missing 0x prefix: {0}")]
    MissingPrefix(String),
    #[error("expected {expected} bytes, got {actual}")]
    WrongLength { expected: usize, actual: usize },
    #[error("invalid hex: {0}")]
    InvalidHex(String),
}

fn decode_prefixed_hex<const N: usize>(s: &str) -> Result<[u8; N], AddressParseError> {
    let body = s
        .strip_prefix("0x")
        .or_else(|| s.strip_prefix("0X"))
        .ok_or_else(|| AddressParseError::MissingPrefix(s.to_string()))?;
    let bytes = hex::decode(body).map_err(|e| AddressParseError::InvalidHex(e.to_string()))?;
    let actual = bytes.len();
    bytes
        .try_into()
        .map_err(|_| AddressParseError::WrongLength {
            expected: N,
            actual,
        })
}

/// Account address: 20 bytes, rendered as lowercase `0x`-prefixed hex.
///
/// Only [`Address::parse`] constructs one; deserialization goes through it too.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Address {
    hex: String,
    bytes: [u8; Address::LEN],
}

impl Address {
    pub const LEN: usize = 20;

    /// Parse and normalize a hex account address.
    pub fn parse(s: &str) -> Result<Self, AddressParseError> {
        let bytes = decode_prefixed_hex::<{ Address::LEN }>(s.trim())?;
        Ok(Address {
            hex: format!("0x{}", hex::encode(bytes)),
            bytes,
        })
    }

    pub fn as_str(&self) -> &str {
        &self.hex
    }

    pub fn to_bytes(&self) -> [u8; Address::LEN] {
        self.bytes
    }

    /// Default subaccount of this address: the 20 address bytes right-padded with 12 zero
    /// bytes.
    pub fn default_subaccount_id(&self) -> SubaccountId {
        let mut bytes = [0u8; SubaccountId::LEN];
        bytes[..Address::LEN].copy_from_slice(&self.bytes);
        SubaccountId(format!("0x{}", hex::encode(bytes)))
    }
}

impl TryFrom<String> for Address {
    type Error = AddressParseError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Address::parse(&value)
    }
}

impl From<Address> for String {
    fn from(address: Address) -> Self {
        address.hex
    }
}

impl std::fmt::Display for Address {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.hex)
    }
}

impl std::str::FromStr for Address {
    type Err = AddressParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Address::parse(s)
    }
}

/// 32-byte exchange subaccount identifier (`0x` + 64 hex chars).
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String")]
pub struct SubaccountId(String);

impl SubaccountId {
    pub const LEN: usize = 32;

    pub fn parse(s: &str) -> Result<Self, AddressParseError> {
        let bytes = decode_prefixed_hex::<{ SubaccountId::LEN }>(s.trim())?;
        Ok(SubaccountId(format!("0x{}", hex::encode(bytes))))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for SubaccountId {
    type Error = AddressParseError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        SubaccountId::parse(&value)
    }
}

impl std::fmt::Display for SubaccountId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// 32-byte market hash (`0x` + 64 hex chars).
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String")]
pub struct MarketId(String);

impl MarketId {
    pub fn parse(s: &str) -> Result<Self, AddressParseError> {
        let bytes = decode_prefixed_hex::<32>(s.trim())?;
        Ok(MarketId(format!("0x{}", hex::encode(bytes))))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for MarketId {
    type Error = AddressParseError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        MarketId::parse(&value)
    }
}

impl std::fmt::Display for MarketId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Chain-native asset identifier (e.g. "inj", "peggy0x…", "ibc/…").
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Denom(pub String);

impl Denom {
    pub fn new(denom: impl Into<String>) -> Self {
        Denom(denom.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for Denom {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Price-feed coin identifier (e.g. "injective-protocol", "tether").
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct CoinId(pub String);

impl CoinId {
    pub fn new(coin_id: impl Into<String>) -> Self {
        CoinId(coin_id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for CoinId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Spot order side.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OrderSide {
    Buy,
    Sell,
}

impl std::fmt::Display for OrderSide {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OrderSide::Buy => write!(f, "buy"),
            OrderSide::Sell => write!(f, "sell"),
        }
    }
}

/// Derivative position direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PositionDirection {
    Long,
    Short,
}

impl PositionDirection {
    /// Signed multiplier for PnL: +1 for Long, -1 for Short.
    pub fn sign(&self) -> Decimal {
        match self {
            PositionDirection::Long => Decimal::one(),
            PositionDirection::Short => -Decimal::one(),
        }
    }
}

impl std::fmt::Display for PositionDirection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PositionDirection::Long => write!(f, "long"),
            PositionDirection::Short => write!(f, "short"),
        }
    }
}
