//! Shared fixtures: a three-market guild and a funded member.
#![allow(dead_code)]

use async_trait::async_trait;
use guildfolio::datasource::MockDataSource;
use guildfolio::db::{init_db, DenomMapStore, Repository};
use guildfolio::domain::{
    Address, BankBalance, CoinId, Decimal, Denom, DerivativeOrder, DerivativePosition, Guild,
    GuildMember, GuildRequirements, Market, MarketId, OrderSide, PositionDirection, SpotOrder,
    SubaccountBalance, TimeMs, TokenMeta,
};
use std::str::FromStr;
use std::sync::Arc;
use tempfile::TempDir;

pub fn d(s: &str) -> Decimal {
    Decimal::from_str(s).unwrap()
}

pub fn market_id(byte: &str) -> MarketId {
    MarketId::parse(&format!("0x{}", byte.repeat(32))).unwrap()
}

pub fn address(n: u8) -> Address {
    Address::parse(&format!("0x{:040x}", n)).unwrap()
}

pub fn inj_ust_spot() -> MarketId {
    market_id("01")
}

pub fn weth_usdt_spot() -> MarketId {
    market_id("02")
}

pub fn weth_usdt_perp() -> MarketId {
    market_id("03")
}

pub fn untracked_market() -> MarketId {
    market_id("09")
}

pub fn markets() -> Vec<Market> {
    vec![
        Market::spot(
            inj_ust_spot(),
            (Denom::new("inj"), TokenMeta::new("Injective", "INJ", 18)),
            (Denom::new("ust"), TokenMeta::new("TerraUSD", "UST", 6)),
            d("0.0005"),
            d("0.001"),
        ),
        Market::spot(
            weth_usdt_spot(),
            (Denom::new("weth"), TokenMeta::new("Wrapped Ether", "WETH", 18)),
            (Denom::new("usdt"), TokenMeta::new("Tether", "USDT", 6)),
            d("0.0005"),
            d("0.001"),
        ),
        Market::perpetual(
            weth_usdt_perp(),
            (Denom::new("usdt"), TokenMeta::new("Tether", "USDT", 6)),
            d("-0.0001"),
            d("0.001"),
        ),
    ]
}

pub fn guild(id: &str, capacity: u32, requirements: GuildRequirements) -> Guild {
    Guild {
        id: id.to_string(),
        name: format!("Guild {}", id),
        description: "Fixture guild".to_string(),
        master_address: address(0xff),
        requirements,
        capacity,
        member_count: 0,
        markets: markets(),
        created_at: TimeMs::new(1_000),
    }
}

pub fn member(guild: &Guild, address: Address) -> GuildMember {
    GuildMember {
        guild_id: guild.id.clone(),
        address,
        is_default_member: false,
        since: TimeMs::new(2_000),
    }
}

pub fn denom_map() -> Vec<(Denom, CoinId)> {
    vec![
        (Denom::new("inj"), CoinId::new("injective-protocol")),
        (Denom::new("usdt"), CoinId::new("tether")),
        (Denom::new("ust"), CoinId::new("terrausd")),
        (Denom::new("weth"), CoinId::new("weth")),
    ]
}

pub fn priced(mock: MockDataSource) -> MockDataSource {
    mock.with_price("injective-protocol", 6.0)
        .with_price("tether", 1.0)
        .with_price("terrausd", 1.0)
        .with_price("weth", 3300.0)
}

/// Deposits, resting orders and a long perp for `address`, plus records in a market the
/// guild does not track.
pub fn fund(mock: MockDataSource, address: &Address) -> MockDataSource {
    let sub = address.default_subaccount_id();
    mock.with_balance(
        &sub,
        SubaccountBalance::new(Denom::new("inj"), d("2000000000000000"), d("1880000000000000")),
    )
    .with_balance(
        &sub,
        SubaccountBalance::new(Denom::new("usdt"), d("50000000"), d("50000000")),
    )
    .with_balance(
        &sub,
        SubaccountBalance::new(
            Denom::new("weth"),
            d("1000000000000000000"),
            d("1000000000000000000"),
        ),
    )
    .with_balance(
        &sub,
        SubaccountBalance::new(Denom::new("ust"), d("30000000"), d("18788800")),
    )
    .with_balance(
        &sub,
        SubaccountBalance::new(Denom::new("atom"), d("999"), d("999")),
    )
    .with_spot_order(
        &sub,
        SpotOrder {
            market_id: inj_ust_spot(),
            order_side: OrderSide::Sell,
            price: d("0.00000015"),
            unfilled_quantity: d("120000000000000"),
        },
    )
    .with_spot_order(
        &sub,
        SpotOrder {
            market_id: inj_ust_spot(),
            order_side: OrderSide::Buy,
            price: d("0.0000001"),
            unfilled_quantity: d("100000000000000"),
        },
    )
    .with_spot_order(
        &sub,
        SpotOrder {
            market_id: inj_ust_spot(),
            order_side: OrderSide::Buy,
            price: d("0.00000012"),
            unfilled_quantity: d("10000000000000"),
        },
    )
    .with_spot_order(
        &sub,
        SpotOrder {
            market_id: untracked_market(),
            order_side: OrderSide::Buy,
            price: d("5"),
            unfilled_quantity: d("1000"),
        },
    )
    .with_position(
        &sub,
        DerivativePosition {
            market_id: weth_usdt_perp(),
            direction: PositionDirection::Long,
            quantity: d("0.5"),
            margin: d("50000000000"),
            entry_price: d("3000000000"),
            mark_price: d("3340000000"),
        },
    )
    .with_position(
        &sub,
        DerivativePosition {
            market_id: untracked_market(),
            direction: PositionDirection::Short,
            quantity: d("10"),
            margin: d("77777"),
            entry_price: d("100"),
            mark_price: d("50"),
        },
    )
    .with_derivative_order(
        &sub,
        DerivativeOrder {
            market_id: weth_usdt_perp(),
            margin: d("2000000000"),
        },
    )
    .with_derivative_order(
        &sub,
        DerivativeOrder {
            market_id: weth_usdt_perp(),
            margin: d("600000000"),
        },
    )
    .with_bank_balance(
        address,
        BankBalance {
            denom: Denom::new("inj"),
            amount: d("1000000000000000000"),
        },
    )
    .with_bank_balance(
        address,
        BankBalance {
            denom: Denom::new("atom"),
            amount: d("5"),
        },
    )
}

/// In-memory denom map.
pub struct StaticDenomMap(pub Vec<(Denom, CoinId)>);

#[async_trait]
impl DenomMapStore for StaticDenomMap {
    async fn list_denom_coin_ids(&self) -> Result<Vec<(Denom, CoinId)>, sqlx::Error> {
        Ok(self.0.clone())
    }
}

/// Fresh database with the fixture denom map loaded.
pub async fn setup_repo() -> (Arc<Repository>, TempDir) {
    let temp_dir = TempDir::new().unwrap();
    let db_path = temp_dir
        .path()
        .join("test.db")
        .to_string_lossy()
        .to_string();
    let pool = init_db(&db_path).await.expect("init_db failed");
    let repo = Repository::new(pool);
    for (denom, coin_id) in denom_map() {
        repo.upsert_denom_coin_id(&denom, &coin_id).await.unwrap();
    }
    (Arc::new(repo), temp_dir)
}
