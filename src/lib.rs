pub mod config;
pub mod datasource;
pub mod db;
pub mod domain;
pub mod engine;
pub mod error;
pub mod orchestration;

pub use config::{Config, StakingConfig};
pub use datasource::{DataSource, DataSourceError, InjectiveDataSource, MockDataSource};
pub use db::{init_db, Repository};
pub use domain::{
    AccountPortfolio, Address, Balance, CoinId, Decimal, Denom, Guild, GuildMember, Market,
    MarketId, SubaccountId, TimeMs,
};
pub use error::{FetchStage, PortfolioError};
pub use orchestration::{GuildAdmission, PortfolioHelper, SnapshotJob};
