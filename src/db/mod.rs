//! Database module for SQLite operations.
//!
//! This module provides:
//! - Database initialization and migrations
//! - SQLite pragma configuration
//! - Repository layer for guilds, members, the denom map and portfolio snapshots

pub mod migrations;
pub mod repo;

pub use migrations::init_db;
pub use repo::{MemberInsert, MemberRemoval, Repository};

use crate::domain::{CoinId, Denom};
use async_trait::async_trait;

/// Source of the denom to price-feed coin id mapping.
#[async_trait]
pub trait DenomMapStore: Send + Sync {
    async fn list_denom_coin_ids(&self) -> Result<Vec<(Denom, CoinId)>, sqlx::Error>;
}
