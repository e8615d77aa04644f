//! Repository layer for database operations.
//!
//! This module provides the `Repository` struct for all database operations.
//! Methods are organized across submodules by domain:
//! - `guilds.rs` - Guild and membership operations
//! - `portfolios.rs` - Append-only portfolio snapshot operations

mod guilds;
mod portfolios;

pub use guilds::{MemberInsert, MemberRemoval};

use super::DenomMapStore;
use crate::domain::{Address, CoinId, Decimal, Denom};
use async_trait::async_trait;
use sqlx::sqlite::SqlitePool;
use sqlx::Row;
use std::str::FromStr;

/// Repository for database operations.
pub struct Repository {
    pool: SqlitePool,
}

impl Repository {
    /// Create a new repository with the given connection pool.
    pub fn new(pool: SqlitePool) -> Self {
        Repository { pool }
    }

    // =========================================================================
    // Denom map operations
    // =========================================================================

    /// Insert or replace the coin id of a denom.
    pub async fn upsert_denom_coin_id(
        &self,
        denom: &Denom,
        coin_id: &CoinId,
    ) -> Result<(), sqlx::Error> {
        sqlx::query(
            r#"
            INSERT INTO denom_coin_ids (denom, coin_id)
            VALUES (?, ?)
            ON CONFLICT(denom) DO UPDATE SET coin_id = excluded.coin_id
            "#,
        )
        .bind(denom.as_str())
        .bind(coin_id.as_str())
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    /// All denom to coin id pairs, ordered by denom.
    pub async fn list_denom_coin_ids(&self) -> Result<Vec<(Denom, CoinId)>, sqlx::Error> {
        let rows = sqlx::query(
            r#"
            SELECT denom, coin_id
            FROM denom_coin_ids
            ORDER BY denom ASC
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(rows
            .iter()
            .map(|row| {
                (
                    Denom::new(row.get::<String, _>("denom")),
                    CoinId::new(row.get::<String, _>("coin_id")),
                )
            })
            .collect())
    }
}

#[async_trait]
impl DenomMapStore for Repository {
    async fn list_denom_coin_ids(&self) -> Result<Vec<(Denom, CoinId)>, sqlx::Error> {
        Repository::list_denom_coin_ids(self).await
    }
}

fn decode_decimal(raw: &str) -> Result<Decimal, sqlx::Error> {
    Decimal::from_str(raw).map_err(|e| sqlx::Error::Decode(Box::new(e)))
}

fn decode_address(raw: &str) -> Result<Address, sqlx::Error> {
    Address::parse(raw).map_err(|e| sqlx::Error::Decode(Box::new(e)))
}

fn decode_json<T: serde::de::DeserializeOwned>(raw: &str) -> Result<T, sqlx::Error> {
    serde_json::from_str(raw).map_err(|e| sqlx::Error::Decode(Box::new(e)))
}

fn encode_json<T: serde::Serialize>(value: &T) -> Result<String, sqlx::Error> {
    serde_json::to_string(value)
        .map_err(|e| sqlx::Error::Protocol(format!("failed to encode JSON column: {}", e)))
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::db::migrations::init_db;
    use tempfile::TempDir;

    pub(crate) async fn setup_repo() -> (Repository, TempDir) {
        let temp_dir = TempDir::new().unwrap();
        let db_path = temp_dir
            .path()
            .join("test.db")
            .to_string_lossy()
            .to_string();
        let pool = init_db(&db_path).await.expect("init_db failed");
        (Repository::new(pool), temp_dir)
    }

    #[tokio::test]
    async fn test_denom_map_upsert_and_list() {
        let (repo, _temp) = setup_repo().await;
        repo.upsert_denom_coin_id(&Denom::new("usdt"), &CoinId::new("usd-coin"))
            .await
            .unwrap();
        repo.upsert_denom_coin_id(&Denom::new("inj"), &CoinId::new("injective-protocol"))
            .await
            .unwrap();
        repo.upsert_denom_coin_id(&Denom::new("usdt"), &CoinId::new("tether"))
            .await
            .unwrap();

        let mapping = DenomMapStore::list_denom_coin_ids(&repo).await.unwrap();
        assert_eq!(
            mapping,
            vec![
                (Denom::new("inj"), CoinId::new("injective-protocol")),
                (Denom::new("usdt"), CoinId::new("tether")),
            ]
        );
    }

    #[test]
    fn test_encode_json_failure_is_protocol_error() {
        // JSON objects only accept string keys.
        let value = std::collections::HashMap::from([((1, 2), "pair")]);
        assert!(matches!(encode_json(&value), Err(sqlx::Error::Protocol(_))));
        assert_eq!(encode_json(&vec![1, 2]).unwrap(), "[1,2]");
    }

    #[test]
    fn test_decode_decimal_rejects_garbage() {
        assert!(decode_decimal("12.5").is_ok());
        assert!(matches!(decode_decimal("abc"), Err(sqlx::Error::Decode(_))));
    }
}
