//! Append-only storage of captured portfolios.

use super::{decode_address, decode_json, encode_json, Repository};
use crate::domain::{AccountPortfolio, Address, TimeMs};
use sqlx::sqlite::SqliteConnection;
use sqlx::Row;

/// Append a snapshot row on `conn` and return its id.
pub(super) async fn insert_portfolio_in(
    conn: &mut SqliteConnection,
    portfolio: &AccountPortfolio,
) -> Result<String, sqlx::Error> {
    let id = uuid::Uuid::new_v4().to_string();
    sqlx::query(
        r#"
        INSERT INTO account_portfolios (
            id, guild_id, address, balances_json, bank_balances_json, updated_at
        ) VALUES (?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(&id)
    .bind(&portfolio.guild_id)
    .bind(portfolio.address.as_str())
    .bind(encode_json(&portfolio.balances)?)
    .bind(encode_json(&portfolio.bank_balances)?)
    .bind(portfolio.updated_at.as_ms())
    .execute(&mut *conn)
    .await?;
    Ok(id)
}

impl Repository {
    /// Store a captured portfolio as a new record and return its id.
    ///
    /// Snapshots are never updated in place.
    pub async fn insert_account_portfolio(
        &self,
        portfolio: &AccountPortfolio,
    ) -> Result<String, sqlx::Error> {
        let mut conn = self.pool.acquire().await?;
        insert_portfolio_in(&mut conn, portfolio).await
    }

    /// Stored snapshots of a member in a guild, newest first.
    pub async fn list_account_portfolios(
        &self,
        guild_id: &str,
        address: &Address,
        limit: u32,
    ) -> Result<Vec<AccountPortfolio>, sqlx::Error> {
        let rows = sqlx::query(
            r#"
            SELECT guild_id, address, balances_json, bank_balances_json, updated_at
            FROM account_portfolios
            WHERE guild_id = ? AND address = ?
            ORDER BY updated_at DESC, rowid DESC
            LIMIT ?
            "#,
        )
        .bind(guild_id)
        .bind(address.as_str())
        .bind(i64::from(limit))
        .fetch_all(&self.pool)
        .await?;

        rows.iter()
            .map(|row| {
                let address: String = row.get("address");
                let balances_json: String = row.get("balances_json");
                let bank_balances_json: String = row.get("bank_balances_json");
                Ok(AccountPortfolio {
                    guild_id: row.get("guild_id"),
                    address: decode_address(&address)?,
                    balances: decode_json(&balances_json)?,
                    bank_balances: decode_json(&bank_balances_json)?,
                    updated_at: TimeMs::new(row.get("updated_at")),
                })
            })
            .collect()
    }

    /// Most recent snapshot of a member in a guild.
    pub async fn latest_account_portfolio(
        &self,
        guild_id: &str,
        address: &Address,
    ) -> Result<Option<AccountPortfolio>, sqlx::Error> {
        Ok(self
            .list_account_portfolios(guild_id, address, 1)
            .await?
            .into_iter()
            .next())
    }
}

#[cfg(test)]
mod tests {
    use super::super::tests::setup_repo;
    use super::*;
    use crate::domain::{
        Balance, Decimal, Denom, Guild, GuildRequirements, PortfolioBankBalance,
    };
    use std::str::FromStr;

    fn addr() -> Address {
        Address::parse("0x00000000000000000000000000000000000000a1").unwrap()
    }

    fn portfolio(updated_at: i64, total: &str) -> AccountPortfolio {
        AccountPortfolio {
            guild_id: "guild-1".to_string(),
            address: addr(),
            balances: vec![Balance {
                denom: Denom::new("inj"),
                price_usd: Some(6.0),
                total_balance: Decimal::from_str(total).unwrap(),
                available_balance: Decimal::from_str(total).unwrap(),
                unrealized_pnl: Decimal::zero(),
                margin_hold: Decimal::zero(),
            }],
            bank_balances: vec![PortfolioBankBalance {
                denom: Denom::new("inj"),
                price_usd: Some(6.0),
                balance: Decimal::from_str("1000000000000000000").unwrap(),
            }],
            updated_at: TimeMs::new(updated_at),
        }
    }

    async fn insert_guild(repo: &Repository) {
        repo.insert_guild(&Guild {
            id: "guild-1".to_string(),
            name: "Alpha".to_string(),
            description: String::new(),
            master_address: addr(),
            requirements: GuildRequirements::default(),
            capacity: 5,
            member_count: 0,
            markets: vec![],
            created_at: TimeMs::new(0),
        })
        .await
        .unwrap();
    }

    #[tokio::test]
    async fn test_snapshots_are_appended_and_listed_newest_first() {
        let (repo, _temp) = setup_repo().await;
        insert_guild(&repo).await;

        let first = repo
            .insert_account_portfolio(&portfolio(1000, "1"))
            .await
            .unwrap();
        let second = repo
            .insert_account_portfolio(&portfolio(2000, "2000000000000000000"))
            .await
            .unwrap();
        assert_ne!(first, second);

        let history = repo
            .list_account_portfolios("guild-1", &addr(), 10)
            .await
            .unwrap();
        assert_eq!(history.len(), 2);
        assert_eq!(history[0], portfolio(2000, "2000000000000000000"));
        assert_eq!(history[1], portfolio(1000, "1"));

        let latest = repo
            .latest_account_portfolio("guild-1", &addr())
            .await
            .unwrap();
        assert_eq!(latest.unwrap().updated_at, TimeMs::new(2000));
    }
}
