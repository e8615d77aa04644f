//! Guild and membership persistence.

use super::portfolios::insert_portfolio_in;
use super::{decode_address, decode_decimal, decode_json, encode_json, Repository};
use crate::domain::{
    AccountPortfolio, Address, Guild, GuildMember, GuildRequirements, Market, TimeMs,
};
use sqlx::sqlite::{SqliteConnection, SqliteRow};
use sqlx::Row;

/// Outcome of adding a member to a guild.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MemberInsert {
    Added,
    AlreadyMember,
    GuildFull,
    GuildNotFound,
}

/// Outcome of removing a member from a guild.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MemberRemoval {
    Removed,
    NotMember,
    DefaultMemberProtected,
}

fn row_to_guild(row: &SqliteRow) -> Result<Guild, sqlx::Error> {
    let master_address: String = row.get("master_address");
    let markets_json: String = row.get("markets_json");
    let capacity: i64 = row.get("capacity");
    let member_count: i64 = row.get("member_count");
    let markets: Vec<Market> = decode_json(&markets_json)?;
    for market in &markets {
        market
            .validate()
            .map_err(|e| sqlx::Error::Decode(Box::new(e)))?;
    }

    Ok(Guild {
        id: row.get("id"),
        name: row.get("name"),
        description: row.get("description"),
        master_address: decode_address(&master_address)?,
        requirements: GuildRequirements {
            spot_base_usd: decode_decimal(&row.get::<String, _>("spot_base_requirement"))?,
            spot_quote_usd: decode_decimal(&row.get::<String, _>("spot_quote_requirement"))?,
            derivative_quote_usd: decode_decimal(
                &row.get::<String, _>("derivative_quote_requirement"),
            )?,
            staking_usd: decode_decimal(&row.get::<String, _>("staking_requirement"))?,
        },
        capacity: u32::try_from(capacity).map_err(|e| sqlx::Error::Decode(Box::new(e)))?,
        member_count: u32::try_from(member_count).map_err(|e| sqlx::Error::Decode(Box::new(e)))?,
        markets,
        created_at: TimeMs::new(row.get("created_at")),
    })
}

/// Insert the member row and bump the guild's member count on `conn`.
///
/// Leaves commit or rollback to the caller; anything but `Added` must be rolled back.
async fn insert_member_in(
    conn: &mut SqliteConnection,
    guild_id: &str,
    address: &Address,
    is_default_member: bool,
    since: TimeMs,
) -> Result<MemberInsert, sqlx::Error> {
    let exists = sqlx::query("SELECT 1 FROM guilds WHERE id = ?")
        .bind(guild_id)
        .fetch_optional(&mut *conn)
        .await?;
    if exists.is_none() {
        return Ok(MemberInsert::GuildNotFound);
    }

    let inserted = sqlx::query(
        r#"
        INSERT INTO guild_members (guild_id, address, is_default_member, since)
        VALUES (?, ?, ?, ?)
        ON CONFLICT(guild_id, address) DO NOTHING
        "#,
    )
    .bind(guild_id)
    .bind(address.as_str())
    .bind(if is_default_member { 1 } else { 0 })
    .bind(since.as_ms())
    .execute(&mut *conn)
    .await?;
    if inserted.rows_affected() == 0 {
        return Ok(MemberInsert::AlreadyMember);
    }

    let counted = sqlx::query(
        r#"
        UPDATE guilds
        SET member_count = member_count + 1
        WHERE id = ? AND member_count < capacity
        "#,
    )
    .bind(guild_id)
    .execute(&mut *conn)
    .await?;
    if counted.rows_affected() == 0 {
        return Ok(MemberInsert::GuildFull);
    }

    Ok(MemberInsert::Added)
}

impl Repository {
    // =========================================================================
    // Guild operations
    // =========================================================================

    /// Insert a guild. The stored member count starts at zero; members are added through
    /// [`Repository::add_member`].
    pub async fn insert_guild(&self, guild: &Guild) -> Result<(), sqlx::Error> {
        for market in &guild.markets {
            market
                .validate()
                .map_err(|e| sqlx::Error::Protocol(format!("refusing to store guild: {}", e)))?;
        }
        let markets_json = encode_json(&guild.markets)?;
        sqlx::query(
            r#"
            INSERT INTO guilds (
                id, name, description, master_address, spot_base_requirement,
                spot_quote_requirement, derivative_quote_requirement, staking_requirement,
                capacity, member_count, markets_json, created_at
            ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, 0, ?, ?)
            "#,
        )
        .bind(&guild.id)
        .bind(&guild.name)
        .bind(&guild.description)
        .bind(guild.master_address.as_str())
        .bind(guild.requirements.spot_base_usd.to_canonical_string())
        .bind(guild.requirements.spot_quote_usd.to_canonical_string())
        .bind(guild.requirements.derivative_quote_usd.to_canonical_string())
        .bind(guild.requirements.staking_usd.to_canonical_string())
        .bind(i64::from(guild.capacity))
        .bind(markets_json)
        .bind(guild.created_at.as_ms())
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    pub async fn get_guild(&self, guild_id: &str) -> Result<Option<Guild>, sqlx::Error> {
        let row = sqlx::query("SELECT * FROM guilds WHERE id = ?")
            .bind(guild_id)
            .fetch_optional(&self.pool)
            .await?;
        row.as_ref().map(row_to_guild).transpose()
    }

    /// All guilds, ordered by creation time.
    pub async fn list_guilds(&self) -> Result<Vec<Guild>, sqlx::Error> {
        let rows = sqlx::query("SELECT * FROM guilds ORDER BY created_at ASC, id ASC")
            .fetch_all(&self.pool)
            .await?;
        rows.iter().map(row_to_guild).collect()
    }

    // =========================================================================
    // Membership operations
    // =========================================================================

    /// Add a member, keeping `member_count <= capacity` within one transaction.
    pub async fn add_member(
        &self,
        guild_id: &str,
        address: &Address,
        is_default_member: bool,
        since: TimeMs,
    ) -> Result<MemberInsert, sqlx::Error> {
        let mut tx = self.pool.begin().await?;
        let outcome = insert_member_in(&mut tx, guild_id, address, is_default_member, since).await?;
        if outcome == MemberInsert::Added {
            tx.commit().await?;
        } else {
            tx.rollback().await?;
        }
        Ok(outcome)
    }

    /// Add a regular member together with the snapshot it was admitted on.
    ///
    /// Both rows are committed in one transaction: either the member exists with its
    /// snapshot, or neither was written. The snapshot id is returned only when the member
    /// was added; otherwise the inner error carries the reason it was not.
    pub async fn add_member_with_snapshot(
        &self,
        portfolio: &AccountPortfolio,
        since: TimeMs,
    ) -> Result<Result<String, MemberInsert>, sqlx::Error> {
        let mut tx = self.pool.begin().await?;
        let outcome = insert_member_in(
            &mut tx,
            &portfolio.guild_id,
            &portfolio.address,
            false,
            since,
        )
        .await?;
        if outcome != MemberInsert::Added {
            tx.rollback().await?;
            return Ok(Err(outcome));
        }

        let portfolio_id = insert_portfolio_in(&mut tx, portfolio).await?;
        tx.commit().await?;
        Ok(Ok(portfolio_id))
    }

    /// Remove a member. Default members are never removed.
    pub async fn remove_member(
        &self,
        guild_id: &str,
        address: &Address,
    ) -> Result<MemberRemoval, sqlx::Error> {
        let mut tx = self.pool.begin().await?;

        let row = sqlx::query(
            "SELECT is_default_member FROM guild_members WHERE guild_id = ? AND address = ?",
        )
        .bind(guild_id)
        .bind(address.as_str())
        .fetch_optional(&mut *tx)
        .await?;

        let Some(row) = row else {
            return Ok(MemberRemoval::NotMember);
        };
        if row.get::<i64, _>("is_default_member") != 0 {
            return Ok(MemberRemoval::DefaultMemberProtected);
        }

        sqlx::query("DELETE FROM guild_members WHERE guild_id = ? AND address = ?")
            .bind(guild_id)
            .bind(address.as_str())
            .execute(&mut *tx)
            .await?;
        sqlx::query("UPDATE guilds SET member_count = member_count - 1 WHERE id = ?")
            .bind(guild_id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(MemberRemoval::Removed)
    }

    /// Members of a guild, default members first.
    pub async fn list_members(&self, guild_id: &str) -> Result<Vec<GuildMember>, sqlx::Error> {
        let rows = sqlx::query(
            r#"
            SELECT guild_id, address, is_default_member, since
            FROM guild_members
            WHERE guild_id = ?
            ORDER BY is_default_member DESC, since ASC, address ASC
            "#,
        )
        .bind(guild_id)
        .fetch_all(&self.pool)
        .await?;

        rows.iter()
            .map(|row| {
                let address: String = row.get("address");
                Ok(GuildMember {
                    guild_id: row.get("guild_id"),
                    address: decode_address(&address)?,
                    is_default_member: row.get::<i64, _>("is_default_member") != 0,
                    since: TimeMs::new(row.get("since")),
                })
            })
            .collect()
    }
}
