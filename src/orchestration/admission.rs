use crate::config::StakingConfig;
use crate::db::{MemberInsert, MemberRemoval, Repository};
use crate::domain::{AccountPortfolio, Address, Decimal, GuildMember, TimeMs};
use crate::engine::{evaluate_eligibility, EligibilityReport};
use crate::error::PortfolioError;
use crate::orchestration::PortfolioHelper;
use std::sync::Arc;
use thiserror::Error;

/// Guild join and leave flow.
#[derive(Clone)]
pub struct GuildAdmission {
    helper: Arc<PortfolioHelper>,
    repo: Arc<Repository>,
    staking: StakingConfig,
}

/// A successful join: the new member and the snapshot it was admitted on.
#[derive(Debug, Clone)]
pub struct Admission {
    pub member: GuildMember,
    pub portfolio: AccountPortfolio,
    pub portfolio_id: String,
    pub report: EligibilityReport,
}

#[derive(Debug, Error)]
pub enum AdmissionError {
    #[error("Guild not found: {0}")]
    GuildNotFound(String),
    #[error("Guild {0} is full")]
    GuildFull(String),
    #[error("{address} is already a member of guild {guild_id}")]
    AlreadyMember { guild_id: String, address: Address },
    #[error("{address} is not a member of guild {guild_id}")]
    NotMember { guild_id: String, address: Address },
    #[error("Default member {address} cannot leave guild {guild_id}")]
    DefaultMemberProtected { guild_id: String, address: Address },
    #[error("{address} does not meet the requirements of guild {guild_id}")]
    NotEligible {
        guild_id: String,
        address: Address,
        report: EligibilityReport,
    },
    #[error(transparent)]
    Portfolio(#[from] PortfolioError),
    #[error(transparent)]
    Db(#[from] sqlx::Error),
}

impl GuildAdmission {
    pub fn new(helper: Arc<PortfolioHelper>, repo: Arc<Repository>, staking: StakingConfig) -> Self {
        Self {
            helper,
            repo,
            staking,
        }
    }

    /// Admit an address into a guild if its priced holdings meet every requirement.
    ///
    /// The member row and the admission snapshot are committed together.
    pub async fn join(&self, guild_id: &str, address: &Address) -> Result<Admission, AdmissionError> {
        let guild = self
            .repo
            .get_guild(guild_id)
            .await?
            .ok_or_else(|| AdmissionError::GuildNotFound(guild_id.to_string()))?;
        if guild.is_full() {
            return Err(AdmissionError::GuildFull(guild.id));
        }

        let member = GuildMember {
            guild_id: guild.id.clone(),
            address: address.clone(),
            is_default_member: false,
            since: TimeMs::now(),
        };
        let portfolio = self
            .helper
            .capture_single_member_portfolio(&guild, &member, true)
            .await?;
        let staking_usd = if guild.requirements.staking_usd.is_zero() {
            Decimal::zero()
        } else {
            self.helper.staking_value_usd(address, &self.staking).await?
        };

        let report = evaluate_eligibility(&guild, &portfolio, staking_usd)?;
        if !report.is_eligible() {
            tracing::info!(
                guild_id = %guild.id,
                address = %address,
                unmet = report.unmet().count(),
                "Join rejected"
            );
            return Err(AdmissionError::NotEligible {
                guild_id: guild.id,
                address: address.clone(),
                report,
            });
        }

        let portfolio_id = match self
            .repo
            .add_member_with_snapshot(&portfolio, member.since)
            .await?
        {
            Ok(id) => id,
            Err(MemberInsert::AlreadyMember) => {
                return Err(AdmissionError::AlreadyMember {
                    guild_id: guild.id,
                    address: address.clone(),
                })
            }
            Err(MemberInsert::GuildFull) => return Err(AdmissionError::GuildFull(guild.id)),
            Err(MemberInsert::GuildNotFound | MemberInsert::Added) => {
                return Err(AdmissionError::GuildNotFound(guild.id))
            }
        };
        tracing::info!(guild_id = %guild.id, address = %address, "Member joined");

        Ok(Admission {
            member,
            portfolio,
            portfolio_id,
            report,
        })
    }

    /// Register the guild-owned default member. No eligibility check applies.
    pub async fn add_default_member(
        &self,
        guild_id: &str,
        address: &Address,
    ) -> Result<GuildMember, AdmissionError> {
        let since = TimeMs::now();
        match self.repo.add_member(guild_id, address, true, since).await? {
            MemberInsert::Added => Ok(GuildMember {
                guild_id: guild_id.to_string(),
                address: address.clone(),
                is_default_member: true,
                since,
            }),
            MemberInsert::AlreadyMember => Err(AdmissionError::AlreadyMember {
                guild_id: guild_id.to_string(),
                address: address.clone(),
            }),
            MemberInsert::GuildFull => Err(AdmissionError::GuildFull(guild_id.to_string())),
            MemberInsert::GuildNotFound => {
                Err(AdmissionError::GuildNotFound(guild_id.to_string()))
            }
        }
    }

    pub async fn leave(&self, guild_id: &str, address: &Address) -> Result<(), AdmissionError> {
        match self.repo.remove_member(guild_id, address).await? {
            MemberRemoval::Removed => {
                tracing::info!(guild_id = %guild_id, address = %address, "Member left");
                Ok(())
            }
            MemberRemoval::NotMember => Err(AdmissionError::NotMember {
                guild_id: guild_id.to_string(),
                address: address.clone(),
            }),
            MemberRemoval::DefaultMemberProtected => Err(AdmissionError::DefaultMemberProtected {
                guild_id: guild_id.to_string(),
                address: address.clone(),
            }),
        }
    }
}
