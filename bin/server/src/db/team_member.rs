//! Roster persistence.
//!
//! The nullable unique constraint on `account_id` is what guarantees that an
//! account links to at most one roster entry; claims and links translate its
//! violations into ordinary outcomes.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rootcause::Report;
use sqlx::{FromRow, PgPool};
use team_pulse_core::{AccountId, TeamMemberId};
use team_pulse_platform_access::{
    Role, RosterWrite, StoreError, StoreResult, TeamMember, TeamMemberStore,
};
use tracing::instrument;

use super::{
    TEAM_MEMBERS_ACCOUNT_ID_KEY, TEAM_MEMBERS_EMAIL_KEY, parse_column, unavailable,
    violated_unique_constraint,
};

const MEMBER_COLUMNS: &str =
    "id, account_id, name, email, role, weekly_hours, is_active, created_at, updated_at";

/// Row type for roster queries.
#[derive(FromRow)]
struct TeamMemberRow {
    id: String,
    account_id: Option<String>,
    name: String,
    email: String,
    role: String,
    weekly_hours: i32,
    is_active: bool,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TeamMemberRow {
    fn try_into_member(self) -> Result<TeamMember, Report<StoreError>> {
        let id: TeamMemberId = parse_column("team member id", &self.id)?;
        let account_id: Option<AccountId> = self
            .account_id
            .as_deref()
            .map(|value| parse_column("account id", value))
            .transpose()?;
        let role: Role = parse_column("role", &self.role)?;
        Ok(TeamMember::with_all_fields(
            id,
            account_id,
            self.name,
            self.email,
            role,
            self.weekly_hours,
            self.is_active,
            self.created_at,
            self.updated_at,
        ))
    }
}

fn into_member(row: Option<TeamMemberRow>) -> StoreResult<Option<TeamMember>> {
    row.map(TeamMemberRow::try_into_member).transpose()
}

/// Maps a failed roster write onto a uniqueness outcome where possible.
fn write_conflict(err: sqlx::Error) -> StoreResult<RosterWrite> {
    match violated_unique_constraint(&err).as_deref() {
        Some(TEAM_MEMBERS_EMAIL_KEY) => Ok(RosterWrite::EmailTaken),
        Some(TEAM_MEMBERS_ACCOUNT_ID_KEY) => Ok(RosterWrite::AccountTaken),
        _ => Err(unavailable(err)),
    }
}

/// Roster store backed by the `team_members` table.
#[derive(Clone)]
pub struct PgTeamMemberStore {
    pool: PgPool,
}

impl PgTeamMemberStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl TeamMemberStore for PgTeamMemberStore {
    #[instrument(level = "debug", skip(self))]
    async fn find_active_by_account(
        &self,
        account_id: AccountId,
    ) -> StoreResult<Option<TeamMember>> {
        let row: Option<TeamMemberRow> = sqlx::query_as(&format!(
            "SELECT {MEMBER_COLUMNS} FROM team_members WHERE account_id = $1 AND is_active"
        ))
        .bind(account_id.to_string())
        .fetch_optional(&self.pool)
        .await
        .map_err(unavailable)?;

        into_member(row)
    }

    #[instrument(level = "debug", skip(self))]
    async fn find_active_by_email(&self, email: &str) -> StoreResult<Option<TeamMember>> {
        let row: Option<TeamMemberRow> = sqlx::query_as(&format!(
            "SELECT {MEMBER_COLUMNS} FROM team_members WHERE email = $1 AND is_active"
        ))
        .bind(email)
        .fetch_optional(&self.pool)
        .await
        .map_err(unavailable)?;

        into_member(row)
    }

    #[instrument(level = "debug", skip(self))]
    async fn find_member(&self, id: TeamMemberId) -> StoreResult<Option<TeamMember>> {
        let row: Option<TeamMemberRow> = sqlx::query_as(&format!(
            "SELECT {MEMBER_COLUMNS} FROM team_members WHERE id = $1"
        ))
        .bind(id.to_string())
        .fetch_optional(&self.pool)
        .await
        .map_err(unavailable)?;

        into_member(row)
    }

    #[instrument(level = "debug", skip(self))]
    async fn claim(
        &self,
        id: TeamMemberId,
        account_id: AccountId,
    ) -> StoreResult<Option<TeamMember>> {
        let result: Result<Option<TeamMemberRow>, sqlx::Error> = sqlx::query_as(&format!(
            r#"
            UPDATE team_members
            SET account_id = $2, updated_at = NOW()
            WHERE id = $1 AND account_id IS NULL AND is_active
            RETURNING {MEMBER_COLUMNS}
            "#
        ))
        .bind(id.to_string())
        .bind(account_id.to_string())
        .fetch_optional(&self.pool)
        .await;

        match result {
            Ok(row) => into_member(row),
            Err(err)
                if violated_unique_constraint(&err).as_deref()
                    == Some(TEAM_MEMBERS_ACCOUNT_ID_KEY) =>
            {
                Ok(None)
            }
            Err(err) => Err(unavailable(err)),
        }
    }

    #[instrument(level = "debug", skip(self))]
    async fn link(&self, id: TeamMemberId, account_id: AccountId) -> StoreResult<RosterWrite> {
        let result: Result<Option<TeamMemberRow>, sqlx::Error> = sqlx::query_as(&format!(
            r#"
            UPDATE team_members
            SET account_id = $2, updated_at = NOW()
            WHERE id = $1 AND is_active AND (account_id IS NULL OR account_id = $2)
            RETURNING {MEMBER_COLUMNS}
            "#
        ))
        .bind(id.to_string())
        .bind(account_id.to_string())
        .fetch_optional(&self.pool)
        .await;

        match result {
            Ok(Some(row)) => Ok(RosterWrite::Applied(row.try_into_member()?)),
            Ok(None) => match self.find_member(id).await? {
                Some(member) if member.is_active() => Ok(RosterWrite::AccountTaken),
                _ => Ok(RosterWrite::NotFound),
            },
            Err(err) => write_conflict(err),
        }
    }

    #[instrument(level = "debug", skip_all, fields(team_member_id = %member.id()))]
    async fn insert_member(&self, member: &TeamMember) -> StoreResult<RosterWrite> {
        let result = sqlx::query(
            r#"
            INSERT INTO team_members (id, account_id, name, email, role, weekly_hours,
                                      is_active, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            "#,
        )
        .bind(member.id().to_string())
        .bind(member.account_id().map(|id| id.to_string()))
        .bind(member.name())
        .bind(member.email())
        .bind(member.role().as_str())
        .bind(member.weekly_hours())
        .bind(member.is_active())
        .bind(member.created_at())
        .bind(member.updated_at())
        .execute(&self.pool)
        .await;

        match result {
            Ok(_) => Ok(RosterWrite::Applied(member.clone())),
            Err(err) => write_conflict(err),
        }
    }

    #[instrument(level = "debug", skip_all, fields(team_member_id = %member.id()))]
    async fn update_member(&self, member: &TeamMember) -> StoreResult<RosterWrite> {
        let result: Result<Option<TeamMemberRow>, sqlx::Error> = sqlx::query_as(&format!(
            r#"
            UPDATE team_members
            SET name = $2, email = $3, role = $4, weekly_hours = $5, is_active = $6,
                updated_at = $7
            WHERE id = $1
            RETURNING {MEMBER_COLUMNS}
            "#
        ))
        .bind(member.id().to_string())
        .bind(member.name())
        .bind(member.email())
        .bind(member.role().as_str())
        .bind(member.weekly_hours())
        .bind(member.is_active())
        .bind(member.updated_at())
        .fetch_optional(&self.pool)
        .await;

        match result {
            Ok(Some(row)) => Ok(RosterWrite::Applied(row.try_into_member()?)),
            Ok(None) => Ok(RosterWrite::NotFound),
            Err(err) => write_conflict(err),
        }
    }

    #[instrument(level = "debug", skip(self))]
    async fn list_members(&self, include_inactive: bool) -> StoreResult<Vec<TeamMember>> {
        let rows: Vec<TeamMemberRow> = sqlx::query_as(&format!(
            "SELECT {MEMBER_COLUMNS} FROM team_members WHERE is_active OR $1 ORDER BY name"
        ))
        .bind(include_inactive)
        .fetch_all(&self.pool)
        .await
        .map_err(unavailable)?;

        rows.into_iter()
            .map(TeamMemberRow::try_into_member)
            .collect()
    }

    #[instrument(level = "debug", skip(self))]
    async fn deactivate(&self, id: TeamMemberId) -> StoreResult<bool> {
        let result = sqlx::query(
            "UPDATE team_members SET is_active = FALSE, updated_at = NOW() WHERE id = $1",
        )
        .bind(id.to_string())
        .execute(&self.pool)
        .await
        .map_err(unavailable)?;

        Ok(result.rows_affected() > 0)
    }
}
