//! Account persistence.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rootcause::Report;
use sqlx::{FromRow, PgPool};
use team_pulse_core::AccountId;
use team_pulse_platform_access::{Account, AccountStore, Provider, StoreError, StoreResult};
use tracing::instrument;

use super::{parse_column, unavailable};

const ACCOUNT_COLUMNS: &str = "id, email, provider, provider_subject, display_name, avatar_url, \
     last_login_at, created_at, updated_at";

/// Row type for account queries.
#[derive(FromRow)]
struct AccountRow {
    id: String,
    email: String,
    provider: String,
    provider_subject: String,
    display_name: Option<String>,
    avatar_url: Option<String>,
    last_login_at: Option<DateTime<Utc>>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl AccountRow {
    fn try_into_account(self) -> Result<Account, Report<StoreError>> {
        let id: AccountId = parse_column("account id", &self.id)?;
        let provider: Provider = parse_column("provider", &self.provider)?;
        Ok(Account::with_all_fields(
            id,
            self.email,
            provider,
            self.provider_subject,
            self.display_name,
            self.avatar_url,
            self.last_login_at,
            self.created_at,
            self.updated_at,
        ))
    }
}

fn into_account(row: Option<AccountRow>) -> StoreResult<Option<Account>> {
    row.map(AccountRow::try_into_account).transpose()
}

/// Account store backed by the `accounts` table.
#[derive(Clone)]
pub struct PgAccountStore {
    pool: PgPool,
}

impl PgAccountStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl AccountStore for PgAccountStore {
    #[instrument(level = "debug", skip(self))]
    async fn find_by_provider(
        &self,
        provider: Provider,
        subject: &str,
    ) -> StoreResult<Option<Account>> {
        let row: Option<AccountRow> = sqlx::query_as(&format!(
            "SELECT {ACCOUNT_COLUMNS} FROM accounts WHERE provider = $1 AND provider_subject = $2"
        ))
        .bind(provider.as_str())
        .bind(subject)
        .fetch_optional(&self.pool)
        .await
        .map_err(unavailable)?;

        into_account(row)
    }

    #[instrument(level = "debug", skip(self))]
    async fn find_account_by_email(&self, email: &str) -> StoreResult<Option<Account>> {
        let row: Option<AccountRow> = sqlx::query_as(&format!(
            "SELECT {ACCOUNT_COLUMNS} FROM accounts WHERE email = $1"
        ))
        .bind(email)
        .fetch_optional(&self.pool)
        .await
        .map_err(unavailable)?;

        into_account(row)
    }

    #[instrument(level = "debug", skip(self))]
    async fn find_account(&self, id: AccountId) -> StoreResult<Option<Account>> {
        let row: Option<AccountRow> = sqlx::query_as(&format!(
            "SELECT {ACCOUNT_COLUMNS} FROM accounts WHERE id = $1"
        ))
        .bind(id.to_string())
        .fetch_optional(&self.pool)
        .await
        .map_err(unavailable)?;

        into_account(row)
    }

    #[instrument(level = "debug", skip_all, fields(account_id = %account.id()))]
    async fn insert_account(&self, account: &Account) -> StoreResult<bool> {
        let result = sqlx::query(
            r#"
            INSERT INTO accounts (id, email, provider, provider_subject, display_name,
                                  avatar_url, last_login_at, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            ON CONFLICT DO NOTHING
            "#,
        )
        .bind(account.id().to_string())
        .bind(account.email())
        .bind(account.provider().as_str())
        .bind(account.provider_subject())
        .bind(account.display_name())
        .bind(account.avatar_url())
        .bind(account.last_login_at())
        .bind(account.created_at())
        .bind(account.updated_at())
        .execute(&self.pool)
        .await
        .map_err(unavailable)?;

        Ok(result.rows_affected() == 1)
    }

    #[instrument(level = "debug", skip_all, fields(account_id = %account.id()))]
    async fn record_login(&self, account: &Account) -> StoreResult<()> {
        sqlx::query(
            r#"
            UPDATE accounts
            SET display_name = $2, avatar_url = $3, last_login_at = $4, updated_at = $5
            WHERE id = $1
            "#,
        )
        .bind(account.id().to_string())
        .bind(account.display_name())
        .bind(account.avatar_url())
        .bind(account.last_login_at())
        .bind(account.updated_at())
        .execute(&self.pool)
        .await
        .map_err(unavailable)?;

        Ok(())
    }
}
