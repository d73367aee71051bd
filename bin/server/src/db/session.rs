//! Refresh-session persistence.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rootcause::Report;
use sqlx::{FromRow, PgPool};
use team_pulse_core::{AccountId, SessionId};
use team_pulse_platform_access::{Session, SessionStore, StoreError, StoreResult};
use tracing::instrument;

use super::{parse_column, unavailable};

/// Row type for session queries.
#[derive(FromRow)]
struct SessionRow {
    id: String,
    account_id: String,
    refresh_token_hash: String,
    expires_at: DateTime<Utc>,
    created_at: DateTime<Utc>,
}

impl SessionRow {
    fn try_into_session(self) -> Result<Session, Report<StoreError>> {
        let id: SessionId = parse_column("session id", &self.id)?;
        let account_id: AccountId = parse_column("account id", &self.account_id)?;
        Ok(Session::with_all_fields(
            id,
            account_id,
            self.refresh_token_hash,
            self.expires_at,
            self.created_at,
        ))
    }
}

/// Session store backed by the `sessions` table.
#[derive(Clone)]
pub struct PgSessionStore {
    pool: PgPool,
}

impl PgSessionStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl SessionStore for PgSessionStore {
    #[instrument(level = "debug", skip_all, fields(session_id = %session.id()))]
    async fn create(&self, session: &Session) -> StoreResult<SessionId> {
        sqlx::query(
            r#"
            INSERT INTO sessions (id, account_id, refresh_token_hash, expires_at, created_at)
            VALUES ($1, $2, $3, $4, $5)
            "#,
        )
        .bind(session.id().to_string())
        .bind(session.account_id().to_string())
        .bind(session.refresh_token_hash())
        .bind(session.expires_at())
        .bind(session.created_at())
        .execute(&self.pool)
        .await
        .map_err(unavailable)?;

        Ok(session.id())
    }

    #[instrument(level = "debug", skip(self, refresh_token_hash))]
    async fn find_valid(
        &self,
        id: SessionId,
        account_id: AccountId,
        refresh_token_hash: &str,
    ) -> StoreResult<Option<Session>> {
        let row: Option<SessionRow> = sqlx::query_as(
            r#"
            SELECT id, account_id, refresh_token_hash, expires_at, created_at
            FROM sessions
            WHERE id = $1 AND account_id = $2 AND refresh_token_hash = $3 AND expires_at > NOW()
            "#,
        )
        .bind(id.to_string())
        .bind(account_id.to_string())
        .bind(refresh_token_hash)
        .fetch_optional(&self.pool)
        .await
        .map_err(unavailable)?;

        row.map(SessionRow::try_into_session).transpose()
    }

    #[instrument(level = "debug", skip(self, refresh_token_hash, next), fields(next_session_id = %next.id()))]
    async fn rotate(
        &self,
        id: SessionId,
        account_id: AccountId,
        refresh_token_hash: &str,
        next: &Session,
    ) -> StoreResult<Option<Session>> {
        let mut tx = self.pool.begin().await.map_err(unavailable)?;

        let row: Option<SessionRow> = sqlx::query_as(
            r#"
            DELETE FROM sessions
            WHERE id = $1 AND account_id = $2 AND refresh_token_hash = $3 AND expires_at > NOW()
            RETURNING id, account_id, refresh_token_hash, expires_at, created_at
            "#,
        )
        .bind(id.to_string())
        .bind(account_id.to_string())
        .bind(refresh_token_hash)
        .fetch_optional(&mut *tx)
        .await
        .map_err(unavailable)?;

        // Dropping the transaction rolls it back.
        let Some(row) = row else {
            return Ok(None);
        };

        sqlx::query(
            r#"
            INSERT INTO sessions (id, account_id, refresh_token_hash, expires_at, created_at)
            VALUES ($1, $2, $3, $4, $5)
            "#,
        )
        .bind(next.id().to_string())
        .bind(next.account_id().to_string())
        .bind(next.refresh_token_hash())
        .bind(next.expires_at())
        .bind(next.created_at())
        .execute(&mut *tx)
        .await
        .map_err(unavailable)?;

        tx.commit().await.map_err(unavailable)?;

        row.try_into_session().map(Some)
    }

    #[instrument(level = "debug", skip(self))]
    async fn delete(&self, id: SessionId) -> StoreResult<()> {
        sqlx::query("DELETE FROM sessions WHERE id = $1")
            .bind(id.to_string())
            .execute(&self.pool)
            .await
            .map_err(unavailable)?;

        Ok(())
    }

    #[instrument(level = "debug", skip(self))]
    async fn delete_all_for_account(&self, account_id: AccountId) -> StoreResult<u64> {
        let result = sqlx::query("DELETE FROM sessions WHERE account_id = $1")
            .bind(account_id.to_string())
            .execute(&self.pool)
            .await
            .map_err(unavailable)?;

        Ok(result.rows_affected())
    }

    #[instrument(level = "debug", skip(self, refresh_token_hash))]
    async fn delete_by_token_hash(
        &self,
        account_id: AccountId,
        refresh_token_hash: &str,
    ) -> StoreResult<u64> {
        let result =
            sqlx::query("DELETE FROM sessions WHERE account_id = $1 AND refresh_token_hash = $2")
                .bind(account_id.to_string())
                .bind(refresh_token_hash)
                .execute(&self.pool)
                .await
                .map_err(unavailable)?;

        Ok(result.rows_affected())
    }

    #[instrument(level = "debug", skip(self))]
    async fn delete_expired(&self) -> StoreResult<u64> {
        let result = sqlx::query("DELETE FROM sessions WHERE expires_at <= NOW()")
            .execute(&self.pool)
            .await
            .map_err(unavailable)?;

        Ok(result.rows_affected())
    }
}
