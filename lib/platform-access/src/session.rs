//! Refresh sessions.
//!
//! One row per outstanding refresh token. The row, not the token signature,
//! is what makes a refresh token usable: a signed token whose row is gone has
//! been rotated or revoked.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use team_pulse_core::{AccountId, SessionId};

/// A persisted refresh session.
///
/// Only the SHA-256 digest of the refresh token is kept.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    id: SessionId,
    account_id: AccountId,
    refresh_token_hash: String,
    expires_at: DateTime<Utc>,
    created_at: DateTime<Utc>,
}

impl Session {
    /// Builds a session that expires `ttl` from now.
    ///
    /// The id is chosen by the caller because it is embedded in the refresh
    /// token before that token is hashed.
    #[must_use]
    pub fn new(
        id: SessionId,
        account_id: AccountId,
        refresh_token_hash: String,
        ttl: Duration,
    ) -> Self {
        let now = Utc::now();
        Self {
            id,
            account_id,
            refresh_token_hash,
            expires_at: now + ttl,
            created_at: now,
        }
    }

    /// Reconstitutes a session from storage.
    #[must_use]
    pub fn with_all_fields(
        id: SessionId,
        account_id: AccountId,
        refresh_token_hash: String,
        expires_at: DateTime<Utc>,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            account_id,
            refresh_token_hash,
            expires_at,
            created_at,
        }
    }

    #[must_use]
    pub fn id(&self) -> SessionId {
        self.id
    }

    #[must_use]
    pub fn account_id(&self) -> AccountId {
        self.account_id
    }

    /// Lowercase hex SHA-256 of the refresh token.
    #[must_use]
    pub fn refresh_token_hash(&self) -> &str {
        &self.refresh_token_hash
    }

    #[must_use]
    pub fn expires_at(&self) -> DateTime<Utc> {
        self.expires_at
    }

    #[must_use]
    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// Returns true if the session has expired at `now`.
    #[must_use]
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        now >= self.expires_at
    }

    /// Returns true if the session has expired.
    #[must_use]
    pub fn is_expired(&self) -> bool {
        self.is_expired_at(Utc::now())
    }

    /// Returns true if this row authorizes the given presentation.
    #[must_use]
    pub fn matches(&self, id: SessionId, account_id: AccountId, refresh_token_hash: &str) -> bool {
        self.id == id
            && self.account_id == account_id
            && self.refresh_token_hash == refresh_token_hash
    }
}
