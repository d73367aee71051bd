//! Storage seams.
//!
//! The service depends only on these traits. Postgres implementations live in
//! the server; [`crate::memory::MemoryStore`] backs tests and local tooling.
//! Every method reports failure as a [`StoreError`] report; "not found" and
//! lost uniqueness races are ordinary return values, not errors.

use async_trait::async_trait;
use team_pulse_core::{AccountId, SessionId, TeamMemberId};

use crate::account::{Account, Provider};
use crate::error::StoreError;
use crate::session::Session;
use crate::team_member::TeamMember;

/// Result alias for store operations.
pub type StoreResult<T> = team_pulse_core::Result<T, StoreError>;

/// Outcome of a roster write that can collide with a uniqueness rule.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RosterWrite {
    /// The write was applied; carries the row as stored.
    Applied(TeamMember),
    /// No roster entry has that id.
    NotFound,
    /// Another entry already uses that email.
    EmailTaken,
    /// The account is already linked to a different entry, or the entry is
    /// linked to a different account.
    AccountTaken,
}

/// Persistence for login accounts.
#[async_trait]
pub trait AccountStore: Send + Sync {
    async fn find_by_provider(
        &self,
        provider: Provider,
        subject: &str,
    ) -> StoreResult<Option<Account>>;

    async fn find_account_by_email(&self, email: &str) -> StoreResult<Option<Account>>;

    async fn find_account(&self, id: AccountId) -> StoreResult<Option<Account>>;

    /// Inserts a new account.
    ///
    /// Returns `false` without writing when the email or the
    /// `(provider, subject)` pair is already taken.
    async fn insert_account(&self, account: &Account) -> StoreResult<bool>;

    /// Persists the login-time profile fields of an existing account.
    async fn record_login(&self, account: &Account) -> StoreResult<()>;
}

/// Persistence for the team roster.
#[async_trait]
pub trait TeamMemberStore: Send + Sync {
    /// Finds the active entry linked to an account.
    async fn find_active_by_account(
        &self,
        account_id: AccountId,
    ) -> StoreResult<Option<TeamMember>>;

    /// Finds the active entry with this email, linked or not.
    async fn find_active_by_email(&self, email: &str) -> StoreResult<Option<TeamMember>>;

    async fn find_member(&self, id: TeamMemberId) -> StoreResult<Option<TeamMember>>;

    /// Links an entry to an account only if the entry is active and unlinked
    /// and the account is not linked elsewhere.
    ///
    /// Returns the claimed entry, or `None` when any condition failed.
    async fn claim(
        &self,
        id: TeamMemberId,
        account_id: AccountId,
    ) -> StoreResult<Option<TeamMember>>;

    /// Links an active entry to an account on explicit request.
    ///
    /// Inactive entries report [`RosterWrite::NotFound`]. Relinking the same
    /// pair is a no-op success.
    async fn link(&self, id: TeamMemberId, account_id: AccountId) -> StoreResult<RosterWrite>;

    async fn insert_member(&self, member: &TeamMember) -> StoreResult<RosterWrite>;

    /// Replaces the editable fields of an existing entry.
    async fn update_member(&self, member: &TeamMember) -> StoreResult<RosterWrite>;

    /// Lists entries ordered by name.
    async fn list_members(&self, include_inactive: bool) -> StoreResult<Vec<TeamMember>>;

    /// Clears the active flag. Returns `false` if the entry does not exist.
    async fn deactivate(&self, id: TeamMemberId) -> StoreResult<bool>;
}

/// Persistence for refresh sessions.
#[async_trait]
pub trait SessionStore: Send + Sync {
    async fn create(&self, session: &Session) -> StoreResult<SessionId>;

    /// Finds the unexpired session matching all three keys.
    async fn find_valid(
        &self,
        id: SessionId,
        account_id: AccountId,
        refresh_token_hash: &str,
    ) -> StoreResult<Option<Session>>;

    /// Replaces the matching unexpired session with `next` in one atomic
    /// step and returns the replaced row.
    ///
    /// Returns `None` and writes nothing when no row matches. Of several
    /// concurrent calls with the same keys at most one succeeds, and a failed
    /// call leaves the previous session in place.
    async fn rotate(
        &self,
        id: SessionId,
        account_id: AccountId,
        refresh_token_hash: &str,
        next: &Session,
    ) -> StoreResult<Option<Session>>;

    async fn delete(&self, id: SessionId) -> StoreResult<()>;

    async fn delete_all_for_account(&self, account_id: AccountId) -> StoreResult<u64>;

    async fn delete_by_token_hash(
        &self,
        account_id: AccountId,
        refresh_token_hash: &str,
    ) -> StoreResult<u64>;

    /// Deletes expired rows. Returns the number removed.
    async fn delete_expired(&self) -> StoreResult<u64>;
}
