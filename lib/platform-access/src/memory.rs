//! In-memory implementation of every store trait.
//!
//! All three tables sit behind one lock, so conditional writes (claims,
//! single-use session rotation) are atomic the same way the SQL statements are.

use async_trait::async_trait;
use chrono::Utc;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use team_pulse_core::{AccountId, SessionId, TeamMemberId};
use tokio::sync::Mutex;

use crate::account::{Account, Provider};
use crate::error::StoreError;
use crate::session::Session;
use crate::store::{AccountStore, RosterWrite, SessionStore, StoreResult, TeamMemberStore};
use crate::team_member::TeamMember;

#[derive(Debug, Default)]
struct Tables {
    accounts: HashMap<AccountId, Account>,
    members: HashMap<TeamMemberId, TeamMember>,
    sessions: HashMap<SessionId, Session>,
}

impl Tables {
    fn member_linked_to(&self, account_id: AccountId) -> Option<&TeamMember> {
        self.members
            .values()
            .find(|m| m.account_id() == Some(account_id))
    }

    fn email_taken_by_other(&self, email: &str, id: TeamMemberId) -> bool {
        self.members
            .values()
            .any(|m| m.id() != id && m.email() == email)
    }
}

/// Process-local store for tests and development.
#[derive(Debug, Default)]
pub struct MemoryStore {
    tables: Mutex<Tables>,
    unavailable: AtomicBool,
}

impl MemoryStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes every subsequent call fail with [`StoreError::Unavailable`].
    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::SeqCst);
    }

    fn check_available(&self) -> StoreResult<()> {
        if self.unavailable.load(Ordering::SeqCst) {
            return Err(StoreError::Unavailable {
                details: "memory store switched off".to_string(),
            }
            .into());
        }
        Ok(())
    }

    /// Number of session rows currently held, expired or not.
    pub async fn session_count(&self) -> usize {
        self.tables.lock().await.sessions.len()
    }

    /// Snapshot of all session rows.
    pub async fn sessions(&self) -> Vec<Session> {
        self.tables.lock().await.sessions.values().cloned().collect()
    }
}

#[async_trait]
impl AccountStore for MemoryStore {
    async fn find_by_provider(
        &self,
        provider: Provider,
        subject: &str,
    ) -> StoreResult<Option<Account>> {
        self.check_available()?;
        let tables = self.tables.lock().await;
        Ok(tables
            .accounts
            .values()
            .find(|a| a.provider() == provider && a.provider_subject() == subject)
            .cloned())
    }

    async fn find_account_by_email(&self, email: &str) -> StoreResult<Option<Account>> {
        self.check_available()?;
        let tables = self.tables.lock().await;
        Ok(tables
            .accounts
            .values()
            .find(|a| a.email() == email)
            .cloned())
    }

    async fn find_account(&self, id: AccountId) -> StoreResult<Option<Account>> {
        self.check_available()?;
        Ok(self.tables.lock().await.accounts.get(&id).cloned())
    }

    async fn insert_account(&self, account: &Account) -> StoreResult<bool> {
        self.check_available()?;
        let mut tables = self.tables.lock().await;
        let taken = tables.accounts.values().any(|a| {
            a.email() == account.email()
                || (a.provider() == account.provider()
                    && a.provider_subject() == account.provider_subject())
        });
        if taken {
            return Ok(false);
        }
        tables.accounts.insert(account.id(), account.clone());
        Ok(true)
    }

    async fn record_login(&self, account: &Account) -> StoreResult<()> {
        self.check_available()?;
        let mut tables = self.tables.lock().await;
        if let Some(stored) = tables.accounts.get_mut(&account.id()) {
            *stored = account.clone();
        }
        Ok(())
    }
}

#[async_trait]
impl TeamMemberStore for MemoryStore {
    async fn find_active_by_account(
        &self,
        account_id: AccountId,
    ) -> StoreResult<Option<TeamMember>> {
        self.check_available()?;
        let tables = self.tables.lock().await;
        Ok(tables
            .member_linked_to(account_id)
            .filter(|m| m.is_active())
            .cloned())
    }

    async fn find_active_by_email(&self, email: &str) -> StoreResult<Option<TeamMember>> {
        self.check_available()?;
        let tables = self.tables.lock().await;
        Ok(tables
            .members
            .values()
            .find(|m| m.is_active() && m.email() == email)
            .cloned())
    }

    async fn find_member(&self, id: TeamMemberId) -> StoreResult<Option<TeamMember>> {
        self.check_available()?;
        Ok(self.tables.lock().await.members.get(&id).cloned())
    }

    async fn claim(
        &self,
        id: TeamMemberId,
        account_id: AccountId,
    ) -> StoreResult<Option<TeamMember>> {
        self.check_available()?;
        let mut tables = self.tables.lock().await;
        if tables.member_linked_to(account_id).is_some() {
            return Ok(None);
        }
        match tables.members.get_mut(&id) {
            Some(member) if member.is_claimable() => {
                member.link(account_id);
                Ok(Some(member.clone()))
            }
            _ => Ok(None),
        }
    }

    async fn link(&self, id: TeamMemberId, account_id: AccountId) -> StoreResult<RosterWrite> {
        self.check_available()?;
        let mut tables = self.tables.lock().await;
        if !tables.members.get(&id).is_some_and(TeamMember::is_active) {
            return Ok(RosterWrite::NotFound);
        }
        if tables
            .member_linked_to(account_id)
            .is_some_and(|m| m.id() != id)
        {
            return Ok(RosterWrite::AccountTaken);
        }
        let Some(member) = tables.members.get_mut(&id) else {
            return Ok(RosterWrite::NotFound);
        };
        if member.account_id().is_some_and(|linked| linked != account_id) {
            return Ok(RosterWrite::AccountTaken);
        }
        member.link(account_id);
        Ok(RosterWrite::Applied(member.clone()))
    }

    async fn insert_member(&self, member: &TeamMember) -> StoreResult<RosterWrite> {
        self.check_available()?;
        let mut tables = self.tables.lock().await;
        if tables.email_taken_by_other(member.email(), member.id()) {
            return Ok(RosterWrite::EmailTaken);
        }
        if let Some(account_id) = member.account_id()
            && tables.member_linked_to(account_id).is_some()
        {
            return Ok(RosterWrite::AccountTaken);
        }
        tables.members.insert(member.id(), member.clone());
        Ok(RosterWrite::Applied(member.clone()))
    }

    async fn update_member(&self, member: &TeamMember) -> StoreResult<RosterWrite> {
        self.check_available()?;
        let mut tables = self.tables.lock().await;
        if tables.email_taken_by_other(member.email(), member.id()) {
            return Ok(RosterWrite::EmailTaken);
        }
        let Some(stored) = tables.members.get_mut(&member.id()) else {
            return Ok(RosterWrite::NotFound);
        };
        stored.set_name(member.name().to_string());
        stored.set_email(member.email().to_string());
        stored.set_role(member.role());
        stored.set_weekly_hours(member.weekly_hours());
        stored.set_active(member.is_active());
        Ok(RosterWrite::Applied(stored.clone()))
    }

    async fn list_members(&self, include_inactive: bool) -> StoreResult<Vec<TeamMember>> {
        self.check_available()?;
        let tables = self.tables.lock().await;
        let mut members: Vec<TeamMember> = tables
            .members
            .values()
            .filter(|m| include_inactive || m.is_active())
            .cloned()
            .collect();
        members.sort_by(|a, b| a.name().cmp(b.name()));
        Ok(members)
    }

    async fn deactivate(&self, id: TeamMemberId) -> StoreResult<bool> {
        self.check_available()?;
        let mut tables = self.tables.lock().await;
        match tables.members.get_mut(&id) {
            Some(member) => {
                member.set_active(false);
                Ok(true)
            }
            None => Ok(false),
        }
    }
}

#[async_trait]
impl SessionStore for MemoryStore {
    async fn create(&self, session: &Session) -> StoreResult<SessionId> {
        self.check_available()?;
        let mut tables = self.tables.lock().await;
        tables.sessions.insert(session.id(), session.clone());
        Ok(session.id())
    }

    async fn find_valid(
        &self,
        id: SessionId,
        account_id: AccountId,
        refresh_token_hash: &str,
    ) -> StoreResult<Option<Session>> {
        self.check_available()?;
        let now = Utc::now();
        let tables = self.tables.lock().await;
        Ok(tables
            .sessions
            .get(&id)
            .filter(|s| s.matches(id, account_id, refresh_token_hash) && !s.is_expired_at(now))
            .cloned())
    }

    async fn rotate(
        &self,
        id: SessionId,
        account_id: AccountId,
        refresh_token_hash: &str,
        next: &Session,
    ) -> StoreResult<Option<Session>> {
        self.check_available()?;
        let now = Utc::now();
        let mut tables = self.tables.lock().await;
        let valid = tables
            .sessions
            .get(&id)
            .is_some_and(|s| s.matches(id, account_id, refresh_token_hash) && !s.is_expired_at(now));
        if !valid {
            return Ok(None);
        }
        let previous = tables.sessions.remove(&id);
        tables.sessions.insert(next.id(), next.clone());
        Ok(previous)
    }

    async fn delete(&self, id: SessionId) -> StoreResult<()> {
        self.check_available()?;
        self.tables.lock().await.sessions.remove(&id);
        Ok(())
    }

    async fn delete_all_for_account(&self, account_id: AccountId) -> StoreResult<u64> {
        self.check_available()?;
        let mut tables = self.tables.lock().await;
        let before = tables.sessions.len();
        tables.sessions.retain(|_, s| s.account_id() != account_id);
        Ok((before - tables.sessions.len()) as u64)
    }

    async fn delete_by_token_hash(
        &self,
        account_id: AccountId,
        refresh_token_hash: &str,
    ) -> StoreResult<u64> {
        self.check_available()?;
        let mut tables = self.tables.lock().await;
        let before = tables.sessions.len();
        tables.sessions.retain(|_, s| {
            !(s.account_id() == account_id && s.refresh_token_hash() == refresh_token_hash)
        });
        Ok((before - tables.sessions.len()) as u64)
    }

    async fn delete_expired(&self) -> StoreResult<u64> {
        self.check_available()?;
        let now = Utc::now();
        let mut tables = self.tables.lock().await;
        let before = tables.sessions.len();
        tables.sessions.retain(|_, s| !s.is_expired_at(now));
        Ok((before - tables.sessions.len()) as u64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::role::Role;
    use chrono::Duration;

    fn account(email: &str, subject: &str) -> Account {
        Account::new(
            Provider::Google,
            subject.to_string(),
            email.to_string(),
            None,
            None,
        )
    }

    #[tokio::test]
    async fn account_insert_rejects_duplicate_email_or_subject() {
        let store = MemoryStore::new();
        assert!(store.insert_account(&account("a@x.com", "1")).await.unwrap());
        assert!(!store.insert_account(&account("a@x.com", "2")).await.unwrap());
        assert!(!store.insert_account(&account("b@x.com", "1")).await.unwrap());

        let found = store
            .find_by_provider(Provider::Google, "1")
            .await
            .unwrap()
            .expect("inserted");
        assert_eq!(found.email(), "a@x.com");
        assert!(
            store
                .find_by_provider(Provider::Microsoft, "1")
                .await
                .unwrap()
                .is_none()
        );
    }

    #[tokio::test]
    async fn claim_only_succeeds_once_per_account() {
        let store = MemoryStore::new();
        let first = TeamMember::new("A".into(), "a@x.com".into(), Role::Member, 40);
        let second = TeamMember::new("B".into(), "b@x.com".into(), Role::Member, 40);
        store.insert_member(&first).await.unwrap();
        store.insert_member(&second).await.unwrap();
        let account_id = AccountId::new();

        assert!(store.claim(first.id(), account_id).await.unwrap().is_some());
        assert!(store.claim(first.id(), AccountId::new()).await.unwrap().is_none());
        assert!(store.claim(second.id(), account_id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn inactive_member_cannot_be_claimed() {
        let store = MemoryStore::new();
        let member = TeamMember::new("A".into(), "a@x.com".into(), Role::Admin, 40);
        store.insert_member(&member).await.unwrap();
        assert!(store.deactivate(member.id()).await.unwrap());

        assert!(store.claim(member.id(), AccountId::new()).await.unwrap().is_none());
        assert!(store.find_active_by_email("a@x.com").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn link_reports_conflicts() {
        let store = MemoryStore::new();
        let first = TeamMember::new("A".into(), "a@x.com".into(), Role::Member, 40);
        let second = TeamMember::new("B".into(), "b@x.com".into(), Role::Member, 40);
        store.insert_member(&first).await.unwrap();
        store.insert_member(&second).await.unwrap();
        let account_id = AccountId::new();

        assert!(matches!(
            store.link(first.id(), account_id).await.unwrap(),
            RosterWrite::Applied(_)
        ));
        assert!(matches!(
            store.link(first.id(), account_id).await.unwrap(),
            RosterWrite::Applied(_)
        ));
        assert_eq!(
            store.link(second.id(), account_id).await.unwrap(),
            RosterWrite::AccountTaken
        );
        assert_eq!(
            store.link(first.id(), AccountId::new()).await.unwrap(),
            RosterWrite::AccountTaken
        );
        assert_eq!(
            store.link(TeamMemberId::new(), AccountId::new()).await.unwrap(),
            RosterWrite::NotFound
        );
    }

    #[tokio::test]
    async fn inactive_member_cannot_be_linked() {
        let store = MemoryStore::new();
        let member = TeamMember::new("A".into(), "a@x.com".into(), Role::Admin, 40);
        store.insert_member(&member).await.unwrap();
        assert!(store.deactivate(member.id()).await.unwrap());

        assert_eq!(
            store.link(member.id(), AccountId::new()).await.unwrap(),
            RosterWrite::NotFound
        );
        let stored = store.find_member(member.id()).await.unwrap().unwrap();
        assert_eq!(stored.account_id(), None);
    }

    #[tokio::test]
    async fn update_rejects_email_owned_by_another_member() {
        let store = MemoryStore::new();
        let first = TeamMember::new("A".into(), "a@x.com".into(), Role::Member, 40);
        let mut second = TeamMember::new("B".into(), "b@x.com".into(), Role::Member, 40);
        store.insert_member(&first).await.unwrap();
        store.insert_member(&second).await.unwrap();

        second.set_email("a@x.com".to_string());
        assert_eq!(
            store.update_member(&second).await.unwrap(),
            RosterWrite::EmailTaken
        );
        assert_eq!(
            store.insert_member(&TeamMember::new("C".into(), "a@x.com".into(), Role::Member, 40))
                .await
                .unwrap(),
            RosterWrite::EmailTaken
        );
    }

    #[tokio::test]
    async fn list_is_ordered_by_name_and_hides_inactive() {
        let store = MemoryStore::new();
        let zed = TeamMember::new("Zed".into(), "z@x.com".into(), Role::Member, 40);
        let amy = TeamMember::new("Amy".into(), "a@x.com".into(), Role::Member, 40);
        let gone = TeamMember::new("Bob".into(), "b@x.com".into(), Role::Member, 40);
        for member in [&zed, &amy, &gone] {
            store.insert_member(member).await.unwrap();
        }
        store.deactivate(gone.id()).await.unwrap();

        let names: Vec<String> = store
            .list_members(false)
            .await
            .unwrap()
            .iter()
            .map(|m| m.name().to_string())
            .collect();
        assert_eq!(names, ["Amy", "Zed"]);
        assert_eq!(store.list_members(true).await.unwrap().len(), 3);
    }

    #[tokio::test]
    async fn rotate_replaces_the_row_once() {
        let store = MemoryStore::new();
        let account_id = AccountId::new();
        let session = Session::new(SessionId::new(), account_id, "h".into(), Duration::days(1));
        let next = Session::new(SessionId::new(), account_id, "h2".into(), Duration::days(1));
        let other = Session::new(SessionId::new(), account_id, "h3".into(), Duration::days(1));
        store.create(&session).await.unwrap();

        assert!(
            store
                .rotate(session.id(), account_id, "wrong", &next)
                .await
                .unwrap()
                .is_none()
        );
        assert_eq!(store.session_count().await, 1);

        let replaced = store
            .rotate(session.id(), account_id, "h", &next)
            .await
            .unwrap()
            .expect("rotated");
        assert_eq!(replaced.id(), session.id());
        assert!(
            store
                .find_valid(next.id(), account_id, "h2")
                .await
                .unwrap()
                .is_some()
        );

        assert!(
            store
                .rotate(session.id(), account_id, "h", &other)
                .await
                .unwrap()
                .is_none()
        );
        assert_eq!(store.session_count().await, 1);
    }

    #[tokio::test]
    async fn failed_rotate_keeps_the_previous_session() {
        let store = MemoryStore::new();
        let account_id = AccountId::new();
        let session = Session::new(SessionId::new(), account_id, "h".into(), Duration::days(1));
        let next = Session::new(SessionId::new(), account_id, "h2".into(), Duration::days(1));
        store.create(&session).await.unwrap();

        store.set_unavailable(true);
        assert!(store.rotate(session.id(), account_id, "h", &next).await.is_err());
        store.set_unavailable(false);

        assert!(
            store
                .find_valid(session.id(), account_id, "h")
                .await
                .unwrap()
                .is_some()
        );
    }

    #[tokio::test]
    async fn expired_sessions_are_invisible_and_swept() {
        let store = MemoryStore::new();
        let account_id = AccountId::new();
        let expired = Session::new(SessionId::new(), account_id, "old".into(), Duration::seconds(-1));
        let live = Session::new(SessionId::new(), account_id, "new".into(), Duration::days(1));
        store.create(&expired).await.unwrap();
        store.create(&live).await.unwrap();

        assert!(
            store
                .find_valid(expired.id(), account_id, "old")
                .await
                .unwrap()
                .is_none()
        );
        assert_eq!(store.delete_expired().await.unwrap(), 1);
        assert_eq!(store.session_count().await, 1);
    }

    #[tokio::test]
    async fn deletes_are_idempotent() {
        let store = MemoryStore::new();
        let account_id = AccountId::new();
        let session = Session::new(SessionId::new(), account_id, "h".into(), Duration::days(1));
        store.create(&session).await.unwrap();

        assert_eq!(store.delete_by_token_hash(account_id, "h").await.unwrap(), 1);
        assert_eq!(store.delete_by_token_hash(account_id, "h").await.unwrap(), 0);
        assert_eq!(store.delete_all_for_account(account_id).await.unwrap(), 0);
        store.delete(session.id()).await.unwrap();
    }

    #[tokio::test]
    async fn unavailable_store_fails_every_call() {
        let store = MemoryStore::new();
        store.set_unavailable(true);
        assert!(store.find_account_by_email("a@x.com").await.is_err());
        assert!(store.delete_expired().await.is_err());
        store.set_unavailable(false);
        assert!(store.find_account_by_email("a@x.com").await.is_ok());
    }
}
