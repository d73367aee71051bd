//! Maps an external login onto an account, a roster entry and a role.

use std::sync::Arc;
use tracing::{debug, info, instrument, warn};

use crate::account::{Account, Provider};
use crate::error::AuthError;
use crate::role::Role;
use crate::store::{AccountStore, TeamMemberStore};
use crate::team_member::TeamMember;

/// Identity asserted by an external provider after a successful login.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExternalProfile {
    pub provider: Provider,
    pub subject: String,
    pub email: String,
    pub display_name: Option<String>,
    pub avatar_url: Option<String>,
}

/// Result of resolving a login.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedIdentity {
    pub account: Account,
    pub role: Role,
    pub team_member: Option<TeamMember>,
}

/// Finds or creates accounts and links them to roster entries.
#[derive(Clone)]
pub struct IdentityResolver {
    accounts: Arc<dyn AccountStore>,
    members: Arc<dyn TeamMemberStore>,
}

impl IdentityResolver {
    #[must_use]
    pub fn new(accounts: Arc<dyn AccountStore>, members: Arc<dyn TeamMemberStore>) -> Self {
        Self { accounts, members }
    }

    /// Resolves a login to an account and its effective role.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::AccountConflict`] when the email already belongs
    /// to an account under another provider or subject, and
    /// [`AuthError::Storage`] when a store call fails.
    #[instrument(skip(self, profile), fields(provider = %profile.provider, email = %profile.email))]
    pub async fn resolve(&self, profile: ExternalProfile) -> Result<ResolvedIdentity, AuthError> {
        let account = self.find_or_create_account(profile).await?;
        let team_member = self.link_team_member(&account).await?;
        Ok(Self::identity(account, team_member))
    }

    /// Re-resolves role and roster entry for an existing account.
    ///
    /// Only an existing active link counts; no claim is attempted.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::Storage`] when a store call fails.
    pub async fn current(&self, account: Account) -> Result<ResolvedIdentity, AuthError> {
        let team_member = self.members.find_active_by_account(account.id()).await?;
        Ok(Self::identity(account, team_member))
    }

    fn identity(account: Account, team_member: Option<TeamMember>) -> ResolvedIdentity {
        let role = team_member
            .as_ref()
            .map_or(Role::DEFAULT, TeamMember::role);
        ResolvedIdentity {
            account,
            role,
            team_member,
        }
    }

    async fn find_or_create_account(&self, profile: ExternalProfile) -> Result<Account, AuthError> {
        if let Some(mut account) = self
            .accounts
            .find_by_provider(profile.provider, &profile.subject)
            .await?
        {
            account.record_login(profile.display_name, profile.avatar_url);
            self.accounts.record_login(&account).await?;
            debug!(account_id = %account.id(), "returning account");
            return Ok(account);
        }

        if self
            .accounts
            .find_account_by_email(&profile.email)
            .await?
            .is_some()
        {
            warn!("email already registered with a different provider");
            return Err(AuthError::AccountConflict {
                email: profile.email,
            });
        }

        let account = Account::new(
            profile.provider,
            profile.subject.clone(),
            profile.email.clone(),
            profile.display_name,
            profile.avatar_url,
        );
        if self.accounts.insert_account(&account).await? {
            info!(account_id = %account.id(), "created account");
            return Ok(account);
        }

        // Lost an insert race; whoever won may be this same login.
        match self
            .accounts
            .find_by_provider(profile.provider, &profile.subject)
            .await?
        {
            Some(existing) => Ok(existing),
            None => Err(AuthError::AccountConflict {
                email: profile.email,
            }),
        }
    }

    async fn link_team_member(&self, account: &Account) -> Result<Option<TeamMember>, AuthError> {
        if let Some(member) = self.members.find_active_by_account(account.id()).await? {
            return Ok(Some(member));
        }

        let Some(candidate) = self.members.find_active_by_email(account.email()).await? else {
            return Ok(None);
        };
        if candidate.account_id().is_some() {
            warn!(
                team_member_id = %candidate.id(),
                "team member with this email is linked to another account"
            );
            return Ok(None);
        }

        match self.members.claim(candidate.id(), account.id()).await? {
            Some(member) => {
                info!(
                    account_id = %account.id(),
                    team_member_id = %member.id(),
                    "linked account to team member"
                );
                Ok(Some(member))
            }
            // Claimed concurrently; see whether it was claimed for us.
            None => Ok(self.members.find_active_by_account(account.id()).await?),
        }
    }
}
