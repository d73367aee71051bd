//! Login, refresh, logout and the current-user view.
//!
//! Every successful login or refresh writes exactly one new session row and
//! returns a fresh access/refresh pair. A refresh swaps its session row for
//! the new one atomically, so a refresh token works at most once.

use chrono::Utc;
use serde::Serialize;
use std::sync::Arc;
use team_pulse_core::{AccountId, SessionId, TeamMemberId};
use tracing::{info, instrument, warn};

use crate::account::Account;
use crate::error::AuthError;
use crate::identity::{ExternalProfile, IdentityResolver, ResolvedIdentity};
use crate::role::Role;
use crate::session::Session;
use crate::store::{AccountStore, SessionStore, TeamMemberStore};
use crate::team_member::TeamMember;
use crate::token::{AccessClaims, RefreshClaims, TokenCodec, TokenKind};

/// Public view of the user a token pair was issued for.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthUser {
    pub id: AccountId,
    pub email: String,
    pub display_name: Option<String>,
    pub role: Role,
    pub team_member_id: Option<TeamMemberId>,
}

impl From<&ResolvedIdentity> for AuthUser {
    fn from(identity: &ResolvedIdentity) -> Self {
        Self {
            id: identity.account.id(),
            email: identity.account.email().to_string(),
            display_name: identity.account.display_name().map(str::to_string),
            role: identity.role,
            team_member_id: identity.team_member.as_ref().map(TeamMember::id),
        }
    }
}

/// A freshly issued token pair.
#[derive(Debug, Clone)]
pub struct AuthTokens {
    pub access_token: String,
    pub refresh_token: String,
    pub user: AuthUser,
}

/// The signed-in user as shown by the profile endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CurrentUser {
    pub id: AccountId,
    pub email: String,
    pub display_name: Option<String>,
    pub avatar_url: Option<String>,
    pub role: Role,
    pub team_member: Option<TeamMember>,
}

impl From<ResolvedIdentity> for CurrentUser {
    fn from(identity: ResolvedIdentity) -> Self {
        let ResolvedIdentity {
            account,
            role,
            team_member,
        } = identity;
        Self {
            id: account.id(),
            email: account.email().to_string(),
            display_name: account.display_name().map(str::to_string),
            avatar_url: account.avatar_url().map(str::to_string),
            role,
            team_member,
        }
    }
}

/// Orchestrates the token and session lifecycle.
#[derive(Clone)]
pub struct AuthService {
    resolver: IdentityResolver,
    accounts: Arc<dyn AccountStore>,
    sessions: Arc<dyn SessionStore>,
    codec: TokenCodec,
}

impl AuthService {
    #[must_use]
    pub fn new(
        accounts: Arc<dyn AccountStore>,
        members: Arc<dyn TeamMemberStore>,
        sessions: Arc<dyn SessionStore>,
        codec: TokenCodec,
    ) -> Self {
        Self {
            resolver: IdentityResolver::new(accounts.clone(), members),
            accounts,
            sessions,
            codec,
        }
    }

    /// Codec used to verify access tokens on incoming requests.
    #[must_use]
    pub fn codec(&self) -> &TokenCodec {
        &self.codec
    }

    /// Completes an external login and issues the first token pair.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::AccountConflict`] if the email belongs to an
    /// account under another provider, [`AuthError::Signing`] if tokens
    /// cannot be minted and [`AuthError::Storage`] if a store fails.
    #[instrument(skip(self, profile), fields(provider = %profile.provider))]
    pub async fn login(&self, profile: ExternalProfile) -> Result<AuthTokens, AuthError> {
        let identity = self.resolver.resolve(profile).await?;
        let (tokens, session) = self.prepare(&identity)?;
        let session_id = self.sessions.create(&session).await?;
        info!(
            account_id = %identity.account.id(),
            session_id = %session_id,
            role = %identity.role,
            "login succeeded"
        );
        Ok(tokens)
    }

    /// Exchanges a refresh token for a new pair, replacing the old session.
    ///
    /// The old session is swapped for the new one in a single store call, so
    /// a failed refresh leaves the presented token usable.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::InvalidRefreshToken`] for any token or session
    /// problem, whatever the cause, and [`AuthError::Storage`] if a store
    /// fails.
    #[instrument(skip_all)]
    pub async fn refresh(&self, refresh_token: &str) -> Result<AuthTokens, AuthError> {
        let claims: RefreshClaims = self.codec.verify(refresh_token).map_err(|e| {
            warn!(error = %e, "refresh token rejected");
            AuthError::InvalidRefreshToken
        })?;
        let hash = TokenCodec::hash(refresh_token);

        if self
            .sessions
            .find_valid(claims.sid, claims.sub, &hash)
            .await?
            .is_none()
        {
            warn!(
                account_id = %claims.sub,
                session_id = %claims.sid,
                "refresh session missing, expired or already used"
            );
            return Err(AuthError::InvalidRefreshToken);
        }

        let Some(account) = self.accounts.find_account(claims.sub).await? else {
            warn!(account_id = %claims.sub, "refresh for unknown account");
            return Err(AuthError::InvalidRefreshToken);
        };

        let identity = self.resolver.current(account).await?;
        let (tokens, session) = self.prepare(&identity)?;
        if self
            .sessions
            .rotate(claims.sid, claims.sub, &hash, &session)
            .await?
            .is_none()
        {
            warn!(
                account_id = %claims.sub,
                session_id = %claims.sid,
                "refresh session used concurrently"
            );
            return Err(AuthError::InvalidRefreshToken);
        }

        info!(
            account_id = %identity.account.id(),
            previous_session_id = %claims.sid,
            session_id = %session.id(),
            "session rotated"
        );
        Ok(tokens)
    }

    /// Revokes one session, or every session of the account.
    ///
    /// With a refresh token only the session holding that token is removed;
    /// without one all of the account's sessions are. Unknown tokens are
    /// ignored.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::Storage`] if the session store fails.
    #[instrument(skip(self, refresh_token), fields(everywhere = refresh_token.is_none()))]
    pub async fn logout(
        &self,
        account_id: AccountId,
        refresh_token: Option<&str>,
    ) -> Result<(), AuthError> {
        let removed = match refresh_token {
            Some(token) => {
                self.sessions
                    .delete_by_token_hash(account_id, &TokenCodec::hash(token))
                    .await?
            }
            None => self.sessions.delete_all_for_account(account_id).await?,
        };
        info!(account_id = %account_id, removed, "logout");
        Ok(())
    }

    /// Loads the current view of a signed-in account.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::AccountNotFound`] if the account no longer exists
    /// and [`AuthError::Storage`] if a store fails.
    pub async fn current_user(&self, account_id: AccountId) -> Result<CurrentUser, AuthError> {
        let account: Account = self
            .accounts
            .find_account(account_id)
            .await?
            .ok_or(AuthError::AccountNotFound { account_id })?;
        Ok(self.resolver.current(account).await?.into())
    }

    /// Mints a token pair and builds the session row that backs it.
    fn prepare(&self, identity: &ResolvedIdentity) -> Result<(AuthTokens, Session), AuthError> {
        let now = Utc::now();
        let account = &identity.account;
        let session_id = SessionId::new();
        let refresh_ttl = self.codec.ttl(TokenKind::Refresh);

        let refresh_token = self.codec.mint(&RefreshClaims::new(
            account.id(),
            session_id,
            now,
            refresh_ttl,
        ))?;
        let access_token = self.codec.mint(&AccessClaims::new(
            account.id(),
            account.email().to_string(),
            identity.role,
            identity.team_member.as_ref().map(TeamMember::id),
            now,
            self.codec.ttl(TokenKind::Access),
        ))?;

        let session = Session::new(
            session_id,
            account.id(),
            TokenCodec::hash(&refresh_token),
            refresh_ttl,
        );

        Ok((
            AuthTokens {
                access_token,
                refresh_token,
                user: AuthUser::from(identity),
            },
            session,
        ))
    }
}
