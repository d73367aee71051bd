//! Signed access and refresh tokens.
//!
//! Access tokens are short-lived and carry everything the request guard
//! needs (account, email, role, linked team member). Refresh tokens are
//! long-lived and carry only the account and the session row they belong to.
//! Each kind has its own HMAC-SHA256 secret, so a token of one kind never
//! verifies as the other.

use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::errors::ErrorKind as JwtErrorKind;
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fmt;
use team_pulse_core::{AccountId, SessionId, TeamMemberId};

use crate::error::AuthError;
use crate::role::Role;

/// Which secret and lifetime a token uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TokenKind {
    Access,
    Refresh,
}

impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Access => f.write_str("access"),
            Self::Refresh => f.write_str("refresh"),
        }
    }
}

/// Claims payload bound to one token kind.
pub trait TokenClaims: Serialize + DeserializeOwned {
    const KIND: TokenKind;
}

/// Claims carried by an access token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccessClaims {
    pub sub: AccountId,
    pub email: String,
    pub role: Role,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tmid: Option<TeamMemberId>,
    pub iat: i64,
    pub exp: i64,
}

impl AccessClaims {
    #[must_use]
    pub fn new(
        sub: AccountId,
        email: String,
        role: Role,
        tmid: Option<TeamMemberId>,
        issued_at: DateTime<Utc>,
        ttl: Duration,
    ) -> Self {
        Self {
            sub,
            email,
            role,
            tmid,
            iat: issued_at.timestamp(),
            exp: (issued_at + ttl).timestamp(),
        }
    }
}

impl TokenClaims for AccessClaims {
    const KIND: TokenKind = TokenKind::Access;
}

/// Claims carried by a refresh token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RefreshClaims {
    pub sub: AccountId,
    pub sid: SessionId,
    pub iat: i64,
    pub exp: i64,
}

impl RefreshClaims {
    #[must_use]
    pub fn new(sub: AccountId, sid: SessionId, issued_at: DateTime<Utc>, ttl: Duration) -> Self {
        Self {
            sub,
            sid,
            iat: issued_at.timestamp(),
            exp: (issued_at + ttl).timestamp(),
        }
    }
}

impl TokenClaims for RefreshClaims {
    const KIND: TokenKind = TokenKind::Refresh;
}

/// Secrets and lifetimes for both token kinds.
#[derive(Clone)]
pub struct TokenSettings {
    pub access_secret: String,
    pub access_ttl: Duration,
    pub refresh_secret: String,
    pub refresh_ttl: Duration,
}

impl fmt::Debug for TokenSettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TokenSettings")
            .field("access_secret", &"[REDACTED]")
            .field("access_ttl", &self.access_ttl)
            .field("refresh_secret", &"[REDACTED]")
            .field("refresh_ttl", &self.refresh_ttl)
            .finish()
    }
}

/// Mints and verifies tokens. Pure; performs no I/O.
#[derive(Clone)]
pub struct TokenCodec {
    settings: TokenSettings,
}

impl fmt::Debug for TokenCodec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TokenCodec")
            .field("settings", &self.settings)
            .finish()
    }
}

impl TokenCodec {
    #[must_use]
    pub fn new(settings: TokenSettings) -> Self {
        Self { settings }
    }

    /// Lifetime configured for a token kind.
    #[must_use]
    pub fn ttl(&self, kind: TokenKind) -> Duration {
        match kind {
            TokenKind::Access => self.settings.access_ttl,
            TokenKind::Refresh => self.settings.refresh_ttl,
        }
    }

    fn secret(&self, kind: TokenKind) -> &str {
        match kind {
            TokenKind::Access => &self.settings.access_secret,
            TokenKind::Refresh => &self.settings.refresh_secret,
        }
    }

    /// Signs claims with the secret for their kind.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::Signing`] if the secret is empty or encoding fails.
    pub fn mint<C: TokenClaims>(&self, claims: &C) -> Result<String, AuthError> {
        let secret = self.secret(C::KIND);
        if secret.is_empty() {
            return Err(AuthError::Signing {
                reason: format!("{} token secret is not configured", C::KIND),
            });
        }

        encode(
            &Header::new(Algorithm::HS256),
            claims,
            &EncodingKey::from_secret(secret.as_bytes()),
        )
        .map_err(|e| AuthError::Signing {
            reason: e.to_string(),
        })
    }

    /// Verifies signature and expiry, then decodes the claims.
    ///
    /// Expiry is checked with zero leeway.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::TokenExpired`] once `exp` has passed and
    /// [`AuthError::TokenInvalid`] for every other failure, including a
    /// missing secret.
    pub fn verify<C: TokenClaims>(&self, token: &str) -> Result<C, AuthError> {
        let secret = self.secret(C::KIND);
        if secret.is_empty() {
            return Err(AuthError::TokenInvalid {
                reason: format!("{} token secret is not configured", C::KIND),
            });
        }

        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = 0;
        validation.validate_exp = true;
        validation.set_required_spec_claims(&["exp", "iat", "sub"]);

        decode::<C>(
            token,
            &DecodingKey::from_secret(secret.as_bytes()),
            &validation,
        )
        .map(|data| data.claims)
        .map_err(|e| match e.kind() {
            JwtErrorKind::ExpiredSignature => AuthError::TokenExpired,
            _ => AuthError::TokenInvalid {
                reason: e.to_string(),
            },
        })
    }

    /// Lowercase hex SHA-256 of a token, as stored in session rows.
    #[must_use]
    pub fn hash(token: &str) -> String {
        let mut hasher = Sha256::new();
        hasher.update(token.as_bytes());
        format!("{:x}", hasher.finalize())
    }
}
