//! Login accounts.
//!
//! An account is the internal identity behind an external OAuth login. It is
//! keyed by `(provider, subject)` and separately by email; both are unique.
//! Role is deliberately not stored here, see [`crate::team_member`].

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use team_pulse_core::AccountId;

/// External identity provider an account signs in with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Provider {
    Google,
    Microsoft,
}

impl Provider {
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Google => "google",
            Self::Microsoft => "microsoft",
        }
    }
}

impl fmt::Display for Provider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Provider {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "google" => Ok(Self::Google),
            "microsoft" => Ok(Self::Microsoft),
            other => Err(format!("unknown provider '{other}'")),
        }
    }
}

/// Represents a login account.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Account {
    id: AccountId,
    email: String,
    provider: Provider,
    /// Subject id issued by the provider; unique together with `provider`.
    provider_subject: String,
    display_name: Option<String>,
    avatar_url: Option<String>,
    last_login_at: Option<DateTime<Utc>>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl Account {
    /// Creates an account for a first successful login.
    ///
    /// The id is generated and `last_login_at` is set to now.
    #[must_use]
    pub fn new(
        provider: Provider,
        provider_subject: String,
        email: String,
        display_name: Option<String>,
        avatar_url: Option<String>,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: AccountId::new(),
            email,
            provider,
            provider_subject,
            display_name,
            avatar_url,
            last_login_at: Some(now),
            created_at: now,
            updated_at: now,
        }
    }

    /// Reconstitutes an account from storage.
    #[must_use]
    #[expect(clippy::too_many_arguments)]
    pub fn with_all_fields(
        id: AccountId,
        email: String,
        provider: Provider,
        provider_subject: String,
        display_name: Option<String>,
        avatar_url: Option<String>,
        last_login_at: Option<DateTime<Utc>>,
        created_at: DateTime<Utc>,
        updated_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            email,
            provider,
            provider_subject,
            display_name,
            avatar_url,
            last_login_at,
            created_at,
            updated_at,
        }
    }

    #[must_use]
    pub fn id(&self) -> AccountId {
        self.id
    }

    #[must_use]
    pub fn email(&self) -> &str {
        &self.email
    }

    #[must_use]
    pub fn provider(&self) -> Provider {
        self.provider
    }

    #[must_use]
    pub fn provider_subject(&self) -> &str {
        &self.provider_subject
    }

    #[must_use]
    pub fn display_name(&self) -> Option<&str> {
        self.display_name.as_deref()
    }

    #[must_use]
    pub fn avatar_url(&self) -> Option<&str> {
        self.avatar_url.as_deref()
    }

    #[must_use]
    pub fn last_login_at(&self) -> Option<DateTime<Utc>> {
        self.last_login_at
    }

    #[must_use]
    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    #[must_use]
    pub fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    /// Applies the profile fields refreshed on every login.
    pub fn record_login(&mut self, display_name: Option<String>, avatar_url: Option<String>) {
        let now = Utc::now();
        self.display_name = display_name;
        self.avatar_url = avatar_url;
        self.last_login_at = Some(now);
        self.updated_at = now;
    }
}
