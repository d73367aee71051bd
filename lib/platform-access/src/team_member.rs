//! Roster entries.
//!
//! Team members are provisioned by an administrator before anyone logs in.
//! The first login whose email matches an active, unclaimed entry links the
//! two; from then on the entry's role is what access tokens carry.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use team_pulse_core::{AccountId, TeamMemberId};

use crate::role::Role;

/// Default contracted hours for a new roster entry.
pub const DEFAULT_WEEKLY_HOURS: i32 = 40;

/// A roster entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TeamMember {
    id: TeamMemberId,
    /// Linked login account; `None` means not yet claimed.
    account_id: Option<AccountId>,
    name: String,
    email: String,
    role: Role,
    weekly_hours: i32,
    is_active: bool,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TeamMember {
    /// Creates an active, unlinked roster entry.
    #[must_use]
    pub fn new(name: String, email: String, role: Role, weekly_hours: i32) -> Self {
        let now = Utc::now();
        Self {
            id: TeamMemberId::new(),
            account_id: None,
            name,
            email,
            role,
            weekly_hours,
            is_active: true,
            created_at: now,
            updated_at: now,
        }
    }

    /// Reconstitutes a roster entry from storage.
    #[must_use]
    #[expect(clippy::too_many_arguments)]
    pub fn with_all_fields(
        id: TeamMemberId,
        account_id: Option<AccountId>,
        name: String,
        email: String,
        role: Role,
        weekly_hours: i32,
        is_active: bool,
        created_at: DateTime<Utc>,
        updated_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            account_id,
            name,
            email,
            role,
            weekly_hours,
            is_active,
            created_at,
            updated_at,
        }
    }

    #[must_use]
    pub fn id(&self) -> TeamMemberId {
        self.id
    }

    #[must_use]
    pub fn account_id(&self) -> Option<AccountId> {
        self.account_id
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn email(&self) -> &str {
        &self.email
    }

    #[must_use]
    pub fn role(&self) -> Role {
        self.role
    }

    #[must_use]
    pub fn weekly_hours(&self) -> i32 {
        self.weekly_hours
    }

    #[must_use]
    pub fn is_active(&self) -> bool {
        self.is_active
    }

    #[must_use]
    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    #[must_use]
    pub fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    /// Returns true if the entry is active and nobody has claimed it.
    #[must_use]
    pub fn is_claimable(&self) -> bool {
        self.is_active && self.account_id.is_none()
    }

    pub fn set_name(&mut self, name: String) {
        self.name = name;
        self.updated_at = Utc::now();
    }

    pub fn set_email(&mut self, email: String) {
        self.email = email;
        self.updated_at = Utc::now();
    }

    pub fn set_role(&mut self, role: Role) {
        self.role = role;
        self.updated_at = Utc::now();
    }

    pub fn set_weekly_hours(&mut self, weekly_hours: i32) {
        self.weekly_hours = weekly_hours;
        self.updated_at = Utc::now();
    }

    pub fn set_active(&mut self, is_active: bool) {
        self.is_active = is_active;
        self.updated_at = Utc::now();
    }

    /// Points the entry at an account.
    ///
    /// Stores enforce that an account is linked to at most one entry; this
    /// only updates the in-memory value.
    pub fn link(&mut self, account_id: AccountId) {
        self.account_id = Some(account_id);
        self.updated_at = Utc::now();
    }
}
