//! Roster roles and allow-sets for route gating.
//!
//! Roles are flat: `admin` does not imply `manager`, and `manager` does not
//! imply `member`. Every gated route names the exact set it accepts.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Role of a roster entry, copied into access tokens at mint time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Admin,
    Manager,
    /// Lowest privilege; the default for accounts without a roster link.
    Member,
}

impl Role {
    /// Role used when an account is not linked to an active team member.
    pub const DEFAULT: Role = Role::Member;

    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Admin => "admin",
            Self::Manager => "manager",
            Self::Member => "member",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "admin" => Ok(Self::Admin),
            "manager" => Ok(Self::Manager),
            "member" => Ok(Self::Member),
            other => Err(format!("unknown role '{other}'")),
        }
    }
}

/// Fixed set of roles a route accepts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoleSet {
    roles: Vec<Role>,
}

impl RoleSet {
    /// Builds a set from the given roles, dropping duplicates.
    #[must_use]
    pub fn of(roles: &[Role]) -> Self {
        let mut set = Vec::with_capacity(roles.len());
        for role in roles {
            if !set.contains(role) {
                set.push(*role);
            }
        }
        Self { roles: set }
    }

    #[must_use]
    pub fn admin_only() -> Self {
        Self::of(&[Role::Admin])
    }

    #[must_use]
    pub fn admin_or_manager() -> Self {
        Self::of(&[Role::Admin, Role::Manager])
    }

    #[must_use]
    pub fn contains(&self, role: Role) -> bool {
        self.roles.contains(&role)
    }

    #[must_use]
    pub fn roles(&self) -> &[Role] {
        &self.roles
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hierarchy_is_flat() {
        let admins = RoleSet::admin_only();
        assert!(admins.contains(Role::Admin));
        assert!(!admins.contains(Role::Manager));
        assert!(!admins.contains(Role::Member));

        let members = RoleSet::of(&[Role::Member]);
        assert!(!members.contains(Role::Admin));
    }

    #[test]
    fn of_removes_duplicates() {
        let set = RoleSet::of(&[Role::Manager, Role::Admin, Role::Manager]);
        assert_eq!(set.roles(), &[Role::Manager, Role::Admin]);
    }

    #[test]
    fn default_role_is_member() {
        assert_eq!(Role::DEFAULT, Role::Member);
    }

    #[test]
    fn parse_and_display_agree() {
        for role in [Role::Admin, Role::Manager, Role::Member] {
            assert_eq!(role.to_string().parse::<Role>(), Ok(role));
        }
        assert!("owner".parse::<Role>().is_err());
    }

    #[test]
    fn serializes_lowercase() {
        let json = serde_json::to_string(&Role::Manager).expect("serialize");
        assert_eq!(json, "\"manager\"");
    }
}
