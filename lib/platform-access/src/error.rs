//! Error types for the platform-access crate.
//!
//! - `StoreError`: failures of a backing store, wrapped in a rootcause
//!   `Report` at the trait boundary.
//! - `AuthError`: the externally meaningful outcomes of login, refresh,
//!   logout and request gating.

use crate::role::Role;
use std::fmt;
use team_pulse_core::AccountId;

/// Errors raised by account, roster and session stores.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    /// The store could not be reached or the query failed.
    Unavailable { details: String },
    /// A stored row could not be mapped back into a domain value.
    Corrupt { details: String },
}

impl fmt::Display for StoreError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Unavailable { details } => write!(f, "store unavailable: {details}"),
            Self::Corrupt { details } => write!(f, "corrupt stored row: {details}"),
        }
    }
}

impl std::error::Error for StoreError {}

/// Errors from authentication and authorization operations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthError {
    /// The email is already registered under a different provider.
    AccountConflict { email: String },
    /// Token signature, shape or payload is wrong.
    TokenInvalid { reason: String },
    /// Token is past its embedded expiry.
    TokenExpired,
    /// Refresh failed. Deliberately says nothing about why.
    InvalidRefreshToken,
    /// Missing or unusable credentials on a request.
    Unauthorized { reason: String },
    /// Caller is authenticated but their role is not in the allowed set.
    Forbidden { required: Vec<Role>, actual: Role },
    /// The account referenced by a valid token no longer exists.
    AccountNotFound { account_id: AccountId },
    /// Token minting is misconfigured (usually a missing secret).
    Signing { reason: String },
    /// The backing store failed; the request cannot complete.
    Storage { details: String },
}

impl fmt::Display for AuthError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::AccountConflict { email } => {
                write!(f, "email {email} already registered with a different provider")
            }
            Self::TokenInvalid { reason } => write!(f, "invalid token: {reason}"),
            Self::TokenExpired => write!(f, "token has expired"),
            Self::InvalidRefreshToken => write!(f, "invalid or expired refresh token"),
            Self::Unauthorized { reason } => write!(f, "unauthorized: {reason}"),
            Self::Forbidden { required, actual } => {
                let required = required
                    .iter()
                    .map(Role::as_str)
                    .collect::<Vec<_>>()
                    .join(", ");
                write!(f, "role {actual} is not one of [{required}]")
            }
            Self::AccountNotFound { account_id } => write!(f, "account {account_id} not found"),
            Self::Signing { reason } => write!(f, "token signing failed: {reason}"),
            Self::Storage { details } => write!(f, "storage error: {details}"),
        }
    }
}

impl std::error::Error for AuthError {}

impl From<rootcause::Report<StoreError>> for AuthError {
    fn from(report: rootcause::Report<StoreError>) -> Self {
        Self::Storage {
            details: report.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn account_conflict_names_the_email() {
        let err = AuthError::AccountConflict {
            email: "a@x.com".to_string(),
        };
        assert!(err.to_string().contains("a@x.com"));
        assert!(err.to_string().contains("different provider"));
    }

    #[test]
    fn forbidden_lists_required_and_actual_roles() {
        let err = AuthError::Forbidden {
            required: vec![Role::Admin, Role::Manager],
            actual: Role::Member,
        };
        let text = err.to_string();
        assert!(text.contains("member"));
        assert!(text.contains("admin, manager"));
    }

    #[test]
    fn refresh_failure_message_is_uniform() {
        assert_eq!(
            AuthError::InvalidRefreshToken.to_string(),
            "invalid or expired refresh token"
        );
    }

    #[test]
    fn store_report_becomes_storage_error() {
        let report: rootcause::Report<StoreError> = StoreError::Unavailable {
            details: "connection refused".to_string(),
        }
        .into();
        let err = AuthError::from(report);
        match err {
            AuthError::Storage { details } => assert!(details.contains("connection refused")),
            other => panic!("unexpected {other:?}"),
        }
    }
}
