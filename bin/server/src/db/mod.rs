//! Postgres-backed stores.
//!
//! Each store wraps a shared `PgPool`, maps rows through `FromRow` row types
//! and reports failures as [`StoreError`] reports. Ids are stored as their
//! prefixed text form.

pub mod account;
pub mod session;
pub mod team_member;

pub use account::PgAccountStore;
pub use session::PgSessionStore;
pub use team_member::PgTeamMemberStore;

use rootcause::Report;
use std::fmt::Display;
use std::str::FromStr;
use team_pulse_platform_access::StoreError;

/// Named unique constraints the stores translate into domain outcomes.
pub(crate) const TEAM_MEMBERS_EMAIL_KEY: &str = "team_members_email_key";
pub(crate) const TEAM_MEMBERS_ACCOUNT_ID_KEY: &str = "team_members_account_id_key";

pub(crate) fn unavailable(err: sqlx::Error) -> Report<StoreError> {
    StoreError::Unavailable {
        details: err.to_string(),
    }
    .into()
}

/// Parses a text column into a domain value, reporting corrupt rows.
pub(crate) fn parse_column<T>(column: &str, value: &str) -> Result<T, Report<StoreError>>
where
    T: FromStr,
    T::Err: Display,
{
    value.parse().map_err(|e: T::Err| {
        StoreError::Corrupt {
            details: format!("invalid {column} '{value}': {e}"),
        }
        .into()
    })
}

/// Name of the unique constraint a statement violated, if any.
pub(crate) fn violated_unique_constraint(err: &sqlx::Error) -> Option<String> {
    let db_err = err.as_database_error()?;
    if db_err.is_unique_violation() {
        Some(db_err.constraint().unwrap_or_default().to_string())
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use team_pulse_core::AccountId;

    #[test]
    fn parse_column_accepts_prefixed_ids() {
        let id = AccountId::new();
        let parsed: AccountId = parse_column("account id", &id.to_string()).unwrap();
        assert_eq!(parsed, id);
    }

    #[test]
    fn parse_column_reports_corrupt_rows() {
        let err = parse_column::<AccountId>("account id", "nope").unwrap_err();
        assert!(err.to_string().contains("invalid account id 'nope'"));
    }

    #[test]
    fn non_database_errors_are_not_unique_violations() {
        assert_eq!(violated_unique_constraint(&sqlx::Error::RowNotFound), None);
    }
}
