//! Error handling foundation for team-pulse.
//!
//! Only the `Result` alias lives here. Domain crates declare their own error
//! enums (`StoreError`, `AuthError`, ...) and wrap them in a rootcause
//! `Report` where a failure crosses a storage boundary, so callers keep the
//! typed context plus whatever the lower layer attached.

use rootcause::Report;

/// Result carrying a rootcause [`Report`] typed by its context `C`.
pub type Result<T, C = ()> = std::result::Result<T, Report<C>>;
