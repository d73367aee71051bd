//! Core types shared by every team-pulse crate.
//!
//! This crate holds the strongly-typed identifiers for accounts, roster
//! entries and sessions, plus the rootcause-backed `Result` alias used at
//! storage boundaries.

pub mod error;
pub mod id;

pub use error::Result;
pub use id::{AccountId, ParseIdError, SessionId, TeamMemberId};
