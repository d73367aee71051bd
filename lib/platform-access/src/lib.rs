//! Authentication, session rotation and role gating for team-pulse.
//!
//! This crate provides:
//! - Accounts and roster entries (`Account`, `TeamMember`)
//! - Flat role-based access control (`Role`, `RoleSet`)
//! - Signed access and refresh tokens (`TokenCodec`)
//! - Storage traits for accounts, roster and sessions, with an in-memory
//!   implementation
//! - Login, refresh and logout orchestration (`AuthService`)
//! - Framework-free request gating (`guard`)
//!
//! # Session model
//!
//! A login issues a short-lived access token and a long-lived refresh token.
//! Only the SHA-256 digest of the refresh token is stored, in a session row
//! whose id is embedded in the token. Refreshing consumes that row and writes
//! a new one, so each refresh token can be used once. Logout deletes one row
//! or all of an account's rows.
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//! use chrono::Duration;
//! use team_pulse_platform_access::{
//!     AuthService, ExternalProfile, MemoryStore, Provider, Role, TeamMember, TokenCodec,
//!     TokenSettings, TeamMemberStore,
//! };
//!
//! # tokio_test_block(async {
//! let store = Arc::new(MemoryStore::new());
//! store
//!     .insert_member(&TeamMember::new("Ana".into(), "ana@x.com".into(), Role::Manager, 40))
//!     .await
//!     .unwrap();
//!
//! let service = AuthService::new(
//!     store.clone(),
//!     store.clone(),
//!     store.clone(),
//!     TokenCodec::new(TokenSettings {
//!         access_secret: "access".into(),
//!         access_ttl: Duration::minutes(15),
//!         refresh_secret: "refresh".into(),
//!         refresh_ttl: Duration::days(7),
//!     }),
//! );
//!
//! let tokens = service
//!     .login(ExternalProfile {
//!         provider: Provider::Google,
//!         subject: "g-1".into(),
//!         email: "ana@x.com".into(),
//!         display_name: Some("Ana".into()),
//!         avatar_url: None,
//!     })
//!     .await
//!     .unwrap();
//! assert_eq!(tokens.user.role, Role::Manager);
//!
//! let rotated = service.refresh(&tokens.refresh_token).await.unwrap();
//! assert!(service.refresh(&tokens.refresh_token).await.is_err());
//! service.logout(rotated.user.id, None).await.unwrap();
//! # });
//! # fn tokio_test_block<F: std::future::Future>(f: F) -> F::Output {
//! #     tokio::runtime::Builder::new_current_thread().build().unwrap().block_on(f)
//! # }
//! ```

pub mod account;
pub mod error;
pub mod guard;
pub mod identity;
pub mod memory;
pub mod role;
pub mod service;
pub mod session;
pub mod store;
pub mod team_member;
pub mod token;

// Re-export main types at crate root
pub use account::{Account, Provider};
pub use error::{AuthError, StoreError};
pub use identity::{ExternalProfile, IdentityResolver, ResolvedIdentity};
pub use memory::MemoryStore;
pub use role::{Role, RoleSet};
pub use service::{AuthService, AuthTokens, AuthUser, CurrentUser};
pub use session::Session;
pub use store::{AccountStore, RosterWrite, SessionStore, StoreResult, TeamMemberStore};
pub use team_member::{DEFAULT_WEEKLY_HOURS, TeamMember};
pub use token::{AccessClaims, RefreshClaims, TokenClaims, TokenCodec, TokenKind, TokenSettings};
