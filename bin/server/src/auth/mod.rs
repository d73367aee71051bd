//! Authentication module for the team-pulse server.
//!
//! This module provides:
//! - Google OAuth login and a development-only shortcut login
//! - Refresh-token rotation and logout over a `refreshToken` cookie
//! - Authentication extractors for Axum routes
//!
//! Access tokens travel in the `Authorization: Bearer` header and are
//! verified without touching the database. Refresh tokens travel in an
//! HttpOnly cookie and are checked against their session row on every use.

pub mod google;
pub mod middleware;
pub mod routes;

use std::sync::Arc;
use team_pulse_platform_access::{AuthService, TeamMemberStore};
use time::Duration as TimeDuration;

use crate::config::{Environment, ServerConfig};

pub use google::{GoogleOAuthClient, GoogleOAuthError};
pub use middleware::{AdminOnly, AdminOrManager, OptionalAuth, RequireAuth, RequireRole};

/// Shared application state.
pub struct AppState {
    /// Login, refresh and logout orchestration.
    pub auth: AuthService,
    /// Roster store for the team-member routes.
    pub team_members: Arc<dyn TeamMemberStore>,
    /// Google OAuth client; `None` when Google login is not configured.
    pub google: Option<GoogleOAuthClient>,
    pub environment: Environment,
    /// Base URL of the frontend that OAuth callbacks redirect to.
    pub frontend_url: String,
    /// Lifetime of the refresh-token cookie.
    pub refresh_cookie_max_age: TimeDuration,
}

impl AppState {
    /// Creates a new application state.
    pub fn new(
        config: &ServerConfig,
        auth: AuthService,
        team_members: Arc<dyn TeamMemberStore>,
        google: Option<GoogleOAuthClient>,
    ) -> Self {
        Self {
            auth,
            team_members,
            google,
            environment: config.environment,
            frontend_url: config.frontend_url.trim_end_matches('/').to_string(),
            refresh_cookie_max_age: TimeDuration::days(config.auth.refresh_token_ttl_days),
        }
    }
}
