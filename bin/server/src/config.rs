//! Centralized server configuration.
//!
//! Loaded via the `config` crate from environment variables, with `__`
//! separating nested keys (`AUTH__ACCESS_TOKEN_SECRET`,
//! `SESSION__CLEANUP_INTERVAL_SECONDS`, `RATE_LIMIT__MAX_AUTH_REQUESTS`).

use chrono::Duration;
use serde::Deserialize;
use std::fmt;
use team_pulse_platform_access::TokenSettings;

/// Deployment environment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    #[default]
    Development,
    Test,
    Production,
}

impl Environment {
    /// Cookies carry the Secure flag only in production.
    #[must_use]
    pub fn secure_cookies(self) -> bool {
        self == Self::Production
    }
}

/// Server configuration composed from library configs.
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// PostgreSQL database connection URL.
    pub database_url: String,

    #[serde(default = "default_listen_addr")]
    pub listen_addr: String,

    #[serde(default)]
    pub environment: Environment,

    /// Base URL of the single-page frontend that OAuth redirects land on.
    #[serde(default = "default_frontend_url")]
    pub frontend_url: String,

    #[serde(default = "default_request_timeout_seconds")]
    pub request_timeout_seconds: u64,

    /// Largest accepted request body, in bytes.
    #[serde(default = "default_max_body_bytes")]
    pub max_body_bytes: usize,

    pub auth: AuthConfig,

    #[serde(default)]
    pub google: GoogleOAuthConfig,

    #[serde(default)]
    pub session: SessionConfig,

    #[serde(default)]
    pub rate_limit: RateLimitConfig,
}

/// Token secrets and lifetimes.
#[derive(Clone, Deserialize)]
pub struct AuthConfig {
    pub access_token_secret: String,

    #[serde(default = "default_access_token_ttl_minutes")]
    pub access_token_ttl_minutes: i64,

    pub refresh_token_secret: String,

    #[serde(default = "default_refresh_token_ttl_days")]
    pub refresh_token_ttl_days: i64,
}

impl AuthConfig {
    #[must_use]
    pub fn token_settings(&self) -> TokenSettings {
        TokenSettings {
            access_secret: self.access_token_secret.clone(),
            access_ttl: Duration::minutes(self.access_token_ttl_minutes),
            refresh_secret: self.refresh_token_secret.clone(),
            refresh_ttl: Duration::days(self.refresh_token_ttl_days),
        }
    }
}

impl fmt::Debug for AuthConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AuthConfig")
            .field("access_token_secret", &"[REDACTED]")
            .field("access_token_ttl_minutes", &self.access_token_ttl_minutes)
            .field("refresh_token_secret", &"[REDACTED]")
            .field("refresh_token_ttl_days", &self.refresh_token_ttl_days)
            .finish()
    }
}

/// Google OAuth client credentials.
///
/// Google login is disabled unless all three are set.
#[derive(Clone, Default, Deserialize)]
pub struct GoogleOAuthConfig {
    pub client_id: Option<String>,
    pub client_secret: Option<String>,
    pub redirect_url: Option<String>,
}

impl fmt::Debug for GoogleOAuthConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GoogleOAuthConfig")
            .field("client_id", &self.client_id)
            .field(
                "client_secret",
                &self.client_secret.as_ref().map(|_| "[REDACTED]"),
            )
            .field("redirect_url", &self.redirect_url)
            .finish()
    }
}

/// Session-related configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct SessionConfig {
    /// Interval between expired-session sweeps, in seconds.
    #[serde(default = "default_cleanup_interval_seconds")]
    pub cleanup_interval_seconds: u64,
}

/// Per-client request budgets over a fixed window.
#[derive(Debug, Clone, Deserialize)]
pub struct RateLimitConfig {
    #[serde(default = "default_rate_limit_window_seconds")]
    pub window_seconds: u64,

    /// Budget across all routes.
    #[serde(default = "default_max_requests")]
    pub max_requests: u32,

    /// Separate, tighter budget for the `/api/auth` routes.
    #[serde(default = "default_max_auth_requests")]
    pub max_auth_requests: u32,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            window_seconds: default_rate_limit_window_seconds(),
            max_requests: default_max_requests(),
            max_auth_requests: default_max_auth_requests(),
        }
    }
}

fn default_listen_addr() -> String {
    "0.0.0.0:3001".to_string()
}

fn default_frontend_url() -> String {
    "http://localhost:5173".to_string()
}

fn default_request_timeout_seconds() -> u64 {
    30
}

fn default_max_body_bytes() -> usize {
    10 * 1024
}

fn default_rate_limit_window_seconds() -> u64 {
    15 * 60
}

fn default_max_requests() -> u32 {
    100
}

fn default_max_auth_requests() -> u32 {
    20
}

fn default_access_token_ttl_minutes() -> i64 {
    15
}

fn default_refresh_token_ttl_days() -> i64 {
    7
}

fn default_cleanup_interval_seconds() -> u64 {
    3600
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            cleanup_interval_seconds: default_cleanup_interval_seconds(),
        }
    }
}

impl ServerConfig {
    /// Loads configuration from environment variables.
    ///
    /// # Errors
    ///
    /// Returns an error if required configuration is missing or invalid.
    pub fn from_env() -> Result<Self, config::ConfigError> {
        config::Config::builder()
            .add_source(
                config::Environment::default()
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?
            .try_deserialize()
    }
}
