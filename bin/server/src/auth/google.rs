//! Google OAuth 2.0 login.
//!
//! Authorization-code flow with PKCE. The callback exchanges the code for an
//! access token and reads the user's profile from the userinfo endpoint; the
//! result is an [`ExternalProfile`] ready for the auth service.

use oauth2::{
    AuthUrl, AuthorizationCode, ClientId, ClientSecret, CsrfToken, PkceCodeChallenge,
    PkceCodeVerifier, RedirectUrl, Scope, TokenResponse, TokenUrl, basic::BasicClient,
};
use serde::{Deserialize, Serialize};
use std::fmt;
use team_pulse_platform_access::{ExternalProfile, Provider};

use crate::config::GoogleOAuthConfig;

/// Google OAuth authorization URL.
const GOOGLE_AUTH_URL: &str = "https://accounts.google.com/o/oauth2/v2/auth";

/// Google OAuth token URL.
const GOOGLE_TOKEN_URL: &str = "https://oauth2.googleapis.com/token";

/// OpenID Connect userinfo endpoint.
const GOOGLE_USERINFO_URL: &str = "https://openidconnect.googleapis.com/v1/userinfo";

const LOGIN_SCOPES: &[&str] = &["openid", "email", "profile"];

/// Google OAuth client configuration.
#[derive(Clone)]
pub struct GoogleOAuthClient {
    client_id: String,
    client_secret: String,
    redirect_url: String,
}

impl fmt::Debug for GoogleOAuthClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GoogleOAuthClient")
            .field("client_id", &self.client_id)
            .field("redirect_url", &self.redirect_url)
            .finish_non_exhaustive()
    }
}

impl GoogleOAuthClient {
    /// Creates a client from configuration.
    ///
    /// # Errors
    ///
    /// Returns [`GoogleOAuthError::NotConfigured`] unless client id, secret
    /// and redirect URL are all set, and [`GoogleOAuthError::Configuration`]
    /// for an unparseable redirect URL.
    pub fn new(config: &GoogleOAuthConfig) -> Result<Self, GoogleOAuthError> {
        let client_id = config
            .client_id
            .clone()
            .ok_or(GoogleOAuthError::NotConfigured)?;
        let client_secret = config
            .client_secret
            .clone()
            .ok_or(GoogleOAuthError::NotConfigured)?;
        let redirect_url = config
            .redirect_url
            .clone()
            .ok_or(GoogleOAuthError::NotConfigured)?;

        RedirectUrl::new(redirect_url.clone())
            .map_err(|e| GoogleOAuthError::Configuration(format!("invalid redirect URL: {e}")))?;

        Ok(Self {
            client_id,
            client_secret,
            redirect_url,
        })
    }

    fn urls(&self) -> Result<(AuthUrl, TokenUrl, RedirectUrl), GoogleOAuthError> {
        let auth_url = AuthUrl::new(GOOGLE_AUTH_URL.to_string())
            .map_err(|e| GoogleOAuthError::Configuration(format!("invalid auth URL: {e}")))?;
        let token_url = TokenUrl::new(GOOGLE_TOKEN_URL.to_string())
            .map_err(|e| GoogleOAuthError::Configuration(format!("invalid token URL: {e}")))?;
        let redirect_url = RedirectUrl::new(self.redirect_url.clone())
            .map_err(|e| GoogleOAuthError::Configuration(format!("invalid redirect URL: {e}")))?;
        Ok((auth_url, token_url, redirect_url))
    }

    /// Generates the URL to send the browser to, plus the state to keep in a
    /// cookie until the callback.
    ///
    /// # Errors
    ///
    /// Returns [`GoogleOAuthError::Configuration`] if a URL fails to parse.
    pub fn authorization_url(&self) -> Result<(String, GoogleAuthState), GoogleOAuthError> {
        let (auth_url, _, redirect_url) = self.urls()?;
        let client = BasicClient::new(ClientId::new(self.client_id.clone()))
            .set_client_secret(ClientSecret::new(self.client_secret.clone()))
            .set_auth_uri(auth_url)
            .set_redirect_uri(redirect_url);

        let (pkce_challenge, pkce_verifier) = PkceCodeChallenge::new_random_sha256();

        let mut auth_request = client
            .authorize_url(CsrfToken::new_random)
            .set_pkce_challenge(pkce_challenge);
        for scope in LOGIN_SCOPES {
            auth_request = auth_request.add_scope(Scope::new((*scope).to_string()));
        }

        let (url, csrf_token) = auth_request.url();

        let state = GoogleAuthState {
            csrf_token: csrf_token.secret().clone(),
            pkce_verifier: pkce_verifier.secret().clone(),
        };

        Ok((url.to_string(), state))
    }

    /// Exchanges the authorization code and loads the Google profile.
    ///
    /// # Errors
    ///
    /// Returns [`GoogleOAuthError::TokenExchange`] if Google rejects the code,
    /// [`GoogleOAuthError::Profile`] if the profile cannot be read or has no
    /// email.
    pub async fn exchange_code(
        &self,
        code: &str,
        pkce_verifier: &str,
    ) -> Result<ExternalProfile, GoogleOAuthError> {
        let http_client = reqwest::Client::builder()
            .redirect(reqwest::redirect::Policy::none())
            .build()
            .map_err(|e| GoogleOAuthError::TokenExchange(format!("HTTP client error: {e}")))?;

        let (_, token_url, redirect_url) = self.urls()?;
        let client = BasicClient::new(ClientId::new(self.client_id.clone()))
            .set_client_secret(ClientSecret::new(self.client_secret.clone()))
            .set_token_uri(token_url)
            .set_redirect_uri(redirect_url);

        let token = client
            .exchange_code(AuthorizationCode::new(code.to_string()))
            .set_pkce_verifier(PkceCodeVerifier::new(pkce_verifier.to_string()))
            .request_async(&http_client)
            .await
            .map_err(|e| GoogleOAuthError::TokenExchange(format!("token exchange failed: {e}")))?;

        let info: GoogleUserInfo = http_client
            .get(GOOGLE_USERINFO_URL)
            .bearer_auth(token.access_token().secret())
            .send()
            .await
            .and_then(reqwest::Response::error_for_status)
            .map_err(|e| GoogleOAuthError::Profile(format!("userinfo request failed: {e}")))?
            .json()
            .await
            .map_err(|e| GoogleOAuthError::Profile(format!("invalid userinfo response: {e}")))?;

        info.into_profile()
    }
}

/// Profile fields returned by the userinfo endpoint.
#[derive(Debug, Deserialize)]
struct GoogleUserInfo {
    sub: String,
    email: Option<String>,
    name: Option<String>,
    picture: Option<String>,
}

impl GoogleUserInfo {
    fn into_profile(self) -> Result<ExternalProfile, GoogleOAuthError> {
        let email = self
            .email
            .filter(|email| !email.is_empty())
            .ok_or_else(|| GoogleOAuthError::Profile("No email found in Google profile".into()))?;
        Ok(ExternalProfile {
            provider: Provider::Google,
            subject: self.sub,
            email,
            display_name: self.name,
            avatar_url: self.picture,
        })
    }
}

/// State kept in a cookie between redirect and callback.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GoogleAuthState {
    pub csrf_token: String,
    pub pkce_verifier: String,
}

/// Google OAuth errors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GoogleOAuthError {
    /// Google OAuth is not configured.
    NotConfigured,
    /// Configuration error.
    Configuration(String),
    /// Token exchange failed.
    TokenExchange(String),
    /// Profile lookup failed or lacked required fields.
    Profile(String),
}

impl fmt::Display for GoogleOAuthError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotConfigured => write!(f, "Google login is not configured"),
            Self::Configuration(msg) => write!(f, "configuration error: {msg}"),
            Self::TokenExchange(msg) => write!(f, "{msg}"),
            Self::Profile(msg) => write!(f, "{msg}"),
        }
    }
}

impl std::error::Error for GoogleOAuthError {}
