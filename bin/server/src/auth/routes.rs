//! Authentication routes.
//!
//! - `GET /api/auth/google` and `GET /api/auth/google/callback`: OAuth login
//! - `POST /api/auth/dev-login`: login by email, development only
//! - `POST /api/auth/refresh`: rotate the refresh token
//! - `POST /api/auth/logout`: revoke one or all sessions
//! - `GET /api/auth/me`: current user

use axum::{
    Json,
    body::Bytes,
    extract::{Query, State},
    response::{IntoResponse, Redirect, Response},
};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use reqwest::Url;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use team_pulse_platform_access::{
    AuthError, AuthTokens, AuthUser, CurrentUser, ExternalProfile, Provider,
};
use time::Duration as TimeDuration;
use tracing::{info, warn};
use validator::Validate;

use super::{AppState, RequireAuth, google::GoogleAuthState};
use crate::config::Environment;
use crate::error::ApiError;

/// Refresh token cookie name.
pub const REFRESH_COOKIE: &str = "refreshToken";

/// Auth state cookie name (for CSRF protection during the OAuth flow).
const GOOGLE_STATE_COOKIE: &str = "google_auth_state";

/// Body returned by login and refresh.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenResponse {
    pub access_token: String,
    pub user: AuthUser,
}

#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: &'static str,
}

/// Query parameters for the OAuth callback.
#[derive(Debug, Deserialize)]
pub struct GoogleCallbackQuery {
    code: Option<String>,
    state: Option<String>,
    error: Option<String>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct DevLoginRequest {
    #[serde(default)]
    #[validate(email(message = "Invalid email"))]
    email: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RefreshRequest {
    refresh_token: Option<String>,
}

fn refresh_cookie(state: &AppState, token: String) -> Cookie<'static> {
    Cookie::build((REFRESH_COOKIE, token))
        .path("/")
        .http_only(true)
        .secure(state.environment.secure_cookies())
        .same_site(SameSite::Lax)
        .max_age(state.refresh_cookie_max_age)
        .build()
}

fn expired_cookie(name: &'static str, state: &AppState) -> Cookie<'static> {
    Cookie::build((name, ""))
        .path("/")
        .http_only(true)
        .secure(state.environment.secure_cookies())
        .same_site(SameSite::Lax)
        .max_age(TimeDuration::ZERO)
        .build()
}

/// Builds `{frontend_url}{path}?{key}={value}` with proper encoding.
fn frontend_redirect(
    state: &AppState,
    path: &str,
    key: &str,
    value: &str,
) -> Result<Redirect, ApiError> {
    let url = Url::parse_with_params(&format!("{}{path}", state.frontend_url), &[(key, value)])
        .map_err(|e| ApiError::Internal {
            details: format!("invalid frontend URL '{}': {e}", state.frontend_url),
        })?;
    Ok(Redirect::to(url.as_str()))
}

fn token_response(
    state: &AppState,
    jar: CookieJar,
    tokens: AuthTokens,
) -> (CookieJar, Json<TokenResponse>) {
    let jar = jar.add(refresh_cookie(state, tokens.refresh_token));
    (
        jar,
        Json(TokenResponse {
            access_token: tokens.access_token,
            user: tokens.user,
        }),
    )
}

/// Initiates Google login by redirecting to the consent screen.
pub async fn google_start(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
) -> Result<impl IntoResponse, ApiError> {
    let client = state.google.as_ref().ok_or(ApiError::NotConfigured {
        feature: "Google login",
    })?;
    let (auth_url, auth_state) = client.authorization_url().map_err(|e| ApiError::Internal {
        details: e.to_string(),
    })?;

    let auth_state_json = serde_json::to_string(&auth_state).map_err(|e| ApiError::Internal {
        details: format!("serialize auth state: {e}"),
    })?;

    let cookie = Cookie::build((GOOGLE_STATE_COOKIE, auth_state_json))
        .path("/")
        .http_only(true)
        .secure(state.environment.secure_cookies())
        .same_site(SameSite::Lax)
        .max_age(TimeDuration::minutes(10));

    Ok((jar.add(cookie), Redirect::to(&auth_url)))
}

/// Handles the redirect back from Google.
///
/// Always answers with a redirect to the frontend: `/auth/callback?token=…`
/// on success, `/auth/error?message=…` on failure.
pub async fn google_callback(
    State(state): State<Arc<AppState>>,
    Query(query): Query<GoogleCallbackQuery>,
    jar: CookieJar,
) -> Result<Response, ApiError> {
    let jar_without_state = jar.clone().add(expired_cookie(GOOGLE_STATE_COOKIE, &state));

    match complete_google_login(&state, &query, &jar).await {
        Ok(tokens) => {
            let redirect =
                frontend_redirect(&state, "/auth/callback", "token", &tokens.access_token)?;
            let jar = jar_without_state.add(refresh_cookie(&state, tokens.refresh_token));
            Ok((jar, redirect).into_response())
        }
        Err(message) => {
            warn!(error = %message, "Google login failed");
            let redirect = frontend_redirect(&state, "/auth/error", "message", &message)?;
            Ok((jar_without_state, redirect).into_response())
        }
    }
}

async fn complete_google_login(
    state: &AppState,
    query: &GoogleCallbackQuery,
    jar: &CookieJar,
) -> Result<AuthTokens, String> {
    if let Some(error) = &query.error {
        return Err(format!("Google returned an error: {error}"));
    }
    let client = state
        .google
        .as_ref()
        .ok_or_else(|| "Google login is not configured".to_string())?;
    let (Some(code), Some(returned_state)) = (&query.code, &query.state) else {
        return Err("Authentication failed".to_string());
    };

    let auth_state: GoogleAuthState = jar
        .get(GOOGLE_STATE_COOKIE)
        .and_then(|cookie| serde_json::from_str(cookie.value()).ok())
        .ok_or_else(|| "Missing or invalid auth state".to_string())?;
    if *returned_state != auth_state.csrf_token {
        return Err("CSRF token mismatch".to_string());
    }

    let profile = client
        .exchange_code(code, &auth_state.pkce_verifier)
        .await
        .map_err(|e| e.to_string())?;

    state.auth.login(profile).await.map_err(|e| {
        if matches!(e, AuthError::AccountConflict { .. }) {
            ApiError::from(e).message()
        } else {
            warn!(error = %e, "login after Google callback failed");
            "Authentication failed".to_string()
        }
    })
}

/// Logs in by email without OAuth. Only available in development.
pub async fn dev_login(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
    Json(body): Json<DevLoginRequest>,
) -> Result<impl IntoResponse, ApiError> {
    if state.environment != Environment::Development {
        return Err(ApiError::not_found("Not found"));
    }
    body.validate()
        .map_err(|e| ApiError::bad_request(e.to_string()))?;
    let email = body
        .email
        .filter(|email| !email.is_empty())
        .ok_or_else(|| ApiError::bad_request("Email required"))?;

    let display_name = email.split('@').next().map(str::to_string);
    let tokens = state
        .auth
        .login(ExternalProfile {
            provider: Provider::Google,
            subject: format!("dev-{email}"),
            email,
            display_name,
            avatar_url: None,
        })
        .await?;

    info!(account_id = %tokens.user.id, "development login");
    Ok(token_response(&state, jar, tokens))
}

/// Rotates the refresh token taken from the cookie or the JSON body.
pub async fn refresh(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
    body: Bytes,
) -> Result<impl IntoResponse, ApiError> {
    let from_cookie = jar
        .get(REFRESH_COOKIE)
        .map(|cookie| cookie.value().to_string())
        .filter(|token| !token.is_empty());
    let token = match from_cookie {
        Some(token) => Some(token),
        None if body.is_empty() => None,
        None => serde_json::from_slice::<RefreshRequest>(&body)
            .unwrap_or_default()
            .refresh_token,
    }
    .filter(|token| !token.is_empty())
    .ok_or_else(|| ApiError::bad_request("Refresh token required"))?;

    let tokens = state.auth.refresh(&token).await?;
    Ok(token_response(&state, jar, tokens))
}

/// Revokes the session behind the refresh cookie, or every session of the
/// caller when no cookie is present.
pub async fn logout(
    State(state): State<Arc<AppState>>,
    RequireAuth(claims): RequireAuth,
    jar: CookieJar,
) -> Result<impl IntoResponse, ApiError> {
    let refresh_token = jar
        .get(REFRESH_COOKIE)
        .map(|cookie| cookie.value().to_string())
        .filter(|token| !token.is_empty());

    state
        .auth
        .logout(claims.sub, refresh_token.as_deref())
        .await?;

    Ok((
        jar.add(expired_cookie(REFRESH_COOKIE, &state)),
        Json(MessageResponse {
            message: "Logged out successfully",
        }),
    ))
}

/// Returns the signed-in user.
pub async fn me(
    State(state): State<Arc<AppState>>,
    RequireAuth(claims): RequireAuth,
) -> Result<Json<CurrentUser>, ApiError> {
    Ok(Json(state.auth.current_user(claims.sub).await?))
}
