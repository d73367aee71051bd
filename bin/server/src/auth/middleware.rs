//! Authentication extractors for Axum.
//!
//! Handlers declare what they need by argument type: [`RequireAuth`] for any
//! signed-in caller, [`RequireRole`] for a specific role set, [`OptionalAuth`]
//! when anonymous callers are fine.

use axum::{
    extract::{FromRef, FromRequestParts},
    http::{header::AUTHORIZATION, request::Parts},
};
use std::marker::PhantomData;
use std::sync::Arc;
use team_pulse_platform_access::{AccessClaims, RoleSet, guard};

use super::AppState;
use crate::error::ApiError;

fn authorization_header(parts: &Parts) -> Option<&str> {
    parts
        .headers
        .get(AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
}

/// Extractor for requiring a valid access token.
pub struct RequireAuth(pub AccessClaims);

impl<S> FromRequestParts<S> for RequireAuth
where
    Arc<AppState>: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let app_state = Arc::<AppState>::from_ref(state);
        let header = authorization_header(parts);
        let claims = guard::authenticate(app_state.auth.codec(), header)?;
        Ok(RequireAuth(claims))
    }
}

/// Extractor for optionally reading the caller's claims.
///
/// Missing, invalid and expired tokens all yield `None`.
pub struct OptionalAuth(pub Option<AccessClaims>);

impl<S> FromRequestParts<S> for OptionalAuth
where
    Arc<AppState>: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let app_state = Arc::<AppState>::from_ref(state);
        let header = authorization_header(parts);
        Ok(OptionalAuth(guard::authenticate_optional(
            app_state.auth.codec(),
            header,
        )))
    }
}

/// A set of roles a route accepts.
pub trait RoleRequirement: Send + Sync + 'static {
    fn allowed() -> RoleSet;
}

/// Only administrators.
pub struct AdminOnly;

impl RoleRequirement for AdminOnly {
    fn allowed() -> RoleSet {
        RoleSet::admin_only()
    }
}

/// Administrators or managers.
pub struct AdminOrManager;

impl RoleRequirement for AdminOrManager {
    fn allowed() -> RoleSet {
        RoleSet::admin_or_manager()
    }
}

/// Extractor for requiring a valid access token whose role is in `R`.
pub struct RequireRole<R: RoleRequirement>(pub AccessClaims, PhantomData<R>);

impl<R: RoleRequirement> RequireRole<R> {
    #[must_use]
    pub fn claims(&self) -> &AccessClaims {
        &self.0
    }
}

impl<S, R> FromRequestParts<S> for RequireRole<R>
where
    Arc<AppState>: FromRef<S>,
    S: Send + Sync,
    R: RoleRequirement,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let RequireAuth(claims) = RequireAuth::from_request_parts(parts, state).await?;
        guard::authorize(&claims, &R::allowed())?;
        Ok(RequireRole(claims, PhantomData))
    }
}
