//! Request gating.
//!
//! Framework-free checks shared by the HTTP extractors: pull a bearer token
//! from an `Authorization` value, verify it, and compare the caller's role
//! against an allowed set.

use crate::error::AuthError;
use crate::role::RoleSet;
use crate::token::{AccessClaims, TokenCodec};

const BEARER_PREFIX: &str = "Bearer ";

/// Extracts the token from an `Authorization: Bearer <token>` value.
///
/// # Errors
///
/// Returns [`AuthError::Unauthorized`] if the header is absent, uses another
/// scheme or carries an empty token.
pub fn bearer_token(header: Option<&str>) -> Result<&str, AuthError> {
    let header = header.ok_or_else(|| AuthError::Unauthorized {
        reason: "No token provided".to_string(),
    })?;
    match header.strip_prefix(BEARER_PREFIX).map(str::trim) {
        Some(token) if !token.is_empty() => Ok(token),
        _ => Err(AuthError::Unauthorized {
            reason: "No token provided".to_string(),
        }),
    }
}

/// Verifies the bearer access token in an `Authorization` value.
///
/// # Errors
///
/// Returns [`AuthError::Unauthorized`] for a missing or malformed header,
/// [`AuthError::TokenExpired`] and [`AuthError::TokenInvalid`] from the codec.
pub fn authenticate(codec: &TokenCodec, header: Option<&str>) -> Result<AccessClaims, AuthError> {
    let token = bearer_token(header)?;
    codec.verify(token)
}

/// Like [`authenticate`], but any failure means "anonymous".
#[must_use]
pub fn authenticate_optional(codec: &TokenCodec, header: Option<&str>) -> Option<AccessClaims> {
    authenticate(codec, header).ok()
}

/// Checks that the caller's role is in the allowed set.
///
/// Roles are flat: admin does not imply manager.
///
/// # Errors
///
/// Returns [`AuthError::Forbidden`] naming the allowed roles and the
/// caller's role.
pub fn authorize(claims: &AccessClaims, allowed: &RoleSet) -> Result<(), AuthError> {
    if allowed.contains(claims.role) {
        Ok(())
    } else {
        Err(AuthError::Forbidden {
            required: allowed.roles().to_vec(),
            actual: claims.role,
        })
    }
}
