//! HTTP error mapping.
//!
//! Every handler and extractor fails with an [`ApiError`], rendered as a JSON
//! body `{"error": "..."}`. Internal details are logged, never returned.

use axum::{
    Json,
    http::{HeaderValue, StatusCode, header},
    response::{IntoResponse, Response},
};
use rootcause::Report;
use serde_json::json;
use std::fmt;
use team_pulse_platform_access::{AuthError, Role, StoreError};

/// Errors surfaced by the HTTP layer.
#[derive(Debug)]
pub enum ApiError {
    /// Authentication or authorization failure from the auth library.
    Auth(AuthError),
    /// Malformed or invalid request input.
    BadRequest { message: String },
    /// The caller may not act on this resource.
    Forbidden { message: String },
    /// The addressed resource does not exist.
    NotFound { message: String },
    /// The write collides with existing data.
    Conflict { message: String },
    /// The client exceeded its request budget for the current window.
    TooManyRequests { retry_after_seconds: u64 },
    /// A feature is disabled by configuration.
    NotConfigured { feature: &'static str },
    /// Anything else; details are logged only.
    Internal { details: String },
}

impl ApiError {
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::BadRequest {
            message: message.into(),
        }
    }

    pub fn forbidden(message: impl Into<String>) -> Self {
        Self::Forbidden {
            message: message.into(),
        }
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::NotFound {
            message: message.into(),
        }
    }

    pub fn conflict(message: impl Into<String>) -> Self {
        Self::Conflict {
            message: message.into(),
        }
    }

    /// Status code this error is rendered with.
    #[must_use]
    pub fn status(&self) -> StatusCode {
        match self {
            Self::Auth(err) => match err {
                AuthError::Unauthorized { .. }
                | AuthError::TokenInvalid { .. }
                | AuthError::TokenExpired
                | AuthError::InvalidRefreshToken => StatusCode::UNAUTHORIZED,
                AuthError::Forbidden { .. } => StatusCode::FORBIDDEN,
                AuthError::AccountConflict { .. } => StatusCode::CONFLICT,
                AuthError::AccountNotFound { .. } => StatusCode::NOT_FOUND,
                AuthError::Signing { .. } | AuthError::Storage { .. } => {
                    StatusCode::INTERNAL_SERVER_ERROR
                }
            },
            Self::BadRequest { .. } => StatusCode::BAD_REQUEST,
            Self::Forbidden { .. } => StatusCode::FORBIDDEN,
            Self::NotFound { .. } => StatusCode::NOT_FOUND,
            Self::Conflict { .. } => StatusCode::CONFLICT,
            Self::TooManyRequests { .. } => StatusCode::TOO_MANY_REQUESTS,
            Self::NotConfigured { .. } => StatusCode::SERVICE_UNAVAILABLE,
            Self::Internal { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Client-facing message.
    #[must_use]
    pub fn message(&self) -> String {
        match self {
            Self::Auth(err) => match err {
                AuthError::Unauthorized { reason } => reason.clone(),
                AuthError::TokenInvalid { .. } => "Invalid token".to_string(),
                AuthError::TokenExpired => "Token expired".to_string(),
                AuthError::InvalidRefreshToken => "Invalid or expired refresh token".to_string(),
                AuthError::Forbidden { .. } => "Insufficient permissions".to_string(),
                AuthError::AccountConflict { .. } => {
                    "Email already registered with a different provider".to_string()
                }
                AuthError::AccountNotFound { .. } => "User not found".to_string(),
                AuthError::Signing { .. } | AuthError::Storage { .. } => {
                    "Internal server error".to_string()
                }
            },
            Self::BadRequest { message }
            | Self::Forbidden { message }
            | Self::NotFound { message }
            | Self::Conflict { message } => message.clone(),
            Self::TooManyRequests { .. } => {
                "Too many requests, please try again later".to_string()
            }
            Self::NotConfigured { feature } => format!("{feature} is not configured"),
            Self::Internal { .. } => "Internal server error".to_string(),
        }
    }
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Auth(err) => write!(f, "{err}"),
            Self::Internal { details } => write!(f, "internal error: {details}"),
            other => write!(f, "{}", other.message()),
        }
    }
}

impl std::error::Error for ApiError {}

impl From<AuthError> for ApiError {
    fn from(err: AuthError) -> Self {
        Self::Auth(err)
    }
}

impl From<Report<StoreError>> for ApiError {
    fn from(report: Report<StoreError>) -> Self {
        Self::Internal {
            details: report.to_string(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!(error = %self, "request failed");
        } else {
            tracing::debug!(error = %self, status = %status, "request rejected");
        }

        let body = match &self {
            Self::Auth(AuthError::Forbidden { required, actual }) => json!({
                "error": self.message(),
                "required": required.iter().map(Role::as_str).collect::<Vec<_>>(),
                "current": actual.as_str(),
            }),
            _ => json!({ "error": self.message() }),
        };

        let mut response = (status, Json(body)).into_response();
        if let Self::TooManyRequests {
            retry_after_seconds,
        } = self
        {
            response
                .headers_mut()
                .insert(header::RETRY_AFTER, HeaderValue::from(retry_after_seconds));
        }
        response
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::to_bytes;
    use team_pulse_core::AccountId;

    async fn render(err: ApiError) -> (StatusCode, serde_json::Value) {
        let response = err.into_response();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[tokio::test]
    async fn token_failures_are_unauthorized() {
        let (status, body) = render(AuthError::TokenExpired.into()).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["error"], "Token expired");

        let (status, body) = render(
            AuthError::TokenInvalid {
                reason: "InvalidSignature".into(),
            }
            .into(),
        )
        .await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["error"], "Invalid token");

        let (status, _) = render(AuthError::InvalidRefreshToken.into()).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn forbidden_lists_required_and_current_roles() {
        let (status, body) = render(
            AuthError::Forbidden {
                required: vec![Role::Admin, Role::Manager],
                actual: Role::Member,
            }
            .into(),
        )
        .await;

        assert_eq!(status, StatusCode::FORBIDDEN);
        assert_eq!(body["error"], "Insufficient permissions");
        assert_eq!(body["required"], json!(["admin", "manager"]));
        assert_eq!(body["current"], "member");
    }

    #[tokio::test]
    async fn internal_details_are_not_leaked() {
        let (status, body) = render(
            AuthError::Storage {
                details: "password authentication failed for user pulse".into(),
            }
            .into(),
        )
        .await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body["error"], "Internal server error");
    }

    #[tokio::test]
    async fn conflicts_and_missing_accounts_map_to_client_errors() {
        let (status, _) = render(
            AuthError::AccountConflict {
                email: "a@x.com".into(),
            }
            .into(),
        )
        .await;
        assert_eq!(status, StatusCode::CONFLICT);

        let (status, _) = render(
            AuthError::AccountNotFound {
                account_id: AccountId::new(),
            }
            .into(),
        )
        .await;
        assert_eq!(status, StatusCode::NOT_FOUND);

        let (status, body) = render(ApiError::bad_request("Refresh token required")).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "Refresh token required");
    }

    #[tokio::test]
    async fn rate_limited_response_carries_retry_after() {
        let response = ApiError::TooManyRequests {
            retry_after_seconds: 42,
        }
        .into_response();
        assert_eq!(response.status(), StatusCode::TOO_MANY_REQUESTS);
        assert_eq!(response.headers()[header::RETRY_AFTER], "42");
    }
}
