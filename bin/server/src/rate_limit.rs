//! Fixed-window request limiting per client address.

use axum::{
    extract::{ConnectInfo, Request, State},
    middleware::Next,
    response::Response,
};
use chrono::{DateTime, Duration, Utc};
use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::{Arc, Mutex, PoisonError};

use crate::error::ApiError;

/// Tracked clients beyond which finished windows are dropped.
const PRUNE_THRESHOLD: usize = 10_000;

/// Result of a rate limit check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RateLimitResult {
    /// Request is allowed.
    Allowed { remaining: u32 },
    /// Budget for the current window is spent.
    Exceeded { retry_after: Duration },
}

impl RateLimitResult {
    #[must_use]
    pub fn is_allowed(&self) -> bool {
        matches!(self, Self::Allowed { .. })
    }
}

#[derive(Debug, Clone)]
struct WindowState {
    count: u32,
    window_start: DateTime<Utc>,
}

/// Counts requests per client key over fixed windows.
#[derive(Debug)]
pub struct RateLimiter {
    max_requests: u32,
    window: Duration,
    /// Read the client from `X-Forwarded-For` (behind a reverse proxy).
    trust_forwarded: bool,
    state: Mutex<HashMap<String, WindowState>>,
}

impl RateLimiter {
    #[must_use]
    pub fn new(max_requests: u32, window: std::time::Duration, trust_forwarded: bool) -> Self {
        Self {
            max_requests,
            window: Duration::from_std(window).unwrap_or_else(|_| Duration::days(365)),
            trust_forwarded,
            state: Mutex::new(HashMap::new()),
        }
    }

    /// Records a request for `key` and reports whether it fits the budget.
    pub fn check(&self, key: &str) -> RateLimitResult {
        self.check_at(key, Utc::now())
    }

    fn check_at(&self, key: &str, now: DateTime<Utc>) -> RateLimitResult {
        let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);

        if state.len() >= PRUNE_THRESHOLD {
            let window = self.window;
            state.retain(|_, w| now - w.window_start < window);
        }

        let window_state = state.entry(key.to_string()).or_insert(WindowState {
            count: 0,
            window_start: now,
        });
        if now - window_state.window_start >= self.window {
            window_state.window_start = now;
            window_state.count = 0;
        }

        if window_state.count >= self.max_requests {
            return RateLimitResult::Exceeded {
                retry_after: window_state.window_start + self.window - now,
            };
        }
        window_state.count += 1;
        RateLimitResult::Allowed {
            remaining: self.max_requests - window_state.count,
        }
    }

    fn client_key(&self, request: &Request) -> String {
        if self.trust_forwarded
            && let Some(forwarded) = request
                .headers()
                .get("x-forwarded-for")
                .and_then(|value| value.to_str().ok())
                .and_then(|value| value.split(',').next())
                .map(str::trim)
                .filter(|value| !value.is_empty())
        {
            return forwarded.to_string();
        }
        request
            .extensions()
            .get::<ConnectInfo<SocketAddr>>()
            .map_or_else(|| "unknown".to_string(), |info| info.0.ip().to_string())
    }
}

/// Middleware rejecting requests over the limiter's budget with 429.
pub async fn limit_requests(
    State(limiter): State<Arc<RateLimiter>>,
    request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let key = limiter.client_key(&request);
    match limiter.check(&key) {
        RateLimitResult::Allowed { .. } => Ok(next.run(request).await),
        RateLimitResult::Exceeded { retry_after } => {
            tracing::warn!(client = %key, "rate limit exceeded");
            Err(ApiError::TooManyRequests {
                retry_after_seconds: u64::try_from(retry_after.num_seconds().max(1))
                    .unwrap_or(1),
            })
        }
    }
}
