//! Pluggable storage for webhook request counters.

use std::time::Duration;

use async_trait::async_trait;

/// Result type for rate limit operations.
pub type RateLimitResult<T> = Result<T, RateLimitError>;

/// Errors from rate limit backend operations.
#[derive(Debug, thiserror::Error)]
pub enum RateLimitError {
    #[error("Backend unavailable: {0}")]
    Unavailable(String),
}

/// Outcome of counting one request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RateDecision {
    Allowed { remaining: u64 },
    Limited { retry_after: Duration },
}

impl RateDecision {
    pub fn is_allowed(&self) -> bool {
        matches!(self, RateDecision::Allowed { .. })
    }
}

/// Fixed-window request counter keyed by client.
#[async_trait]
pub trait RateLimitBackend: Send + Sync {
    /// Count one request from `client`. Requests beyond `max_requests` in
    /// the current window are refused and not counted.
    async fn hit(
        &self,
        client: &str,
        max_requests: u64,
        window: Duration,
    ) -> RateLimitResult<RateDecision>;
}
