//! Per-client rate limiting for the webhook.
//!
//! A fixed window per client address: at most `max_requests` deliveries
//! per `window`, default 1000 per hour. Backends are pluggable; the
//! in-memory one is used by the server.

mod backend;
mod memory;

use std::sync::Arc;
use std::time::Duration;

pub use backend::{RateDecision, RateLimitBackend, RateLimitError, RateLimitResult};
pub use memory::InMemoryRateLimitBackend;

use crate::config::Settings;

/// Webhook rate limiter.
#[derive(Clone)]
pub struct RateLimiter {
    backend: Arc<dyn RateLimitBackend>,
    max_requests: u64,
    window: Duration,
}

impl RateLimiter {
    pub fn new(backend: Arc<dyn RateLimitBackend>, max_requests: u64, window: Duration) -> Self {
        Self {
            backend,
            max_requests,
            window,
        }
    }

    /// In-memory limiter using the configured limits.
    pub fn from_settings(settings: &Settings) -> Self {
        Self::new(
            Arc::new(InMemoryRateLimitBackend::new()),
            settings.rate_limit_max_requests,
            settings.rate_limit_window,
        )
    }

    /// Count a request from `client`. Backend failures let the request
    /// through.
    pub async fn check(&self, client: &str) -> RateDecision {
        match self
            .backend
            .hit(client, self.max_requests, self.window)
            .await
        {
            Ok(decision) => decision,
            Err(e) => {
                tracing::warn!("Rate limit backend failed, allowing request: {}", e);
                RateDecision::Allowed { remaining: 0 }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;

    struct Broken;

    #[async_trait]
    impl RateLimitBackend for Broken {
        async fn hit(&self, _: &str, _: u64, _: Duration) -> RateLimitResult<RateDecision> {
            Err(RateLimitError::Unavailable("down".into()))
        }
    }

    #[tokio::test]
    async fn test_settings_limits_are_applied() {
        let settings = Settings {
            rate_limit_max_requests: 1,
            ..Default::default()
        };
        let limiter = RateLimiter::from_settings(&settings);
        assert!(limiter.check("10.0.0.1").await.is_allowed());
        match limiter.check("10.0.0.1").await {
            RateDecision::Limited { retry_after } => {
                assert!(retry_after <= Duration::from_secs(3600))
            }
            other => panic!("expected limit, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_backend_failure_fails_open() {
        let limiter = RateLimiter::new(Arc::new(Broken), 1, Duration::from_secs(1));
        assert!(limiter.check("x").await.is_allowed());
    }
}
