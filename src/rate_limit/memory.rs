//! In-memory rate limit backend for single-process operation.
//!
//! State is not persisted across restarts.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use tokio::sync::RwLock;

use super::backend::{RateDecision, RateLimitBackend, RateLimitResult};

/// Tracked clients before expired windows are first pruned.
const PRUNE_THRESHOLD: usize = 10_000;

#[derive(Debug)]
struct WindowEntry {
    started: Instant,
    count: u64,
}

#[derive(Debug)]
struct Windows {
    clients: HashMap<String, WindowEntry>,
    /// Map size that triggers the next prune. Doubles past the live set so
    /// a full map of active windows is not rescanned on every hit.
    prune_at: usize,
}

impl Default for Windows {
    fn default() -> Self {
        Self {
            clients: HashMap::new(),
            prune_at: PRUNE_THRESHOLD,
        }
    }
}

impl Windows {
    fn prune(&mut self, now: Instant, window: Duration) {
        let before = self.clients.len();
        self.clients
            .retain(|_, e| now.duration_since(e.started) < window);
        self.prune_at = PRUNE_THRESHOLD.max(self.clients.len() * 2);
        tracing::debug!(
            "Pruned {} expired rate limit windows, {} active",
            before - self.clients.len(),
            self.clients.len()
        );
    }
}

/// In-memory rate limit backend.
#[derive(Clone, Default)]
pub struct InMemoryRateLimitBackend {
    state: Arc<RwLock<Windows>>,
}

impl InMemoryRateLimitBackend {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl RateLimitBackend for InMemoryRateLimitBackend {
    async fn hit(
        &self,
        client: &str,
        max_requests: u64,
        window: Duration,
    ) -> RateLimitResult<RateDecision> {
        let now = Instant::now();
        let mut state = self.state.write().await;

        if state.clients.len() >= state.prune_at {
            state.prune(now, window);
        }

        let entry = state
            .clients
            .entry(client.to_string())
            .or_insert(WindowEntry {
                started: now,
                count: 0,
            });
        let elapsed = now.duration_since(entry.started);
        if elapsed >= window {
            entry.started = now;
            entry.count = 0;
        }

        if entry.count >= max_requests {
            return Ok(RateDecision::Limited {
                retry_after: window.saturating_sub(now.duration_since(entry.started)),
            });
        }

        entry.count += 1;
        Ok(RateDecision::Allowed {
            remaining: max_requests - entry.count,
        })
    }
}
