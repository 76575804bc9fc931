//! Client for the ClickRank platform API.
//!
//! Two endpoints are used: `subscription` registers the webhook URL and
//! `sync` pulls pending optimizations. Both are JSON POSTs with bearer
//! authorization and share one retry policy.

mod retry;

pub use retry::RetryPolicy;

use std::time::Duration;

use reqwest::Client;
use serde::Serialize;
use tracing::{debug, info};

use crate::config::Settings;
use crate::error::{SyncError, SyncResult};

/// A 2xx response from the platform.
#[derive(Debug, Clone)]
pub struct ApiResponse {
    pub status: u16,
    pub body: String,
}

impl ApiResponse {
    /// Body parsed as JSON, or `None` when empty or not JSON.
    pub fn json(&self) -> Option<serde_json::Value> {
        if self.body.trim().is_empty() {
            return None;
        }
        serde_json::from_str(&self.body).ok()
    }
}

#[derive(Debug, Serialize)]
struct SubscriptionRequest<'a> {
    webhook_url: &'a str,
    site_url: &'a str,
    api_key: &'a str,
}

#[derive(Debug, Serialize)]
struct SyncRequest<'a> {
    site_url: &'a str,
    api_key: &'a str,
    post_count: i64,
}

/// Platform API client bound to one API key.
#[derive(Clone)]
pub struct ApiClient {
    client: Client,
    base_url: String,
    api_key: String,
    retry: RetryPolicy,
    subscription_timeout: Duration,
    sync_timeout: Duration,
}

impl ApiClient {
    /// Build a client from settings. Fails when no API key is configured.
    pub fn from_settings(settings: &Settings) -> SyncResult<Self> {
        let api_key = settings
            .api_key()
            .ok_or_else(|| SyncError::Unauthorized("API key required".into()))?;
        let client = Client::builder()
            .user_agent(&settings.user_agent)
            .gzip(true)
            .build()
            .map_err(|e| SyncError::TransientNetwork(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            client,
            base_url: settings.api_base_url.clone(),
            api_key: api_key.to_string(),
            retry: RetryPolicy::new(2, settings.retry_backoff),
            subscription_timeout: settings.subscription_timeout,
            sync_timeout: settings.sync_timeout,
        })
    }

    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn endpoint_url(&self, endpoint: &str) -> String {
        format!("{}/{}", self.base_url.trim_end_matches('/'), endpoint)
    }

    /// Register or refresh the webhook URL.
    pub async fn subscribe(&self, webhook_url: &str, site_url: &str) -> SyncResult<ApiResponse> {
        let body = SubscriptionRequest {
            webhook_url,
            site_url,
            api_key: &self.api_key,
        };
        self.post("subscription", &body, self.subscription_timeout)
            .await
    }

    /// Ask the platform for pending optimizations.
    pub async fn sync(&self, site_url: &str, post_count: i64) -> SyncResult<ApiResponse> {
        let body = SyncRequest {
            site_url,
            api_key: &self.api_key,
            post_count,
        };
        self.post("sync", &body, self.sync_timeout).await
    }

    async fn post<B: Serialize>(
        &self,
        endpoint: &str,
        body: &B,
        timeout: Duration,
    ) -> SyncResult<ApiResponse> {
        let url = self.endpoint_url(endpoint);
        let response = self
            .retry
            .execute(endpoint, || self.send_once(&url, body, timeout))
            .await?;
        info!("API request successful: {}", endpoint);
        Ok(response)
    }

    async fn send_once<B: Serialize>(
        &self,
        url: &str,
        body: &B,
        timeout: Duration,
    ) -> SyncResult<ApiResponse> {
        debug!("POST {}", url);
        let response = self
            .client
            .post(url)
            .bearer_auth(&self.api_key)
            .timeout(timeout)
            .json(body)
            .send()
            .await
            .map_err(|e| SyncError::TransientNetwork(e.to_string()))?;

        let status = response.status().as_u16();
        let text = response
            .text()
            .await
            .map_err(|e| SyncError::TransientNetwork(e.to_string()))?;

        if (200..300).contains(&status) {
            return Ok(ApiResponse { status, body: text });
        }

        Err(SyncError::Remote {
            status,
            message: error_message(&text),
        })
    }
}

/// The `message` field of an error body.
fn error_message(body: &str) -> String {
    serde_json::from_str::<serde_json::Value>(body)
        .ok()
        .and_then(|v| v.get("message").and_then(|m| m.as_str()).map(str::to_string))
        .unwrap_or_else(|| "Unknown error".to_string())
}
