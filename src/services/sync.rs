//! Pull-based sync with the ClickRank platform.
//!
//! `sync` asks the platform for pending optimizations and feeds each one
//! through the reconciliation engine. `announce` registers the webhook URL;
//! the health check and connection test are announcements that record
//! when they last succeeded.

use std::sync::Arc;

use serde::Serialize;
use serde_json::json;
use tracing::debug;

use crate::activity_log::ActivityLog;
use crate::config::{keys, Settings};
use crate::error::{SyncError, SyncResult};
use crate::http_client::ApiClient;
use crate::models::{ContentRef, LogLevel, OptimizationPayload};
use crate::repository::now_timestamp;
use crate::site::{LegacyStore, SiteDirectory};

use super::reconcile::{Outcome, ReconciliationEngine};

/// One sync item that could not be applied.
#[derive(Debug, Clone, Serialize)]
pub struct SyncFailure {
    pub page_url: String,
    pub error: String,
}

/// Tally of one sync run.
#[derive(Debug, Clone, Default, Serialize)]
pub struct SyncReport {
    pub processed: usize,
    pub successful: usize,
    pub failures: Vec<SyncFailure>,
}

impl SyncReport {
    /// A run succeeds when nothing was pending or at least one item applied.
    pub fn succeeded(&self) -> bool {
        self.processed == 0 || self.successful > 0
    }
}

/// Result of a connection test.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ConnectionStatus {
    pub success: bool,
    pub message: String,
}

impl ConnectionStatus {
    fn new(success: bool, message: &str) -> Self {
        Self {
            success,
            message: message.to_string(),
        }
    }
}

pub struct SyncOrchestrator {
    client: Option<ApiClient>,
    engine: ReconciliationEngine,
    site: Arc<dyn SiteDirectory>,
    legacy: Arc<dyn LegacyStore>,
    log: Arc<dyn ActivityLog>,
    site_url: String,
    webhook_url: String,
}

impl SyncOrchestrator {
    /// Build from settings. A missing API key is not an error here; the
    /// operations that need it report it instead.
    pub fn from_settings(
        settings: &Settings,
        engine: ReconciliationEngine,
        site: Arc<dyn SiteDirectory>,
        legacy: Arc<dyn LegacyStore>,
        log: Arc<dyn ActivityLog>,
    ) -> SyncResult<Self> {
        let client = match ApiClient::from_settings(settings) {
            Ok(client) => Some(client),
            Err(SyncError::Unauthorized(_)) => None,
            Err(e) => return Err(e),
        };
        Ok(Self {
            client,
            engine,
            site,
            legacy,
            log,
            site_url: settings.home_url().to_string(),
            webhook_url: settings.webhook_url(),
        })
    }

    fn client(&self) -> SyncResult<&ApiClient> {
        self.client
            .as_ref()
            .ok_or_else(|| SyncError::Unauthorized("API key required".into()))
    }

    /// Register or refresh the webhook URL.
    pub async fn announce(&self) -> SyncResult<()> {
        let client = self.client()?;
        client.subscribe(&self.webhook_url, &self.site_url).await?;
        Ok(())
    }

    /// Announce and record the time of the last healthy check. Failures are
    /// logged and never returned.
    pub async fn health_check(&self) -> bool {
        if self.client.is_none() {
            debug!("Health check skipped: no API key configured");
            return false;
        }
        match self.announce().await {
            Ok(()) => {
                self.stamp(keys::LAST_HEALTH_CHECK).await;
                self.log
                    .log(LogLevel::Debug, "Health check passed", None)
                    .await;
                true
            }
            Err(e) => {
                self.log
                    .warning(
                        "Health check failed: unable to connect to ClickRank.ai",
                        Some(json!({ "error": e.to_string() })),
                    )
                    .await;
                false
            }
        }
    }

    /// Verify the API key by announcing.
    pub async fn test_connection(&self) -> ConnectionStatus {
        if self.client.is_none() {
            return ConnectionStatus::new(false, "API key required");
        }
        match self.announce().await {
            Ok(()) => {
                self.stamp(keys::LAST_SUCCESSFUL_CONNECTION).await;
                ConnectionStatus::new(true, "Connection successful")
            }
            Err(e) => {
                self.log
                    .error(
                        "Connection test failed",
                        Some(json!({ "error": e.to_string() })),
                    )
                    .await;
                ConnectionStatus::new(false, "Connection failed - please verify your API key")
            }
        }
    }

    async fn stamp(&self, option: &str) {
        if let Err(e) = self.legacy.set_option(option, &now_timestamp()).await {
            tracing::warn!("Failed to record {}: {}", option, e);
        }
    }

    /// Pull pending optimizations and apply them. A failed item never
    /// aborts the batch.
    pub async fn sync(&self) -> SyncResult<SyncReport> {
        let client = match self.client() {
            Ok(client) => client,
            Err(e) => {
                self.log
                    .error("Cannot sync data - API key is empty", None)
                    .await;
                return Err(e);
            }
        };

        let post_count = self.site.count_published_posts().await?;
        let response = match client.sync(&self.site_url, post_count).await {
            Ok(response) => response,
            Err(e) => {
                self.log
                    .error("Sync request failed", Some(json!({ "error": e.to_string() })))
                    .await;
                return Err(e);
            }
        };

        let items = match response.json() {
            Some(serde_json::Value::Object(map)) => map.into_iter().collect::<Vec<_>>(),
            Some(serde_json::Value::Array(list)) => {
                list.into_iter().map(|v| (String::new(), v)).collect()
            }
            _ => Vec::new(),
        };
        if items.is_empty() {
            return Ok(SyncReport::default());
        }

        self.log
            .info(&format!(
                "Sync successful: processing {} optimizations",
                items.len()
            ))
            .await;

        let mut report = SyncReport::default();
        for (page_url, value) in items {
            report.processed += 1;
            let url = value
                .get("page_url")
                .and_then(|v| v.as_str())
                .filter(|u| !u.is_empty())
                .unwrap_or(page_url.as_str())
                .to_string();

            match self.apply_item(&page_url, value).await {
                Ok(outcome) => {
                    debug!("Sync item applied: {} ({})", url, outcome.message);
                    report.successful += 1;
                }
                Err((content, e)) => {
                    self.log
                        .warning(
                            "Sync item failed",
                            Some(json!({
                                "url": url,
                                "content": content.map(|c| c.to_string()),
                                "error": e.to_string(),
                            })),
                        )
                        .await;
                    report.failures.push(SyncFailure {
                        page_url: url,
                        error: e.to_string(),
                    });
                }
            }
        }

        self.log
            .info(&format!(
                "Sync complete: {}/{} pages updated",
                report.successful, report.processed
            ))
            .await;
        Ok(report)
    }

    /// Apply one item. Unresolved URLs only take image updates.
    async fn apply_item(
        &self,
        page_url: &str,
        value: serde_json::Value,
    ) -> Result<Outcome, (Option<ContentRef>, SyncError)> {
        let mut payload: OptimizationPayload =
            serde_json::from_value(value).map_err(|e| (None, SyncError::from(e)))?;
        if payload.page_url.is_empty() {
            payload.page_url = page_url.to_string();
        }
        let payload = payload.sanitized();
        if payload.page_url.is_empty() {
            return Err((None, SyncError::Validation("Invalid request data".into())));
        }

        if payload.is_revert() {
            return self
                .engine
                .revert_url(&payload.page_url, payload.revert_fields())
                .await
                .map_err(|e| (None, e));
        }

        let content = self
            .engine
            .resolve(&payload.page_url)
            .await
            .map_err(|e| (None, e))?;

        if !content.is_resolved() {
            if payload.has_images() {
                return self
                    .engine
                    .apply_images_only(&payload)
                    .await
                    .map_err(|e| (Some(content), e));
            }
            return Err((
                Some(content),
                SyncError::NotFound(format!("Cannot resolve URL: {}", payload.page_url)),
            ));
        }

        self.engine
            .apply(&content, &payload)
            .await
            .map_err(|e| (Some(content), e))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_report_success_rules() {
        assert!(SyncReport::default().succeeded());
        let failed = SyncReport {
            processed: 2,
            successful: 0,
            failures: Vec::new(),
        };
        assert!(!failed.succeeded());
        let partial = SyncReport {
            processed: 3,
            successful: 2,
            failures: Vec::new(),
        };
        assert!(partial.succeeded());
    }
}
