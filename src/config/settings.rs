//! Resolved runtime settings.

use std::fs;
use std::path::PathBuf;
use std::time::Duration;

use super::compat::CompatMode;
use super::modules::ModuleToggleSet;
use crate::repository::DieselDbContext;

/// Default database filename.
pub const DEFAULT_DATABASE_FILENAME: &str = "clickrank.db";

/// Platform API base.
pub const DEFAULT_API_BASE_URL: &str = "https://app.clickrank.ai/api/v2/";

/// Path the webhook is served on.
pub const WEBHOOK_PATH: &str = "/clickrank-ai/v1/update-post";

/// Application settings.
#[derive(Debug, Clone)]
pub struct Settings {
    /// Base data directory.
    pub data_dir: PathBuf,
    /// Database filename.
    pub database_filename: String,
    /// Database URL (overrides data_dir/database_filename if set).
    pub database_url: Option<String>,
    /// Public site URL.
    pub site_url: String,
    /// Home URL, when it differs from the site URL.
    pub home_url: Option<String>,
    /// Webhook URL announced to the platform.
    pub webhook_url: Option<String>,
    pub api_key: Option<String>,
    pub api_base_url: String,
    pub user_agent: String,
    pub compat_mode: CompatMode,
    pub modules: ModuleToggleSet,
    /// Webhook requests allowed per client per window.
    pub rate_limit_max_requests: u64,
    pub rate_limit_window: Duration,
    /// Take the rate-limit key from forwarding headers before the peer.
    pub trust_forwarded_headers: bool,
    /// Activity log rows kept.
    pub max_log_entries: usize,
    /// SEO rows not updated for this many days are purged by maintenance.
    pub retention_days: u32,
    pub subscription_timeout: Duration,
    pub sync_timeout: Duration,
    /// Delay before the single retry of an outbound request.
    pub retry_backoff: Duration,
}

impl Default for Settings {
    fn default() -> Self {
        let data_dir = dirs::data_dir()
            .or_else(dirs::home_dir)
            .unwrap_or_else(|| PathBuf::from("."))
            .join("clickrank");

        Self {
            data_dir,
            database_filename: DEFAULT_DATABASE_FILENAME.to_string(),
            database_url: None,
            site_url: "http://localhost".to_string(),
            home_url: None,
            webhook_url: None,
            api_key: None,
            api_base_url: DEFAULT_API_BASE_URL.to_string(),
            user_agent: format!("clickrank/{}", env!("CARGO_PKG_VERSION")),
            compat_mode: CompatMode::None,
            modules: ModuleToggleSet::all_enabled(),
            rate_limit_max_requests: 1000,
            rate_limit_window: Duration::from_secs(3600),
            trust_forwarded_headers: true,
            max_log_entries: 1000,
            retention_days: 90,
            subscription_timeout: Duration::from_secs(30),
            sync_timeout: Duration::from_secs(45),
            retry_backoff: Duration::from_millis(2000),
        }
    }
}

impl Settings {
    /// Create settings with a custom data directory.
    pub fn with_data_dir(data_dir: PathBuf) -> Self {
        Self {
            data_dir,
            ..Default::default()
        }
    }

    /// Get the database URL, constructing from path if not explicitly set.
    pub fn database_url(&self) -> String {
        if let Some(ref url) = self.database_url {
            url.clone()
        } else {
            format!("sqlite:{}", self.database_path().display())
        }
    }

    /// Get the full path to the database file.
    pub fn database_path(&self) -> PathBuf {
        self.data_dir.join(&self.database_filename)
    }

    /// Home URL, falling back to the site URL.
    pub fn home_url(&self) -> &str {
        self.home_url.as_deref().unwrap_or(&self.site_url)
    }

    /// Webhook URL announced to the platform.
    pub fn webhook_url(&self) -> String {
        self.webhook_url
            .clone()
            .unwrap_or_else(|| format!("{}{}", self.site_url.trim_end_matches('/'), WEBHOOK_PATH))
    }

    /// Configured API key, if non-empty.
    pub fn api_key(&self) -> Option<&str> {
        self.api_key.as_deref().filter(|k| !k.trim().is_empty())
    }

    /// Ensure the data directory exists.
    pub fn ensure_directories(&self) -> std::io::Result<()> {
        fs::create_dir_all(&self.data_dir).map_err(|e| {
            std::io::Error::new(
                e.kind(),
                format!(
                    "Failed to create data directory '{}': {}",
                    self.data_dir.display(),
                    e
                ),
            )
        })
    }

    /// Create a database context using the configured database URL or path.
    pub fn create_db_context(&self) -> DieselDbContext {
        DieselDbContext::from_url(&self.database_url())
    }
}
