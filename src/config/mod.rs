//! Configuration management using the prefer crate.

mod compat;
mod loader;
mod modules;
mod settings;

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

pub use compat::{keys, CompatMode, MetaKeys, OptionSlot};
pub use loader::{load_settings_with_options, LoadOptions};
pub use modules::{ModuleToggleSet, ModulesConfig};
pub use settings::{
    Settings, DEFAULT_API_BASE_URL, DEFAULT_DATABASE_FILENAME, WEBHOOK_PATH,
};

/// Webhook rate limit as written in the config file.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, prefer::FromValue)]
pub struct RateLimitConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_requests: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub window_secs: Option<u64>,
    /// Key clients by `Client-IP`/`X-Forwarded-For`. Only safe behind a
    /// proxy that overwrites these headers.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub trust_forwarded_headers: Option<bool>,
}

impl RateLimitConfig {
    pub fn is_default(&self) -> bool {
        *self == Self::default()
    }
}

/// Configuration file structure.
#[derive(Debug, Clone, Default, Serialize, Deserialize, prefer::FromValue)]
pub struct Config {
    /// Data directory path.
    #[serde(default, skip_serializing_if = "Option::is_none", alias = "target")]
    pub data_dir: Option<String>,
    /// Database filename.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub database: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub site_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub home_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub webhook_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_base_url: Option<String>,
    /// Active SEO plugin layout: yoast, rank_math, aioseo or none.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub seo_plugin: Option<String>,
    #[serde(default, skip_serializing_if = "ModulesConfig::is_default")]
    #[prefer(default)]
    pub modules: ModulesConfig,
    #[serde(default, skip_serializing_if = "RateLimitConfig::is_default")]
    #[prefer(default)]
    pub rate_limit: RateLimitConfig,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_log_entries: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub retention_days: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subscription_timeout_secs: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sync_timeout_secs: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub retry_backoff_ms: Option<u64>,
    /// Path to the config file this was loaded from (not serialized).
    #[serde(skip)]
    #[prefer(skip)]
    pub source_path: Option<PathBuf>,
}

impl Config {
    /// Load configuration using prefer crate for discovery.
    /// Automatically discovers clickrank config files in standard locations.
    pub async fn load() -> Self {
        match prefer::load("clickrank").await {
            Ok(pref_config) => {
                if let Some(path) = pref_config.source_path() {
                    match Self::load_from_path(path).await {
                        Ok(config) => config,
                        Err(e) => {
                            tracing::warn!("{}", e);
                            Self::default()
                        }
                    }
                } else {
                    Self::default()
                }
            }
            Err(_) => Self::default(),
        }
    }

    /// Load configuration from a specific file path.
    /// Supports JSON, TOML and YAML based on file extension.
    pub async fn load_from_path(path: &Path) -> Result<Self, String> {
        let contents = tokio::fs::read_to_string(path)
            .await
            .map_err(|e| format!("Failed to read config file: {}", e))?;

        let ext = path.extension().and_then(|e| e.to_str()).unwrap_or("json");

        let mut config: Config = match ext {
            "toml" => toml::from_str(&contents)
                .map_err(|e| format!("Failed to parse TOML config: {}", e))?,
            "yaml" | "yml" => serde_yaml::from_str(&contents)
                .map_err(|e| format!("Failed to parse YAML config: {}", e))?,
            _ => serde_json::from_str(&contents)
                .map_err(|e| format!("Failed to parse JSON config: {}", e))?,
        };

        config.source_path = Some(path.to_path_buf());
        Ok(config)
    }

    /// Get the base directory for resolving relative paths.
    pub fn base_dir(&self) -> Option<PathBuf> {
        self.source_path
            .as_ref()
            .and_then(|p| p.parent().map(|p| p.to_path_buf()))
    }

    /// Resolve a path that may be relative to the config file.
    /// - Absolute paths are returned as-is
    /// - Paths starting with ~ are expanded
    /// - Relative paths are resolved relative to `base_dir`
    pub fn resolve_path(&self, path_str: &str, base_dir: &Path) -> PathBuf {
        let expanded = shellexpand::tilde(path_str);
        let path = Path::new(expanded.as_ref());

        if path.is_absolute() {
            path.to_path_buf()
        } else {
            base_dir.join(path)
        }
    }

    /// Apply configuration to settings.
    pub fn apply_to_settings(&self, settings: &mut Settings, base_dir: &Path) {
        if let Some(ref data_dir) = self.data_dir {
            settings.data_dir = self.resolve_path(data_dir, base_dir);
        }
        if let Some(ref database) = self.database {
            settings.database_filename = database.clone();
        }
        if let Some(ref site_url) = self.site_url {
            settings.site_url = site_url.clone();
        }
        if let Some(ref home_url) = self.home_url {
            settings.home_url = Some(home_url.clone());
        }
        if let Some(ref webhook_url) = self.webhook_url {
            settings.webhook_url = Some(webhook_url.clone());
        }
        if let Some(ref api_key) = self.api_key {
            settings.api_key = Some(api_key.clone());
        }
        if let Some(ref base) = self.api_base_url {
            settings.api_base_url = base.clone();
        }
        if let Some(ref plugin) = self.seo_plugin {
            match CompatMode::from_str(plugin) {
                Some(mode) => settings.compat_mode = mode,
                None => tracing::warn!("Unknown seo_plugin '{}', using native keys", plugin),
            }
        }
        settings.modules = self.modules.resolve();
        if let Some(max) = self.rate_limit.max_requests {
            settings.rate_limit_max_requests = max;
        }
        if let Some(secs) = self.rate_limit.window_secs {
            settings.rate_limit_window = Duration::from_secs(secs);
        }
        if let Some(trust) = self.rate_limit.trust_forwarded_headers {
            settings.trust_forwarded_headers = trust;
        }
        if let Some(max) = self.max_log_entries {
            settings.max_log_entries = usize::try_from(max).unwrap_or(usize::MAX);
        }
        if let Some(days) = self.retention_days {
            settings.retention_days = u32::try_from(days).unwrap_or(u32::MAX);
        }
        if let Some(secs) = self.subscription_timeout_secs {
            settings.subscription_timeout = Duration::from_secs(secs);
        }
        if let Some(secs) = self.sync_timeout_secs {
            settings.sync_timeout = Duration::from_secs(secs);
        }
        if let Some(ms) = self.retry_backoff_ms {
            settings.retry_backoff = Duration::from_millis(ms);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[tokio::test]
    async fn test_load_toml_and_apply() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("clickrank.toml");
        std::fs::write(
            &path,
            r#"
data_dir = "./data"
site_url = "https://example.com"
api_key = "secret"
seo_plugin = "yoast"

[modules]
schema = false

[rate_limit]
max_requests = 5
window_secs = 60
trust_forwarded_headers = false
"#,
        )
        .unwrap();

        let config = Config::load_from_path(&path).await.unwrap();
        assert_eq!(config.base_dir().as_deref(), Some(dir.path()));

        let mut settings = Settings::default();
        config.apply_to_settings(&mut settings, dir.path());
        assert_eq!(settings.data_dir, dir.path().join("data"));
        assert_eq!(settings.compat_mode, CompatMode::Yoast);
        assert!(!settings.modules.schema);
        assert!(settings.modules.title);
        assert_eq!(settings.rate_limit_max_requests, 5);
        assert_eq!(settings.rate_limit_window, Duration::from_secs(60));
        assert!(!settings.trust_forwarded_headers);
        assert_eq!(settings.api_key(), Some("secret"));
    }

    #[tokio::test]
    async fn test_load_yaml() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("clickrank.yaml");
        std::fs::write(&path, "site_url: https://example.org\nretention_days: 30\n").unwrap();
        let config = Config::load_from_path(&path).await.unwrap();
        assert_eq!(config.site_url.as_deref(), Some("https://example.org"));
        assert_eq!(config.retention_days, Some(30));
    }

    #[tokio::test]
    async fn test_invalid_json_is_reported() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("clickrank.json");
        std::fs::write(&path, "{not json").unwrap();
        let err = Config::load_from_path(&path).await.unwrap_err();
        assert!(err.contains("JSON"));
    }

    #[test]
    fn test_resolve_path_keeps_absolute() {
        let config = Config::default();
        assert_eq!(
            config.resolve_path("/var/lib/clickrank", Path::new("/etc")),
            PathBuf::from("/var/lib/clickrank")
        );
        assert_eq!(
            config.resolve_path("data", Path::new("/etc")),
            PathBuf::from("/etc/data")
        );
    }
}
