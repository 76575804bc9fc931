//! Settings discovery: explicit path, next to the data dir, then prefer.

use std::path::{Path, PathBuf};

use super::{Config, Settings};

/// Options for loading settings.
#[derive(Debug, Clone, Default)]
pub struct LoadOptions {
    /// Explicit config file path (overrides auto-discovery).
    pub config_path: Option<PathBuf>,
    /// Data directory (--target flag).
    pub data: Option<PathBuf>,
}

/// Look for a config file next to the database.
fn find_config_next_to_db(data_dir: &Path) -> Option<PathBuf> {
    let extensions = ["json", "yaml", "yml", "toml"];
    let basenames = ["clickrank", "config"];

    for basename in basenames {
        for ext in extensions {
            let path = data_dir.join(format!("{}.{}", basename, ext));
            if path.exists() {
                return Some(path);
            }
        }
    }
    None
}

fn absolute(path: &Path) -> PathBuf {
    if path.is_absolute() {
        path.to_path_buf()
    } else {
        std::env::current_dir()
            .unwrap_or_else(|_| PathBuf::from("."))
            .join(path)
    }
}

async fn load_file_config(options: &LoadOptions, data_dir: Option<&Path>) -> Config {
    // Priority 1: explicit --config flag
    if let Some(ref config_path) = options.config_path {
        return match Config::load_from_path(config_path).await {
            Ok(config) => config,
            Err(e) => {
                tracing::warn!("{}", e);
                Config::default()
            }
        };
    }

    // Priority 2: config next to the data dir
    if let Some(config_path) = data_dir.and_then(find_config_next_to_db) {
        tracing::debug!("Found config next to data dir: {}", config_path.display());
        return Config::load_from_path(&config_path)
            .await
            .unwrap_or_default();
    }

    // Priority 3: auto-discover via prefer
    Config::load().await
}

fn env_override(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|s| !s.is_empty())
}

/// Load settings with explicit options.
/// Returns (Settings, Config) tuple.
pub async fn load_settings_with_options(options: LoadOptions) -> (Settings, Config) {
    let data_dir_override = options.data.as_deref().map(absolute);
    let config = load_file_config(&options, data_dir_override.as_deref()).await;

    let mut settings = Settings::default();
    let base_dir = config
        .base_dir()
        .unwrap_or_else(|| std::env::current_dir().unwrap_or_else(|_| PathBuf::from(".")));
    config.apply_to_settings(&mut settings, &base_dir);

    if let Some(data_dir) = data_dir_override {
        settings.data_dir = data_dir;
    }

    // Environment variables take highest precedence
    if let Some(database_url) = env_override("DATABASE_URL") {
        tracing::debug!("Using DATABASE_URL from environment: {}", database_url);
        settings.database_url = Some(database_url);
    }
    if let Some(key) = env_override("CLICKRANK_API_KEY") {
        settings.api_key = Some(key);
    }
    if let Some(site_url) = env_override("CLICKRANK_SITE_URL") {
        settings.site_url = site_url;
    }
    if let Some(base) = env_override("CLICKRANK_API_BASE_URL") {
        settings.api_base_url = base;
    }

    (settings, config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_find_config_next_to_db() {
        let dir = tempdir().unwrap();
        assert!(find_config_next_to_db(dir.path()).is_none());
        std::fs::write(dir.path().join("clickrank.toml"), "").unwrap();
        assert_eq!(
            find_config_next_to_db(dir.path()),
            Some(dir.path().join("clickrank.toml"))
        );
    }

    #[tokio::test]
    async fn test_target_dir_config_is_used() {
        let dir = tempdir().unwrap();
        std::fs::write(
            dir.path().join("clickrank.json"),
            r#"{"site_url": "https://target.example", "retention_days": 14}"#,
        )
        .unwrap();

        let (settings, config) = load_settings_with_options(LoadOptions {
            config_path: None,
            data: Some(dir.path().to_path_buf()),
        })
        .await;
        assert_eq!(config.retention_days, Some(14));
        assert_eq!(settings.retention_days, 14);
        assert_eq!(settings.data_dir, dir.path());
    }
}
