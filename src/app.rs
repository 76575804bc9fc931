//! Service wiring.
//!
//! `App::bootstrap` is the single initialization point: it opens and
//! migrates the database, resolves the compatibility mode, and builds the
//! reconciliation engine and rate limiter shared by the CLI and the server.

use std::sync::Arc;

use tracing::{debug, info};

use crate::activity_log::ActivityLog;
use crate::config::Settings;
use crate::error::{SyncError, SyncResult};
use crate::rate_limit::RateLimiter;
use crate::repository::{DieselDbContext, DieselSiteRepository};
use crate::services::{Backfill, EngineConfig, ReconciliationEngine, SyncOrchestrator};

#[derive(Clone)]
pub struct App {
    pub settings: Arc<Settings>,
    pub db: DieselDbContext,
    pub site: Arc<DieselSiteRepository>,
    pub log: Arc<dyn ActivityLog>,
    pub engine: ReconciliationEngine,
    pub rate_limiter: RateLimiter,
}

impl App {
    /// Open the database, apply migrations and build the services.
    pub async fn bootstrap(settings: Settings) -> SyncResult<Self> {
        if settings.database_url.is_none() {
            settings.ensure_directories().map_err(|e| {
                SyncError::Persistence(format!("Failed to prepare data directory: {}", e))
            })?;
        }

        let db = settings.create_db_context();
        let applied = db.migrate().await?;
        if !applied.is_empty() {
            info!("Applied {} migration(s)", applied.len());
        }

        let site = Arc::new(db.site());
        let log: Arc<dyn ActivityLog> = Arc::new(db.activity_log(settings.max_log_entries));
        let engine = ReconciliationEngine::new(
            db.seo_data(),
            site.clone(),
            site.clone(),
            log.clone(),
            EngineConfig::from_settings(&settings),
        );
        let rate_limiter = RateLimiter::from_settings(&settings);
        debug!(
            "Bootstrapped with compat mode {} for {}",
            settings.compat_mode.as_str(),
            settings.home_url()
        );

        Ok(Self {
            settings: Arc::new(settings),
            db,
            site,
            log,
            engine,
            rate_limiter,
        })
    }

    pub fn sync_orchestrator(&self) -> SyncResult<SyncOrchestrator> {
        SyncOrchestrator::from_settings(
            &self.settings,
            self.engine.clone(),
            self.site.clone(),
            self.site.clone(),
            self.log.clone(),
        )
    }

    pub fn backfill(&self) -> Backfill {
        Backfill::new(
            self.db.seo_data(),
            self.site.clone(),
            self.site.clone(),
            self.log.clone(),
            &self.settings,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::OptimizationPayload;
    use tempfile::tempdir;

    #[tokio::test]
    async fn test_bootstrap_migrates_and_applies() {
        let dir = tempdir().unwrap();
        let settings = Settings {
            site_url: "https://example.com".into(),
            ..Settings::with_data_dir(dir.path().join("data"))
        };
        let app = App::bootstrap(settings).await.unwrap();
        assert!(app.db.get_schema_version().await.unwrap().is_some());

        let outcome = app
            .engine
            .handle(OptimizationPayload {
                page_title: Some("Home".into()),
                ..OptimizationPayload::for_url("https://example.com/")
            })
            .await
            .unwrap();
        assert_eq!(outcome.message, "Homepage updated");

        // A second bootstrap over the same database is a no-op migration.
        let again = App::bootstrap((*app.settings).clone()).await.unwrap();
        assert!(again.db.seo_data().get("https://example.com").await.unwrap().is_some());
    }
}
