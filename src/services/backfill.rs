//! Copy legacy per-post metadata and homepage options into the URL table.
//!
//! Sites that ran before the URL table existed keep their optimizations in
//! post meta and options. Backfill copies them over without touching the
//! `original_*` columns, and leaves rows that already carry a title alone.

use std::sync::Arc;

use serde::Serialize;
use tracing::debug;

use crate::activity_log::ActivityLog;
use crate::config::{keys, MetaKeys, Settings};
use crate::error::SyncResult;
use crate::models::SeoFields;
use crate::repository::DieselSeoDataRepository;
use crate::site::{LegacyStore, MetaScope, SiteDirectory};

/// Counts from one backfill run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct BackfillReport {
    pub processed: usize,
    pub migrated: usize,
    pub skipped: usize,
    pub errors: Vec<String>,
    /// Whether the homepage options produced a row.
    pub homepage: bool,
}

pub struct Backfill {
    seo: DieselSeoDataRepository,
    site: Arc<dyn SiteDirectory>,
    legacy: Arc<dyn LegacyStore>,
    log: Arc<dyn ActivityLog>,
    keys: &'static MetaKeys,
    home_url: String,
}

impl Backfill {
    pub fn new(
        seo: DieselSeoDataRepository,
        site: Arc<dyn SiteDirectory>,
        legacy: Arc<dyn LegacyStore>,
        log: Arc<dyn ActivityLog>,
        settings: &Settings,
    ) -> Self {
        Self {
            seo,
            site,
            legacy,
            log,
            keys: settings.compat_mode.keys(),
            home_url: settings.home_url().to_string(),
        }
    }

    /// Backfill the homepage, then every published post.
    pub async fn run(&self) -> SyncResult<BackfillReport> {
        self.log.info("Starting backfill to URL table").await;
        let mut report = BackfillReport {
            homepage: self.homepage().await?,
            ..Default::default()
        };

        for post in self.site.published_posts().await? {
            report.processed += 1;
            if post.permalink.is_empty() || self.seo.has_title(&post.permalink).await? {
                report.skipped += 1;
                continue;
            }

            let scope = MetaScope::Post(post.id);
            let fields = SeoFields {
                title: self.meta(scope, self.keys.post_title).await?,
                description: self.meta(scope, self.keys.post_description).await?,
                canonical_url: self.meta(scope, keys::CANONICAL).await?,
                schema: self.meta(scope, keys::SCHEMA).await?,
                entity_id: Some(post.id),
            };

            if fields.is_empty() {
                report.skipped += 1;
                continue;
            }

            match self.seo.upsert(&post.permalink, &fields, false).await {
                Ok(_) => {
                    report.migrated += 1;
                    debug!("Migrated post {}: {}", post.id, post.title);
                }
                Err(e) => report
                    .errors
                    .push(format!("Failed to migrate post {}: {}", post.id, e)),
            }
        }

        self.log
            .info(&format!(
                "Backfill completed: {} posts migrated, {} skipped",
                report.migrated, report.skipped
            ))
            .await;
        Ok(report)
    }

    async fn homepage(&self) -> SyncResult<bool> {
        let fields = SeoFields {
            title: self.option(keys::HOMEPAGE_TITLE).await?,
            description: self.option(keys::HOMEPAGE_DESCRIPTION).await?,
            canonical_url: self.option(keys::HOMEPAGE_CANONICAL).await?,
            schema: self.option(keys::HOMEPAGE_SCHEMA).await?,
            entity_id: None,
        };
        if fields.is_empty() {
            return Ok(false);
        }

        let url = format!("{}/", self.home_url.trim_end_matches('/'));
        self.seo.upsert(&url, &fields, false).await?;
        self.log.info("Homepage migrated to URL table").await;
        Ok(true)
    }

    async fn meta(&self, scope: MetaScope, key: &str) -> SyncResult<Option<String>> {
        Ok(self
            .legacy
            .get_meta(scope, key)
            .await?
            .filter(|v| !v.is_empty()))
    }

    async fn option(&self, name: &str) -> SyncResult<Option<String>> {
        Ok(self
            .legacy
            .get_option(name)
            .await?
            .filter(|v| !v.is_empty()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::activity_log::MemoryActivityLog;
    use crate::config::CompatMode;
    use crate::models::{Post, SiteExport};
    use crate::repository::migrations::run_migrations;
    use crate::repository::DbPool;
    use crate::site::InMemorySite;
    use tempfile::tempdir;

    fn post(id: i64, slug: &str) -> Post {
        Post {
            id,
            post_type: "post".into(),
            slug: slug.into(),
            permalink: format!("https://example.com/{slug}/"),
            status: "publish".into(),
            title: slug.into(),
            published_at: None,
        }
    }

    #[tokio::test]
    async fn test_backfill_copies_meta_and_skips_titled_rows() {
        let dir = tempdir().unwrap();
        let db_url = dir.path().join("test.db").display().to_string();
        run_migrations(&db_url).await.unwrap();
        let seo = DieselSeoDataRepository::new(DbPool::from_url(&db_url));

        let site = InMemorySite::new(SiteExport {
            posts: vec![post(1, "one"), post(2, "two"), post(3, "three")],
            ..Default::default()
        });
        site.set_meta(MetaScope::Post(1), "rank_math_title", "One title")
            .await
            .unwrap();
        site.set_meta(MetaScope::Post(2), keys::CANONICAL, "https://example.com/2")
            .await
            .unwrap();
        site.set_option(keys::HOMEPAGE_TITLE, "Home").await.unwrap();

        // Post 2 already has a title in the URL table.
        seo.upsert(
            "https://example.com/two/",
            &SeoFields {
                title: Some("Existing".into()),
                ..Default::default()
            },
            true,
        )
        .await
        .unwrap();

        let settings = Settings {
            site_url: "https://example.com".into(),
            compat_mode: CompatMode::RankMath,
            ..Default::default()
        };
        let backfill = Backfill::new(
            seo.clone(),
            Arc::new(site.clone()),
            Arc::new(site.clone()),
            Arc::new(MemoryActivityLog::new()),
            &settings,
        );

        let report = backfill.run().await.unwrap();
        assert!(report.homepage);
        assert_eq!(report.processed, 3);
        assert_eq!(report.migrated, 1);
        assert_eq!(report.skipped, 2);
        assert!(report.errors.is_empty());

        let record = seo.get("https://example.com/one/").await.unwrap().unwrap();
        assert_eq!(record.title.as_deref(), Some("One title"));
        assert_eq!(record.resolved_entity_id, Some(1));
        assert_eq!(record.original_title, None);

        let home = seo.get("https://example.com/").await.unwrap().unwrap();
        assert_eq!(home.title.as_deref(), Some("Home"));
        assert_eq!(
            seo.get("https://example.com/two/")
                .await
                .unwrap()
                .unwrap()
                .title
                .as_deref(),
            Some("Existing")
        );
    }
}
