//! Reconciliation engine.
//!
//! Applies incoming SEO field updates to a resolved content reference and
//! undoes them on request. Every update goes to two places: the URL-keyed
//! SEO table, and the legacy per-entity metadata the site's SEO plugin
//! reads. Legacy writes snapshot the value they replace into the entity's
//! revert bundle; the first snapshot of a field wins, so a revert always
//! returns to the state before the first optimization.

mod images;
mod location;

use images::ImageUpdate;

use std::sync::Arc;

use serde::Serialize;
use serde_json::json;

use crate::activity_log::ActivityLog;
use crate::config::{keys, CompatMode, MetaKeys, ModuleToggleSet, Settings};
use crate::error::{SyncError, SyncResult};
use crate::models::{
    BundleField, ContentRef, OptimizationPayload, RevertBundle, SeoField, SeoFields, StoreRevert,
};
use crate::repository::DieselSeoDataRepository;
use crate::site::{LegacyStore, SiteDirectory};

use super::resolver::ContentResolver;

/// What a successful apply or revert did.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Outcome {
    pub message: String,
    pub content: ContentRef,
    /// Field labels written or restored.
    pub fields: Vec<&'static str>,
    /// Only the URL-keyed table changed.
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub url_table_only: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url_record_id: Option<i64>,
    /// Image fields written by an image-only update.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub count: Option<usize>,
}

impl Outcome {
    fn new(message: impl Into<String>, content: ContentRef) -> Self {
        Self {
            message: message.into(),
            content,
            fields: Vec::new(),
            url_table_only: false,
            url_record_id: None,
            count: None,
        }
    }
}

/// Engine settings resolved once at startup.
#[derive(Debug, Clone)]
pub struct EngineConfig {
    pub home_url: String,
    pub compat_mode: CompatMode,
    pub toggles: ModuleToggleSet,
}

impl EngineConfig {
    pub fn from_settings(settings: &Settings) -> Self {
        Self {
            home_url: settings.home_url().to_string(),
            compat_mode: settings.compat_mode,
            toggles: settings.modules,
        }
    }
}

/// A row written to the URL table during apply.
#[derive(Debug, Clone, Copy)]
struct Stored {
    id: i64,
}

#[derive(Clone)]
pub struct ReconciliationEngine {
    seo: DieselSeoDataRepository,
    legacy: Arc<dyn LegacyStore>,
    site: Arc<dyn SiteDirectory>,
    log: Arc<dyn ActivityLog>,
    resolver: ContentResolver,
    keys: &'static MetaKeys,
    toggles: ModuleToggleSet,
}

impl ReconciliationEngine {
    pub fn new(
        seo: DieselSeoDataRepository,
        legacy: Arc<dyn LegacyStore>,
        site: Arc<dyn SiteDirectory>,
        log: Arc<dyn ActivityLog>,
        config: EngineConfig,
    ) -> Self {
        let resolver = ContentResolver::new(site.clone(), &config.home_url);
        Self {
            seo,
            legacy,
            site,
            log,
            resolver,
            keys: config.compat_mode.keys(),
            toggles: config.toggles,
        }
    }

    pub fn resolver(&self) -> &ContentResolver {
        &self.resolver
    }

    pub fn toggles(&self) -> ModuleToggleSet {
        self.toggles
    }

    pub async fn resolve(&self, url: &str) -> SyncResult<ContentRef> {
        Ok(self.resolver.resolve(url).await?)
    }

    /// Sanitize a payload, resolve its URL and apply or revert it.
    pub async fn handle(&self, payload: OptimizationPayload) -> SyncResult<Outcome> {
        let payload = payload.sanitized();
        if payload.page_url.is_empty() {
            return Err(SyncError::Validation("Invalid request data".into()));
        }

        self.log
            .info(&format!("Processing webhook for: {}", payload.page_url))
            .await;

        if payload.is_revert() {
            return self
                .revert_url(&payload.page_url, payload.revert_fields())
                .await;
        }

        let content = self.resolve(&payload.page_url).await?;
        self.apply(&content, &payload).await
    }

    /// Apply a payload to already-resolved content.
    ///
    /// The URL-table write always happens first and is independent of the
    /// legacy writes: a failure there is logged and the legacy writes still
    /// run.
    pub async fn apply(
        &self,
        content: &ContentRef,
        payload: &OptimizationPayload,
    ) -> SyncResult<Outcome> {
        tracing::debug!(
            "Applying {} to {} (toggles: {:?})",
            payload.page_url,
            content,
            self.toggles
        );
        let stored = self.save_to_url_table(content, payload).await;

        let result = match content {
            ContentRef::Unknown => self.apply_unresolved(payload, stored).await,
            ContentRef::Post { id } => {
                let accessible = self
                    .site
                    .get_post(*id)
                    .await?
                    .is_some_and(|p| p.is_published());
                if !accessible {
                    return Err(SyncError::NotFound(
                        "Post not found or not accessible".into(),
                    ));
                }
                self.apply_entity(content, payload, stored).await
            }
            ContentRef::TaxonomyTerm { id, .. } => {
                if self.site.get_term(*id).await?.is_none() {
                    return Err(SyncError::NotFound("Term not found".into()));
                }
                self.apply_entity(content, payload, stored).await
            }
            ContentRef::Homepage => self.apply_entity(content, payload, stored).await,
        };

        if let Err(e @ (SyncError::Persistence(_) | SyncError::Serialization(_))) = &result {
            self.log
                .error(
                    "Legacy metadata update failed",
                    Some(json!({
                        "url": payload.page_url,
                        "content": content,
                        "fields": self.incoming_labels(content, payload),
                        "error": e.to_string(),
                    })),
                )
                .await;
        }
        result
    }

    /// Fields carried by the payload, gated by the module toggles, as they
    /// go into the URL table.
    fn url_table_fields(&self, content: &ContentRef, payload: &OptimizationPayload) -> SeoFields {
        let t = &self.toggles;
        let title = match content {
            ContentRef::TaxonomyTerm { .. } => payload.term_title(),
            _ => payload.page_title.as_deref(),
        };
        SeoFields {
            title: enabled(t.title, title),
            description: enabled(t.meta_description, payload.meta_description.as_deref()),
            canonical_url: enabled(t.canonical, payload.canonical_url.as_deref()),
            schema: enabled(t.schema, payload.page_schema.as_deref()),
            entity_id: content.post_id(),
        }
    }

    async fn save_to_url_table(
        &self,
        content: &ContentRef,
        payload: &OptimizationPayload,
    ) -> Option<Stored> {
        let fields = self.url_table_fields(content, payload);
        if fields.is_empty() {
            return None;
        }
        match self.seo.upsert(&payload.page_url, &fields, true).await {
            Ok(id) => {
                self.log
                    .info(&format!("SEO data saved to URL table for: {}", payload.page_url))
                    .await;
                Some(Stored { id })
            }
            Err(e) => {
                let labels: Vec<&str> = fields.supplied().iter().map(|f| f.label()).collect();
                self.log
                    .error(
                        "Failed to save SEO data to URL table",
                        Some(json!({
                            "url": payload.page_url,
                            "content": content,
                            "fields": labels,
                            "error": e.to_string(),
                        })),
                    )
                    .await;
                None
            }
        }
    }

    /// Value the payload carries for a legacy field, when its module is on.
    fn incoming(&self, field: BundleField, payload: &OptimizationPayload) -> Option<String> {
        let t = &self.toggles;
        match field {
            BundleField::PageTitle => enabled(t.title, payload.page_title.as_deref()),
            BundleField::TermName => enabled(t.title, payload.term_title()),
            BundleField::MetaDescription => {
                enabled(t.meta_description, payload.meta_description.as_deref())
            }
            BundleField::CanonicalUrl => enabled(t.canonical, payload.canonical_url.as_deref()),
            BundleField::PageSchema => enabled(t.schema, payload.page_schema.as_deref()),
            BundleField::LinkTitles => {
                if !t.link_title || payload.link_titles.is_empty() {
                    return None;
                }
                serde_json::to_string(&payload.link_titles).ok()
            }
            BundleField::Images => None,
        }
    }

    fn incoming_labels(&self, content: &ContentRef, payload: &OptimizationPayload) -> Vec<&'static str> {
        BundleField::ALL
            .into_iter()
            .filter(|f| self.location(content, *f).is_some() && self.incoming(*f, payload).is_some())
            .map(|f| f.label())
            .collect()
    }

    fn takes_images(content: &ContentRef) -> bool {
        matches!(content, ContentRef::Homepage | ContentRef::Post { .. })
    }

    async fn apply_entity(
        &self,
        content: &ContentRef,
        payload: &OptimizationPayload,
        stored: Option<Stored>,
    ) -> SyncResult<Outcome> {
        let loaded = self.load_bundle(content).await?.unwrap_or_default();
        let mut bundle = loaded.clone();
        let mut updated = Vec::new();

        let written = self
            .write_entity_fields(content, payload, &mut bundle, &mut updated)
            .await;
        if let Err(e) = written {
            // Fields written before the failure stay revertible.
            if bundle != loaded {
                if let Err(store_err) = self.store_bundle(content, &bundle).await {
                    tracing::warn!("Failed to save revert data for {}: {}", content, store_err);
                }
            }
            return Err(e);
        }

        if bundle != loaded {
            self.store_bundle(content, &bundle).await?;
        }

        let label = entity_label(content);
        if !updated.is_empty() {
            let mut outcome = Outcome::new(format!("{} updated", label), content.clone());
            outcome.fields = updated;
            outcome.url_record_id = stored.map(|s| s.id);
            self.log.info(&outcome.message).await;
            return Ok(outcome);
        }

        match stored {
            Some(stored) => {
                let mut outcome = Outcome::new(
                    format!("{} saved to URL table only", label),
                    content.clone(),
                );
                outcome.url_table_only = true;
                outcome.url_record_id = Some(stored.id);
                self.log.info(&outcome.message).await;
                Ok(outcome)
            }
            None => Err(SyncError::NoFieldsUpdated),
        }
    }

    /// Write every incoming legacy field of `content`. Each snapshot is
    /// taken before its write.
    async fn write_entity_fields(
        &self,
        content: &ContentRef,
        payload: &OptimizationPayload,
        bundle: &mut RevertBundle,
        updated: &mut Vec<&'static str>,
    ) -> SyncResult<()> {
        for field in BundleField::ALL {
            let Some(location) = self.location(content, field) else {
                continue;
            };
            let Some(value) = self.incoming(field, payload) else {
                continue;
            };
            let previous = self.read(&location).await?.unwrap_or_default();
            let fresh = bundle.snapshot(field, previous);
            if self.write(&location, &value).await? {
                updated.push(field.label());
                tracing::debug!("Updated {} {}: {}", content, field.as_str(), value);
            } else if fresh {
                bundle.take(field);
            }
        }

        if self.toggles.image_alt && payload.has_images() && Self::takes_images(content) {
            let mut images = ImageUpdate::default();
            let result = self
                .update_images(&payload.image_optimizations, &mut images)
                .await;
            if result.is_err() || images.updated > 0 {
                for backup in images.backups {
                    bundle.snapshot_image(backup);
                }
            }
            result?;
            if images.updated > 0 {
                updated.push(BundleField::Images.label());
            }
        }

        Ok(())
    }

    async fn apply_unresolved(
        &self,
        payload: &OptimizationPayload,
        stored: Option<Stored>,
    ) -> SyncResult<Outcome> {
        if let Some(stored) = stored {
            self.log
                .info(&format!(
                    "URL stored in table but post not found: {}",
                    payload.page_url
                ))
                .await;
            let mut outcome = Outcome::new(
                "SEO data saved to URL table (post not resolved)",
                ContentRef::Unknown,
            );
            outcome.url_table_only = true;
            outcome.url_record_id = Some(stored.id);
            return Ok(outcome);
        }

        if payload.has_images() {
            return self.apply_images_only(payload).await;
        }

        Err(SyncError::NotFound(
            "Content not found and no data to save".into(),
        ))
    }

    /// Update images by attachment URL without a resolved page.
    pub async fn apply_images_only(&self, payload: &OptimizationPayload) -> SyncResult<Outcome> {
        if !self.toggles.image_alt || !payload.has_images() {
            return Err(SyncError::Validation(
                "Image optimization not enabled or no images".into(),
            ));
        }
        let mut images = ImageUpdate::default();
        self.update_images(&payload.image_optimizations, &mut images)
            .await?;
        if images.updated == 0 {
            return Err(SyncError::Validation("No images updated".into()));
        }
        let mut outcome = Outcome::new("Images updated", ContentRef::Unknown);
        outcome.fields.push(BundleField::Images.label());
        outcome.count = Some(images.updated);
        self.log.info(&outcome.message).await;
        Ok(outcome)
    }

    /// Revert a URL: the URL table first, then the legacy metadata of the
    /// content it resolves to.
    pub async fn revert_url(&self, url: &str, fields: &[String]) -> SyncResult<Outcome> {
        let store = self.revert_url_table(url, fields).await;
        if let StoreRevert::Reverted(_) = &store {
            self.log
                .info(&format!("Reverted SEO data from URL table for: {}", url))
                .await;
        }

        let content = self.resolve(url).await?;
        let url_table_outcome = |content: ContentRef| -> Option<Outcome> {
            let StoreRevert::Reverted(reverted) = &store else {
                return None;
            };
            let mut outcome = Outcome::new(
                match content {
                    ContentRef::Unknown => "Reverted from URL table (post not resolved)",
                    _ => "Reverted from URL table",
                },
                content,
            );
            outcome.fields = reverted.iter().map(|f| f.label()).collect();
            outcome.url_table_only = true;
            Some(outcome)
        };

        if content == ContentRef::Unknown {
            return url_table_outcome(content)
                .ok_or_else(|| SyncError::NotFound("Cannot revert: content not found".into()));
        }

        match self.revert(&content, fields).await {
            Ok(outcome) => Ok(outcome),
            Err(e @ (SyncError::NotFound(_) | SyncError::NothingToRevert)) => {
                url_table_outcome(content).ok_or(e)
            }
            Err(e) => Err(e),
        }
    }

    async fn revert_url_table(&self, url: &str, fields: &[String]) -> StoreRevert {
        let mut requested: Vec<SeoField> = Vec::new();
        for field in fields.iter().filter_map(|f| SeoField::from_request(f)) {
            if !requested.contains(&field) {
                requested.push(field);
            }
        }
        if !fields.is_empty() && requested.is_empty() {
            return StoreRevert::NothingToRevert;
        }
        match self.seo.revert(url, &requested).await {
            Ok(result) => result,
            Err(e) => {
                self.log
                    .error(
                        "Failed to revert SEO data in URL table",
                        Some(json!({ "url": url, "fields": fields, "error": e.to_string() })),
                    )
                    .await;
                StoreRevert::NothingToRevert
            }
        }
    }

    /// Restore legacy metadata from the content's revert bundle.
    ///
    /// Only fields present in both the request and the bundle are restored;
    /// an empty request means every field. Entity bundles lose the restored
    /// fields and are deleted once empty. The homepage backup is left in
    /// place; see [`Self::clear_homepage_backup`].
    pub async fn revert(&self, content: &ContentRef, fields: &[String]) -> SyncResult<Outcome> {
        let label = entity_label(content);
        let Some(mut bundle) = self.load_bundle(content).await? else {
            return match content {
                ContentRef::Homepage => self.reset_homepage().await,
                ContentRef::Unknown => {
                    Err(SyncError::NotFound("Cannot revert: content not found".into()))
                }
                _ => Err(SyncError::NotFound("No revert data found".into())),
            };
        };

        let is_term = matches!(content, ContentRef::TaxonomyTerm { .. });
        let mut requested: Vec<BundleField> = Vec::new();
        for field in BundleField::parse_requested(fields) {
            let field = match field {
                BundleField::PageTitle if is_term => BundleField::TermName,
                other => other,
            };
            if !requested.contains(&field) {
                requested.push(field);
            }
        }

        let keep_backup = *content == ContentRef::Homepage;
        let mut reverted = Vec::new();
        for field in requested {
            if field == BundleField::Images {
                if !Self::takes_images(content) || !bundle.contains(field) {
                    continue;
                }
                let backups = if keep_backup {
                    bundle.image_optimizations.clone()
                } else {
                    bundle.take_images()
                };
                self.revert_images(&backups).await?;
                reverted.push(field.label());
                continue;
            }

            let Some(location) = self.location(content, field) else {
                continue;
            };
            let value = if keep_backup {
                bundle.get(field).map(str::to_string)
            } else {
                bundle.take(field)
            };
            let Some(value) = value else {
                continue;
            };
            if self.restore(&location, &value).await? {
                reverted.push(field.label());
            }
        }

        if !keep_backup {
            self.store_bundle(content, &bundle).await?;
        }

        if reverted.is_empty() {
            return Err(SyncError::NothingToRevert);
        }
        let mut outcome = Outcome::new(format!("{} reverted", label), content.clone());
        outcome.fields = reverted;
        self.log.info(&outcome.message).await;
        Ok(outcome)
    }

    /// Homepage revert with no backup: drop every homepage option.
    async fn reset_homepage(&self) -> SyncResult<Outcome> {
        for option in [
            keys::HOMEPAGE_TITLE,
            keys::HOMEPAGE_DESCRIPTION,
            keys::HOMEPAGE_SCHEMA,
            keys::HOMEPAGE_CANONICAL,
        ] {
            self.legacy.delete_option(option).await?;
        }
        let outcome = Outcome::new(
            "Homepage reverted to default (no backup found)",
            ContentRef::Homepage,
        );
        self.log.info(&outcome.message).await;
        Ok(outcome)
    }

    /// Delete the homepage backup. Returns whether one existed.
    pub async fn clear_homepage_backup(&self) -> SyncResult<bool> {
        let removed = self.legacy.delete_option(keys::HOMEPAGE_BACKUP).await?;
        if removed {
            self.log.info("Homepage revert data cleared").await;
        }
        Ok(removed)
    }

    /// Current homepage backup, if any.
    pub async fn homepage_backup(&self) -> SyncResult<Option<RevertBundle>> {
        self.load_bundle(&ContentRef::Homepage).await
    }
}

fn enabled(toggle: bool, value: Option<&str>) -> Option<String> {
    value
        .filter(|v| toggle && !v.trim().is_empty())
        .map(str::to_string)
}

fn entity_label(content: &ContentRef) -> String {
    match content {
        ContentRef::Homepage => "Homepage".to_string(),
        ContentRef::Post { id } => format!("Post {}", id),
        ContentRef::TaxonomyTerm { id, .. } => format!("Term {}", id),
        ContentRef::Unknown => "Content".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::activity_log::MemoryActivityLog;
    use crate::models::{Attachment, ImageOptimization, Post, SiteExport, Taxonomy, Term};
    use crate::repository::migrations::run_migrations;
    use crate::repository::DbPool;
    use crate::site::{InMemorySite, MetaScope, SiteError, SiteResult};
    use std::sync::atomic::{AtomicBool, Ordering};
    use tempfile::tempdir;

    const YOAST_TITLE: &str = "_yoast_wpseo_title";

    struct Fixture {
        engine: ReconciliationEngine,
        site: InMemorySite,
        seo: DieselSeoDataRepository,
        log: MemoryActivityLog,
        _dir: tempfile::TempDir,
    }

    fn post(id: i64, slug: &str, status: &str) -> Post {
        Post {
            id,
            post_type: "post".into(),
            slug: slug.into(),
            permalink: format!("https://example.com/{slug}/"),
            status: status.into(),
            title: slug.into(),
            published_at: None,
        }
    }

    fn export() -> SiteExport {
        SiteExport {
            posts: vec![post(1, "hello", "publish"), post(2, "draft-post", "draft")],
            taxonomies: vec![Taxonomy {
                name: "category".into(),
                public: true,
            }],
            terms: vec![Term {
                id: 10,
                taxonomy: "category".into(),
                slug: "news".into(),
                name: "News".into(),
            }],
            attachments: vec![Attachment {
                id: 50,
                url: "https://example.com/wp-content/a.png".into(),
                title: "A".into(),
            }],
        }
    }

    async fn fixture_with(toggles: ModuleToggleSet) -> Fixture {
        let dir = tempdir().unwrap();
        let db_url = dir.path().join("test.db").display().to_string();
        run_migrations(&db_url).await.unwrap();
        let seo = DieselSeoDataRepository::new(DbPool::from_url(&db_url));
        let site = InMemorySite::new(export());
        let log = MemoryActivityLog::new();
        let engine = ReconciliationEngine::new(
            seo.clone(),
            Arc::new(site.clone()),
            Arc::new(site.clone()),
            Arc::new(log.clone()),
            EngineConfig {
                home_url: "https://example.com".into(),
                compat_mode: CompatMode::Yoast,
                toggles,
            },
        );
        Fixture {
            engine,
            site,
            seo,
            log,
            _dir: dir,
        }
    }

    /// Legacy store whose first write to one meta key fails.
    struct FailingOnce {
        inner: InMemorySite,
        key: &'static str,
        tripped: AtomicBool,
    }

    #[async_trait::async_trait]
    impl LegacyStore for FailingOnce {
        async fn get_meta(&self, scope: MetaScope, key: &str) -> SiteResult<Option<String>> {
            self.inner.get_meta(scope, key).await
        }

        async fn set_meta(&self, scope: MetaScope, key: &str, value: &str) -> SiteResult<()> {
            if key == self.key && !self.tripped.swap(true, Ordering::SeqCst) {
                return Err(SiteError::Database("disk full".into()));
            }
            self.inner.set_meta(scope, key, value).await
        }

        async fn delete_meta(&self, scope: MetaScope, key: &str) -> SiteResult<bool> {
            self.inner.delete_meta(scope, key).await
        }

        async fn get_option(&self, name: &str) -> SiteResult<Option<String>> {
            self.inner.get_option(name).await
        }

        async fn set_option(&self, name: &str, value: &str) -> SiteResult<()> {
            self.inner.set_option(name, value).await
        }

        async fn delete_option(&self, name: &str) -> SiteResult<bool> {
            self.inner.delete_option(name).await
        }

        async fn set_post_title(&self, id: i64, title: &str) -> SiteResult<bool> {
            self.inner.set_post_title(id, title).await
        }

        async fn set_term_name(&self, id: i64, name: &str) -> SiteResult<bool> {
            self.inner.set_term_name(id, name).await
        }
    }

    async fn fixture() -> Fixture {
        fixture_with(ModuleToggleSet::all_enabled()).await
    }

    fn titled(url: &str, title: &str) -> OptimizationPayload {
        OptimizationPayload {
            page_title: Some(title.into()),
            ..OptimizationPayload::for_url(url)
        }
    }

    fn revert_request(url: &str, fields: &[&str]) -> OptimizationPayload {
        OptimizationPayload {
            action: Some("revert".into()),
            fields: Some(fields.iter().map(|f| f.to_string()).collect()),
            ..OptimizationPayload::for_url(url)
        }
    }

    #[tokio::test]
    async fn test_post_update_then_revert_restores_first_values() {
        let f = fixture().await;
        let url = "https://example.com/hello/";
        f.site
            .set_meta(MetaScope::Post(1), YOAST_TITLE, "Original")
            .await
            .unwrap();

        let outcome = f.engine.handle(titled(url, "A")).await.unwrap();
        assert_eq!(outcome.content, ContentRef::Post { id: 1 });
        assert_eq!(outcome.fields, vec!["title"]);
        assert!(outcome.url_record_id.is_some());

        f.engine.handle(titled(url, "B")).await.unwrap();
        let meta = f.site.get_meta(MetaScope::Post(1), YOAST_TITLE).await.unwrap();
        assert_eq!(meta.as_deref(), Some("B"));
        let bundle = f
            .engine
            .load_bundle(&ContentRef::Post { id: 1 })
            .await
            .unwrap()
            .unwrap();
        assert_eq!(bundle.page_title.as_deref(), Some("Original"));

        let outcome = f
            .engine
            .handle(revert_request(url, &["post_title"]))
            .await
            .unwrap();
        assert_eq!(outcome.fields, vec!["title"]);
        let meta = f.site.get_meta(MetaScope::Post(1), YOAST_TITLE).await.unwrap();
        assert_eq!(meta.as_deref(), Some("Original"));

        let record = f.seo.get(url).await.unwrap().unwrap();
        assert_eq!(record.title.as_deref(), Some("A"));
        assert_eq!(record.original_title, None);
        assert!(f
            .site
            .get_meta(MetaScope::Post(1), keys::REVERT_BUNDLE)
            .await
            .unwrap()
            .is_none());
    }

    #[tokio::test]
    async fn test_failed_write_keeps_earlier_snapshots() {
        let f = fixture().await;
        let url = "https://example.com/hello/";
        f.site
            .set_meta(MetaScope::Post(1), YOAST_TITLE, "Original")
            .await
            .unwrap();
        let engine = ReconciliationEngine::new(
            f.seo.clone(),
            Arc::new(FailingOnce {
                inner: f.site.clone(),
                key: keys::CANONICAL,
                tripped: AtomicBool::new(false),
            }),
            Arc::new(f.site.clone()),
            Arc::new(f.log.clone()),
            EngineConfig {
                home_url: "https://example.com".into(),
                compat_mode: CompatMode::Yoast,
                toggles: ModuleToggleSet::all_enabled(),
            },
        );

        let payload = OptimizationPayload {
            canonical_url: Some("https://example.com/canonical".into()),
            ..titled(url, "A")
        };
        let err = engine.handle(payload).await.unwrap_err();
        assert!(matches!(err, SyncError::Persistence(_)));
        let meta = f.site.get_meta(MetaScope::Post(1), YOAST_TITLE).await.unwrap();
        assert_eq!(meta.as_deref(), Some("A"));

        engine.handle(titled(url, "B")).await.unwrap();
        engine
            .handle(revert_request(url, &["page_title"]))
            .await
            .unwrap();
        let meta = f.site.get_meta(MetaScope::Post(1), YOAST_TITLE).await.unwrap();
        assert_eq!(meta.as_deref(), Some("Original"));
    }

    #[tokio::test]
    async fn test_term_name_revert_restores_both_stores() {
        let f = fixture().await;
        let url = "https://example.com/category/news";
        for name in ["First", "Second"] {
            let payload = OptimizationPayload {
                term_name: Some(name.into()),
                ..OptimizationPayload::for_url(url)
            };
            f.engine.handle(payload).await.unwrap();
        }

        let outcome = f
            .engine
            .handle(revert_request(url, &["term_name"]))
            .await
            .unwrap();
        assert_eq!(outcome.fields, vec!["name"]);
        assert_eq!(f.site.get_term(10).await.unwrap().unwrap().name, "News");

        let record = f.seo.get(url).await.unwrap().unwrap();
        assert_eq!(record.title.as_deref(), Some("First"));
        assert_eq!(record.original_title, None);
    }

    #[tokio::test]
    async fn test_unpublished_post_is_rejected_after_url_table_write() {
        let f = fixture().await;
        let url = "https://example.com/draft-post/";
        let err = f.engine.handle(titled(url, "Draft")).await.unwrap_err();
        assert!(matches!(err, SyncError::NotFound(_)));
        assert!(f.seo.get(url).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_term_update_and_revert() {
        let f = fixture().await;
        let url = "https://example.com/category/news";
        let payload = OptimizationPayload {
            term_name: Some("Latest News".into()),
            meta_description: Some("All the news".into()),
            ..OptimizationPayload::for_url(url)
        };
        let outcome = f.engine.handle(payload).await.unwrap();
        assert_eq!(outcome.fields, vec!["description", "name"]);
        assert_eq!(f.site.get_term(10).await.unwrap().unwrap().name, "Latest News");
        assert_eq!(
            f.site
                .get_meta(MetaScope::Term(10), "wpseo_desc")
                .await
                .unwrap()
                .as_deref(),
            Some("All the news")
        );
        assert_eq!(
            f.seo.get(url).await.unwrap().unwrap().title.as_deref(),
            Some("Latest News")
        );

        let content = ContentRef::TaxonomyTerm {
            id: 10,
            taxonomy: "category".into(),
        };
        let outcome = f.engine.revert(&content, &[]).await.unwrap();
        assert_eq!(outcome.message, "Term 10 reverted");
        assert_eq!(f.site.get_term(10).await.unwrap().unwrap().name, "News");
        assert!(f
            .site
            .get_meta(MetaScope::Term(10), "wpseo_desc")
            .await
            .unwrap()
            .is_none());

        let err = f.engine.revert(&content, &[]).await.unwrap_err();
        assert!(matches!(err, SyncError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_homepage_backup_survives_revert_until_cleared() {
        let f = fixture().await;
        f.site
            .set_option(keys::HOMEPAGE_TITLE, "Old Home")
            .await
            .unwrap();

        let outcome = f
            .engine
            .handle(titled("https://example.com/", "New Home"))
            .await
            .unwrap();
        assert_eq!(outcome.content, ContentRef::Homepage);
        let options = f.site.options().await;
        assert_eq!(options.get(keys::HOMEPAGE_TITLE).map(String::as_str), Some("New Home"));
        assert_eq!(
            f.site
                .get_option_slot("wpseo_titles", "title-home-wpseo")
                .await
                .unwrap()
                .as_deref(),
            Some("New Home")
        );

        let outcome = f.engine.revert(&ContentRef::Homepage, &[]).await.unwrap();
        assert_eq!(outcome.fields, vec!["title"]);
        assert_eq!(
            f.site.get_option(keys::HOMEPAGE_TITLE).await.unwrap().as_deref(),
            Some("Old Home")
        );
        assert!(f.engine.homepage_backup().await.unwrap().is_some());

        assert!(f.engine.clear_homepage_backup().await.unwrap());
        assert!(f.engine.homepage_backup().await.unwrap().is_none());

        let outcome = f.engine.revert(&ContentRef::Homepage, &[]).await.unwrap();
        assert_eq!(outcome.message, "Homepage reverted to default (no backup found)");
        assert!(f.site.get_option(keys::HOMEPAGE_TITLE).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_unresolved_url_is_saved_to_url_table_only() {
        let f = fixture().await;
        let url = "https://example.com/nowhere/at/all";
        let outcome = f.engine.handle(titled(url, "Lost")).await.unwrap();
        assert!(outcome.url_table_only);
        assert_eq!(outcome.content, ContentRef::Unknown);
        assert_eq!(f.log.matching("URL stored in table").await.len(), 1);

        let outcome = f.engine.handle(revert_request(url, &[])).await;
        assert!(matches!(outcome, Err(SyncError::NotFound(_))));

        let err = f
            .engine
            .handle(OptimizationPayload::for_url(url))
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "Content not found and no data to save");
    }

    #[tokio::test]
    async fn test_image_only_update_for_unresolved_url() {
        let f = fixture().await;
        let payload = OptimizationPayload {
            image_optimizations: vec![
                ImageOptimization {
                    image_url: "https://example.com/wp-content/a.png".into(),
                    new_alt_text: Some("A cat".into()),
                    new_title: None,
                },
                ImageOptimization {
                    image_url: "https://example.com/wp-content/missing.png".into(),
                    new_alt_text: Some("Nothing".into()),
                    new_title: None,
                },
            ],
            ..OptimizationPayload::for_url("https://example.com/gallery/unknown")
        };
        let outcome = f.engine.handle(payload).await.unwrap();
        assert_eq!(outcome.message, "Images updated");
        assert_eq!(outcome.count, Some(1));
        assert_eq!(
            f.site
                .get_meta(MetaScope::Post(50), keys::IMAGE_ALT)
                .await
                .unwrap()
                .as_deref(),
            Some("A cat")
        );
    }

    #[tokio::test]
    async fn test_post_images_and_links_revert() {
        let f = fixture().await;
        f.site
            .set_meta(MetaScope::Post(50), keys::IMAGE_ALT, "old alt")
            .await
            .unwrap();
        let mut payload = OptimizationPayload {
            image_optimizations: vec![ImageOptimization {
                image_url: "https://example.com/wp-content/a.png".into(),
                new_alt_text: Some("new alt".into()),
                new_title: Some("New".into()),
            }],
            ..OptimizationPayload::for_url("https://example.com/hello")
        };
        payload
            .link_titles
            .insert("https://example.com/about".into(), "About us".into());

        let outcome = f.engine.handle(payload).await.unwrap();
        assert_eq!(outcome.fields, vec!["links", "images"]);
        let links = f
            .site
            .get_meta(MetaScope::Post(1), keys::LINK_TITLES)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(links, r#"{"https://example.com/about":"About us"}"#);

        let outcome = f
            .engine
            .revert(&ContentRef::Post { id: 1 }, &["images".to_string()])
            .await
            .unwrap();
        assert_eq!(outcome.fields, vec!["images"]);
        assert_eq!(
            f.site
                .get_meta(MetaScope::Post(50), keys::IMAGE_ALT)
                .await
                .unwrap()
                .as_deref(),
            Some("old alt")
        );
        let attachment = f
            .site
            .attachment_for_url("https://example.com/wp-content/a.png")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(attachment.title, "A");

        // Link titles are still held.
        let bundle = f
            .engine
            .load_bundle(&ContentRef::Post { id: 1 })
            .await
            .unwrap()
            .unwrap();
        assert_eq!(bundle.link_titles.as_deref(), Some(""));
    }

    #[tokio::test]
    async fn test_disabled_module_skips_both_writes() {
        let toggles = ModuleToggleSet {
            title: false,
            ..ModuleToggleSet::all_enabled()
        };
        let f = fixture_with(toggles).await;
        let url = "https://example.com/hello/";
        let err = f.engine.handle(titled(url, "Ignored")).await.unwrap_err();
        assert!(matches!(err, SyncError::NoFieldsUpdated));
        assert!(f.seo.get(url).await.unwrap().is_none());
        assert!(f
            .site
            .get_meta(MetaScope::Post(1), YOAST_TITLE)
            .await
            .unwrap()
            .is_none());
    }

    #[tokio::test]
    async fn test_revert_with_only_url_table_backup() {
        let f = fixture().await;
        let url = "https://example.com/hello/";
        for title in ["Before", "After"] {
            let fields = SeoFields {
                title: Some(title.into()),
                ..Default::default()
            };
            f.seo.upsert(url, &fields, true).await.unwrap();
        }

        let outcome = f.engine.revert_url(url, &[]).await.unwrap();
        assert!(outcome.url_table_only);
        assert_eq!(outcome.fields, vec!["title"]);
        assert_eq!(
            f.seo.get(url).await.unwrap().unwrap().title.as_deref(),
            Some("Before")
        );
    }

    #[tokio::test]
    async fn test_invalid_payload_is_rejected() {
        let f = fixture().await;
        let err = f
            .engine
            .handle(OptimizationPayload::for_url("javascript:alert(1)"))
            .await
            .unwrap_err();
        assert!(matches!(err, SyncError::Validation(_)));
    }
}
