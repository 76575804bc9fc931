//! SQLite-backed site directory and legacy option/meta store.

use async_trait::async_trait;
use diesel::prelude::*;
use diesel_async::RunQueryDsl;

use super::models::{NewSitePost, SiteAttachmentRecord, SitePostRecord, SiteTermRecord};
use super::pool::{DbPool, DieselError};
use super::{format_datetime, now_timestamp, parse_datetime_opt};
use crate::models::{Attachment, Post, SiteExport, Term, POST_STATUS_PUBLISH};
use crate::schema::{
    entity_meta, site_attachments, site_options, site_posts, site_taxonomies, site_terms,
};
use crate::site::{LegacyStore, MetaScope, SiteDirectory, SiteResult};
use crate::utils::normalize;
use crate::with_conn;

impl From<SitePostRecord> for Post {
    fn from(record: SitePostRecord) -> Self {
        Post {
            id: record.id,
            post_type: record.post_type,
            slug: record.slug,
            permalink: record.permalink,
            status: record.status,
            title: record.title,
            published_at: parse_datetime_opt(record.published_at),
        }
    }
}

impl From<SiteTermRecord> for Term {
    fn from(record: SiteTermRecord) -> Self {
        Term {
            id: record.id,
            taxonomy: record.taxonomy,
            slug: record.slug,
            name: record.name,
        }
    }
}

impl From<SiteAttachmentRecord> for Attachment {
    fn from(record: SiteAttachmentRecord) -> Self {
        Attachment {
            id: record.id,
            url: record.url,
            title: record.title,
        }
    }
}

/// Counts of rows written by [`DieselSiteRepository::import`].
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ImportSummary {
    pub posts: usize,
    pub taxonomies: usize,
    pub terms: usize,
    pub attachments: usize,
}

/// Site tables and legacy stores in SQLite.
#[derive(Clone)]
pub struct DieselSiteRepository {
    pool: DbPool,
}

impl DieselSiteRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    /// Load a site export, replacing rows with the same keys.
    pub async fn import(&self, export: &SiteExport) -> Result<ImportSummary, DieselError> {
        let mut summary = ImportSummary::default();
        with_conn!(self.pool, conn, {
            for post in &export.posts {
                let permalink_normalized = normalize(&post.permalink);
                diesel::replace_into(site_posts::table)
                    .values(&NewSitePost {
                        id: post.id,
                        post_type: &post.post_type,
                        slug: &post.slug,
                        permalink: &post.permalink,
                        permalink_normalized: &permalink_normalized,
                        status: &post.status,
                        title: &post.title,
                        published_at: post.published_at.map(format_datetime),
                    })
                    .execute(&mut conn)
                    .await?;
                summary.posts += 1;
            }

            for (position, taxonomy) in export.taxonomies.iter().enumerate() {
                diesel::replace_into(site_taxonomies::table)
                    .values((
                        site_taxonomies::name.eq(&taxonomy.name),
                        site_taxonomies::is_public.eq(i32::from(taxonomy.public)),
                        site_taxonomies::position.eq(position as i32),
                    ))
                    .execute(&mut conn)
                    .await?;
                summary.taxonomies += 1;
            }

            for term in &export.terms {
                diesel::replace_into(site_terms::table)
                    .values((
                        site_terms::id.eq(term.id),
                        site_terms::taxonomy.eq(&term.taxonomy),
                        site_terms::slug.eq(&term.slug),
                        site_terms::name.eq(&term.name),
                    ))
                    .execute(&mut conn)
                    .await?;
                summary.terms += 1;
            }

            for attachment in &export.attachments {
                diesel::replace_into(site_attachments::table)
                    .values((
                        site_attachments::id.eq(attachment.id),
                        site_attachments::url.eq(&attachment.url),
                        site_attachments::url_normalized.eq(normalize(&attachment.url)),
                        site_attachments::title.eq(&attachment.title),
                    ))
                    .execute(&mut conn)
                    .await?;
                summary.attachments += 1;
            }

            Ok(summary)
        })
    }
}

#[async_trait]
impl SiteDirectory for DieselSiteRepository {
    async fn post_id_for_url(&self, url: &str) -> SiteResult<Option<i64>> {
        let key = normalize(url);
        Ok(with_conn!(self.pool, conn, {
            site_posts::table
                .filter(site_posts::permalink_normalized.eq(&key))
                .select(site_posts::id)
                .first::<i64>(&mut conn)
                .await
                .optional()
        })?)
    }

    async fn find_published_post_by_slug(&self, slug: &str) -> SiteResult<Option<Post>> {
        Ok(with_conn!(self.pool, conn, {
            site_posts::table
                .filter(site_posts::slug.eq(slug))
                .filter(site_posts::status.eq(POST_STATUS_PUBLISH))
                .order(site_posts::published_at.desc())
                .first::<SitePostRecord>(&mut conn)
                .await
                .optional()
                .map(|opt| opt.map(Post::from))
        })?)
    }

    async fn public_taxonomies(&self) -> SiteResult<Vec<String>> {
        Ok(with_conn!(self.pool, conn, {
            site_taxonomies::table
                .filter(site_taxonomies::is_public.eq(1))
                .order((site_taxonomies::position.asc(), site_taxonomies::name.asc()))
                .select(site_taxonomies::name)
                .load::<String>(&mut conn)
                .await
        })?)
    }

    async fn find_term_by_slug(&self, taxonomy: &str, slug: &str) -> SiteResult<Option<Term>> {
        Ok(with_conn!(self.pool, conn, {
            site_terms::table
                .filter(site_terms::taxonomy.eq(taxonomy))
                .filter(site_terms::slug.eq(slug))
                .first::<SiteTermRecord>(&mut conn)
                .await
                .optional()
                .map(|opt| opt.map(Term::from))
        })?)
    }

    async fn get_post(&self, id: i64) -> SiteResult<Option<Post>> {
        Ok(with_conn!(self.pool, conn, {
            site_posts::table
                .find(id)
                .first::<SitePostRecord>(&mut conn)
                .await
                .optional()
                .map(|opt| opt.map(Post::from))
        })?)
    }

    async fn get_term(&self, id: i64) -> SiteResult<Option<Term>> {
        Ok(with_conn!(self.pool, conn, {
            site_terms::table
                .find(id)
                .first::<SiteTermRecord>(&mut conn)
                .await
                .optional()
                .map(|opt| opt.map(Term::from))
        })?)
    }

    async fn attachment_for_url(&self, url: &str) -> SiteResult<Option<Attachment>> {
        let key = normalize(url);
        Ok(with_conn!(self.pool, conn, {
            site_attachments::table
                .filter(site_attachments::url_normalized.eq(&key))
                .first::<SiteAttachmentRecord>(&mut conn)
                .await
                .optional()
                .map(|opt| opt.map(Attachment::from))
        })?)
    }

    async fn published_posts(&self) -> SiteResult<Vec<Post>> {
        Ok(with_conn!(self.pool, conn, {
            site_posts::table
                .filter(site_posts::status.eq(POST_STATUS_PUBLISH))
                .order(site_posts::id.asc())
                .load::<SitePostRecord>(&mut conn)
                .await
                .map(|records| records.into_iter().map(Post::from).collect())
        })?)
    }

    async fn count_published_posts(&self) -> SiteResult<i64> {
        use diesel::dsl::count_star;
        Ok(with_conn!(self.pool, conn, {
            site_posts::table
                .filter(site_posts::status.eq(POST_STATUS_PUBLISH))
                .select(count_star())
                .first::<i64>(&mut conn)
                .await
        })?)
    }
}

#[async_trait]
impl LegacyStore for DieselSiteRepository {
    async fn get_meta(&self, scope: MetaScope, key: &str) -> SiteResult<Option<String>> {
        Ok(with_conn!(self.pool, conn, {
            entity_meta::table
                .filter(entity_meta::scope.eq(scope.as_str()))
                .filter(entity_meta::entity_id.eq(scope.id()))
                .filter(entity_meta::meta_key.eq(key))
                .select(entity_meta::meta_value)
                .first::<String>(&mut conn)
                .await
                .optional()
        })?)
    }

    async fn set_meta(&self, scope: MetaScope, key: &str, value: &str) -> SiteResult<()> {
        with_conn!(self.pool, conn, {
            diesel::replace_into(entity_meta::table)
                .values((
                    entity_meta::scope.eq(scope.as_str()),
                    entity_meta::entity_id.eq(scope.id()),
                    entity_meta::meta_key.eq(key),
                    entity_meta::meta_value.eq(value),
                ))
                .execute(&mut conn)
                .await
        })?;
        Ok(())
    }

    async fn delete_meta(&self, scope: MetaScope, key: &str) -> SiteResult<bool> {
        let rows = with_conn!(self.pool, conn, {
            diesel::delete(
                entity_meta::table
                    .filter(entity_meta::scope.eq(scope.as_str()))
                    .filter(entity_meta::entity_id.eq(scope.id()))
                    .filter(entity_meta::meta_key.eq(key)),
            )
            .execute(&mut conn)
            .await
        })?;
        Ok(rows > 0)
    }

    async fn get_option(&self, name: &str) -> SiteResult<Option<String>> {
        Ok(with_conn!(self.pool, conn, {
            site_options::table
                .find(name)
                .select(site_options::value)
                .first::<String>(&mut conn)
                .await
                .optional()
        })?)
    }

    async fn set_option(&self, name: &str, value: &str) -> SiteResult<()> {
        let now = now_timestamp();
        with_conn!(self.pool, conn, {
            diesel::replace_into(site_options::table)
                .values((
                    site_options::name.eq(name),
                    site_options::value.eq(value),
                    site_options::updated_at.eq(&now),
                ))
                .execute(&mut conn)
                .await
        })?;
        Ok(())
    }

    async fn delete_option(&self, name: &str) -> SiteResult<bool> {
        let rows = with_conn!(self.pool, conn, {
            diesel::delete(site_options::table.find(name))
                .execute(&mut conn)
                .await
        })?;
        Ok(rows > 0)
    }

    async fn set_post_title(&self, id: i64, title: &str) -> SiteResult<bool> {
        let rows = with_conn!(self.pool, conn, {
            let rows = diesel::update(site_posts::table.find(id))
                .set(site_posts::title.eq(title))
                .execute(&mut conn)
                .await?;
            if rows > 0 {
                Ok::<usize, DieselError>(rows)
            } else {
                diesel::update(site_attachments::table.find(id))
                    .set(site_attachments::title.eq(title))
                    .execute(&mut conn)
                    .await
            }
        })?;
        Ok(rows > 0)
    }

    async fn set_term_name(&self, id: i64, name: &str) -> SiteResult<bool> {
        let rows = with_conn!(self.pool, conn, {
            diesel::update(site_terms::table.find(id))
                .set(site_terms::name.eq(name))
                .execute(&mut conn)
                .await
        })?;
        Ok(rows > 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Taxonomy;
    use crate::repository::migrations::run_migrations;
    use chrono::{TimeZone, Utc};
    use tempfile::tempdir;

    async fn setup_test_db() -> (DieselSiteRepository, tempfile::TempDir) {
        let dir = tempdir().unwrap();
        let db_url = dir.path().join("test.db").display().to_string();
        run_migrations(&db_url).await.unwrap();
        (DieselSiteRepository::new(DbPool::from_url(&db_url)), dir)
    }

    fn export() -> SiteExport {
        SiteExport {
            posts: vec![
                Post {
                    id: 1,
                    post_type: "post".into(),
                    slug: "news".into(),
                    permalink: "https://example.com/2020/news/".into(),
                    status: "publish".into(),
                    title: "Old news".into(),
                    published_at: Some(Utc.with_ymd_and_hms(2020, 1, 1, 0, 0, 0).unwrap()),
                },
                Post {
                    id: 2,
                    post_type: "post".into(),
                    slug: "news".into(),
                    permalink: "https://example.com/2024/news/".into(),
                    status: "publish".into(),
                    title: "New news".into(),
                    published_at: Some(Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap()),
                },
            ],
            taxonomies: vec![
                Taxonomy {
                    name: "post_tag".into(),
                    public: true,
                },
                Taxonomy {
                    name: "category".into(),
                    public: true,
                },
            ],
            terms: vec![Term {
                id: 10,
                taxonomy: "category".into(),
                slug: "guides".into(),
                name: "Guides".into(),
            }],
            attachments: vec![Attachment {
                id: 30,
                url: "https://example.com/uploads/hero.jpg".into(),
                title: "hero".into(),
            }],
        }
    }

    #[tokio::test]
    async fn test_import_and_lookup() {
        let (repo, _dir) = setup_test_db().await;
        let summary = repo.import(&export()).await.unwrap();
        assert_eq!(summary.posts, 2);
        assert_eq!(summary.terms, 1);

        assert_eq!(
            repo.post_id_for_url("https://example.com/2020/news")
                .await
                .unwrap(),
            Some(1)
        );
        let latest = repo.find_published_post_by_slug("news").await.unwrap();
        assert_eq!(latest.map(|p| p.id), Some(2));
        assert_eq!(
            repo.public_taxonomies().await.unwrap(),
            vec!["post_tag".to_string(), "category".to_string()]
        );
        let term = repo.find_term_by_slug("category", "guides").await.unwrap();
        assert_eq!(term.map(|t| t.id), Some(10));
        assert_eq!(repo.count_published_posts().await.unwrap(), 2);
    }

    #[tokio::test]
    async fn test_meta_and_options() {
        let (repo, _dir) = setup_test_db().await;
        let scope = MetaScope::Post(1);
        repo.set_meta(scope, "_yoast_wpseo_title", "A").await.unwrap();
        repo.set_meta(scope, "_yoast_wpseo_title", "B").await.unwrap();
        assert_eq!(
            repo.get_meta(scope, "_yoast_wpseo_title")
                .await
                .unwrap()
                .as_deref(),
            Some("B")
        );
        assert_eq!(
            repo.get_meta(MetaScope::Term(1), "_yoast_wpseo_title")
                .await
                .unwrap(),
            None
        );
        assert!(repo.delete_meta(scope, "_yoast_wpseo_title").await.unwrap());
        assert!(!repo.delete_meta(scope, "_yoast_wpseo_title").await.unwrap());

        repo.set_option("blogname", "Example").await.unwrap();
        assert_eq!(
            repo.get_option("blogname").await.unwrap().as_deref(),
            Some("Example")
        );
        assert!(repo.delete_option("blogname").await.unwrap());
    }

    #[tokio::test]
    async fn test_titles_and_names() {
        let (repo, _dir) = setup_test_db().await;
        repo.import(&export()).await.unwrap();

        assert!(repo.set_post_title(2, "Renamed").await.unwrap());
        assert_eq!(repo.get_post(2).await.unwrap().unwrap().title, "Renamed");

        assert!(repo.set_post_title(30, "Hero").await.unwrap());
        let attachment = repo
            .attachment_for_url("https://example.com/uploads/hero.jpg")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(attachment.title, "Hero");

        assert!(repo.set_term_name(10, "How-to").await.unwrap());
        assert_eq!(repo.get_term(10).await.unwrap().unwrap().name, "How-to");
        assert!(!repo.set_term_name(99, "x").await.unwrap());
    }
}
