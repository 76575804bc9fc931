//! URL-keyed SEO data repository.
//!
//! One row per normalized URL. Current values may be overwritten freely;
//! the `original_*` columns hold the value seen immediately before the
//! first override and are only cleared by a revert.

use chrono::{Duration, Utc};
use diesel::prelude::*;
use diesel::sql_types::{BigInt, Text};
use diesel_async::RunQueryDsl;

use super::models::{NewSeoData, SeoDataChangeset, SeoDataRecord};
use super::pool::{DbPool, DieselError};
use super::util::{non_empty, to_diesel_error};
use super::{format_datetime, now_timestamp, parse_datetime, parse_datetime_opt};
use crate::models::{SeoField, SeoFields, SeoRecord, SeoStatistics, StoreRevert};
use crate::schema::seo_data;
use crate::utils::normalize;
use crate::with_conn;

impl From<SeoDataRecord> for SeoRecord {
    fn from(record: SeoDataRecord) -> Self {
        SeoRecord {
            id: record.id,
            url: record.page_url,
            url_normalized: record.page_url_normalized,
            resolved_entity_id: record.post_id,
            title: record.page_title,
            description: record.meta_description,
            canonical_url: record.canonical_url,
            schema: record.page_schema,
            original_title: record.original_title,
            original_description: record.original_description,
            original_canonical: record.original_canonical,
            original_schema: record.original_schema,
            created_at: parse_datetime(&record.created_at),
            updated_at: parse_datetime(&record.updated_at),
        }
    }
}

/// Column holding the backup of a field.
fn original_column(field: SeoField) -> &'static str {
    match field {
        SeoField::Title => "original_title",
        SeoField::Description => "original_description",
        SeoField::Canonical => "original_canonical",
        SeoField::Schema => "original_schema",
    }
}

fn set_current(changes: &mut SeoDataChangeset, field: SeoField, value: Option<String>) {
    match field {
        SeoField::Title => changes.page_title = Some(value),
        SeoField::Description => changes.meta_description = Some(value),
        SeoField::Canonical => changes.canonical_url = Some(value),
        SeoField::Schema => changes.page_schema = Some(value),
    }
}

#[derive(QueryableByName)]
struct TimestampRow {
    #[diesel(sql_type = diesel::sql_types::Nullable<Text>)]
    ts: Option<String>,
}

/// Diesel-backed SEO data store.
#[derive(Clone)]
pub struct DieselSeoDataRepository {
    pool: DbPool,
}

impl DieselSeoDataRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    /// Insert or update the record for `url`, returning its ID.
    ///
    /// Only fields carried by `fields` are written. With
    /// `preserve_originals`, each overwritten field whose backup is empty
    /// gets the existing non-empty current value copied into its backup
    /// first.
    pub async fn upsert(
        &self,
        url: &str,
        fields: &SeoFields,
        preserve_originals: bool,
    ) -> Result<i64, DieselError> {
        let normalized = normalize(url);
        if normalized.is_empty() {
            return Err(to_diesel_error("cannot store SEO data for an empty URL"));
        }
        let now = now_timestamp();

        with_conn!(self.pool, conn, {
            let existing = seo_data::table
                .filter(seo_data::page_url_normalized.eq(&normalized))
                .select(seo_data::id)
                .first::<i64>(&mut conn)
                .await
                .optional()?;

            let id = match existing {
                Some(id) => id,
                None => {
                    let inserted = diesel::insert_into(seo_data::table)
                        .values(&NewSeoData {
                            page_url: url,
                            page_url_normalized: &normalized,
                            post_id: fields.entity_id,
                            page_title: fields.title.as_deref(),
                            meta_description: fields.description.as_deref(),
                            canonical_url: fields.canonical_url.as_deref(),
                            page_schema: fields.schema.as_deref(),
                            created_at: &now,
                            updated_at: &now,
                        })
                        .on_conflict(seo_data::page_url_normalized)
                        .do_nothing()
                        .execute(&mut conn)
                        .await?;

                    let id = seo_data::table
                        .filter(seo_data::page_url_normalized.eq(&normalized))
                        .select(seo_data::id)
                        .first::<i64>(&mut conn)
                        .await?;

                    if inserted == 1 {
                        return Ok(id);
                    }
                    // Lost an insert race; fall through to the update path.
                    tracing::debug!("Concurrent insert for {}, updating instead", normalized);
                    id
                }
            };

            if preserve_originals {
                for field in fields.supplied() {
                    let current = field.as_str();
                    let original = original_column(field);
                    diesel::sql_query(format!(
                        "UPDATE seo_data SET {original} = {current} \
                         WHERE id = ? AND ({original} IS NULL OR {original} = '') \
                         AND {current} IS NOT NULL AND {current} <> ''"
                    ))
                    .bind::<BigInt, _>(id)
                    .execute(&mut conn)
                    .await?;
                }
            }

            let mut changes = SeoDataChangeset {
                page_url: Some(url.to_string()),
                updated_at: Some(now.clone()),
                ..Default::default()
            };
            if let Some(entity_id) = fields.entity_id {
                changes.post_id = Some(Some(entity_id));
            }
            for field in fields.supplied() {
                set_current(&mut changes, field, fields.get(field).map(str::to_string));
            }

            diesel::update(seo_data::table.find(id))
                .set(&changes)
                .execute(&mut conn)
                .await?;

            Ok(id)
        })
    }

    /// Get the record for a URL.
    pub async fn get(&self, url: &str) -> Result<Option<SeoRecord>, DieselError> {
        let normalized = normalize(url);
        with_conn!(self.pool, conn, {
            seo_data::table
                .filter(seo_data::page_url_normalized.eq(&normalized))
                .first::<SeoDataRecord>(&mut conn)
                .await
                .optional()
                .map(|opt| opt.map(SeoRecord::from))
        })
    }

    /// Most recently updated record linked to a post.
    pub async fn get_by_entity_id(&self, entity_id: i64) -> Result<Option<SeoRecord>, DieselError> {
        with_conn!(self.pool, conn, {
            seo_data::table
                .filter(seo_data::post_id.eq(entity_id))
                .order(seo_data::updated_at.desc())
                .first::<SeoDataRecord>(&mut conn)
                .await
                .optional()
                .map(|opt| opt.map(SeoRecord::from))
        })
    }

    /// Most recently updated records.
    pub async fn recent(&self, limit: i64) -> Result<Vec<SeoRecord>, DieselError> {
        with_conn!(self.pool, conn, {
            seo_data::table
                .order(seo_data::updated_at.desc())
                .limit(limit)
                .load::<SeoDataRecord>(&mut conn)
                .await
                .map(|records| records.into_iter().map(SeoRecord::from).collect())
        })
    }

    /// Restore backed-up values into the current fields.
    ///
    /// An empty `fields` slice reverts all four. Fields without a non-empty
    /// backup are skipped and do not count towards success.
    pub async fn revert(&self, url: &str, fields: &[SeoField]) -> Result<StoreRevert, DieselError> {
        let normalized = normalize(url);
        let requested: Vec<SeoField> = if fields.is_empty() {
            SeoField::ALL.to_vec()
        } else {
            fields.to_vec()
        };
        let now = now_timestamp();

        with_conn!(self.pool, conn, {
            let id = seo_data::table
                .filter(seo_data::page_url_normalized.eq(&normalized))
                .select(seo_data::id)
                .first::<i64>(&mut conn)
                .await
                .optional()?;
            let Some(id) = id else {
                return Ok(StoreRevert::NotFound);
            };

            let mut reverted = Vec::new();
            for field in requested {
                let current = field.as_str();
                let original = original_column(field);
                let rows = diesel::sql_query(format!(
                    "UPDATE seo_data SET {current} = {original}, {original} = NULL, updated_at = ? \
                     WHERE id = ? AND {original} IS NOT NULL AND {original} <> ''"
                ))
                .bind::<Text, _>(&now)
                .bind::<BigInt, _>(id)
                .execute(&mut conn)
                .await?;
                if rows > 0 {
                    reverted.push(field);
                }
            }

            if reverted.is_empty() {
                Ok(StoreRevert::NothingToRevert)
            } else {
                Ok(StoreRevert::Reverted(reverted))
            }
        })
    }

    /// Delete the record for a URL.
    pub async fn delete(&self, url: &str) -> Result<bool, DieselError> {
        let normalized = normalize(url);
        with_conn!(self.pool, conn, {
            let rows = diesel::delete(
                seo_data::table.filter(seo_data::page_url_normalized.eq(&normalized)),
            )
            .execute(&mut conn)
            .await?;
            Ok(rows > 0)
        })
    }

    /// Delete records not updated within `max_age_days`.
    pub async fn cleanup(&self, max_age_days: u32) -> Result<usize, DieselError> {
        let cutoff = format_datetime(Utc::now() - Duration::days(i64::from(max_age_days)));
        with_conn!(self.pool, conn, {
            diesel::delete(seo_data::table.filter(seo_data::updated_at.lt(&cutoff)))
                .execute(&mut conn)
                .await
        })
    }

    /// Totals over the table.
    pub async fn statistics(&self) -> Result<SeoStatistics, DieselError> {
        use diesel::dsl::count_star;

        with_conn!(self.pool, conn, {
            let total: i64 = seo_data::table
                .select(count_star())
                .first(&mut conn)
                .await?;
            let with_title: i64 = seo_data::table
                .filter(seo_data::page_title.is_not_null())
                .filter(seo_data::page_title.ne(""))
                .select(count_star())
                .first(&mut conn)
                .await?;
            let with_description: i64 = seo_data::table
                .filter(seo_data::meta_description.is_not_null())
                .filter(seo_data::meta_description.ne(""))
                .select(count_star())
                .first(&mut conn)
                .await?;
            let with_schema: i64 = seo_data::table
                .filter(seo_data::page_schema.is_not_null())
                .filter(seo_data::page_schema.ne(""))
                .select(count_star())
                .first(&mut conn)
                .await?;
            let with_canonical: i64 = seo_data::table
                .filter(seo_data::canonical_url.is_not_null())
                .filter(seo_data::canonical_url.ne(""))
                .select(count_star())
                .first(&mut conn)
                .await?;

            let oldest: TimestampRow =
                diesel::sql_query("SELECT MIN(created_at) AS ts FROM seo_data")
                    .get_result(&mut conn)
                    .await?;
            let newest: TimestampRow =
                diesel::sql_query("SELECT MAX(updated_at) AS ts FROM seo_data")
                    .get_result(&mut conn)
                    .await?;

            Ok(SeoStatistics {
                total,
                with_title,
                with_description,
                with_schema,
                with_canonical,
                oldest: parse_datetime_opt(oldest.ts),
                newest: parse_datetime_opt(newest.ts),
            })
        })
    }

    /// Whether the URL has a non-empty stored title.
    pub async fn has_title(&self, url: &str) -> Result<bool, DieselError> {
        Ok(self
            .get(url)
            .await?
            .is_some_and(|r| non_empty(r.title.as_deref()).is_some()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::migrations::run_migrations;
    use tempfile::tempdir;

    async fn setup_test_db() -> (DieselSeoDataRepository, tempfile::TempDir) {
        let dir = tempdir().unwrap();
        let db_url = dir.path().join("test.db").display().to_string();
        run_migrations(&db_url).await.unwrap();
        (
            DieselSeoDataRepository::new(DbPool::from_url(&db_url)),
            dir,
        )
    }

    fn title(value: &str) -> SeoFields {
        SeoFields {
            title: Some(value.to_string()),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_single_write_then_revert_is_noop() {
        let (repo, _dir) = setup_test_db().await;
        repo.upsert("https://example.com/a", &title("A"), true)
            .await
            .unwrap();

        let result = repo
            .revert("https://example.com/a", &[SeoField::Title])
            .await
            .unwrap();
        assert_eq!(result, StoreRevert::NothingToRevert);

        let record = repo.get("https://example.com/a").await.unwrap().unwrap();
        assert_eq!(record.title.as_deref(), Some("A"));
    }

    #[tokio::test]
    async fn test_backup_then_restore() {
        let (repo, _dir) = setup_test_db().await;
        let url = "https://example.com/a";
        repo.upsert(url, &title("A"), true).await.unwrap();
        repo.upsert(url, &title("B"), true).await.unwrap();

        let result = repo.revert(url, &[SeoField::Title]).await.unwrap();
        assert_eq!(result, StoreRevert::Reverted(vec![SeoField::Title]));

        let record = repo.get(url).await.unwrap().unwrap();
        assert_eq!(record.title.as_deref(), Some("A"));
        assert_eq!(record.original_title, None);
    }

    #[tokio::test]
    async fn test_backup_is_taken_once() {
        let (repo, _dir) = setup_test_db().await;
        let url = "https://example.com/a";
        for value in ["A", "B", "C", "D"] {
            repo.upsert(url, &title(value), true).await.unwrap();
        }
        let record = repo.get(url).await.unwrap().unwrap();
        assert_eq!(record.title.as_deref(), Some("D"));
        assert_eq!(record.original_title.as_deref(), Some("A"));
    }

    #[tokio::test]
    async fn test_upsert_only_touches_supplied_fields() {
        let (repo, _dir) = setup_test_db().await;
        let url = "https://example.com/a";
        let first = SeoFields {
            title: Some("T".into()),
            description: Some("D".into()),
            ..Default::default()
        };
        let id = repo.upsert(url, &first, true).await.unwrap();
        let second = SeoFields {
            schema: Some("{}".into()),
            ..Default::default()
        };
        assert_eq!(repo.upsert(url, &second, true).await.unwrap(), id);

        let record = repo.get(url).await.unwrap().unwrap();
        assert_eq!(record.description.as_deref(), Some("D"));
        assert_eq!(record.schema.as_deref(), Some("{}"));
        assert_eq!(record.original_description, None);
        assert_eq!(record.original_schema, None);
    }

    #[tokio::test]
    async fn test_query_and_slash_variants_share_a_row() {
        let (repo, _dir) = setup_test_db().await;
        let a = repo
            .upsert("https://Example.com/page/?utm=1", &title("A"), true)
            .await
            .unwrap();
        let b = repo
            .upsert("https://example.com/page", &title("B"), true)
            .await
            .unwrap();
        assert_eq!(a, b);
        let stats = repo.statistics().await.unwrap();
        assert_eq!(stats.total, 1);
        assert_eq!(stats.with_title, 1);
    }

    #[tokio::test]
    async fn test_concurrent_inserts_yield_one_row() {
        let (repo, _dir) = setup_test_db().await;
        let mut handles = Vec::new();
        for i in 0..8 {
            let repo = repo.clone();
            handles.push(tokio::spawn(async move {
                repo.upsert("https://example.com/race", &title(&format!("T{i}")), true)
                    .await
            }));
        }
        let mut ids = Vec::new();
        for handle in handles {
            ids.push(handle.await.unwrap().unwrap());
        }
        ids.dedup();
        assert_eq!(ids.len(), 1);
        assert_eq!(repo.statistics().await.unwrap().total, 1);
    }

    #[tokio::test]
    async fn test_revert_unknown_url() {
        let (repo, _dir) = setup_test_db().await;
        let result = repo.revert("https://example.com/none", &[]).await.unwrap();
        assert_eq!(result, StoreRevert::NotFound);
    }

    #[tokio::test]
    async fn test_get_by_entity_id_and_delete() {
        let (repo, _dir) = setup_test_db().await;
        let fields = SeoFields {
            title: Some("Post".into()),
            entity_id: Some(42),
            ..Default::default()
        };
        repo.upsert("https://example.com/post", &fields, true)
            .await
            .unwrap();
        let record = repo.get_by_entity_id(42).await.unwrap().unwrap();
        assert_eq!(record.url, "https://example.com/post");

        assert!(repo.delete("https://example.com/post/").await.unwrap());
        assert!(repo.get_by_entity_id(42).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_cleanup_removes_stale_rows() {
        let (repo, _dir) = setup_test_db().await;
        repo.upsert("https://example.com/old", &title("Old"), true)
            .await
            .unwrap();
        repo.upsert("https://example.com/new", &title("New"), true)
            .await
            .unwrap();

        let stale = format_datetime(Utc::now() - Duration::days(120));
        let mut conn = repo.pool.get().await.unwrap();
        diesel::update(
            seo_data::table.filter(seo_data::page_url_normalized.eq("https://example.com/old")),
        )
        .set(seo_data::updated_at.eq(&stale))
        .execute(&mut conn)
        .await
        .unwrap();

        assert_eq!(repo.cleanup(90).await.unwrap(), 1);
        assert!(repo.get("https://example.com/old").await.unwrap().is_none());
        assert!(repo.has_title("https://example.com/new").await.unwrap());
    }
}
