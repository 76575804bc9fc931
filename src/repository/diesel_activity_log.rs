//! SQLite-backed activity log.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{Duration, Utc};
use diesel::prelude::*;
use diesel::sql_types::{BigInt, Text};
use diesel_async::RunQueryDsl;

use super::models::{ActivityLogRecord, NewActivityLog};
use super::pool::{DbPool, DieselError};
use super::{format_datetime, now_timestamp, parse_datetime};
use crate::activity_log::{ActivityLog, DEFAULT_MAX_ENTRIES, TRIM_EVERY};
use crate::error::SyncResult;
use crate::models::{LogEntry, LogLevel, LogStats};
use crate::schema::activity_log;
use crate::with_conn;

impl From<ActivityLogRecord> for LogEntry {
    fn from(record: ActivityLogRecord) -> Self {
        LogEntry {
            id: record.id,
            level: LogLevel::from_str(&record.level).unwrap_or(LogLevel::Info),
            message: record.message,
            created_at: parse_datetime(&record.created_at),
        }
    }
}

#[derive(QueryableByName)]
struct LevelCount {
    #[diesel(sql_type = Text)]
    level: String,
    #[diesel(sql_type = BigInt)]
    count: i64,
}

/// Activity log stored in the `activity_log` table.
///
/// Every [`TRIM_EVERY`] inserts through one instance, the table is trimmed
/// to `max_entries` rows.
#[derive(Clone)]
pub struct DieselActivityLog {
    pool: DbPool,
    max_entries: usize,
    inserts: Arc<AtomicU64>,
}

impl DieselActivityLog {
    pub fn new(pool: DbPool) -> Self {
        Self::with_max_entries(pool, DEFAULT_MAX_ENTRIES)
    }

    pub fn with_max_entries(pool: DbPool, max_entries: usize) -> Self {
        Self {
            pool,
            max_entries,
            inserts: Arc::new(AtomicU64::new(0)),
        }
    }

    async fn insert(&self, level: LogLevel, message: &str) -> Result<(), DieselError> {
        let now = now_timestamp();
        with_conn!(self.pool, conn, {
            diesel::insert_into(activity_log::table)
                .values(&NewActivityLog {
                    level: level.as_str(),
                    message,
                    created_at: &now,
                })
                .execute(&mut conn)
                .await?;
            Ok(())
        })
    }

    async fn trim_rows(&self, max_entries: usize) -> Result<usize, DieselError> {
        let keep = i64::try_from(max_entries).unwrap_or(i64::MAX);
        with_conn!(self.pool, conn, {
            diesel::sql_query(
                "DELETE FROM activity_log WHERE id NOT IN \
                 (SELECT id FROM activity_log ORDER BY id DESC LIMIT ?)",
            )
            .bind::<BigInt, _>(keep)
            .execute(&mut conn)
            .await
        })
    }
}

#[async_trait]
impl ActivityLog for DieselActivityLog {
    async fn record(&self, level: LogLevel, message: &str) -> SyncResult<()> {
        self.insert(level, message).await?;

        let count = self.inserts.fetch_add(1, Ordering::Relaxed) + 1;
        if count % TRIM_EVERY == 0 {
            let removed = self.trim_rows(self.max_entries).await?;
            if removed > 0 {
                tracing::debug!("Trimmed {} activity log entries", removed);
            }
        }
        Ok(())
    }

    async fn recent(&self, limit: usize, level: Option<LogLevel>) -> SyncResult<Vec<LogEntry>> {
        let limit = i64::try_from(limit).unwrap_or(i64::MAX);
        let rows = with_conn!(self.pool, conn, {
            let mut query = activity_log::table
                .order(activity_log::id.desc())
                .limit(limit)
                .into_boxed();
            if let Some(level) = level {
                query = query.filter(activity_log::level.eq(level.as_str()));
            }
            query.load::<ActivityLogRecord>(&mut conn).await
        })?;
        Ok(rows.into_iter().map(LogEntry::from).collect())
    }

    async fn stats(&self) -> SyncResult<LogStats> {
        let cutoff = format_datetime(Utc::now() - Duration::hours(24));
        let counts: Vec<LevelCount> = with_conn!(self.pool, conn, {
            diesel::sql_query(
                "SELECT level, COUNT(*) AS count FROM activity_log \
                 WHERE created_at >= ? GROUP BY level",
            )
            .bind::<Text, _>(&cutoff)
            .load(&mut conn)
            .await
        })?;

        let mut stats = LogStats::default();
        for row in counts {
            let level = LogLevel::from_str(&row.level).unwrap_or(LogLevel::Info);
            stats.add(level, row.count);
        }
        Ok(stats)
    }

    async fn trim(&self, max_entries: usize) -> SyncResult<usize> {
        Ok(self.trim_rows(max_entries).await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::migrations::run_migrations;
    use tempfile::tempdir;

    async fn setup_test_db(max_entries: usize) -> (DieselActivityLog, tempfile::TempDir) {
        let dir = tempdir().unwrap();
        let db_url = dir.path().join("test.db").display().to_string();
        run_migrations(&db_url).await.unwrap();
        (
            DieselActivityLog::with_max_entries(DbPool::from_url(&db_url), max_entries),
            dir,
        )
    }

    #[tokio::test]
    async fn test_record_and_filter() {
        let (log, _dir) = setup_test_db(1000).await;
        log.record(LogLevel::Info, "one").await.unwrap();
        log.record(LogLevel::Error, "two").await.unwrap();
        log.record(LogLevel::Info, "three").await.unwrap();

        let all = log.recent(10, None).await.unwrap();
        assert_eq!(all.len(), 3);
        assert_eq!(all[0].message, "three");

        let errors = log.recent(10, Some(LogLevel::Error)).await.unwrap();
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].message, "two");

        let stats = log.stats().await.unwrap();
        assert_eq!(stats.total, 3);
        assert_eq!(stats.info, 2);
        assert_eq!(stats.count(LogLevel::Error), 1);
    }

    #[tokio::test]
    async fn test_opportunistic_trim() {
        let (log, _dir) = setup_test_db(10).await;
        for i in 0..TRIM_EVERY {
            log.record(LogLevel::Debug, &format!("entry {i}"))
                .await
                .unwrap();
        }
        let rows = log.recent(1000, None).await.unwrap();
        assert_eq!(rows.len(), 10);
        assert_eq!(rows[0].message, format!("entry {}", TRIM_EVERY - 1));
    }

    #[tokio::test]
    async fn test_explicit_trim() {
        let (log, _dir) = setup_test_db(1000).await;
        for i in 0..5 {
            log.record(LogLevel::Info, &format!("{i}")).await.unwrap();
        }
        assert_eq!(log.trim(2).await.unwrap(), 3);
        assert_eq!(log.recent(10, None).await.unwrap().len(), 2);
    }
}
