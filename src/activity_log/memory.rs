//! In-memory activity log for tests and dry runs.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{Duration, Utc};
use tokio::sync::RwLock;

use super::{ActivityLog, DEFAULT_MAX_ENTRIES};
use crate::error::SyncResult;
use crate::models::{LogEntry, LogLevel, LogStats};

#[derive(Default)]
struct Entries {
    next_id: i64,
    rows: Vec<LogEntry>,
}

/// Activity log held in process memory, capped at a maximum length.
#[derive(Clone)]
pub struct MemoryActivityLog {
    entries: Arc<RwLock<Entries>>,
    max_entries: usize,
}

impl Default for MemoryActivityLog {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryActivityLog {
    pub fn new() -> Self {
        Self::with_max_entries(DEFAULT_MAX_ENTRIES)
    }

    pub fn with_max_entries(max_entries: usize) -> Self {
        Self {
            entries: Arc::new(RwLock::new(Entries::default())),
            max_entries,
        }
    }

    /// Entries whose message starts with `prefix`.
    pub async fn matching(&self, prefix: &str) -> Vec<LogEntry> {
        self.entries
            .read()
            .await
            .rows
            .iter()
            .filter(|e| e.message.starts_with(prefix))
            .cloned()
            .collect()
    }
}

#[async_trait]
impl ActivityLog for MemoryActivityLog {
    async fn record(&self, level: LogLevel, message: &str) -> SyncResult<()> {
        let mut entries = self.entries.write().await;
        entries.next_id += 1;
        let id = entries.next_id;
        entries.rows.push(LogEntry {
            id,
            level,
            message: message.to_string(),
            created_at: Utc::now(),
        });
        let overflow = entries.rows.len().saturating_sub(self.max_entries);
        if overflow > 0 {
            entries.rows.drain(..overflow);
        }
        Ok(())
    }

    async fn recent(&self, limit: usize, level: Option<LogLevel>) -> SyncResult<Vec<LogEntry>> {
        let entries = self.entries.read().await;
        Ok(entries
            .rows
            .iter()
            .rev()
            .filter(|e| level.map_or(true, |l| e.level == l))
            .take(limit)
            .cloned()
            .collect())
    }

    async fn stats(&self) -> SyncResult<LogStats> {
        let cutoff = Utc::now() - Duration::hours(24);
        let entries = self.entries.read().await;
        let mut stats = LogStats::default();
        for entry in entries.rows.iter().filter(|e| e.created_at >= cutoff) {
            stats.add(entry.level, 1);
        }
        Ok(stats)
    }

    async fn trim(&self, max_entries: usize) -> SyncResult<usize> {
        let mut entries = self.entries.write().await;
        let overflow = entries.rows.len().saturating_sub(max_entries);
        entries.rows.drain(..overflow);
        Ok(overflow)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_trim_keeps_newest() {
        let log = MemoryActivityLog::new();
        for i in 0..5 {
            log.record(LogLevel::Info, &format!("entry {i}")).await.unwrap();
        }
        assert_eq!(log.trim(2).await.unwrap(), 3);
        let rest = log.recent(10, None).await.unwrap();
        assert_eq!(rest.len(), 2);
        assert_eq!(rest[0].message, "entry 4");
    }

    #[tokio::test]
    async fn test_capacity_is_enforced() {
        let log = MemoryActivityLog::with_max_entries(3);
        for i in 0..10 {
            log.record(LogLevel::Debug, &format!("{i}")).await.unwrap();
        }
        assert_eq!(log.recent(100, None).await.unwrap().len(), 3);
    }
}
