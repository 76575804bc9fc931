//! Persisted activity log.
//!
//! The activity log is the append-only record operators read through
//! `clickrank logs`. Every entry is mirrored to `tracing` as well.

mod memory;

use async_trait::async_trait;

use crate::error::SyncResult;
use crate::models::{LogEntry, LogLevel, LogStats};

pub use crate::repository::DieselActivityLog;
pub use memory::MemoryActivityLog;

/// Longest message stored, in characters.
pub const MAX_MESSAGE_CHARS: usize = 2000;

/// Inserts between opportunistic trims.
pub const TRIM_EVERY: u64 = 100;

/// Default number of rows kept.
pub const DEFAULT_MAX_ENTRIES: usize = 1000;

/// Build the stored message: truncate, then append context as JSON.
pub fn format_message(message: &str, context: Option<&serde_json::Value>) -> String {
    let mut out: String = message.chars().take(MAX_MESSAGE_CHARS).collect();
    if let Some(ctx) = context.filter(|c| !c.is_null()) {
        out.push_str(" | ");
        out.push_str(&ctx.to_string());
    }
    out
}

/// Storage for activity entries.
#[async_trait]
pub trait ActivityLog: Send + Sync {
    /// Append one entry. `message` is stored as given.
    async fn record(&self, level: LogLevel, message: &str) -> SyncResult<()>;

    /// Newest entries first, optionally restricted to one level.
    async fn recent(&self, limit: usize, level: Option<LogLevel>) -> SyncResult<Vec<LogEntry>>;

    /// Per-level counts over the last 24 hours.
    async fn stats(&self) -> SyncResult<LogStats>;

    /// Keep only the newest `max_entries` rows. Returns rows removed.
    async fn trim(&self, max_entries: usize) -> SyncResult<usize>;

    /// Record an entry with optional context, mirroring it to tracing.
    /// Storage failures are reported through tracing only.
    async fn log(&self, level: LogLevel, message: &str, context: Option<serde_json::Value>) {
        let line = format_message(message, context.as_ref());
        match level {
            LogLevel::Debug => tracing::debug!("{}", line),
            LogLevel::Info => tracing::info!("{}", line),
            LogLevel::Warning => tracing::warn!("{}", line),
            LogLevel::Error | LogLevel::Critical => tracing::error!("{}", line),
        }
        if let Err(e) = self.record(level, &line).await {
            tracing::warn!("Failed to write activity log entry: {}", e);
        }
    }

    async fn info(&self, message: &str) {
        self.log(LogLevel::Info, message, None).await
    }

    async fn warning(&self, message: &str, context: Option<serde_json::Value>) {
        self.log(LogLevel::Warning, message, context).await
    }

    async fn error(&self, message: &str, context: Option<serde_json::Value>) {
        self.log(LogLevel::Error, message, context).await
    }
}
