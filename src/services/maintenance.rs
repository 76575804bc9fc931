//! Periodic housekeeping: activity log trim and SEO row retention.

use std::sync::Arc;

use serde::Serialize;

use crate::activity_log::ActivityLog;
use crate::error::SyncResult;
use crate::repository::DieselSeoDataRepository;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct MaintenanceReport {
    pub log_entries_removed: usize,
    pub seo_rows_removed: usize,
}

/// Trim the activity log to `max_log_entries` rows and drop SEO rows not
/// updated within `retention_days`.
pub async fn run_maintenance(
    seo: &DieselSeoDataRepository,
    log: &Arc<dyn ActivityLog>,
    max_log_entries: usize,
    retention_days: u32,
) -> SyncResult<MaintenanceReport> {
    let report = MaintenanceReport {
        log_entries_removed: log.trim(max_log_entries).await?,
        seo_rows_removed: seo.cleanup(retention_days).await?,
    };

    if report.log_entries_removed > 0 {
        log.info(&format!(
            "Log cleanup: {} entries removed",
            report.log_entries_removed
        ))
        .await;
    }
    if report.seo_rows_removed > 0 {
        log.info(&format!(
            "SEO data cleanup: {} stale rows removed",
            report.seo_rows_removed
        ))
        .await;
    }
    Ok(report)
}
