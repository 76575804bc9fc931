//! Repository layer for database persistence.
//!
//! All database access uses Diesel with SQLite through diesel-async's
//! `SyncConnectionWrapper`. Schema changes are applied by cetane
//! migrations (see [`migrations::run_migrations`]).

pub mod diesel_activity_log;
pub mod diesel_context;
pub mod diesel_seo_data;
pub mod diesel_site;
pub mod migrations;
pub mod models;
pub mod pool;
pub mod util;

pub use diesel_activity_log::DieselActivityLog;
pub use diesel_context::DieselDbContext;
pub use diesel_seo_data::DieselSeoDataRepository;
pub use diesel_site::DieselSiteRepository;
pub use pool::{DbPool, DieselError};

use chrono::{DateTime, SecondsFormat, Utc};

/// Parse a datetime string from the database, defaulting to Unix epoch on error.
pub fn parse_datetime(s: &str) -> DateTime<Utc> {
    DateTime::parse_from_rfc3339(s)
        .map(|dt| dt.with_timezone(&Utc))
        .unwrap_or(DateTime::UNIX_EPOCH)
}

/// Parse an optional datetime string from the database.
pub fn parse_datetime_opt(s: Option<String>) -> Option<DateTime<Utc>> {
    s.and_then(|s| {
        DateTime::parse_from_rfc3339(&s)
            .map(|dt| dt.with_timezone(&Utc))
            .ok()
    })
}

/// Format a timestamp for storage.
///
/// Fixed-width UTC with microseconds, so text comparison orders correctly.
pub fn format_datetime(dt: DateTime<Utc>) -> String {
    dt.to_rfc3339_opts(SecondsFormat::Micros, true)
}

/// Current time, formatted for storage.
pub fn now_timestamp() -> String {
    format_datetime(Utc::now())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[test]
    fn test_stored_timestamps_sort_as_text() {
        let earlier = Utc::now() - Duration::days(3);
        let later = Utc::now();
        assert!(format_datetime(earlier) < format_datetime(later));
        assert_eq!(parse_datetime(&format_datetime(earlier)), earlier);
    }

    #[test]
    fn test_parse_datetime_fallbacks() {
        assert_eq!(parse_datetime("garbage"), DateTime::UNIX_EPOCH);
        assert_eq!(parse_datetime_opt(None), None);
        assert_eq!(parse_datetime_opt(Some("nope".into())), None);
    }
}
