//! Diesel database context for managing connection pools and repository access.
//!
//! Create one context per command or service, then use it to reach every
//! repository.
//!
//! # Example
//! ```ignore
//! let ctx = DieselDbContext::new(&db_path);
//! ctx.migrate().await?;
//! let record = ctx.seo_data().get("https://example.com/about").await?;
//! ```

use std::path::Path;

use diesel::prelude::*;
use diesel_async::RunQueryDsl;

use super::diesel_activity_log::DieselActivityLog;
use super::diesel_seo_data::DieselSeoDataRepository;
use super::diesel_site::DieselSiteRepository;
use super::migrations::run_migrations;
use super::pool::{DbPool, DieselError};
use crate::schema::storage_meta;
use crate::with_conn;

#[derive(Clone)]
pub struct DieselDbContext {
    pool: DbPool,
}

impl DieselDbContext {
    /// Create a context for a database file.
    pub fn new(db_path: &Path) -> Self {
        Self {
            pool: DbPool::from_path(db_path),
        }
    }

    /// Create a context from a database URL (`sqlite:` prefix optional).
    pub fn from_url(database_url: &str) -> Self {
        Self {
            pool: DbPool::from_url(database_url),
        }
    }

    pub fn pool(&self) -> &DbPool {
        &self.pool
    }

    pub fn seo_data(&self) -> DieselSeoDataRepository {
        DieselSeoDataRepository::new(self.pool.clone())
    }

    pub fn site(&self) -> DieselSiteRepository {
        DieselSiteRepository::new(self.pool.clone())
    }

    pub fn activity_log(&self, max_entries: usize) -> DieselActivityLog {
        DieselActivityLog::with_max_entries(self.pool.clone(), max_entries)
    }

    /// Apply pending migrations. Returns the names of those applied.
    pub async fn migrate(&self) -> Result<Vec<String>, DieselError> {
        run_migrations(self.pool.database_url()).await
    }

    /// Open a connection and run a trivial query.
    pub async fn test_connection(&self) -> Result<(), DieselError> {
        with_conn!(self.pool, conn, {
            diesel::sql_query("SELECT 1").execute(&mut conn).await?;
            Ok(())
        })
    }

    /// Storage format version recorded by the first migration.
    pub async fn get_schema_version(&self) -> Result<Option<String>, DieselError> {
        with_conn!(self.pool, conn, {
            storage_meta::table
                .find("format_version")
                .select(storage_meta::value)
                .first::<String>(&mut conn)
                .await
                .optional()
        })
    }
}
