//! Site collaborators: the content directory the resolver searches and the
//! legacy option/meta store the reconciliation engine writes to.

mod memory;

use async_trait::async_trait;

use crate::models::{Attachment, Post, Term};
use crate::repository::DieselError;

pub use crate::repository::DieselSiteRepository;
pub use memory::InMemorySite;

/// Result type for site operations.
pub type SiteResult<T> = Result<T, SiteError>;

#[derive(Debug, thiserror::Error)]
pub enum SiteError {
    #[error("Database error: {0}")]
    Database(String),
    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl From<DieselError> for SiteError {
    fn from(e: DieselError) -> Self {
        SiteError::Database(e.to_string())
    }
}

impl From<serde_json::Error> for SiteError {
    fn from(e: serde_json::Error) -> Self {
        SiteError::Serialization(e.to_string())
    }
}

/// Owner of a legacy metadata entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MetaScope {
    /// Posts, pages and attachments.
    Post(i64),
    Term(i64),
}

impl MetaScope {
    pub fn as_str(&self) -> &'static str {
        match self {
            MetaScope::Post(_) => "post",
            MetaScope::Term(_) => "term",
        }
    }

    pub fn id(&self) -> i64 {
        match self {
            MetaScope::Post(id) | MetaScope::Term(id) => *id,
        }
    }
}

/// Read access to the site's content.
#[async_trait]
pub trait SiteDirectory: Send + Sync {
    /// Post whose permalink matches the URL, in any status.
    async fn post_id_for_url(&self, url: &str) -> SiteResult<Option<i64>>;

    /// Most recently published post with the given slug.
    async fn find_published_post_by_slug(&self, slug: &str) -> SiteResult<Option<Post>>;

    /// Public taxonomy names in enumeration order.
    async fn public_taxonomies(&self) -> SiteResult<Vec<String>>;

    async fn find_term_by_slug(&self, taxonomy: &str, slug: &str) -> SiteResult<Option<Term>>;

    async fn get_post(&self, id: i64) -> SiteResult<Option<Post>>;

    async fn get_term(&self, id: i64) -> SiteResult<Option<Term>>;

    /// Attachment whose file URL matches.
    async fn attachment_for_url(&self, url: &str) -> SiteResult<Option<Attachment>>;

    async fn published_posts(&self) -> SiteResult<Vec<Post>>;

    async fn count_published_posts(&self) -> SiteResult<i64>;
}

/// The legacy key/value stores: site options and per-entity metadata.
#[async_trait]
pub trait LegacyStore: Send + Sync {
    async fn get_meta(&self, scope: MetaScope, key: &str) -> SiteResult<Option<String>>;

    async fn set_meta(&self, scope: MetaScope, key: &str, value: &str) -> SiteResult<()>;

    /// Returns whether an entry was removed.
    async fn delete_meta(&self, scope: MetaScope, key: &str) -> SiteResult<bool>;

    async fn get_option(&self, name: &str) -> SiteResult<Option<String>>;

    async fn set_option(&self, name: &str, value: &str) -> SiteResult<()>;

    async fn delete_option(&self, name: &str) -> SiteResult<bool>;

    /// Set a post or attachment title. Returns false when no such entity.
    async fn set_post_title(&self, id: i64, title: &str) -> SiteResult<bool>;

    /// Set a term name. Returns false when no such term.
    async fn set_term_name(&self, id: i64, name: &str) -> SiteResult<bool>;

    /// Read one key of an option holding a JSON object.
    async fn get_option_slot(&self, option: &str, key: &str) -> SiteResult<Option<String>> {
        let Some(raw) = self.get_option(option).await? else {
            return Ok(None);
        };
        let value: serde_json::Value = serde_json::from_str(&raw).unwrap_or_default();
        Ok(value.get(key).map(|v| match v {
            serde_json::Value::String(s) => s.clone(),
            other => other.to_string(),
        }))
    }

    /// Write one key of an option holding a JSON object, creating it as
    /// needed and keeping its other keys.
    async fn set_option_slot(&self, option: &str, key: &str, value: &str) -> SiteResult<()> {
        let mut object = match self.get_option(option).await? {
            Some(raw) => match serde_json::from_str::<serde_json::Value>(&raw) {
                Ok(serde_json::Value::Object(map)) => map,
                _ => serde_json::Map::new(),
            },
            None => serde_json::Map::new(),
        };
        object.insert(key.to_string(), serde_json::Value::String(value.to_string()));
        let raw = serde_json::to_string(&object)?;
        self.set_option(option, &raw).await
    }
}
