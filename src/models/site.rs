//! Site content the resolver and reconciler work against.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

pub const POST_STATUS_PUBLISH: &str = "publish";

fn default_post_type() -> String {
    "post".to_string()
}

fn default_status() -> String {
    POST_STATUS_PUBLISH.to_string()
}

fn default_true() -> bool {
    true
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Post {
    pub id: i64,
    #[serde(default = "default_post_type")]
    pub post_type: String,
    pub slug: String,
    /// Canonical public URL of the post.
    pub permalink: String,
    #[serde(default = "default_status")]
    pub status: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub published_at: Option<DateTime<Utc>>,
}

impl Post {
    pub fn is_published(&self) -> bool {
        self.status == POST_STATUS_PUBLISH
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Taxonomy {
    pub name: String,
    #[serde(default = "default_true")]
    pub public: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Term {
    pub id: i64,
    pub taxonomy: String,
    pub slug: String,
    #[serde(default)]
    pub name: String,
}

/// Media item. Shares the post ID space.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Attachment {
    pub id: i64,
    pub url: String,
    #[serde(default)]
    pub title: String,
}

/// Serialized site directory, as read by `import-site`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SiteExport {
    #[serde(default)]
    pub posts: Vec<Post>,
    #[serde(default)]
    pub taxonomies: Vec<Taxonomy>,
    #[serde(default)]
    pub terms: Vec<Term>,
    #[serde(default)]
    pub attachments: Vec<Attachment>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_export_defaults() {
        let export: SiteExport = serde_json::from_str(
            r#"{
                "posts": [{"id": 1, "slug": "hello", "permalink": "https://example.com/hello/"}],
                "taxonomies": [{"name": "category"}]
            }"#,
        )
        .unwrap();
        assert!(export.posts[0].is_published());
        assert_eq!(export.posts[0].post_type, "post");
        assert!(export.taxonomies[0].public);
        assert!(export.terms.is_empty());
    }
}
