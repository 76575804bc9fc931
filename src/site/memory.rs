//! In-memory site, built from a [`SiteExport`].

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::RwLock;

use super::{LegacyStore, MetaScope, SiteDirectory, SiteResult};
use crate::models::{Attachment, Post, SiteExport, Term};
use crate::utils::normalize;

#[derive(Default)]
struct State {
    export: SiteExport,
    meta: HashMap<(MetaScope, String), String>,
    options: BTreeMap<String, String>,
}

/// Site directory and legacy store held in memory.
#[derive(Clone, Default)]
pub struct InMemorySite {
    state: Arc<RwLock<State>>,
}

impl InMemorySite {
    pub fn new(export: SiteExport) -> Self {
        Self {
            state: Arc::new(RwLock::new(State {
                export,
                ..Default::default()
            })),
        }
    }

    /// Snapshot of all site options.
    pub async fn options(&self) -> BTreeMap<String, String> {
        self.state.read().await.options.clone()
    }
}

#[async_trait]
impl SiteDirectory for InMemorySite {
    async fn post_id_for_url(&self, url: &str) -> SiteResult<Option<i64>> {
        let key = normalize(url);
        let state = self.state.read().await;
        Ok(state
            .export
            .posts
            .iter()
            .find(|p| normalize(&p.permalink) == key)
            .map(|p| p.id))
    }

    async fn find_published_post_by_slug(&self, slug: &str) -> SiteResult<Option<Post>> {
        let state = self.state.read().await;
        Ok(state
            .export
            .posts
            .iter()
            .filter(|p| p.slug == slug && p.is_published())
            .max_by_key(|p| p.published_at)
            .cloned())
    }

    async fn public_taxonomies(&self) -> SiteResult<Vec<String>> {
        let state = self.state.read().await;
        Ok(state
            .export
            .taxonomies
            .iter()
            .filter(|t| t.public)
            .map(|t| t.name.clone())
            .collect())
    }

    async fn find_term_by_slug(&self, taxonomy: &str, slug: &str) -> SiteResult<Option<Term>> {
        let state = self.state.read().await;
        Ok(state
            .export
            .terms
            .iter()
            .find(|t| t.taxonomy == taxonomy && t.slug == slug)
            .cloned())
    }

    async fn get_post(&self, id: i64) -> SiteResult<Option<Post>> {
        let state = self.state.read().await;
        Ok(state.export.posts.iter().find(|p| p.id == id).cloned())
    }

    async fn get_term(&self, id: i64) -> SiteResult<Option<Term>> {
        let state = self.state.read().await;
        Ok(state.export.terms.iter().find(|t| t.id == id).cloned())
    }

    async fn attachment_for_url(&self, url: &str) -> SiteResult<Option<Attachment>> {
        let key = normalize(url);
        let state = self.state.read().await;
        Ok(state
            .export
            .attachments
            .iter()
            .find(|a| normalize(&a.url) == key)
            .cloned())
    }

    async fn published_posts(&self) -> SiteResult<Vec<Post>> {
        let state = self.state.read().await;
        Ok(state
            .export
            .posts
            .iter()
            .filter(|p| p.is_published())
            .cloned()
            .collect())
    }

    async fn count_published_posts(&self) -> SiteResult<i64> {
        let state = self.state.read().await;
        Ok(state.export.posts.iter().filter(|p| p.is_published()).count() as i64)
    }
}

#[async_trait]
impl LegacyStore for InMemorySite {
    async fn get_meta(&self, scope: MetaScope, key: &str) -> SiteResult<Option<String>> {
        let state = self.state.read().await;
        Ok(state.meta.get(&(scope, key.to_string())).cloned())
    }

    async fn set_meta(&self, scope: MetaScope, key: &str, value: &str) -> SiteResult<()> {
        let mut state = self.state.write().await;
        state
            .meta
            .insert((scope, key.to_string()), value.to_string());
        Ok(())
    }

    async fn delete_meta(&self, scope: MetaScope, key: &str) -> SiteResult<bool> {
        let mut state = self.state.write().await;
        Ok(state.meta.remove(&(scope, key.to_string())).is_some())
    }

    async fn get_option(&self, name: &str) -> SiteResult<Option<String>> {
        let state = self.state.read().await;
        Ok(state.options.get(name).cloned())
    }

    async fn set_option(&self, name: &str, value: &str) -> SiteResult<()> {
        let mut state = self.state.write().await;
        state.options.insert(name.to_string(), value.to_string());
        Ok(())
    }

    async fn delete_option(&self, name: &str) -> SiteResult<bool> {
        let mut state = self.state.write().await;
        Ok(state.options.remove(name).is_some())
    }

    async fn set_post_title(&self, id: i64, title: &str) -> SiteResult<bool> {
        let mut state = self.state.write().await;
        if let Some(post) = state.export.posts.iter_mut().find(|p| p.id == id) {
            post.title = title.to_string();
            return Ok(true);
        }
        if let Some(attachment) = state.export.attachments.iter_mut().find(|a| a.id == id) {
            attachment.title = title.to_string();
            return Ok(true);
        }
        Ok(false)
    }

    async fn set_term_name(&self, id: i64, name: &str) -> SiteResult<bool> {
        let mut state = self.state.write().await;
        match state.export.terms.iter_mut().find(|t| t.id == id) {
            Some(term) => {
                term.name = name.to_string();
                Ok(true)
            }
            None => Ok(false),
        }
    }
}
