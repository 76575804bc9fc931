//! Maps a URL to the site content it names.

use std::sync::Arc;

use crate::models::ContentRef;
use crate::site::{SiteDirectory, SiteResult};
use crate::utils::{path_segments, url_path};

/// Category taxonomy, assumed to exist even when not listed as public.
const CATEGORY_TAXONOMY: &str = "category";

/// Resolves URLs against a [`SiteDirectory`].
///
/// Strategies run in a fixed order and the first hit wins: homepage path,
/// permalink lookup, published post slug, term slug in any public taxonomy,
/// then the `{taxonomy}/{slug}` pattern. Posts are tried before terms, so a
/// slug shared by both resolves to the post.
#[derive(Clone)]
pub struct ContentResolver {
    site: Arc<dyn SiteDirectory>,
    home_path: String,
}

impl ContentResolver {
    pub fn new(site: Arc<dyn SiteDirectory>, home_url: &str) -> Self {
        Self {
            site,
            home_path: url_path(home_url).trim_end_matches('/').to_string(),
        }
    }

    pub fn is_homepage(&self, url: &str) -> bool {
        url_path(url).trim_end_matches('/') == self.home_path
    }

    pub async fn resolve(&self, url: &str) -> SiteResult<ContentRef> {
        if self.is_homepage(url) {
            return Ok(ContentRef::Homepage);
        }

        if let Some(id) = self.site.post_id_for_url(url).await? {
            return Ok(ContentRef::Post { id });
        }

        let segments = path_segments(url);
        let Some(slug) = segments.last() else {
            return Ok(ContentRef::Unknown);
        };

        if let Some(post) = self.site.find_published_post_by_slug(slug).await? {
            return Ok(ContentRef::Post { id: post.id });
        }

        for taxonomy in self.site.public_taxonomies().await? {
            if let Some(term) = self.site.find_term_by_slug(&taxonomy, slug).await? {
                tracing::debug!(
                    "Found taxonomy term: {} (ID: {}) in taxonomy: {}",
                    term.name,
                    term.id,
                    taxonomy
                );
                return Ok(ContentRef::TaxonomyTerm {
                    id: term.id,
                    taxonomy,
                });
            }
        }

        if segments.len() >= 2 {
            let taxonomy = if segments[0] == CATEGORY_TAXONOMY {
                CATEGORY_TAXONOMY
            } else {
                segments[0].as_str()
            };
            if let Some(term) = self.site.find_term_by_slug(taxonomy, &segments[1]).await? {
                tracing::debug!(
                    "Found taxonomy term via traditional format: {} (ID: {}) in taxonomy: {}",
                    term.name,
                    term.id,
                    taxonomy
                );
                return Ok(ContentRef::TaxonomyTerm {
                    id: term.id,
                    taxonomy: term.taxonomy,
                });
            }
        }

        Ok(ContentRef::Unknown)
    }
}
