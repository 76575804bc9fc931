//! Per-entity revert bundles.
//!
//! A bundle holds the pre-change values of an entity's legacy fields. The
//! first snapshot of a field wins; later writes never overwrite it, so a
//! revert always returns to the state before the first optimization.

use serde::{Deserialize, Serialize};

/// Snapshot of an image attachment before its alt text or title changed.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageBackup {
    pub image_url: String,
    #[serde(default)]
    pub original_alt: String,
    #[serde(default)]
    pub original_title: String,
}

/// Keys a revert bundle can hold.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BundleField {
    PageTitle,
    MetaDescription,
    CanonicalUrl,
    PageSchema,
    TermName,
    LinkTitles,
    Images,
}

impl BundleField {
    pub const ALL: [BundleField; 7] = [
        BundleField::PageTitle,
        BundleField::MetaDescription,
        BundleField::CanonicalUrl,
        BundleField::PageSchema,
        BundleField::TermName,
        BundleField::LinkTitles,
        BundleField::Images,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::PageTitle => "page_title",
            Self::MetaDescription => "meta_description",
            Self::CanonicalUrl => "canonical_url",
            Self::PageSchema => "page_schema",
            Self::TermName => "term_name",
            Self::LinkTitles => "link_titles",
            Self::Images => "image_optimizations",
        }
    }

    /// Name reported back to callers after apply or revert.
    pub fn label(&self) -> &'static str {
        match self {
            Self::PageTitle => "title",
            Self::MetaDescription => "description",
            Self::CanonicalUrl => "canonical",
            Self::PageSchema => "schema",
            Self::TermName => "name",
            Self::LinkTitles => "links",
            Self::Images => "images",
        }
    }

    /// Parse a requested revert field. `post_title` is an alias of
    /// `page_title`.
    pub fn from_request(name: &str) -> Option<Self> {
        match name {
            "page_title" | "post_title" => Some(Self::PageTitle),
            "meta_description" => Some(Self::MetaDescription),
            "canonical_url" => Some(Self::CanonicalUrl),
            "page_schema" => Some(Self::PageSchema),
            "term_name" => Some(Self::TermName),
            "link_titles" => Some(Self::LinkTitles),
            "image_optimizations" | "images" => Some(Self::Images),
            _ => None,
        }
    }

    /// Resolve a request field list. Empty means every field.
    pub fn parse_requested(names: &[String]) -> Vec<Self> {
        if names.is_empty() {
            return Self::ALL.to_vec();
        }
        let mut out = Vec::new();
        for f in names.iter().filter_map(|n| Self::from_request(n)) {
            if !out.contains(&f) {
                out.push(f);
            }
        }
        out
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RevertBundle {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub page_title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub meta_description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub canonical_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub page_schema: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub term_name: Option<String>,
    /// Serialized link-title map.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub link_titles: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub image_optimizations: Vec<ImageBackup>,
}

impl RevertBundle {
    fn slot(&mut self, field: BundleField) -> Option<&mut Option<String>> {
        match field {
            BundleField::PageTitle => Some(&mut self.page_title),
            BundleField::MetaDescription => Some(&mut self.meta_description),
            BundleField::CanonicalUrl => Some(&mut self.canonical_url),
            BundleField::PageSchema => Some(&mut self.page_schema),
            BundleField::TermName => Some(&mut self.term_name),
            BundleField::LinkTitles => Some(&mut self.link_titles),
            BundleField::Images => None,
        }
    }

    pub fn contains(&self, field: BundleField) -> bool {
        match field {
            BundleField::PageTitle => self.page_title.is_some(),
            BundleField::MetaDescription => self.meta_description.is_some(),
            BundleField::CanonicalUrl => self.canonical_url.is_some(),
            BundleField::PageSchema => self.page_schema.is_some(),
            BundleField::TermName => self.term_name.is_some(),
            BundleField::LinkTitles => self.link_titles.is_some(),
            BundleField::Images => !self.image_optimizations.is_empty(),
        }
    }

    pub fn get(&self, field: BundleField) -> Option<&str> {
        match field {
            BundleField::PageTitle => self.page_title.as_deref(),
            BundleField::MetaDescription => self.meta_description.as_deref(),
            BundleField::CanonicalUrl => self.canonical_url.as_deref(),
            BundleField::PageSchema => self.page_schema.as_deref(),
            BundleField::TermName => self.term_name.as_deref(),
            BundleField::LinkTitles => self.link_titles.as_deref(),
            BundleField::Images => None,
        }
    }

    /// Record the pre-change value unless one is already held. Returns
    /// whether the snapshot was taken.
    pub fn snapshot(&mut self, field: BundleField, value: impl Into<String>) -> bool {
        match self.slot(field) {
            Some(slot) if slot.is_none() => {
                *slot = Some(value.into());
                true
            }
            _ => false,
        }
    }

    /// Record an image backup unless one for the same URL is held.
    pub fn snapshot_image(&mut self, backup: ImageBackup) -> bool {
        if self
            .image_optimizations
            .iter()
            .any(|b| b.image_url == backup.image_url)
        {
            return false;
        }
        self.image_optimizations.push(backup);
        true
    }

    /// Remove and return a held value.
    pub fn take(&mut self, field: BundleField) -> Option<String> {
        self.slot(field).and_then(Option::take)
    }

    pub fn take_images(&mut self) -> Vec<ImageBackup> {
        std::mem::take(&mut self.image_optimizations)
    }

    pub fn is_empty(&self) -> bool {
        BundleField::ALL.iter().all(|f| !self.contains(*f))
    }
}
