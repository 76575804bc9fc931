//! Incoming optimization payloads.

use std::collections::BTreeMap;

use serde::{Deserialize, Deserializer, Serialize};

use super::seo::SeoFields;
use crate::utils::sanitize;

/// Alt text and title update for one image.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageOptimization {
    #[serde(default)]
    pub image_url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub new_alt_text: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub new_title: Option<String>,
}

/// Field updates for one URL, as sent by the platform.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OptimizationPayload {
    #[serde(default)]
    pub page_url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub action: Option<String>,
    #[serde(
        default,
        alias = "title",
        alias = "site_title",
        skip_serializing_if = "Option::is_none"
    )]
    pub page_title: Option<String>,
    #[serde(
        default,
        alias = "description",
        skip_serializing_if = "Option::is_none"
    )]
    pub meta_description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub canonical_url: Option<String>,
    /// JSON-LD. Accepted either as a string or as inline JSON.
    #[serde(
        default,
        deserialize_with = "string_or_json",
        skip_serializing_if = "Option::is_none"
    )]
    pub page_schema: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub term_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fields: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub image_optimizations: Vec<ImageOptimization>,
    /// Link URL to title attribute.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub link_titles: BTreeMap<String, String>,
}

fn string_or_json<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<serde_json::Value>::deserialize(deserializer)?;
    Ok(match value {
        None | Some(serde_json::Value::Null) => None,
        Some(serde_json::Value::String(s)) => Some(s),
        Some(other) => Some(other.to_string()),
    })
}

impl OptimizationPayload {
    pub fn for_url(url: impl Into<String>) -> Self {
        Self {
            page_url: url.into(),
            ..Default::default()
        }
    }

    pub fn is_revert(&self) -> bool {
        self.action.as_deref() == Some("revert")
    }

    /// Requested revert fields; empty means all.
    pub fn revert_fields(&self) -> &[String] {
        self.fields.as_deref().unwrap_or(&[])
    }

    /// Title to apply to a taxonomy term.
    pub fn term_title(&self) -> Option<&str> {
        self.term_name.as_deref().or(self.page_title.as_deref())
    }

    pub fn has_images(&self) -> bool {
        !self.image_optimizations.is_empty()
    }

    /// URL-store view of the payload.
    pub fn seo_fields(&self, entity_id: Option<i64>) -> SeoFields {
        SeoFields {
            title: self.page_title.clone(),
            description: self.meta_description.clone(),
            canonical_url: self.canonical_url.clone(),
            schema: self.page_schema.clone(),
            entity_id,
        }
    }

    /// Clean every field according to its kind. Image entries without a
    /// URL and link entries with an empty URL or title are dropped.
    pub fn sanitized(self) -> Self {
        Self {
            page_url: sanitize::url(&self.page_url),
            action: self.action.map(|a| sanitize::key(&a)),
            page_title: self.page_title.map(|v| sanitize::text_field(&v)),
            meta_description: self.meta_description.map(|v| sanitize::textarea_field(&v)),
            canonical_url: self.canonical_url.map(|v| sanitize::url(&v)),
            page_schema: self.page_schema.map(|v| sanitize::markup(&v)),
            term_name: self.term_name.map(|v| sanitize::text_field(&v)),
            fields: self
                .fields
                .map(|fs| fs.iter().map(|f| sanitize::key(f)).collect()),
            image_optimizations: self
                .image_optimizations
                .into_iter()
                .filter_map(|img| {
                    let image_url = sanitize::url(&img.image_url);
                    if image_url.is_empty() {
                        return None;
                    }
                    Some(ImageOptimization {
                        image_url,
                        new_alt_text: img.new_alt_text.map(|v| sanitize::text_field(&v)),
                        new_title: img.new_title.map(|v| sanitize::text_field(&v)),
                    })
                })
                .collect(),
            link_titles: self
                .link_titles
                .into_iter()
                .filter_map(|(url, title)| {
                    let url = sanitize::url(&url);
                    let title = sanitize::text_field(&title);
                    (!url.is_empty() && !title.is_empty()).then_some((url, title))
                })
                .collect(),
        }
    }
}
