//! URL-keyed SEO records.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// The four field classes stored per URL.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SeoField {
    Title,
    Description,
    Canonical,
    Schema,
}

impl SeoField {
    pub const ALL: [SeoField; 4] = [
        SeoField::Title,
        SeoField::Description,
        SeoField::Canonical,
        SeoField::Schema,
    ];

    /// Wire and column name of the current value.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Title => "page_title",
            Self::Description => "meta_description",
            Self::Canonical => "canonical_url",
            Self::Schema => "page_schema",
        }
    }

    /// Short name used in API responses.
    pub fn label(&self) -> &'static str {
        match self {
            Self::Title => "title",
            Self::Description => "description",
            Self::Canonical => "canonical",
            Self::Schema => "schema",
        }
    }

    /// Parse a requested field name. Accepts wire names, short names and
    /// the `post_title` alias. Term names are stored as the title.
    pub fn from_request(s: &str) -> Option<Self> {
        match s {
            "page_title" | "post_title" | "title" | "term_name" | "name" => Some(Self::Title),
            "meta_description" | "description" => Some(Self::Description),
            "canonical_url" | "canonical" => Some(Self::Canonical),
            "page_schema" | "schema" => Some(Self::Schema),
            _ => None,
        }
    }
}

impl std::fmt::Display for SeoField {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A set of field values to write. `None` means "leave unchanged".
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SeoFields {
    pub title: Option<String>,
    pub description: Option<String>,
    pub canonical_url: Option<String>,
    pub schema: Option<String>,
    /// Post ID the URL resolved to, if any.
    pub entity_id: Option<i64>,
}

impl SeoFields {
    pub fn get(&self, field: SeoField) -> Option<&str> {
        match field {
            SeoField::Title => self.title.as_deref(),
            SeoField::Description => self.description.as_deref(),
            SeoField::Canonical => self.canonical_url.as_deref(),
            SeoField::Schema => self.schema.as_deref(),
        }
    }

    pub fn set(&mut self, field: SeoField, value: impl Into<String>) {
        let value = Some(value.into());
        match field {
            SeoField::Title => self.title = value,
            SeoField::Description => self.description = value,
            SeoField::Canonical => self.canonical_url = value,
            SeoField::Schema => self.schema = value,
        }
    }

    /// Fields that carry a value.
    pub fn supplied(&self) -> Vec<SeoField> {
        SeoField::ALL
            .into_iter()
            .filter(|f| self.get(*f).is_some())
            .collect()
    }

    pub fn is_empty(&self) -> bool {
        self.supplied().is_empty()
    }
}

/// One row of the SEO table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SeoRecord {
    pub id: i64,
    pub url: String,
    pub url_normalized: String,
    pub resolved_entity_id: Option<i64>,
    pub title: Option<String>,
    pub description: Option<String>,
    pub canonical_url: Option<String>,
    pub schema: Option<String>,
    pub original_title: Option<String>,
    pub original_description: Option<String>,
    pub original_canonical: Option<String>,
    pub original_schema: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl SeoRecord {
    pub fn current(&self, field: SeoField) -> Option<&str> {
        match field {
            SeoField::Title => self.title.as_deref(),
            SeoField::Description => self.description.as_deref(),
            SeoField::Canonical => self.canonical_url.as_deref(),
            SeoField::Schema => self.schema.as_deref(),
        }
    }

    pub fn original(&self, field: SeoField) -> Option<&str> {
        match field {
            SeoField::Title => self.original_title.as_deref(),
            SeoField::Description => self.original_description.as_deref(),
            SeoField::Canonical => self.original_canonical.as_deref(),
            SeoField::Schema => self.original_schema.as_deref(),
        }
    }

    /// Whether a non-empty backup exists for the field.
    pub fn has_backup(&self, field: SeoField) -> bool {
        self.original(field).is_some_and(|v| !v.is_empty())
    }
}

/// Aggregate counts over the SEO table.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SeoStatistics {
    pub total: i64,
    pub with_title: i64,
    pub with_description: i64,
    pub with_schema: i64,
    pub with_canonical: i64,
    pub oldest: Option<DateTime<Utc>>,
    pub newest: Option<DateTime<Utc>>,
}

/// Result of reverting a URL's stored fields.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreRevert {
    Reverted(Vec<SeoField>),
    NothingToRevert,
    NotFound,
}

impl StoreRevert {
    pub fn is_success(&self) -> bool {
        matches!(self, StoreRevert::Reverted(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_field_aliases() {
        assert_eq!(SeoField::from_request("post_title"), Some(SeoField::Title));
        assert_eq!(SeoField::from_request("page_schema"), Some(SeoField::Schema));
        assert_eq!(SeoField::from_request("canonical"), Some(SeoField::Canonical));
        assert_eq!(SeoField::from_request("term_name"), Some(SeoField::Title));
        assert_eq!(SeoField::from_request("image_optimizations"), None);
    }

    #[test]
    fn test_supplied_fields() {
        let mut fields = SeoFields::default();
        assert!(fields.is_empty());
        fields.set(SeoField::Schema, "{}");
        fields.set(SeoField::Title, "T");
        assert_eq!(fields.supplied(), vec![SeoField::Title, SeoField::Schema]);
    }
}
