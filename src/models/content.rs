//! Resolved content references.

use serde::Serialize;

/// What a URL points to on the site.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ContentRef {
    Homepage,
    Post { id: i64 },
    TaxonomyTerm { id: i64, taxonomy: String },
    Unknown,
}

impl ContentRef {
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Homepage => "homepage",
            Self::Post { .. } => "post",
            Self::TaxonomyTerm { .. } => "term",
            Self::Unknown => "unknown",
        }
    }

    /// Post or term ID, when the reference names an entity.
    pub fn entity_id(&self) -> Option<i64> {
        match self {
            Self::Post { id } | Self::TaxonomyTerm { id, .. } => Some(*id),
            Self::Homepage | Self::Unknown => None,
        }
    }

    /// Post ID recorded against URL-store rows. Terms live in a separate
    /// ID space and are never recorded.
    pub fn post_id(&self) -> Option<i64> {
        match self {
            Self::Post { id } => Some(*id),
            _ => None,
        }
    }

    pub fn is_resolved(&self) -> bool {
        !matches!(self, Self::Unknown)
    }
}

impl std::fmt::Display for ContentRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Homepage => write!(f, "homepage"),
            Self::Post { id } => write!(f, "post #{}", id),
            Self::TaxonomyTerm { id, taxonomy } => write!(f, "{} term #{}", taxonomy, id),
            Self::Unknown => write!(f, "unknown"),
        }
    }
}
