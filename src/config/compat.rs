//! Meta keys per SEO plugin compatibility mode.
//!
//! The active mode is chosen once from configuration; every write then goes
//! through the resolved [`MetaKeys`] table.

use std::fmt;

/// Which SEO plugin's storage layout to write.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CompatMode {
    Yoast,
    RankMath,
    Aioseo,
    #[default]
    None,
}

impl CompatMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Yoast => "yoast",
            Self::RankMath => "rank_math",
            Self::Aioseo => "aioseo",
            Self::None => "none",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().replace('-', "_").as_str() {
            "yoast" | "wordpress_seo" => Some(Self::Yoast),
            "rank_math" | "rankmath" => Some(Self::RankMath),
            "aioseo" | "all_in_one_seo" => Some(Self::Aioseo),
            "none" | "" => Some(Self::None),
            _ => None,
        }
    }

    /// Meta keys for this mode.
    pub fn keys(&self) -> &'static MetaKeys {
        match self {
            Self::Yoast => &YOAST,
            Self::RankMath => &RANK_MATH,
            Self::Aioseo => &AIOSEO,
            Self::None => &NATIVE,
        }
    }
}

impl fmt::Display for CompatMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Where a homepage value lives.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OptionSlot {
    /// A plain option.
    Plain(&'static str),
    /// One key inside an option holding a JSON object.
    Keyed {
        option: &'static str,
        key: &'static str,
    },
}

/// Meta keys and option slots a compatibility mode writes.
#[derive(Debug, PartialEq, Eq)]
pub struct MetaKeys {
    pub post_title: &'static str,
    pub post_description: &'static str,
    pub term_title: &'static str,
    pub term_description: &'static str,
    /// Extra homepage title slots besides the native option.
    pub homepage_title: &'static [OptionSlot],
    pub homepage_description: &'static [OptionSlot],
}

static YOAST: MetaKeys = MetaKeys {
    post_title: "_yoast_wpseo_title",
    post_description: "_yoast_wpseo_metadesc",
    term_title: "wpseo_title",
    term_description: "wpseo_desc",
    homepage_title: &[OptionSlot::Keyed {
        option: "wpseo_titles",
        key: "title-home-wpseo",
    }],
    homepage_description: &[OptionSlot::Keyed {
        option: "wpseo_titles",
        key: "metadesc-home-wpseo",
    }],
};

static RANK_MATH: MetaKeys = MetaKeys {
    post_title: "rank_math_title",
    post_description: "rank_math_description",
    term_title: "rank_math_title",
    term_description: "rank_math_description",
    homepage_title: &[
        OptionSlot::Keyed {
            option: "rank-math-options-titles",
            key: "homepage_title",
        },
        OptionSlot::Keyed {
            option: "rank-math-options-general",
            key: "homepage_title",
        },
        OptionSlot::Plain("rank_math_homepage_title"),
    ],
    homepage_description: &[
        OptionSlot::Keyed {
            option: "rank-math-options-titles",
            key: "homepage_description",
        },
        OptionSlot::Keyed {
            option: "rank-math-options-general",
            key: "homepage_description",
        },
        OptionSlot::Plain("rank_math_homepage_description"),
    ],
};

static AIOSEO: MetaKeys = MetaKeys {
    post_title: "aioseo_title",
    post_description: "aioseo_description",
    term_title: "aioseo_title",
    term_description: "aioseo_description",
    homepage_title: &[],
    homepage_description: &[],
};

static NATIVE: MetaKeys = MetaKeys {
    post_title: "_clickrank_ai_seo_title",
    post_description: "_clickrank_ai_meta_description",
    term_title: "_clickrank_ai_seo_title",
    term_description: "_clickrank_ai_meta_description",
    homepage_title: &[],
    homepage_description: &[],
};

/// Keys shared by every mode.
pub mod keys {
    pub const CANONICAL: &str = "_clickrank_ai_canonical_url";
    pub const SCHEMA: &str = "_clickrank_ai_page_schema";
    pub const LINK_TITLES: &str = "_clickrank_ai_link_titles";
    pub const REVERT_BUNDLE: &str = "_clickrank_ai_revert_data";
    pub const IMAGE_ALT: &str = "_wp_attachment_image_alt";

    pub const HOMEPAGE_TITLE: &str = "_clickrank_ai_homepage_title";
    pub const HOMEPAGE_DESCRIPTION: &str = "_clickrank_ai_homepage_description";
    pub const HOMEPAGE_SCHEMA: &str = "_clickrank_ai_homepage_schema";
    pub const HOMEPAGE_CANONICAL: &str = "_clickrank_ai_homepage_canonical";
    pub const HOMEPAGE_BACKUP: &str = "_clickrank_ai_homepage_revert_data";

    pub const LAST_HEALTH_CHECK: &str = "clickrank_ai_last_health_check";
    pub const LAST_SUCCESSFUL_CONNECTION: &str = "clickrank_ai_last_successful_connection";
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mode_parsing() {
        assert_eq!(CompatMode::from_str("Rank-Math"), Some(CompatMode::RankMath));
        assert_eq!(CompatMode::from_str("yoast"), Some(CompatMode::Yoast));
        assert_eq!(CompatMode::from_str(""), Some(CompatMode::None));
        assert_eq!(CompatMode::from_str("seopress"), None);
    }

    #[test]
    fn test_term_keys_differ_only_for_yoast() {
        assert_eq!(CompatMode::Yoast.keys().term_description, "wpseo_desc");
        assert_eq!(
            CompatMode::RankMath.keys().term_description,
            CompatMode::RankMath.keys().post_description
        );
        assert_eq!(CompatMode::None.keys().post_title, "_clickrank_ai_seo_title");
    }

    #[test]
    fn test_rank_math_homepage_fan_out() {
        assert_eq!(CompatMode::RankMath.keys().homepage_title.len(), 3);
        assert!(CompatMode::Aioseo.keys().homepage_title.is_empty());
    }
}
