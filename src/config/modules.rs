//! Per-field feature toggles.

use serde::{Deserialize, Serialize};

/// Module switches as written in the config file. Absent means enabled.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, prefer::FromValue)]
pub struct ModulesConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub meta_description: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_alt: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub schema: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub canonical: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub link_title: Option<bool>,
}

impl ModulesConfig {
    pub fn is_default(&self) -> bool {
        *self == Self::default()
    }

    pub fn resolve(&self) -> ModuleToggleSet {
        ModuleToggleSet {
            title: self.title.unwrap_or(true),
            meta_description: self.meta_description.unwrap_or(true),
            image_alt: self.image_alt.unwrap_or(true),
            schema: self.schema.unwrap_or(true),
            canonical: self.canonical.unwrap_or(true),
            link_title: self.link_title.unwrap_or(true),
        }
    }
}

/// Which field classes the reconciliation engine may write.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ModuleToggleSet {
    pub title: bool,
    pub meta_description: bool,
    pub image_alt: bool,
    pub schema: bool,
    pub canonical: bool,
    pub link_title: bool,
}

impl Default for ModuleToggleSet {
    fn default() -> Self {
        Self::all_enabled()
    }
}

impl ModuleToggleSet {
    pub fn all_enabled() -> Self {
        Self {
            title: true,
            meta_description: true,
            image_alt: true,
            schema: true,
            canonical: true,
            link_title: true,
        }
    }
}
