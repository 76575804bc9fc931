//! Where each legacy field of a content reference lives.

use crate::config::{keys, OptionSlot};
use crate::error::SyncResult;
use crate::models::{BundleField, ContentRef, RevertBundle};
use crate::site::MetaScope;

use super::ReconciliationEngine;

/// A legacy storage location for one field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(super) enum Location {
    /// A site option, mirrored into the plugin's option slots.
    SiteOption {
        name: &'static str,
        mirrors: &'static [OptionSlot],
    },
    Meta(MetaScope, &'static str),
    /// The name of a taxonomy term.
    TermName(i64),
}

impl Location {
    fn option(name: &'static str) -> Self {
        Location::SiteOption { name, mirrors: &[] }
    }
}

impl ReconciliationEngine {
    /// Location of `field` for `content`, when that content carries it.
    pub(super) fn location(&self, content: &ContentRef, field: BundleField) -> Option<Location> {
        let meta = self.keys;
        match content {
            ContentRef::Homepage => match field {
                BundleField::PageTitle => Some(Location::SiteOption {
                    name: keys::HOMEPAGE_TITLE,
                    mirrors: meta.homepage_title,
                }),
                BundleField::MetaDescription => Some(Location::SiteOption {
                    name: keys::HOMEPAGE_DESCRIPTION,
                    mirrors: meta.homepage_description,
                }),
                BundleField::CanonicalUrl => Some(Location::option(keys::HOMEPAGE_CANONICAL)),
                BundleField::PageSchema => Some(Location::option(keys::HOMEPAGE_SCHEMA)),
                _ => None,
            },
            ContentRef::Post { id } => {
                let scope = MetaScope::Post(*id);
                match field {
                    BundleField::PageTitle => Some(Location::Meta(scope, meta.post_title)),
                    BundleField::MetaDescription => {
                        Some(Location::Meta(scope, meta.post_description))
                    }
                    BundleField::CanonicalUrl => Some(Location::Meta(scope, keys::CANONICAL)),
                    BundleField::PageSchema => Some(Location::Meta(scope, keys::SCHEMA)),
                    BundleField::LinkTitles => Some(Location::Meta(scope, keys::LINK_TITLES)),
                    _ => None,
                }
            }
            ContentRef::TaxonomyTerm { id, .. } => match field {
                BundleField::TermName => Some(Location::TermName(*id)),
                BundleField::MetaDescription => {
                    Some(Location::Meta(MetaScope::Term(*id), meta.term_description))
                }
                _ => None,
            },
            ContentRef::Unknown => None,
        }
    }

    /// Where the revert bundle of `content` is kept.
    pub(super) fn bundle_location(content: &ContentRef) -> Option<Location> {
        match content {
            ContentRef::Homepage => Some(Location::option(keys::HOMEPAGE_BACKUP)),
            ContentRef::Post { id } => Some(Location::Meta(MetaScope::Post(*id), keys::REVERT_BUNDLE)),
            ContentRef::TaxonomyTerm { id, .. } => {
                Some(Location::Meta(MetaScope::Term(*id), keys::REVERT_BUNDLE))
            }
            ContentRef::Unknown => None,
        }
    }

    pub(super) async fn read(&self, location: &Location) -> SyncResult<Option<String>> {
        Ok(match location {
            Location::SiteOption { name, .. } => self.legacy.get_option(name).await?,
            Location::Meta(scope, key) => self.legacy.get_meta(*scope, key).await?,
            Location::TermName(id) => self.site.get_term(*id).await?.map(|t| t.name),
        })
    }

    /// Write a value. Returns false when the target entity does not exist.
    pub(super) async fn write(&self, location: &Location, value: &str) -> SyncResult<bool> {
        match location {
            Location::SiteOption { name, mirrors } => {
                self.legacy.set_option(name, value).await?;
                for slot in mirrors.iter() {
                    self.write_slot(slot, value).await?;
                }
                Ok(true)
            }
            Location::Meta(scope, key) => {
                self.legacy.set_meta(*scope, key, value).await?;
                Ok(true)
            }
            Location::TermName(id) => Ok(self.legacy.set_term_name(*id, value).await?),
        }
    }

    /// Put back a backed-up value. An empty backup removes the entry, except
    /// for term names, which are never blanked.
    pub(super) async fn restore(&self, location: &Location, value: &str) -> SyncResult<bool> {
        if !value.is_empty() {
            return self.write(location, value).await;
        }
        match location {
            Location::SiteOption { name, mirrors } => {
                self.legacy.delete_option(name).await?;
                for slot in mirrors.iter() {
                    match slot {
                        OptionSlot::Plain(option) => {
                            self.legacy.delete_option(option).await?;
                        }
                        OptionSlot::Keyed { .. } => self.write_slot(slot, "").await?,
                    }
                }
                Ok(true)
            }
            Location::Meta(scope, key) => {
                self.legacy.delete_meta(*scope, key).await?;
                Ok(true)
            }
            Location::TermName(_) => Ok(false),
        }
    }

    pub(super) async fn remove(&self, location: &Location) -> SyncResult<bool> {
        Ok(match location {
            Location::SiteOption { name, .. } => self.legacy.delete_option(name).await?,
            Location::Meta(scope, key) => self.legacy.delete_meta(*scope, key).await?,
            Location::TermName(_) => false,
        })
    }

    async fn write_slot(&self, slot: &OptionSlot, value: &str) -> SyncResult<()> {
        match slot {
            OptionSlot::Plain(option) => self.legacy.set_option(option, value).await?,
            OptionSlot::Keyed { option, key } => {
                self.legacy.set_option_slot(option, key, value).await?
            }
        }
        Ok(())
    }

    /// Load the revert bundle of `content`. A missing or unreadable bundle
    /// yields `None`.
    pub(super) async fn load_bundle(&self, content: &ContentRef) -> SyncResult<Option<RevertBundle>> {
        let Some(location) = Self::bundle_location(content) else {
            return Ok(None);
        };
        let Some(raw) = self.read(&location).await? else {
            return Ok(None);
        };
        match serde_json::from_str::<RevertBundle>(&raw) {
            Ok(bundle) => Ok(Some(bundle)),
            Err(e) => {
                tracing::warn!("Ignoring unreadable revert data for {}: {}", content, e);
                Ok(None)
            }
        }
    }

    /// Persist the bundle, or delete it once it holds nothing.
    pub(super) async fn store_bundle(
        &self,
        content: &ContentRef,
        bundle: &RevertBundle,
    ) -> SyncResult<()> {
        let Some(location) = Self::bundle_location(content) else {
            return Ok(());
        };
        if bundle.is_empty() {
            self.remove(&location).await?;
        } else {
            let raw = serde_json::to_string(bundle)?;
            self.write(&location, &raw).await?;
        }
        Ok(())
    }
}
