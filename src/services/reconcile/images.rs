//! Image attachment alt text and titles.

use crate::config::keys;
use crate::error::SyncResult;
use crate::models::{ImageBackup, ImageOptimization};
use crate::site::MetaScope;

use super::ReconciliationEngine;

/// Result of applying a batch of image optimizations.
#[derive(Debug, Default)]
pub(super) struct ImageUpdate {
    /// Alt texts and titles written.
    pub updated: usize,
    /// Pre-change state of every attachment touched.
    pub backups: Vec<ImageBackup>,
}

impl ReconciliationEngine {
    /// Apply alt text and title changes to the attachments behind each
    /// image URL. Images with no matching attachment are skipped. `result`
    /// keeps the backups taken so far when a write fails.
    pub(super) async fn update_images(
        &self,
        optimizations: &[ImageOptimization],
        result: &mut ImageUpdate,
    ) -> SyncResult<()> {
        for opt in optimizations {
            if opt.image_url.is_empty() {
                continue;
            }
            let Some(attachment) = self.site.attachment_for_url(&opt.image_url).await? else {
                tracing::debug!("No attachment for image {}", opt.image_url);
                continue;
            };
            let scope = MetaScope::Post(attachment.id);

            result.backups.push(ImageBackup {
                image_url: opt.image_url.clone(),
                original_alt: self
                    .legacy
                    .get_meta(scope, keys::IMAGE_ALT)
                    .await?
                    .unwrap_or_default(),
                original_title: attachment.title.clone(),
            });

            if let Some(alt) = &opt.new_alt_text {
                self.legacy.set_meta(scope, keys::IMAGE_ALT, alt).await?;
                result.updated += 1;
            }
            if let Some(title) = &opt.new_title {
                if self.legacy.set_post_title(attachment.id, title).await? {
                    result.updated += 1;
                }
            }
        }

        Ok(())
    }

    /// Put attachments back to their backed-up alt text and title.
    pub(super) async fn revert_images(&self, backups: &[ImageBackup]) -> SyncResult<usize> {
        let mut reverted = 0;
        for backup in backups {
            let Some(attachment) = self.site.attachment_for_url(&backup.image_url).await? else {
                continue;
            };
            let scope = MetaScope::Post(attachment.id);
            if backup.original_alt.is_empty() {
                self.legacy.delete_meta(scope, keys::IMAGE_ALT).await?;
            } else {
                self.legacy
                    .set_meta(scope, keys::IMAGE_ALT, &backup.original_alt)
                    .await?;
            }
            self.legacy
                .set_post_title(attachment.id, &backup.original_title)
                .await?;
            reverted += 1;
        }
        Ok(reverted)
    }
}
