//! Domain models for SEO sync.

mod activity;
mod content;
mod payload;
mod revert;
mod seo;
mod site;

pub use activity::{LogEntry, LogLevel, LogStats};
pub use content::ContentRef;
pub use payload::{ImageOptimization, OptimizationPayload};
pub use revert::{BundleField, ImageBackup, RevertBundle};
pub use seo::{SeoField, SeoFields, SeoRecord, SeoStatistics, StoreRevert};
pub use site::{Attachment, Post, SiteExport, Taxonomy, Term, POST_STATUS_PUBLISH};
