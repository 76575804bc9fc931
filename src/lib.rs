//! ClickRank SEO sync service.
//!
//! Keeps SEO metadata (titles, descriptions, canonical URLs, schema markup,
//! image alt text and link titles) in sync between the ClickRank platform
//! and a site. Incoming changes arrive through the webhook server or the
//! outbound sync API; both flow through the content resolver and the
//! reconciliation engine into the URL-keyed SEO table and the legacy
//! per-entity metadata store.

pub mod activity_log;
pub mod app;
pub mod cli;
pub mod config;
pub mod error;
pub mod http_client;
pub mod migrations;
pub mod models;
pub mod rate_limit;
pub mod repository;
pub mod schema;
pub mod server;
pub mod services;
pub mod site;
pub mod utils;

pub use app::App;
pub use error::{SyncError, SyncResult};
