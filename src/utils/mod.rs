//! Shared utility functions.
//!
//! - `url`: URL normalization and path helpers for lookup keys
//! - `sanitize`: cleaning of inbound text, URL, key and markup values

pub mod sanitize;
pub mod url;

pub use url::{normalize, path_segments, url_path};
