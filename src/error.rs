//! Error taxonomy shared by the webhook, the sync client and the CLI.

use std::time::Duration;

use crate::repository::DieselError;
use crate::site::SiteError;

/// Result type for sync and reconciliation operations.
pub type SyncResult<T> = Result<T, SyncError>;

/// Errors raised while resolving, applying or syncing SEO data.
#[derive(Debug, thiserror::Error)]
pub enum SyncError {
    /// Malformed or missing input. Never retried.
    #[error("{0}")]
    Validation(String),
    /// Missing or malformed credentials.
    #[error("{0}")]
    Unauthorized(String),
    /// Credentials present but wrong.
    #[error("{0}")]
    Forbidden(String),
    #[error("{0}")]
    NotFound(String),
    #[error("Rate limit exceeded, retry in {}s", retry_after.as_secs())]
    RateLimited { retry_after: Duration },
    /// Network failure or 5xx that survived the retry.
    #[error("Transient network error: {0}")]
    TransientNetwork(String),
    /// Non-retryable response from the remote platform.
    #[error("Remote API returned {status}: {message}")]
    Remote { status: u16, message: String },
    #[error("Persistence error: {0}")]
    Persistence(String),
    #[error("Serialization error: {0}")]
    Serialization(String),
    #[error("No updates applied")]
    NoFieldsUpdated,
    #[error("No fields reverted")]
    NothingToRevert,
}

impl SyncError {
    /// HTTP status used when the error is returned from the webhook.
    pub fn status_code(&self) -> u16 {
        match self {
            SyncError::Validation(_) | SyncError::NoFieldsUpdated | SyncError::NothingToRevert => {
                400
            }
            SyncError::Unauthorized(_) => 401,
            SyncError::Forbidden(_) => 403,
            SyncError::NotFound(_) => 404,
            SyncError::RateLimited { .. } => 429,
            SyncError::TransientNetwork(_) | SyncError::Remote { .. } => 502,
            SyncError::Persistence(_) | SyncError::Serialization(_) => 500,
        }
    }

    /// Whether a single retry may succeed: network failures and 5xx.
    pub fn is_transient(&self) -> bool {
        match self {
            SyncError::TransientNetwork(_) => true,
            SyncError::Remote { status, .. } => *status >= 500,
            _ => false,
        }
    }
}

impl From<DieselError> for SyncError {
    fn from(e: DieselError) -> Self {
        SyncError::Persistence(e.to_string())
    }
}

impl From<SiteError> for SyncError {
    fn from(e: SiteError) -> Self {
        match e {
            SiteError::Serialization(msg) => SyncError::Serialization(msg),
            other => SyncError::Persistence(other.to_string()),
        }
    }
}

impl From<serde_json::Error> for SyncError {
    fn from(e: serde_json::Error) -> Self {
        SyncError::Serialization(e.to_string())
    }
}
