//! Bearer-token check for webhook deliveries.

use std::sync::LazyLock;

use regex::Regex;
use sha2::{Digest, Sha256};

use crate::error::SyncError;
use crate::utils::sanitize;

static BEARER: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?i)^Bearer\s+(.+)$").unwrap());

/// Check an `Authorization` header against the configured API key.
///
/// No configured key or a malformed header is `Unauthorized`; a wrong key
/// is `Forbidden`.
pub fn verify_bearer(configured: Option<&str>, header: Option<&str>) -> Result<(), SyncError> {
    let Some(expected) = configured else {
        return Err(SyncError::Unauthorized("API key not configured".into()));
    };
    let token = header
        .and_then(|h| BEARER.captures(h.trim()))
        .and_then(|c| c.get(1))
        .map(|m| sanitize::text_field(m.as_str()))
        .ok_or_else(|| SyncError::Unauthorized("Invalid authorization".into()))?;

    if !constant_time_eq(expected, &token) {
        return Err(SyncError::Forbidden("Invalid API key".into()));
    }
    Ok(())
}

/// Compare digests so timing depends on neither input's content nor length.
fn constant_time_eq(a: &str, b: &str) -> bool {
    let a = Sha256::digest(a.as_bytes());
    let b = Sha256::digest(b.as_bytes());
    a.iter().zip(b.iter()).fold(0u8, |acc, (x, y)| acc | (x ^ y)) == 0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_verify_bearer() {
        assert!(verify_bearer(Some("secret"), Some("Bearer secret")).is_ok());
        assert!(verify_bearer(Some("secret"), Some("bearer   secret")).is_ok());

        assert!(matches!(
            verify_bearer(None, Some("Bearer secret")),
            Err(SyncError::Unauthorized(m)) if m == "API key not configured"
        ));
        assert!(matches!(
            verify_bearer(Some("secret"), Some("Basic abc")),
            Err(SyncError::Unauthorized(m)) if m == "Invalid authorization"
        ));
        assert!(matches!(
            verify_bearer(Some("secret"), None),
            Err(SyncError::Unauthorized(_))
        ));
        assert!(matches!(
            verify_bearer(Some("secret"), Some("Bearer wrong")),
            Err(SyncError::Forbidden(_))
        ));
    }
}
