//! Input sanitization for values arriving from the platform.
//!
//! Every string that ends up in the SEO table or the legacy store passes
//! through one of these helpers first.

use std::sync::LazyLock;

use regex::Regex;

static TAG: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?s)<[^>]*>").unwrap());
static OCTET: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"%[a-fA-F0-9]{2}").unwrap());
static WHITESPACE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"[\s\p{Cc}]+").unwrap());
static INLINE_WS: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"[ \t\x0B\x0C]+").unwrap());
static UNSAFE_ELEMENT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?is)</?\s*(script|style|iframe|object|embed|form|input|link|meta)\b[^>]*>").unwrap()
});
static EVENT_ATTR: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?i)\s+on[a-z]+\s*=\s*("[^"]*"|'[^']*'|[^\s>]+)"#).unwrap()
});
static JS_SCHEME: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?i)javascript\s*:").unwrap());

/// Single-line text: tags and percent-encoded octets removed, all
/// whitespace runs collapsed to one space, trimmed.
pub fn text_field(input: &str) -> String {
    let stripped = TAG.replace_all(input, "");
    let stripped = OCTET.replace_all(&stripped, "");
    WHITESPACE
        .replace_all(&stripped, " ")
        .trim()
        .to_string()
}

/// Multi-line text: like [`text_field`] but line breaks survive.
pub fn textarea_field(input: &str) -> String {
    let stripped = TAG.replace_all(input, "");
    let stripped = OCTET.replace_all(&stripped, "");
    let unified = stripped.replace("\r\n", "\n").replace('\r', "\n");

    unified
        .split('\n')
        .map(|line| INLINE_WS.replace_all(line, " ").trim().to_string())
        .collect::<Vec<_>>()
        .join("\n")
        .trim()
        .to_string()
}

/// Lower-cased identifier restricted to `[a-z0-9_-]`.
pub fn key(input: &str) -> String {
    input
        .to_lowercase()
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || *c == '_' || *c == '-')
        .collect()
}

/// An http(s) URL with unsafe characters removed, or an empty string.
///
/// Scheme-less hosts get `http://` prepended. Root-relative paths are kept.
pub fn url(input: &str) -> String {
    let cleaned: String = input
        .trim()
        .chars()
        .filter(|c| {
            !c.is_control()
                && !c.is_whitespace()
                && !matches!(c, '<' | '>' | '"' | '`' | '{' | '}' | '|' | '\\' | '^')
        })
        .collect();

    if cleaned.is_empty() {
        return String::new();
    }

    if cleaned.starts_with('/') || cleaned.starts_with('#') || cleaned.starts_with('?') {
        return cleaned;
    }

    let lower = cleaned.to_lowercase();
    if lower.starts_with("http://") || lower.starts_with("https://") {
        return cleaned;
    }

    // Any other scheme (`javascript:`, `data:`, `ftp://`) is dropped. A colon
    // followed by a digit is a port, not a scheme.
    if let Some((scheme, rest)) = cleaned.split_once(':') {
        let is_scheme = !scheme.is_empty()
            && scheme
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || matches!(c, '+' | '-' | '.'))
            && !rest.starts_with(|c: char| c.is_ascii_digit());
        if is_scheme {
            return String::new();
        }
    }

    format!("http://{}", cleaned)
}

/// Schema or other rich markup: dangerous elements and inline handlers are
/// removed, element content is kept.
pub fn markup(input: &str) -> String {
    let cleaned = UNSAFE_ELEMENT.replace_all(input, "");
    let cleaned = EVENT_ATTR.replace_all(&cleaned, "");
    JS_SCHEME.replace_all(&cleaned, "").trim().to_string()
}
