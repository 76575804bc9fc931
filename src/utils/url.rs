//! URL normalization for SEO record lookup keys.
//!
//! A normalized URL is `scheme://host/path` with the scheme and host
//! lower-cased, the query string and fragment dropped, and trailing
//! slashes removed from every path except the root. Ports and userinfo are
//! not part of the key.

use url::Url;

/// Normalize a URL into its lookup key.
///
/// Never fails. Input that is not an absolute URL falls back to a loose
/// textual split so that the same raw string always maps to the same key.
pub fn normalize(raw: &str) -> String {
    let raw = raw.trim();

    match Url::parse(raw) {
        Ok(parsed) if parsed.has_host() => {
            let host = parsed.host_str().unwrap_or_default().to_lowercase();
            format!("{}://{}{}", parsed.scheme(), host, trim_path(parsed.path()))
        }
        _ => normalize_loose(raw),
    }
}

/// Path component of a URL with trailing slashes removed (root stays `/`).
pub fn url_path(raw: &str) -> String {
    let raw = raw.trim();
    match Url::parse(raw) {
        Ok(parsed) if parsed.has_host() => trim_path(parsed.path()),
        _ => {
            let without_query = strip_query_and_fragment(raw);
            let path = match without_query.split_once("://") {
                Some((_, rest)) => rest.find('/').map(|i| &rest[i..]).unwrap_or(""),
                None => without_query,
            };
            let path = trim_path(path);
            if path.starts_with('/') {
                path
            } else {
                format!("/{}", path)
            }
        }
    }
}

/// Non-empty path segments of a URL, in order.
pub fn path_segments(raw: &str) -> Vec<String> {
    url_path(raw)
        .split('/')
        .filter(|segment| !segment.is_empty())
        .map(|segment| {
            urlencoding::decode(segment)
                .map(|decoded| decoded.into_owned())
                .unwrap_or_else(|_| segment.to_string())
        })
        .collect()
}

fn strip_query_and_fragment(raw: &str) -> &str {
    let end = raw.find(['?', '#']).unwrap_or(raw.len());
    &raw[..end]
}

fn trim_path(path: &str) -> String {
    let trimmed = path.trim_end_matches('/');
    if trimmed.is_empty() {
        "/".to_string()
    } else {
        trimmed.to_string()
    }
}

fn normalize_loose(raw: &str) -> String {
    let without_query = strip_query_and_fragment(raw);

    match without_query.split_once("://") {
        Some((scheme, rest)) => {
            let (authority, path) = match rest.find('/') {
                Some(i) => (&rest[..i], &rest[i..]),
                None => (rest, ""),
            };
            let host = authority.rsplit('@').next().unwrap_or_default();
            let host = strip_port(host).to_lowercase();
            format!("{}://{}{}", scheme.to_lowercase(), host, trim_path(path))
        }
        None => trim_path(without_query),
    }
}

fn strip_port(host: &str) -> &str {
    // Bracketed IPv6 literals keep their colons.
    if host.starts_with('[') {
        return match host.find(']') {
            Some(end) => &host[..=end],
            None => host,
        };
    }
    match host.rsplit_once(':') {
        Some((name, port)) if port.chars().all(|c| c.is_ascii_digit()) => name,
        _ => host,
    }
}
