//! Client address used as the rate-limit key.

use std::net::{IpAddr, SocketAddr};

use axum::http::HeaderMap;

const FORWARDING_HEADERS: [&str; 2] = ["client-ip", "x-forwarded-for"];

/// First public address named by `Client-IP` or `X-Forwarded-For`, else
/// the socket peer. Only the first entry of each header is considered.
///
/// The headers are client-controlled unless a proxy rewrites them, so a
/// direct caller can pick its own key. Pass `trust_forwarded = false` when
/// the server is reachable without such a proxy.
pub fn client_ip(headers: &HeaderMap, peer: Option<SocketAddr>, trust_forwarded: bool) -> String {
    let names: &[&str] = if trust_forwarded { &FORWARDING_HEADERS } else { &[] };
    for &name in names {
        let candidate = headers
            .get(name)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.split(',').next())
            .and_then(|v| v.trim().parse::<IpAddr>().ok());
        if let Some(ip) = candidate.filter(is_public) {
            return ip.to_string();
        }
    }
    peer.map(|p| p.ip().to_string())
        .unwrap_or_else(|| "127.0.0.1".to_string())
}

fn is_public(ip: &IpAddr) -> bool {
    match ip {
        IpAddr::V4(v4) => {
            !(v4.is_private()
                || v4.is_loopback()
                || v4.is_link_local()
                || v4.is_unspecified()
                || v4.is_broadcast()
                || v4.is_documentation()
                || v4.octets()[0] == 0
                || v4.octets()[0] >= 240)
        }
        IpAddr::V6(v6) => {
            let first = v6.segments()[0];
            !(v6.is_loopback()
                || v6.is_unspecified()
                || (first & 0xfe00) == 0xfc00
                || (first & 0xffc0) == 0xfe80)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn headers(pairs: &[(&'static str, &str)]) -> HeaderMap {
        let mut map = HeaderMap::new();
        for (k, v) in pairs {
            map.insert(*k, v.parse().unwrap());
        }
        map
    }

    #[test]
    fn test_header_order_and_filtering() {
        let peer: SocketAddr = "10.1.1.1:443".parse().unwrap();

        let h = headers(&[("client-ip", "8.8.8.8"), ("x-forwarded-for", "1.1.1.1")]);
        assert_eq!(client_ip(&h, Some(peer), true), "8.8.8.8");

        let h = headers(&[("client-ip", "192.168.0.5"), ("x-forwarded-for", "1.1.1.1, 9.9.9.9")]);
        assert_eq!(client_ip(&h, Some(peer), true), "1.1.1.1");

        let h = headers(&[("x-forwarded-for", "10.0.0.1, 1.1.1.1")]);
        assert_eq!(client_ip(&h, Some(peer), true), "10.1.1.1");

        assert_eq!(client_ip(&HeaderMap::new(), None, true), "127.0.0.1");
    }

    #[test]
    fn test_untrusted_headers_use_peer() {
        let peer: SocketAddr = "203.0.113.9:443".parse().unwrap();
        let h = headers(&[("client-ip", "8.8.8.8"), ("x-forwarded-for", "1.1.1.1")]);
        assert_eq!(client_ip(&h, Some(peer), false), "203.0.113.9");
    }
}
