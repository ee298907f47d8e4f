use std::net::IpAddr;

use axum::http::HeaderMap;

/// Proxy headers in trust order. The first one carrying a value wins.
const FORWARDED_FOR: &str = "x-forwarded-for";
const CF_CONNECTING_IP: &str = "cf-connecting-ip";
const REAL_IP: &str = "x-real-ip";

pub const UNKNOWN_CLIENT: &str = "unknown";

/// Derives the client identifier used to partition rate-limit counters.
///
/// Precedence: `x-forwarded-for` (first hop) > `cf-connecting-ip` >
/// `x-real-ip` > the socket peer address > `"unknown"`.
pub fn client_identifier(headers: &HeaderMap, remote: Option<IpAddr>) -> String {
    let header = |name: &str| {
        headers
            .get(name)
            .and_then(|h| h.to_str().ok())
            .map(str::trim)
            .filter(|v| !v.is_empty())
    };

    header(FORWARDED_FOR)
        .and_then(|list| list.split(',').next())
        .map(str::trim)
        .filter(|ip| !ip.is_empty())
        .or_else(|| header(CF_CONNECTING_IP))
        .or_else(|| header(REAL_IP))
        .map(String::from)
        .or_else(|| remote.map(|ip| ip.to_string()))
        .unwrap_or_else(|| UNKNOWN_CLIENT.to_string())
}
