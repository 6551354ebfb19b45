//! Client address extraction from forwarding headers
//!
//! The first parseable `x-forwarded-for` entry wins (leftmost is the
//! originating client), then `x-real-ip`, then the socket address the
//! caller passes in.

use axum::http::HeaderMap;
use std::net::IpAddr;

/// Extract the client address from forwarding headers, falling back to the
/// connection's remote address.
pub fn extract_client_ip(headers: &HeaderMap, fallback: IpAddr) -> IpAddr {
    if let Some(ip) = from_forwarded_for(headers) {
        return ip;
    }

    if let Some(ip) = from_real_ip(headers) {
        return ip;
    }

    fallback
}

fn from_forwarded_for(headers: &HeaderMap) -> Option<IpAddr> {
    let xff = headers.get("x-forwarded-for")?.to_str().ok()?;

    xff.split(',')
        .find_map(|entry| entry.trim().parse::<IpAddr>().ok())
}

fn from_real_ip(headers: &HeaderMap) -> Option<IpAddr> {
    headers
        .get("x-real-ip")?
        .to_str()
        .ok()?
        .trim()
        .parse::<IpAddr>()
        .ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    const FALLBACK: &str = "127.0.0.1";

    fn fallback() -> IpAddr {
        FALLBACK.parse().unwrap()
    }

    #[test]
    fn test_no_headers_uses_fallback() {
        let headers = HeaderMap::new();
        assert_eq!(extract_client_ip(&headers, fallback()), fallback());
    }

    #[test]
    fn test_forwarded_for_first_entry_wins() {
        let mut headers = HeaderMap::new();
        headers.insert(
            "x-forwarded-for",
            HeaderValue::from_static("203.0.113.1, 198.51.100.1"),
        );

        assert_eq!(
            extract_client_ip(&headers, fallback()),
            "203.0.113.1".parse::<IpAddr>().unwrap()
        );
    }

    #[test]
    fn test_forwarded_for_skips_unparseable_entries() {
        let mut headers = HeaderMap::new();
        headers.insert(
            "x-forwarded-for",
            HeaderValue::from_static("unknown, 198.51.100.1"),
        );

        assert_eq!(
            extract_client_ip(&headers, fallback()),
            "198.51.100.1".parse::<IpAddr>().unwrap()
        );
    }

    #[test]
    fn test_real_ip_used_when_forwarded_for_missing() {
        let mut headers = HeaderMap::new();
        headers.insert("x-real-ip", HeaderValue::from_static("203.0.113.9"));

        assert_eq!(
            extract_client_ip(&headers, fallback()),
            "203.0.113.9".parse::<IpAddr>().unwrap()
        );
    }

    #[test]
    fn test_forwarded_for_preferred_over_real_ip() {
        let mut headers = HeaderMap::new();
        headers.insert("x-forwarded-for", HeaderValue::from_static("203.0.113.1"));
        headers.insert("x-real-ip", HeaderValue::from_static("198.51.100.9"));

        assert_eq!(
            extract_client_ip(&headers, fallback()),
            "203.0.113.1".parse::<IpAddr>().unwrap()
        );
    }

    #[test]
    fn test_ipv6_forwarded_for() {
        let mut headers = HeaderMap::new();
        headers.insert("x-forwarded-for", HeaderValue::from_static("2001:db8::7"));

        assert_eq!(
            extract_client_ip(&headers, fallback()),
            "2001:db8::7".parse::<IpAddr>().unwrap()
        );
    }
}
