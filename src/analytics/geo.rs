//! Network address geolocation with a bounded-lifetime cache
//!
//! Lookups go to an external HTTP service (ip-api.com response shape) with a
//! hard timeout. Results are cached per address; failures degrade to an
//! empty location and are not cached, so the next lookup retries upstream.
//! Private and loopback ranges never leave the process.

use anyhow::Result;
use moka::future::Cache;
use serde::Deserialize;
use std::net::IpAddr;
use std::time::Duration;
use tracing::debug;

use crate::config::GeoConfig;

/// Coarse location for a visitor. Both fields stay `None` for private
/// addresses and failed lookups.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GeoLocation {
    pub country: Option<String>,
    pub city: Option<String>,
}

#[derive(Debug, Deserialize)]
struct GeoApiResponse {
    country: Option<String>,
    city: Option<String>,
}

/// Shared geolocation resolver: one instance per process, passed around by
/// `Arc`. The cache is safe for concurrent lookups.
pub struct GeoResolver {
    client: reqwest::Client,
    cache: Cache<IpAddr, GeoLocation>,
    endpoint: String,
}

impl GeoResolver {
    pub fn new(config: &GeoConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_millis(config.timeout_ms))
            .build()?;

        let cache = Cache::builder()
            .max_capacity(config.cache_capacity)
            .time_to_live(Duration::from_secs(config.cache_ttl_secs))
            .build();

        Ok(Self {
            client,
            cache,
            endpoint: config.endpoint.trim_end_matches('/').to_string(),
        })
    }

    /// Resolve an address to a coarse location. Never fails: timeouts,
    /// non-success responses, and parse errors all yield the empty location.
    pub async fn resolve(&self, ip: IpAddr) -> GeoLocation {
        if is_private(ip) {
            return GeoLocation::default();
        }

        self.cache
            .optionally_get_with(ip, self.fetch(ip))
            .await
            .unwrap_or_default()
    }

    async fn fetch(&self, ip: IpAddr) -> Option<GeoLocation> {
        let url = format!("{}/{}?fields=country,city", self.endpoint, ip);

        let response = match self.client.get(&url).send().await {
            Ok(response) => response,
            Err(err) => {
                debug!(error = %err, "geo lookup request failed");
                return None;
            }
        };

        if !response.status().is_success() {
            debug!(status = %response.status(), "geo lookup returned non-success status");
            return None;
        }

        match response.json::<GeoApiResponse>().await {
            Ok(body) => Some(GeoLocation {
                // The service reports failures as 200s with empty fields
                country: body.country.filter(|c| !c.is_empty()),
                city: body.city.filter(|c| !c.is_empty()),
            }),
            Err(err) => {
                debug!(error = %err, "geo lookup body was unparseable");
                None
            }
        }
    }
}

/// Ranges that short-circuit without an external call: loopback, RFC 1918,
/// link-local, unspecified, and IPv6 unique-local.
fn is_private(ip: IpAddr) -> bool {
    match ip {
        IpAddr::V4(v4) => {
            v4.is_loopback() || v4.is_private() || v4.is_link_local() || v4.is_unspecified()
        }
        IpAddr::V6(v6) => {
            v6.is_loopback()
                || v6.is_unspecified()
                || (v6.segments()[0] & 0xfe00) == 0xfc00
                || (v6.segments()[0] & 0xffc0) == 0xfe80
        }
    }
}
