//! Detached click accounting
//!
//! The redirect handler hands a [`ClickRequest`] to [`ClickTracker::track`]
//! inside a spawned task and returns immediately. Everything here is
//! best-effort: each step's failure is logged and the rest continue with
//! defaults, because the HTTP response was already delivered.

use std::net::IpAddr;
use std::sync::Arc;

use chrono::Utc;
use tracing::{debug, warn};

use crate::analytics::agent;
use crate::analytics::fingerprint::fingerprint;
use crate::analytics::geo::GeoResolver;
use crate::models::NewClickEvent;
use crate::storage::Storage;

/// Trailing window within which repeated clicks from the same
/// (link, fingerprint) pair are suppressed.
pub const DEDUP_WINDOW_MS: i64 = 2_000;

/// Everything the accounting task needs from the request. The raw address
/// lives only as long as fingerprinting and geolocation need it.
#[derive(Debug, Clone)]
pub struct ClickRequest {
    pub link_id: i64,
    pub addr: IpAddr,
    pub user_agent: String,
    pub referrer: Option<String>,
}

pub struct ClickTracker {
    storage: Arc<dyn Storage>,
    geo: Arc<GeoResolver>,
}

impl ClickTracker {
    pub fn new(storage: Arc<dyn Storage>, geo: Arc<GeoResolver>) -> Self {
        Self { storage, geo }
    }

    /// Record one allowed redirect: fingerprint, dedup, enrich, persist,
    /// count.
    ///
    /// The dedup probe and the insert are not atomic; two same-fingerprint
    /// requests racing inside the window can both pass the probe and both
    /// record. That occasional duplicate is an accepted trade against
    /// locking the hot path.
    pub async fn track(&self, hit: ClickRequest) {
        let ip_hash = fingerprint(&hit.addr.to_string());

        let since = Utc::now().timestamp_millis() - DEDUP_WINDOW_MS;
        match self
            .storage
            .recent_click_exists(hit.link_id, &ip_hash, since)
            .await
        {
            Ok(true) => {
                debug!(link_id = hit.link_id, "duplicate click suppressed");
                return;
            }
            Ok(false) => {}
            // Best effort: a failed probe records the click anyway
            Err(err) => {
                warn!(link_id = hit.link_id, error = %err, "dedup check failed");
            }
        }

        let agent = agent::classify(&hit.user_agent);
        let geo = self.geo.resolve(hit.addr).await;

        let event = NewClickEvent {
            link_id: hit.link_id,
            ip_hash,
            device: agent.device.as_str().to_string(),
            browser: agent.browser,
            os: agent.os,
            country: geo.country,
            city: geo.city,
            referrer: hit.referrer,
            user_agent: hit.user_agent,
            // Enrichment completion time, not request arrival
            created_at: Utc::now().timestamp_millis(),
        };

        if let Err(err) = self.storage.insert_click(&event).await {
            warn!(link_id = hit.link_id, error = %err, "failed to persist click event");
        }

        // Deliberately independent of the insert above; the counter may
        // drift from the event table under failures or races.
        if let Err(err) = self.storage.increment_clicks(hit.link_id).await {
            warn!(link_id = hit.link_id, error = %err, "failed to increment click counter");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::{anyhow, Result};
    use async_trait::async_trait;
    use crate::config::GeoConfig;
    use crate::models::{ClickEvent, NewLink, ShortLink};
    use crate::storage::{SqliteStorage, StorageResult};

    fn test_geo() -> Arc<GeoResolver> {
        Arc::new(
            GeoResolver::new(&GeoConfig {
                endpoint: "http://127.0.0.1:9".to_string(),
                timeout_ms: 100,
                cache_ttl_secs: 60,
                cache_capacity: 16,
            })
            .unwrap(),
        )
    }

    async fn test_tracker() -> (Arc<dyn Storage>, ClickTracker) {
        let storage: Arc<dyn Storage> =
            Arc::new(SqliteStorage::new("sqlite::memory:", 5).await.unwrap());
        storage.init().await.unwrap();

        let tracker = ClickTracker::new(Arc::clone(&storage), test_geo());
        (storage, tracker)
    }

    /// Real SQLite underneath, except the dedup probe always errors
    struct BrokenDedupStorage {
        inner: SqliteStorage,
    }

    #[async_trait]
    impl Storage for BrokenDedupStorage {
        async fn init(&self) -> Result<()> {
            self.inner.init().await
        }

        async fn create_link(&self, link: &NewLink) -> StorageResult<ShortLink> {
            self.inner.create_link(link).await
        }

        async fn get_by_slug(&self, slug: &str) -> Result<Option<ShortLink>> {
            self.inner.get_by_slug(slug).await
        }

        async fn increment_clicks(&self, link_id: i64) -> Result<()> {
            self.inner.increment_clicks(link_id).await
        }

        async fn insert_click(&self, event: &NewClickEvent) -> Result<()> {
            self.inner.insert_click(event).await
        }

        async fn recent_click_exists(
            &self,
            _link_id: i64,
            _ip_hash: &str,
            _since_ms: i64,
        ) -> Result<bool> {
            Err(anyhow!("dedup query lost its connection"))
        }

        async fn clicks_for_link(&self, link_id: i64) -> Result<Vec<ClickEvent>> {
            self.inner.clicks_for_link(link_id).await
        }

        async fn set_active(&self, slug: &str, active: bool) -> Result<bool> {
            self.inner.set_active(slug, active).await
        }
    }

    fn hit(link_id: i64) -> ClickRequest {
        ClickRequest {
            link_id,
            addr: "192.168.1.50".parse().unwrap(),
            user_agent: "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 \
                         (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36"
                .to_string(),
            referrer: Some("https://example.org/".to_string()),
        }
    }

    #[tokio::test]
    async fn test_track_records_enriched_event_and_counts() {
        let (storage, tracker) = test_tracker().await;
        let link = storage
            .create_link(&NewLink {
                slug: "tracked".to_string(),
                original_url: "https://example.com".to_string(),
                ..Default::default()
            })
            .await
            .unwrap();

        tracker.track(hit(link.id)).await;

        let clicks = storage.clicks_for_link(link.id).await.unwrap();
        assert_eq!(clicks.len(), 1);

        let event = &clicks[0];
        assert_eq!(event.device, "desktop");
        assert_eq!(event.browser, "Chrome");
        assert_eq!(event.ip_hash.len(), 16);
        assert!(!event.user_agent.is_empty());
        assert_eq!(event.referrer.as_deref(), Some("https://example.org/"));
        // Private source address: no geo data
        assert_eq!(event.country, None);
        assert_eq!(event.city, None);

        let link = storage.get_by_slug("tracked").await.unwrap().unwrap();
        assert_eq!(link.click_count, 1);
    }

    #[tokio::test]
    async fn test_track_suppresses_duplicate_within_window() {
        let (storage, tracker) = test_tracker().await;
        let link = storage
            .create_link(&NewLink {
                slug: "dup".to_string(),
                original_url: "https://example.com".to_string(),
                ..Default::default()
            })
            .await
            .unwrap();

        tracker.track(hit(link.id)).await;
        tracker.track(hit(link.id)).await;

        let clicks = storage.clicks_for_link(link.id).await.unwrap();
        assert_eq!(clicks.len(), 1, "second click inside window is suppressed");

        // The suppressed attempt must not touch the counter either
        let link = storage.get_by_slug("dup").await.unwrap().unwrap();
        assert_eq!(link.click_count, 1);
    }

    #[tokio::test]
    async fn test_track_distinct_visitors_both_recorded() {
        let (storage, tracker) = test_tracker().await;
        let link = storage
            .create_link(&NewLink {
                slug: "two".to_string(),
                original_url: "https://example.com".to_string(),
                ..Default::default()
            })
            .await
            .unwrap();

        let mut second = hit(link.id);
        second.addr = "192.168.1.51".parse().unwrap();

        tracker.track(hit(link.id)).await;
        tracker.track(second).await;

        let clicks = storage.clicks_for_link(link.id).await.unwrap();
        assert_eq!(clicks.len(), 2);
    }

    #[tokio::test]
    async fn test_track_records_when_dedup_probe_errors() {
        // A failing probe degrades to "not a duplicate"; the click still
        // lands in both tables
        let inner = SqliteStorage::new("sqlite::memory:", 5).await.unwrap();
        inner.init().await.unwrap();
        let storage: Arc<dyn Storage> = Arc::new(BrokenDedupStorage { inner });

        let link = storage
            .create_link(&NewLink {
                slug: "shaky".to_string(),
                original_url: "https://example.com".to_string(),
                ..Default::default()
            })
            .await
            .unwrap();

        let tracker = ClickTracker::new(Arc::clone(&storage), test_geo());
        tracker.track(hit(link.id)).await;

        let clicks = storage.clicks_for_link(link.id).await.unwrap();
        assert_eq!(clicks.len(), 1, "click must be recorded despite the failed probe");

        let link = storage.get_by_slug("shaky").await.unwrap().unwrap();
        assert_eq!(link.click_count, 1);
    }

    #[tokio::test]
    async fn test_track_vanished_link_is_swallowed() {
        let (_storage, tracker) = test_tracker().await;

        // Link id that never existed; accounting must complete without error
        tracker.track(hit(4242)).await;
    }
}
