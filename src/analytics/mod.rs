//! Click enrichment and accounting
//!
//! Everything here runs off the redirect hot path: visitor fingerprinting,
//! user-agent classification, address geolocation, and the detached
//! accounting task that persists enriched click events.

pub mod agent;
pub mod fingerprint;
pub mod geo;
pub mod ip_extractor;
pub mod tracker;

pub use agent::{classify, AgentInfo, DeviceClass};
pub use fingerprint::fingerprint;
pub use geo::{GeoLocation, GeoResolver};
pub use ip_extractor::extract_client_ip;
pub use tracker::{ClickRequest, ClickTracker, DEDUP_WINDOW_MS};
