use crate::models::{ClickEvent, NewClickEvent, NewLink, ShortLink};
use anyhow::Result;
use async_trait::async_trait;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("slug already exists")]
    Conflict,
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

pub type StorageResult<T> = Result<T, StorageError>;

#[async_trait]
pub trait Storage: Send + Sync {
    /// Initialize the storage (create tables and indexes)
    async fn init(&self) -> Result<()>;

    /// Create a new short link with a caller-provided slug.
    /// The management API owns slug generation; this is its storage surface.
    async fn create_link(&self, link: &NewLink) -> StorageResult<ShortLink>;

    /// Look up a short link by slug
    async fn get_by_slug(&self, slug: &str) -> Result<Option<ShortLink>>;

    /// Atomically add one to a link's click counter.
    /// Zero rows affected means the link vanished mid-flight; that lost
    /// update is tolerated, not an error.
    async fn increment_clicks(&self, link_id: i64) -> Result<()>;

    /// Insert an enriched click event
    async fn insert_click(&self, event: &NewClickEvent) -> Result<()>;

    /// Whether a click for (link, fingerprint) was recorded at or after
    /// `since_ms` (Unix milliseconds)
    async fn recent_click_exists(&self, link_id: i64, ip_hash: &str, since_ms: i64)
        -> Result<bool>;

    /// All click events for a link, newest first
    async fn clicks_for_link(&self, link_id: i64) -> Result<Vec<ClickEvent>>;

    /// Set a link's active flag; returns false if the slug is unknown
    async fn set_active(&self, slug: &str, active: bool) -> Result<bool>;
}
