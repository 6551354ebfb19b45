use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// A short link record. Optional restrictions (password, expiry, click cap)
/// are absent rather than sentinel-valued so the access policy can branch
/// exhaustively on them.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct ShortLink {
    pub id: i64,
    pub slug: String,
    pub original_url: String,
    pub title: Option<String>,
    pub password: Option<String>,
    /// Unix seconds after which the link is expired.
    pub expires_at: Option<i64>,
    /// Once `click_count` reaches this, the link is terminally exhausted.
    pub max_clicks: Option<i64>,
    pub is_active: bool,
    pub click_count: i64,
    pub created_by: Option<String>,
    /// Unix seconds.
    pub created_at: i64,
}

/// Fields supplied when creating a link. The slug is caller-provided;
/// generation belongs to the management layer.
#[derive(Debug, Clone, Default)]
pub struct NewLink {
    pub slug: String,
    pub original_url: String,
    pub title: Option<String>,
    pub password: Option<String>,
    pub expires_at: Option<i64>,
    pub max_clicks: Option<i64>,
    pub created_by: Option<String>,
}

/// One recorded visit, enriched and immutable after insert.
///
/// `created_at` is in Unix milliseconds and marks enrichment completion,
/// not request arrival; the duplicate-click window needs the sub-second
/// resolution.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct ClickEvent {
    pub id: i64,
    pub link_id: i64,
    /// Truncated one-way hash of the visitor address; the raw address is
    /// never persisted.
    pub ip_hash: String,
    pub device: String,
    pub browser: String,
    pub os: String,
    pub country: Option<String>,
    pub city: Option<String>,
    pub referrer: Option<String>,
    pub user_agent: String,
    pub created_at: i64,
}

#[derive(Debug, Clone)]
pub struct NewClickEvent {
    pub link_id: i64,
    pub ip_hash: String,
    pub device: String,
    pub browser: String,
    pub os: String,
    pub country: Option<String>,
    pub city: Option<String>,
    pub referrer: Option<String>,
    pub user_agent: String,
    pub created_at: i64,
}
