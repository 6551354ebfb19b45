use crate::models::{ClickEvent, NewClickEvent, NewLink, ShortLink};
use crate::storage::{Storage, StorageError, StorageResult};
use anyhow::Result;
use async_trait::async_trait;
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;
use std::sync::Arc;

const LINK_COLUMNS: &str = "id, slug, original_url, title, password, expires_at, max_clicks, \
                            is_active, click_count, created_by, created_at";

const CLICK_COLUMNS: &str = "id, link_id, ip_hash, device, browser, os, country, city, \
                             referrer, user_agent, created_at";

pub struct PostgresStorage {
    pool: Arc<PgPool>,
}

impl PostgresStorage {
    pub async fn new(database_url: &str, max_connections: u32) -> Result<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .connect(database_url)
            .await?;
        Ok(Self {
            pool: Arc::new(pool),
        })
    }
}

#[async_trait]
impl Storage for PostgresStorage {
    async fn init(&self) -> Result<()> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS links (
                id BIGSERIAL PRIMARY KEY,
                slug TEXT NOT NULL UNIQUE,
                original_url TEXT NOT NULL,
                title TEXT,
                password TEXT,
                expires_at BIGINT,
                max_clicks BIGINT,
                is_active BOOLEAN NOT NULL DEFAULT TRUE,
                click_count BIGINT NOT NULL DEFAULT 0,
                created_by TEXT,
                created_at BIGINT NOT NULL
            )
            "#,
        )
        .execute(self.pool.as_ref())
        .await?;

        sqlx::query("CREATE INDEX IF NOT EXISTS idx_links_slug ON links(slug)")
            .execute(self.pool.as_ref())
            .await?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS clicks (
                id BIGSERIAL PRIMARY KEY,
                link_id BIGINT NOT NULL,
                ip_hash TEXT NOT NULL,
                device TEXT NOT NULL,
                browser TEXT NOT NULL,
                os TEXT NOT NULL,
                country TEXT,
                city TEXT,
                referrer TEXT,
                user_agent TEXT NOT NULL,
                created_at BIGINT NOT NULL
            )
            "#,
        )
        .execute(self.pool.as_ref())
        .await?;

        sqlx::query(
            "CREATE INDEX IF NOT EXISTS idx_clicks_dedup ON clicks(link_id, ip_hash, created_at)",
        )
        .execute(self.pool.as_ref())
        .await?;

        Ok(())
    }

    async fn create_link(&self, link: &NewLink) -> StorageResult<ShortLink> {
        let created_at = std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .map_err(|e| StorageError::Other(e.into()))?
            .as_secs() as i64;

        let result = sqlx::query(
            r#"
            INSERT INTO links (slug, original_url, title, password, expires_at, max_clicks,
                               is_active, created_by, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, TRUE, $7, $8)
            ON CONFLICT (slug) DO NOTHING
            "#,
        )
        .bind(&link.slug)
        .bind(&link.original_url)
        .bind(&link.title)
        .bind(&link.password)
        .bind(link.expires_at)
        .bind(link.max_clicks)
        .bind(&link.created_by)
        .bind(created_at)
        .execute(self.pool.as_ref())
        .await
        .map_err(|e| StorageError::Other(e.into()))?;

        if result.rows_affected() == 0 {
            return Err(StorageError::Conflict);
        }

        let created = sqlx::query_as::<_, ShortLink>(&format!(
            "SELECT {LINK_COLUMNS} FROM links WHERE slug = $1"
        ))
        .bind(&link.slug)
        .fetch_one(self.pool.as_ref())
        .await
        .map_err(|e| StorageError::Other(e.into()))?;

        Ok(created)
    }

    async fn get_by_slug(&self, slug: &str) -> Result<Option<ShortLink>> {
        let link = sqlx::query_as::<_, ShortLink>(&format!(
            "SELECT {LINK_COLUMNS} FROM links WHERE slug = $1"
        ))
        .bind(slug)
        .fetch_optional(self.pool.as_ref())
        .await?;

        Ok(link)
    }

    async fn increment_clicks(&self, link_id: i64) -> Result<()> {
        sqlx::query(
            r#"
            UPDATE links
            SET click_count = click_count + 1
            WHERE id = $1
            "#,
        )
        .bind(link_id)
        .execute(self.pool.as_ref())
        .await?;

        Ok(())
    }

    async fn insert_click(&self, event: &NewClickEvent) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO clicks (link_id, ip_hash, device, browser, os, country, city,
                                referrer, user_agent, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            "#,
        )
        .bind(event.link_id)
        .bind(&event.ip_hash)
        .bind(&event.device)
        .bind(&event.browser)
        .bind(&event.os)
        .bind(&event.country)
        .bind(&event.city)
        .bind(&event.referrer)
        .bind(&event.user_agent)
        .bind(event.created_at)
        .execute(self.pool.as_ref())
        .await?;

        Ok(())
    }

    async fn recent_click_exists(
        &self,
        link_id: i64,
        ip_hash: &str,
        since_ms: i64,
    ) -> Result<bool> {
        let exists = sqlx::query_scalar::<_, bool>(
            r#"
            SELECT EXISTS(
                SELECT 1 FROM clicks
                WHERE link_id = $1 AND ip_hash = $2 AND created_at >= $3
            )
            "#,
        )
        .bind(link_id)
        .bind(ip_hash)
        .bind(since_ms)
        .fetch_one(self.pool.as_ref())
        .await?;

        Ok(exists)
    }

    async fn clicks_for_link(&self, link_id: i64) -> Result<Vec<ClickEvent>> {
        let clicks = sqlx::query_as::<_, ClickEvent>(&format!(
            "SELECT {CLICK_COLUMNS} FROM clicks WHERE link_id = $1 ORDER BY created_at DESC"
        ))
        .bind(link_id)
        .fetch_all(self.pool.as_ref())
        .await?;

        Ok(clicks)
    }

    async fn set_active(&self, slug: &str, active: bool) -> Result<bool> {
        let result = sqlx::query(
            r#"
            UPDATE links
            SET is_active = $1
            WHERE slug = $2
            "#,
        )
        .bind(active)
        .bind(slug)
        .execute(self.pool.as_ref())
        .await?;

        Ok(result.rows_affected() > 0)
    }
}
