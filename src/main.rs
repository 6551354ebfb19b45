use anyhow::Result;
use std::net::SocketAddr;
use std::sync::Arc;
use tracing::info;

use snip::analytics::{ClickTracker, GeoResolver};
use snip::config::{Config, DatabaseBackend};
use snip::redirect;
use snip::storage::{PostgresStorage, SqliteStorage, Storage};

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt::init();

    let config = Config::from_env()?;
    info!("Loaded configuration");

    let storage: Arc<dyn Storage> = match config.database.backend {
        DatabaseBackend::Sqlite => {
            info!("Using SQLite storage: {}", config.database.url);
            Arc::new(
                SqliteStorage::new(&config.database.url, config.database.max_connections).await?,
            )
        }
        DatabaseBackend::Postgres => {
            info!("Using PostgreSQL storage: {}", config.database.url);
            Arc::new(
                PostgresStorage::new(&config.database.url, config.database.max_connections)
                    .await?,
            )
        }
    };

    info!("Initializing database...");
    storage.init().await?;
    info!("Database initialized successfully");

    let geo = Arc::new(GeoResolver::new(&config.geo)?);
    info!(
        "Geo lookups via {} (timeout {}ms, cache TTL {}s)",
        config.geo.endpoint, config.geo.timeout_ms, config.geo.cache_ttl_secs
    );

    let tracker = Arc::new(ClickTracker::new(Arc::clone(&storage), geo));
    let router = redirect::create_redirect_router(Arc::clone(&storage), tracker);

    let addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!("🚀 Redirect server listening on http://{}", addr);

    axum::serve(
        listener,
        router.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await?;

    Ok(())
}
