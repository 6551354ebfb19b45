use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub database: DatabaseConfig,
    pub server: ServerConfig,
    pub geo: GeoConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    pub backend: DatabaseBackend,
    pub url: String,
    pub max_connections: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DatabaseBackend {
    Sqlite,
    Postgres,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

/// Settings for the external geolocation lookup and its cache.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeoConfig {
    /// Base URL of the geolocation service; the address is appended as a
    /// path segment (ip-api.com style).
    pub endpoint: String,
    /// Upper bound on a single lookup, so a slow upstream cannot pin a
    /// background task.
    #[serde(default = "GeoConfig::default_timeout_ms")]
    pub timeout_ms: u64,
    #[serde(default = "GeoConfig::default_cache_ttl_secs")]
    pub cache_ttl_secs: u64,
    #[serde(default = "GeoConfig::default_cache_capacity")]
    pub cache_capacity: u64,
}

impl GeoConfig {
    const fn default_timeout_ms() -> u64 {
        3_000
    }

    /// Lookups are considered fresh for a day, then refreshed lazily.
    const fn default_cache_ttl_secs() -> u64 {
        86_400
    }

    const fn default_cache_capacity() -> u64 {
        10_000
    }
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();

        let backend_str =
            std::env::var("DATABASE_BACKEND").unwrap_or_else(|_| "sqlite".to_string());

        let backend = match backend_str.to_lowercase().as_str() {
            "postgres" | "postgresql" => DatabaseBackend::Postgres,
            _ => DatabaseBackend::Sqlite,
        };

        let database_url =
            std::env::var("DATABASE_URL").unwrap_or_else(|_| "sqlite://./snip.db".to_string());

        let max_connections = std::env::var("DATABASE_MAX_CONNECTIONS")
            .unwrap_or_else(|_| "5".to_string())
            .parse::<u32>()?;

        let host = std::env::var("HOST").unwrap_or_else(|_| "127.0.0.1".to_string());
        let port = std::env::var("PORT")
            .unwrap_or_else(|_| "3000".to_string())
            .parse::<u16>()?;

        let geo_endpoint = std::env::var("GEO_API_URL")
            .unwrap_or_else(|_| "http://ip-api.com/json".to_string());
        let geo_timeout_ms = std::env::var("GEO_TIMEOUT_MS")
            .ok()
            .and_then(|v| v.parse::<u64>().ok())
            .unwrap_or_else(GeoConfig::default_timeout_ms);
        let geo_cache_ttl_secs = std::env::var("GEO_CACHE_TTL_SECS")
            .ok()
            .and_then(|v| v.parse::<u64>().ok())
            .unwrap_or_else(GeoConfig::default_cache_ttl_secs);
        let geo_cache_capacity = std::env::var("GEO_CACHE_CAPACITY")
            .ok()
            .and_then(|v| v.parse::<u64>().ok())
            .unwrap_or_else(GeoConfig::default_cache_capacity);

        Ok(Config {
            database: DatabaseConfig {
                backend,
                url: database_url,
                max_connections,
            },
            server: ServerConfig { host, port },
            geo: GeoConfig {
                endpoint: geo_endpoint,
                timeout_ms: geo_timeout_ms,
                cache_ttl_secs: geo_cache_ttl_secs,
                cache_capacity: geo_cache_capacity,
            },
        })
    }
}
