//! Server configuration from environment variables.
//!
//! Unparseable numeric values fall back to their defaults.

use std::path::PathBuf;
use std::time::Duration;

use conflict_map_query_models::DEFAULT_MAX_SIZE;
use strum_macros::{AsRefStr, Display, EnumString};

/// Which response cache backend to use.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, EnumString, AsRefStr)]
#[strum(serialize_all = "snake_case", ascii_case_insensitive)]
pub enum CacheBackend {
    /// No caching.
    Off,
    /// Process-local TTL map.
    Memory,
    /// `DuckDB` file (requires the `duckdb` feature).
    #[strum(serialize = "duckdb")]
    DuckDb,
}

/// Runtime settings for the API server.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerConfig {
    /// Store base URL (`ES_HOST`).
    pub es_host: String,
    /// Store request timeout (`ES_TIMEOUT_SECONDS`).
    pub es_timeout: Duration,
    /// Cache backend (`CACHE_BACKEND`, or legacy `REDIS_ENABLED=1`).
    pub cache_backend: CacheBackend,
    /// Cache entry TTL (`CACHE_TTL_SECONDS`).
    pub cache_ttl: Duration,
    /// `DuckDB` cache file (`CACHE_PATH`).
    pub cache_path: PathBuf,
    /// Upper clamp for result sizes (`API_MAX_SIZE`).
    pub max_size: usize,
    /// Bind address (`BIND_ADDR`).
    pub bind_addr: String,
    /// Listen port (`PORT`).
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            es_host: "http://localhost:9200".to_string(),
            es_timeout: Duration::from_secs(30),
            cache_backend: CacheBackend::Off,
            cache_ttl: Duration::from_secs(3600),
            cache_path: PathBuf::from("data/cache/responses.duckdb"),
            max_size: DEFAULT_MAX_SIZE,
            bind_addr: "127.0.0.1".to_string(),
            port: 8080,
        }
    }
}

impl ServerConfig {
    /// Reads the configuration from the process environment.
    #[must_use]
    pub fn from_env() -> Self {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Reads the configuration through an arbitrary variable lookup.
    #[must_use]
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();
        let parsed = |name: &str| lookup(name).and_then(|v| v.trim().parse::<u64>().ok());

        let cache_backend = match lookup("CACHE_BACKEND") {
            Some(raw) => raw.trim().parse().unwrap_or_else(|_| {
                log::warn!("Unknown CACHE_BACKEND {raw:?}, caching disabled");
                CacheBackend::Off
            }),
            None if lookup("REDIS_ENABLED").as_deref() == Some("1") => CacheBackend::Memory,
            None => defaults.cache_backend,
        };

        Self {
            es_host: lookup("ES_HOST").unwrap_or(defaults.es_host),
            es_timeout: parsed("ES_TIMEOUT_SECONDS").map_or(defaults.es_timeout, Duration::from_secs),
            cache_backend,
            cache_ttl: parsed("CACHE_TTL_SECONDS").map_or(defaults.cache_ttl, Duration::from_secs),
            cache_path: lookup("CACHE_PATH").map_or(defaults.cache_path, PathBuf::from),
            max_size: parsed("API_MAX_SIZE")
                .and_then(|v| usize::try_from(v).ok())
                .unwrap_or(defaults.max_size),
            bind_addr: lookup("BIND_ADDR").unwrap_or(defaults.bind_addr),
            port: parsed("PORT")
                .and_then(|v| u16::try_from(v).ok())
                .unwrap_or(defaults.port),
        }
    }
}
