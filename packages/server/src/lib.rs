#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Actix-Web API server for the conflict map application.
//!
//! Serves the two map feature endpoints backed by the search store, plus
//! health and cache maintenance. Responses are optionally cached; the
//! cache fails open.

pub mod config;
mod handlers;

use std::sync::Arc;

use actix_cors::Cors;
use actix_web::{App, HttpServer, middleware, web};
use conflict_map_cache::ResponseCache;
use conflict_map_cache::memory::MemoryCache;
use conflict_map_query::QueryService;
use conflict_map_store::elastic::ElasticStore;

use crate::config::{CacheBackend, ServerConfig};

/// Shared application state.
pub struct AppState {
    /// Query service over the store and response cache.
    pub service: QueryService,
}

/// Registers the API routes.
pub fn routes(cfg: &mut web::ServiceConfig) {
    cfg.route("/health", web::get().to(handlers::health))
        .route("/conflicts", web::get().to(handlers::conflicts))
        .route(
            "/conflict-countries",
            web::get().to(handlers::conflict_countries),
        )
        .route("/cache/clear", web::post().to(handlers::cache_clear));
}

/// Builds the response cache for the configured backend.
///
/// A backend that cannot be opened is logged and treated as absent.
#[must_use]
pub fn build_cache(config: &ServerConfig) -> ResponseCache {
    match config.cache_backend {
        CacheBackend::Off => ResponseCache::disabled(),
        CacheBackend::Memory => ResponseCache::new(Arc::new(MemoryCache::new()), config.cache_ttl),
        CacheBackend::DuckDb => duckdb_cache(config),
    }
}

#[cfg(feature = "duckdb")]
fn duckdb_cache(config: &ServerConfig) -> ResponseCache {
    match conflict_map_cache::duckdb_store::DuckDbCache::open(&config.cache_path) {
        Ok(cache) => ResponseCache::new(Arc::new(cache), config.cache_ttl),
        Err(e) => {
            log::warn!(
                "Failed to open cache at {}: {e}; caching disabled",
                config.cache_path.display()
            );
            ResponseCache::disabled()
        }
    }
}

#[cfg(not(feature = "duckdb"))]
fn duckdb_cache(_config: &ServerConfig) -> ResponseCache {
    log::warn!("CACHE_BACKEND=duckdb requires the `duckdb` feature; caching disabled");
    ResponseCache::disabled()
}

/// Starts the conflict map API server.
///
/// Reads [`ServerConfig`] from the environment, connects the store client
/// and cache, and runs the Actix-Web HTTP server. The caller provides the
/// async runtime (e.g. via `#[actix_web::main]`).
///
/// # Errors
///
/// Returns an `std::io::Result` error if the store client cannot be built,
/// or if the HTTP server fails to bind or encounters a runtime error.
#[allow(clippy::future_not_send)]
pub async fn run_server() -> std::io::Result<()> {
    pretty_env_logger::init_custom_env("RUST_LOG");

    let config = ServerConfig::from_env();

    log::info!("Using store at {}", config.es_host);
    let store = ElasticStore::new(&config.es_host, config.es_timeout).map_err(std::io::Error::other)?;

    let cache = build_cache(&config);
    log::info!(
        "Response cache: {} (ttl {}s)",
        config.cache_backend,
        config.cache_ttl.as_secs()
    );

    let service = QueryService::new(Arc::new(store), cache).with_max_size(config.max_size);
    let state = web::Data::new(AppState { service });

    log::info!("Starting server on {}:{}", config.bind_addr, config.port);

    HttpServer::new(move || {
        let cors = Cors::permissive();

        App::new()
            .wrap(cors)
            .wrap(middleware::Logger::default())
            .app_data(state.clone())
            .configure(routes)
    })
    .bind((config.bind_addr, config.port))?
    .run()
    .await
}
