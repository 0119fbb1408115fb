//! HTTP handler functions for the conflict map API.

use actix_web::{HttpResponse, web};
use conflict_map_cache::ClearOutcome;
use conflict_map_query::QueryError;
use conflict_map_server_models::{
    ApiCacheClear, ApiError, ApiHealth, CountryQueryParams, EventQueryParams,
};

use crate::AppState;

/// `GET /health`
pub async fn health(state: web::Data<AppState>) -> HttpResponse {
    let store = state.service.store();
    let (info, error) = match store.info().await {
        Ok(info) => (Some(info), None),
        Err(e) => {
            log::warn!("Store health check failed: {e}");
            (None, Some(e.to_string()))
        }
    };
    let cache = state.service.cache();

    HttpResponse::Ok().json(ApiHealth {
        ok: error.is_none(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        store_host: store.endpoint().to_string(),
        store: info,
        store_error: error,
        cache_enabled: cache.is_enabled(),
        cache_connected: cache.healthy().unwrap_or(false),
    })
}

/// `GET /conflicts`
///
/// One point feature per event for the requested year.
pub async fn conflicts(
    state: web::Data<AppState>,
    params: web::Query<EventQueryParams>,
) -> HttpResponse {
    match state
        .service
        .fetch_event_features(params.year, params.size(), &params.filters())
        .await
    {
        Ok(collection) => HttpResponse::Ok().json(collection),
        Err(e) => query_failed("conflicts", &e),
    }
}

/// `GET /conflict-countries`
///
/// One aggregated polygon feature per country for the requested year.
pub async fn conflict_countries(
    state: web::Data<AppState>,
    params: web::Query<CountryQueryParams>,
) -> HttpResponse {
    match state
        .service
        .fetch_country_features(params.year, params.size(), &params.filters())
        .await
    {
        Ok(collection) => HttpResponse::Ok().json(collection),
        Err(e) => query_failed("conflict countries", &e),
    }
}

/// `POST /cache/clear`
pub async fn cache_clear(state: web::Data<AppState>) -> HttpResponse {
    match state.service.cache().clear() {
        ClearOutcome::Disabled => HttpResponse::Ok().json(ApiCacheClear {
            ok: false,
            cache_connected: false,
        }),
        ClearOutcome::Cleared => HttpResponse::Ok().json(ApiCacheClear {
            ok: true,
            cache_connected: true,
        }),
        ClearOutcome::Failed(message) => HttpResponse::InternalServerError().json(ApiError {
            detail: format!("Cache error: {message}"),
        }),
    }
}

fn query_failed(what: &str, e: &QueryError) -> HttpResponse {
    log::error!("Failed to query {what}: {e}");
    HttpResponse::InternalServerError().json(ApiError {
        detail: e.to_string(),
    })
}
