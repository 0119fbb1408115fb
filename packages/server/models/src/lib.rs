#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! API request and response types for the conflict map server.
//!
//! Query parameter names mirror the store field names so the frontend can
//! pass attribute values straight through.

use conflict_map_query_models::{CountryFilters, DEFAULT_SIZE, EventFilters};
use serde::{Deserialize, Serialize};

/// Query parameters for `GET /conflicts`.
#[derive(Debug, Clone, Deserialize)]
pub struct EventQueryParams {
    /// Calendar year (required).
    pub year: i64,
    /// Result-size cap. Defaults to [`DEFAULT_SIZE`].
    pub size: Option<usize>,
    /// Region label.
    pub region: Option<String>,
    /// Country name.
    pub country: Option<String>,
    /// Violence type code.
    pub type_of_violence: Option<i64>,
    /// Inclusive minimum best fatality estimate.
    pub min_best: Option<i64>,
}

impl EventQueryParams {
    /// Requested size, or the default.
    #[must_use]
    pub fn size(&self) -> usize {
        self.size.unwrap_or(DEFAULT_SIZE)
    }

    /// Filter set for the query service.
    #[must_use]
    pub fn filters(&self) -> EventFilters {
        EventFilters {
            region: self.region.clone(),
            country: self.country.clone(),
            type_of_violence: self.type_of_violence,
            min_best: self.min_best,
        }
    }
}

/// Query parameters for `GET /conflict-countries`.
#[derive(Debug, Clone, Deserialize)]
pub struct CountryQueryParams {
    /// Calendar year (required).
    pub year: i64,
    /// Result-size cap. Defaults to [`DEFAULT_SIZE`].
    pub size: Option<usize>,
    /// Region label.
    pub region: Option<String>,
    /// Country name.
    pub country_name: Option<String>,
    /// Conflict type code.
    pub type_of_conflict: Option<i64>,
    /// Intensity code.
    pub intensity_level: Option<i64>,
}

impl CountryQueryParams {
    /// Requested size, or the default.
    #[must_use]
    pub fn size(&self) -> usize {
        self.size.unwrap_or(DEFAULT_SIZE)
    }

    /// Filter set for the query service.
    #[must_use]
    pub fn filters(&self) -> CountryFilters {
        CountryFilters {
            region: self.region.clone(),
            country_name: self.country_name.clone(),
            type_of_conflict: self.type_of_conflict,
            intensity_level: self.intensity_level,
        }
    }
}

/// Health check response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiHealth {
    /// Whether the store answered.
    pub ok: bool,
    /// Service version.
    pub version: String,
    /// Configured store endpoint.
    pub store_host: String,
    /// Store cluster information, when reachable.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub store: Option<serde_json::Value>,
    /// Store error text, when unreachable.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub store_error: Option<String>,
    /// Whether a cache backend is configured.
    pub cache_enabled: bool,
    /// Whether the cache backend answered a ping.
    pub cache_connected: bool,
}

/// Response of `POST /cache/clear`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApiCacheClear {
    /// Whether the cache was cleared.
    pub ok: bool,
    /// Whether a cache backend is connected.
    pub cache_connected: bool,
}

/// Error body for failed requests.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiError {
    /// Human-readable failure description.
    pub detail: String,
}
