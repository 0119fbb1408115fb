#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Optional response cache for the query endpoints.
//!
//! The cache is advisory. [`ResponseCache`] wraps an optional
//! [`CacheStore`] backend and turns every backend failure into a miss or a
//! no-op, so an unreachable or broken cache never fails a query.

#[cfg(feature = "duckdb")]
pub mod duckdb_store;
pub mod key;
pub mod memory;

use std::sync::Arc;
use std::time::Duration;

use serde_json::Value;

pub use key::cache_key;

/// Errors raised by cache backends.
#[derive(Debug, thiserror::Error)]
pub enum CacheError {
    /// The backend could not be reached.
    #[error("Cache unavailable: {0}")]
    Unavailable(String),

    /// The backend rejected an operation.
    #[error("Cache backend error: {0}")]
    Backend(String),
}

/// A key-value store with per-entry time-to-live.
pub trait CacheStore: Send + Sync {
    /// Returns the stored value for `key` if present and not expired.
    ///
    /// # Errors
    ///
    /// Returns [`CacheError`] if the backend fails.
    fn get(&self, key: &str) -> Result<Option<String>, CacheError>;

    /// Stores `value` under `key` for `ttl`.
    ///
    /// # Errors
    ///
    /// Returns [`CacheError`] if the backend fails.
    fn set(&self, key: &str, value: &str, ttl: Duration) -> Result<(), CacheError>;

    /// Removes every entry.
    ///
    /// # Errors
    ///
    /// Returns [`CacheError`] if the backend fails.
    fn clear(&self) -> Result<(), CacheError>;

    /// Checks that the backend is reachable.
    ///
    /// # Errors
    ///
    /// Returns [`CacheError`] if the backend is unreachable.
    fn ping(&self) -> Result<(), CacheError>;
}

/// Result of a cache clear request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClearOutcome {
    /// No cache backend is configured.
    Disabled,
    /// All entries were removed.
    Cleared,
    /// The backend failed; the message is safe to show to callers.
    Failed(String),
}

/// Fail-open wrapper around an optional cache backend.
#[derive(Clone)]
pub struct ResponseCache {
    store: Option<Arc<dyn CacheStore>>,
    ttl: Duration,
}

impl ResponseCache {
    /// A cache that never stores anything.
    #[must_use]
    pub const fn disabled() -> Self {
        Self {
            store: None,
            ttl: Duration::ZERO,
        }
    }

    /// Wraps a backend with the given entry time-to-live.
    #[must_use]
    pub fn new(store: Arc<dyn CacheStore>, ttl: Duration) -> Self {
        Self {
            store: Some(store),
            ttl,
        }
    }

    /// Whether a backend is configured.
    #[must_use]
    pub const fn is_enabled(&self) -> bool {
        self.store.is_some()
    }

    /// Entry time-to-live.
    #[must_use]
    pub const fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Looks up and decodes a cached JSON response.
    ///
    /// Backend errors and undecodable entries are logged and reported as a
    /// miss.
    #[must_use]
    pub fn get_json(&self, key: &str) -> Option<Value> {
        let store = self.store.as_ref()?;
        match store.get(key) {
            Ok(Some(raw)) => match serde_json::from_str(&raw) {
                Ok(value) => {
                    log::debug!("Cache hit: {key}");
                    Some(value)
                }
                Err(e) => {
                    log::warn!("Ignoring undecodable cache entry {key}: {e}");
                    None
                }
            },
            Ok(None) => None,
            Err(e) => {
                log::warn!("Cache read failed for {key}: {e}");
                None
            }
        }
    }

    /// Encodes and stores a JSON response. Failures are logged and ignored.
    pub fn set_json(&self, key: &str, value: &Value) {
        let Some(store) = &self.store else {
            return;
        };
        let raw = match serde_json::to_string(value) {
            Ok(raw) => raw,
            Err(e) => {
                log::warn!("Failed to encode cache entry {key}: {e}");
                return;
            }
        };
        if let Err(e) = store.set(key, &raw, self.ttl) {
            log::warn!("Cache write failed for {key}: {e}");
        }
    }

    /// Removes every cached response.
    #[must_use]
    pub fn clear(&self) -> ClearOutcome {
        let Some(store) = &self.store else {
            return ClearOutcome::Disabled;
        };
        match store.clear() {
            Ok(()) => {
                log::info!("Response cache cleared");
                ClearOutcome::Cleared
            }
            Err(e) => {
                log::warn!("Cache clear failed: {e}");
                ClearOutcome::Failed(e.to_string())
            }
        }
    }

    /// Reports backend health: `None` when disabled, otherwise whether a
    /// ping succeeded.
    #[must_use]
    pub fn healthy(&self) -> Option<bool> {
        self.store.as_ref().map(|s| match s.ping() {
            Ok(()) => true,
            Err(e) => {
                log::warn!("Cache ping failed: {e}");
                false
            }
        })
    }
}

impl std::fmt::Debug for ResponseCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResponseCache")
            .field("enabled", &self.is_enabled())
            .field("ttl", &self.ttl)
            .finish()
    }
}
