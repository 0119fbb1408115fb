#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Search-index store client for the conflict datasets.
//!
//! The query layer only ever issues conjunctive term and lower-bounded
//! range filters with a result-size cap, so the [`ConflictStore`] trait
//! exposes exactly that, plus the index creation and bulk loading needed
//! to populate the indexes from the ETL output. [`elastic::ElasticStore`]
//! talks to Elasticsearch over its REST API; [`memory::MemoryStore`] keeps
//! documents in process.

pub mod documents;
pub mod elastic;
pub mod mapping;
pub mod memory;
pub mod query;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

pub use query::{Filter, SearchRequest};

/// Errors that can occur during store operations.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// HTTP request failed (connection, timeout, or body decoding).
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// JSON parsing failed.
    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),

    /// The store answered with a non-success status.
    #[error("Store returned HTTP {status}: {body}")]
    Status {
        /// HTTP status code.
        status: u16,
        /// Response body, truncated for logging.
        body: String,
    },

    /// The store answered with an unexpected response shape.
    #[error("Unexpected store response: {message}")]
    Response {
        /// Description of what went wrong.
        message: String,
    },
}

/// A document to be indexed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndexDocument {
    /// Document id. `None` lets the store assign one.
    pub id: Option<String>,
    /// Document body: business attributes plus a `geometry` field.
    pub source: Map<String, Value>,
}

/// Outcome of a bulk indexing run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BulkReport {
    /// Documents the store accepted.
    pub succeeded: u64,
    /// Documents the store rejected or that could not be sent.
    pub failed: u64,
}

impl BulkReport {
    /// Adds another report's counts to this one.
    pub const fn merge(&mut self, other: Self) {
        self.succeeded += other.succeeded;
        self.failed += other.failed;
    }

    /// Total documents attempted.
    #[must_use]
    pub const fn total(&self) -> u64 {
        self.succeeded + self.failed
    }
}

/// A store holding the indexed conflict datasets.
///
/// Implementations must bound every request in time; the query layer does
/// not add its own timeouts.
#[async_trait]
pub trait ConflictStore: Send + Sync {
    /// Human-readable endpoint description (for health reporting).
    fn endpoint(&self) -> &str;

    /// Runs a filtered search and returns the matching document bodies in
    /// store order.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] if the store is unreachable or rejects the
    /// query.
    async fn search(&self, request: &SearchRequest) -> Result<Vec<Map<String, Value>>, StoreError>;

    /// Creates `index` with the given mapping document if it does not
    /// exist yet. Returns `true` if the index was created.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] if the existence check or creation fails.
    async fn ensure_index(&self, index: &str, mapping: &Value) -> Result<bool, StoreError>;

    /// Indexes documents. Individual document failures are counted in the
    /// returned report and do not abort the remaining documents.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] only for failures that prevent reporting at
    /// all.
    async fn bulk_index(
        &self,
        index: &str,
        documents: &[IndexDocument],
    ) -> Result<BulkReport, StoreError>;

    /// Returns store cluster information.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] if the store is unreachable.
    async fn info(&self) -> Result<Value, StoreError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bulk_reports_merge() {
        let mut report = BulkReport {
            succeeded: 3,
            failed: 1,
        };
        report.merge(BulkReport {
            succeeded: 2,
            failed: 4,
        });
        assert_eq!(report.succeeded, 5);
        assert_eq!(report.failed, 5);
        assert_eq!(report.total(), 10);
    }
}
