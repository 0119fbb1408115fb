//! Elasticsearch REST client.
//!
//! Only the handful of endpoints the conflict datasets need are used:
//! `_search`, index existence/creation, `_bulk`, and the root info
//! endpoint. Every request is bounded by the client timeout.

use std::fmt::Write as _;
use std::time::Duration;

use async_trait::async_trait;
use serde_json::{Map, Value, json};

use crate::{BulkReport, ConflictStore, IndexDocument, SearchRequest, StoreError};

/// Number of documents sent per `_bulk` request.
pub const BULK_CHUNK_SIZE: usize = 500;

const MAX_ERROR_BODY: usize = 500;

/// A [`ConflictStore`] backed by an Elasticsearch cluster.
pub struct ElasticStore {
    client: reqwest::Client,
    base_url: String,
}

impl ElasticStore {
    /// Creates a client for the cluster at `base_url`.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Http`] if the HTTP client cannot be built.
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, StoreError> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    async fn check(response: reqwest::Response) -> Result<Value, StoreError> {
        let status = response.status();
        let text = response.text().await?;
        if !status.is_success() {
            return Err(StoreError::Status {
                status: status.as_u16(),
                body: truncate(&text, MAX_ERROR_BODY),
            });
        }
        Ok(serde_json::from_str(&text)?)
    }

    async fn send_bulk_chunk(
        &self,
        index: &str,
        chunk: &[IndexDocument],
    ) -> Result<BulkReport, StoreError> {
        let body = bulk_body(index, chunk)?;
        let response = self
            .client
            .post(self.url("_bulk"))
            .header("Content-Type", "application/x-ndjson")
            .body(body)
            .send()
            .await?;
        let value = Self::check(response).await?;
        parse_bulk_response(&value)
    }
}

#[async_trait]
impl ConflictStore for ElasticStore {
    fn endpoint(&self) -> &str {
        &self.base_url
    }

    async fn search(&self, request: &SearchRequest) -> Result<Vec<Map<String, Value>>, StoreError> {
        log::debug!("Searching {} with {}", request.index, request.to_body());
        let response = self
            .client
            .post(self.url(&format!("{}/_search", request.index)))
            .json(&request.to_body())
            .send()
            .await?;
        let value = Self::check(response).await?;
        extract_hits(&value)
    }

    async fn ensure_index(&self, index: &str, mapping: &Value) -> Result<bool, StoreError> {
        let head = self.client.head(self.url(index)).send().await?;
        if head.status().is_success() {
            log::debug!("Index {index} already exists");
            return Ok(false);
        }
        if head.status() != reqwest::StatusCode::NOT_FOUND {
            return Err(StoreError::Status {
                status: head.status().as_u16(),
                body: format!("unexpected status checking index {index}"),
            });
        }

        let response = self.client.put(self.url(index)).json(mapping).send().await?;
        Self::check(response).await?;
        log::info!("Created index {index}");
        Ok(true)
    }

    async fn bulk_index(
        &self,
        index: &str,
        documents: &[IndexDocument],
    ) -> Result<BulkReport, StoreError> {
        let mut report = BulkReport::default();

        for (i, chunk) in documents.chunks(BULK_CHUNK_SIZE).enumerate() {
            match self.send_bulk_chunk(index, chunk).await {
                Ok(chunk_report) => {
                    if chunk_report.failed > 0 {
                        log::warn!(
                            "Bulk chunk {i} into {index}: {} of {} documents rejected",
                            chunk_report.failed,
                            chunk.len()
                        );
                    }
                    report.merge(chunk_report);
                }
                Err(e) => {
                    log::warn!("Bulk chunk {i} into {index} failed: {e}");
                    report.failed += chunk.len() as u64;
                }
            }
        }

        Ok(report)
    }

    async fn info(&self) -> Result<Value, StoreError> {
        let response = self.client.get(self.url("")).send().await?;
        Self::check(response).await
    }
}

/// Builds the NDJSON body for a `_bulk` request.
///
/// # Errors
///
/// Returns [`StoreError::Json`] if a document fails to serialize.
pub fn bulk_body(index: &str, documents: &[IndexDocument]) -> Result<String, StoreError> {
    let mut body = String::new();
    for doc in documents {
        let action = doc.id.as_ref().map_or_else(
            || json!({ "index": { "_index": index } }),
            |id| json!({ "index": { "_index": index, "_id": id } }),
        );
        let _ = writeln!(body, "{}", serde_json::to_string(&action)?);
        let _ = writeln!(body, "{}", serde_json::to_string(&doc.source)?);
    }
    Ok(body)
}

/// Extracts `_source` bodies from a search response, in hit order.
///
/// # Errors
///
/// Returns [`StoreError::Response`] if `hits.hits` is missing.
pub fn extract_hits(response: &Value) -> Result<Vec<Map<String, Value>>, StoreError> {
    let hits = response
        .get("hits")
        .and_then(|h| h.get("hits"))
        .and_then(Value::as_array)
        .ok_or_else(|| StoreError::Response {
            message: "search response has no hits.hits array".to_string(),
        })?;

    Ok(hits
        .iter()
        .filter_map(|hit| hit.get("_source").and_then(Value::as_object).cloned())
        .collect())
}

/// Counts accepted and rejected documents in a `_bulk` response.
///
/// # Errors
///
/// Returns [`StoreError::Response`] if `items` is missing.
pub fn parse_bulk_response(response: &Value) -> Result<BulkReport, StoreError> {
    let items = response
        .get("items")
        .and_then(Value::as_array)
        .ok_or_else(|| StoreError::Response {
            message: "bulk response has no items array".to_string(),
        })?;

    let mut report = BulkReport::default();
    for item in items {
        let result = item
            .as_object()
            .and_then(|obj| obj.values().next())
            .cloned()
            .unwrap_or(Value::Null);
        let status = result.get("status").and_then(Value::as_u64).unwrap_or(0);
        if result.get("error").is_some() || !(200..300).contains(&status) {
            let (id, reason) = describe_failure(&result, status);
            log::warn!("Failed to index document {id}: {reason}");
            report.failed += 1;
        } else {
            report.succeeded += 1;
        }
    }
    Ok(report)
}

/// Document id and failure reason of a rejected bulk item.
fn describe_failure(result: &Value, status: u64) -> (String, String) {
    let id = result.get("_id").map_or_else(
        || "<unknown>".to_string(),
        |v| v.as_str().map_or_else(|| v.to_string(), str::to_string),
    );
    let reason = result.get("error").map_or_else(
        || format!("HTTP {status}"),
        |e| {
            e.get("reason")
                .and_then(Value::as_str)
                .map_or_else(|| e.to_string(), str::to_string)
        },
    );
    (id, reason)
}

fn truncate(text: &str, max: usize) -> String {
    if text.len() <= max {
        return text.to_string();
    }
    let mut end = max;
    while !text.is_char_boundary(end) {
        end -= 1;
    }
    format!("{}...", &text[..end])
}
