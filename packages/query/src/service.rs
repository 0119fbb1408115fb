//! Cached query service over the conflict store.

use std::sync::Arc;

use conflict_map_cache::{ResponseCache, cache_key};
use conflict_map_conflict_models::sanitize::sanitize_value;
use conflict_map_conflict_models::{DatasetKind, fields};
use conflict_map_query_models::{
    CountryFilters, DEFAULT_MAX_SIZE, EventFilters, Feature, FeatureCollection, clamp_size,
};
use conflict_map_store::{ConflictStore, Filter, SearchRequest};
use serde_json::{Map, Value};

use crate::QueryError;
use crate::aggregate::aggregate_country_features;
use crate::points::point_features;

/// Answers the two feature queries, consulting the response cache first.
pub struct QueryService {
    store: Arc<dyn ConflictStore>,
    cache: ResponseCache,
    max_size: usize,
    events_index: String,
    countries_index: String,
}

impl QueryService {
    /// Creates a service using the default index names and size clamp.
    #[must_use]
    pub fn new(store: Arc<dyn ConflictStore>, cache: ResponseCache) -> Self {
        Self {
            store,
            cache,
            max_size: DEFAULT_MAX_SIZE,
            events_index: DatasetKind::Events.default_index().to_string(),
            countries_index: DatasetKind::Countries.default_index().to_string(),
        }
    }

    /// Sets the upper clamp for result-size caps.
    #[must_use]
    pub const fn with_max_size(mut self, max_size: usize) -> Self {
        self.max_size = max_size;
        self
    }

    /// Overrides the index names.
    #[must_use]
    pub fn with_indexes(mut self, events: impl Into<String>, countries: impl Into<String>) -> Self {
        self.events_index = events.into();
        self.countries_index = countries.into();
        self
    }

    /// The underlying store.
    #[must_use]
    pub fn store(&self) -> &Arc<dyn ConflictStore> {
        &self.store
    }

    /// The response cache.
    #[must_use]
    pub const fn cache(&self) -> &ResponseCache {
        &self.cache
    }

    /// Returns one point feature per event matching the year and filters.
    ///
    /// # Errors
    ///
    /// Returns [`QueryError::Store`] if the store query fails.
    pub async fn fetch_event_features(
        &self,
        year: i64,
        size: usize,
        filters: &EventFilters,
    ) -> Result<FeatureCollection, QueryError> {
        self.fetch(
            &self.events_index,
            year,
            size,
            filters.store_filters(),
            filters.cache_fields(),
            point_features,
        )
        .await
    }

    /// Returns one aggregated feature per country matching the year and
    /// filters.
    ///
    /// # Errors
    ///
    /// Returns [`QueryError::Store`] if the store query fails.
    pub async fn fetch_country_features(
        &self,
        year: i64,
        size: usize,
        filters: &CountryFilters,
    ) -> Result<FeatureCollection, QueryError> {
        self.fetch(
            &self.countries_index,
            year,
            size,
            filters.store_filters(),
            filters.cache_fields(),
            aggregate_country_features,
        )
        .await
    }

    async fn fetch(
        &self,
        index: &str,
        year: i64,
        size: usize,
        filters: Vec<Filter>,
        cache_fields: Vec<(&'static str, Value)>,
        build: fn(Vec<Map<String, Value>>) -> Vec<Feature>,
    ) -> Result<FeatureCollection, QueryError> {
        let size = clamp_size(size, self.max_size);
        let key = cache_key(index, year, size, cache_fields);

        if let Some(cached) = self.cache.get_json(&key) {
            match serde_json::from_value::<FeatureCollection>(cached) {
                Ok(collection) => return Ok(collection),
                Err(e) => log::warn!("Ignoring malformed cached response {key}: {e}"),
            }
        }

        let mut request = SearchRequest::new(index, size).filter(Filter::term(fields::YEAR, year));
        request.filters.extend(filters);

        let rows = self
            .store
            .search(&request)
            .await?
            .into_iter()
            .map(sanitize_row)
            .collect();

        let collection = FeatureCollection::new(build(rows));
        log::debug!(
            "{index} year={year} size={size}: {} features",
            collection.features.len()
        );

        match serde_json::to_value(&collection) {
            Ok(value) => self.cache.set_json(&key, &value),
            Err(e) => log::warn!("Failed to encode response for caching: {e}"),
        }

        Ok(collection)
    }
}

fn sanitize_row(row: Map<String, Value>) -> Map<String, Value> {
    row.into_iter().map(|(k, v)| (k, sanitize_value(v))).collect()
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    use async_trait::async_trait;
    use conflict_map_cache::memory::MemoryCache;
    use conflict_map_store::memory::MemoryStore;
    use conflict_map_store::{BulkReport, IndexDocument, StoreError};
    use serde_json::json;

    use super::*;

    fn doc(value: Value) -> Map<String, Value> {
        value.as_object().unwrap().clone()
    }

    fn square() -> Value {
        json!({"type": "Polygon", "coordinates": [[[0,0],[1,0],[1,1],[0,1],[0,0]]]})
    }

    fn seeded_store() -> Arc<MemoryStore> {
        let store = MemoryStore::new();
        store.insert_all(
            "conflicts",
            vec![
                doc(json!({"id": 1, "year": 2020, "region": "Africa", "best": 5,
                           "latitude": 1.0, "longitude": 2.0, "side_b": "nan"})),
                doc(json!({"id": 2, "year": 2020, "region": "Africa", "best": 50,
                           "latitude": 3.0, "longitude": 4.0})),
                doc(json!({"id": 3, "year": 2021, "region": "Africa", "best": 50})),
            ],
        );
        store.insert_all(
            "conflict_countries",
            vec![
                doc(json!({"conflict_id": 10, "year": 2020, "country_name": "Mali",
                           "intensity_level": 1, "geometry": square()})),
                doc(json!({"conflict_id": 11, "year": 2020, "country_name": "Mali",
                           "intensity_level": 2, "geometry": square()})),
                doc(json!({"conflict_id": 12, "year": 2020, "country_name": "Chad",
                           "intensity_level": 1, "geometry": square()})),
            ],
        );
        Arc::new(store)
    }

    #[tokio::test]
    async fn fetches_event_points_for_year() {
        let service = QueryService::new(seeded_store(), ResponseCache::disabled());
        let fc = service
            .fetch_event_features(2020, 100, &EventFilters::default())
            .await
            .unwrap();
        assert_eq!(fc.features.len(), 2);
        assert_eq!(fc.features[0].geometry["type"], "Point");
        assert_eq!(fc.features[0].properties["side_b"], Value::Null);
    }

    #[tokio::test]
    async fn applies_min_best_filter() {
        let service = QueryService::new(seeded_store(), ResponseCache::disabled());
        let filters = EventFilters {
            min_best: Some(10),
            ..EventFilters::default()
        };
        let fc = service.fetch_event_features(2020, 100, &filters).await.unwrap();
        assert_eq!(fc.features.len(), 1);
        assert_eq!(fc.features[0].properties["id"], 2);
    }

    #[tokio::test]
    async fn aggregates_countries() {
        let service = QueryService::new(seeded_store(), ResponseCache::disabled());
        let fc = service
            .fetch_country_features(2020, 100, &CountryFilters::default())
            .await
            .unwrap();
        assert_eq!(fc.features.len(), 2);
        let mali = &fc.features[0].properties;
        assert_eq!(mali["country_name"], "Mali");
        assert_eq!(mali["conflicts_count"], 2);
        assert_eq!(mali["intensity_level_max"], 2);
        assert_eq!(mali["conflict_ids"], json!([10, 11]));
    }

    #[tokio::test]
    async fn size_is_clamped() {
        let service =
            QueryService::new(seeded_store(), ResponseCache::disabled()).with_max_size(1);
        let fc = service
            .fetch_event_features(2020, 100, &EventFilters::default())
            .await
            .unwrap();
        assert_eq!(fc.features.len(), 1);

        let fc = service
            .fetch_event_features(2020, 0, &EventFilters::default())
            .await
            .unwrap();
        assert_eq!(fc.features.len(), 1);
    }

    struct CountingStore {
        inner: Arc<MemoryStore>,
        searches: AtomicUsize,
    }

    #[async_trait]
    impl ConflictStore for CountingStore {
        fn endpoint(&self) -> &str {
            "counting"
        }
        async fn search(
            &self,
            request: &SearchRequest,
        ) -> Result<Vec<Map<String, Value>>, StoreError> {
            self.searches.fetch_add(1, Ordering::SeqCst);
            self.inner.search(request).await
        }
        async fn ensure_index(&self, index: &str, mapping: &Value) -> Result<bool, StoreError> {
            self.inner.ensure_index(index, mapping).await
        }
        async fn bulk_index(
            &self,
            index: &str,
            documents: &[IndexDocument],
        ) -> Result<BulkReport, StoreError> {
            self.inner.bulk_index(index, documents).await
        }
        async fn info(&self) -> Result<Value, StoreError> {
            self.inner.info().await
        }
    }

    #[tokio::test]
    async fn second_identical_query_is_served_from_cache() {
        let store = Arc::new(CountingStore {
            inner: seeded_store(),
            searches: AtomicUsize::new(0),
        });
        let cache = ResponseCache::new(Arc::new(MemoryCache::new()), Duration::from_secs(60));
        let service = QueryService::new(store.clone(), cache);

        let first = service
            .fetch_country_features(2020, 100, &CountryFilters::default())
            .await
            .unwrap();
        let second = service
            .fetch_country_features(2020, 100, &CountryFilters::default())
            .await
            .unwrap();

        assert_eq!(first, second);
        assert_eq!(store.searches.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn store_failure_surfaces() {
        let service = QueryService::new(Arc::new(MemoryStore::new()), ResponseCache::disabled());
        let err = service
            .fetch_event_features(2020, 10, &EventFilters::default())
            .await
            .unwrap_err();
        assert!(matches!(err, QueryError::Store(_)));
    }
}
