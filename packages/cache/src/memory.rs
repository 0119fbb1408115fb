//! In-process TTL cache backend.

use std::collections::BTreeMap;
use std::sync::Mutex;
use std::time::{Duration, Instant};

use crate::{CacheError, CacheStore};

/// A [`CacheStore`] holding entries in a process-local map.
///
/// Expired entries are evicted when read and purged on every write.
#[derive(Default)]
pub struct MemoryCache {
    entries: Mutex<BTreeMap<String, (String, Instant)>>,
}

impl MemoryCache {
    /// Creates an empty cache.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(
        &self,
    ) -> Result<std::sync::MutexGuard<'_, BTreeMap<String, (String, Instant)>>, CacheError> {
        self.entries
            .lock()
            .map_err(|_| CacheError::Unavailable("memory cache lock poisoned".to_string()))
    }
}

impl CacheStore for MemoryCache {
    fn get(&self, key: &str) -> Result<Option<String>, CacheError> {
        let mut entries = self.lock()?;
        match entries.get(key) {
            Some((value, expires)) if *expires > Instant::now() => Ok(Some(value.clone())),
            Some(_) => {
                entries.remove(key);
                Ok(None)
            }
            None => Ok(None),
        }
    }

    fn set(&self, key: &str, value: &str, ttl: Duration) -> Result<(), CacheError> {
        let now = Instant::now();
        let mut entries = self.lock()?;
        entries.retain(|_, (_, expires)| *expires > now);
        entries.insert(key.to_string(), (value.to_string(), now + ttl));
        Ok(())
    }

    fn clear(&self) -> Result<(), CacheError> {
        self.lock()?.clear();
        Ok(())
    }

    fn ping(&self) -> Result<(), CacheError> {
        self.lock().map(|_| ())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stores_and_expires_entries() {
        let cache = MemoryCache::new();
        cache.set("a", "1", Duration::from_secs(60)).unwrap();
        cache.set("b", "2", Duration::ZERO).unwrap();

        assert_eq!(cache.get("a").unwrap().as_deref(), Some("1"));
        assert_eq!(cache.get("b").unwrap(), None);
        assert_eq!(cache.get("missing").unwrap(), None);
    }

    #[test]
    fn writes_purge_expired_entries() {
        let cache = MemoryCache::new();
        for i in 0..1000 {
            cache.set(&format!("stale-{i}"), "x", Duration::ZERO).unwrap();
        }
        cache.set("live", "1", Duration::from_secs(60)).unwrap();

        let entries = cache.entries.lock().unwrap();
        assert_eq!(entries.len(), 1);
        assert!(entries.contains_key("live"));
    }

    #[test]
    fn clear_removes_everything() {
        let cache = MemoryCache::new();
        cache.set("a", "1", Duration::from_secs(60)).unwrap();
        cache.clear().unwrap();
        assert_eq!(cache.get("a").unwrap(), None);
        assert!(cache.ping().is_ok());
    }
}
