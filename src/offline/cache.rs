//! Named, versioned response caches.

use std::sync::Arc;

use axum::body::Bytes;
use dashmap::DashMap;

/// Stored copy of a fetched asset.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CachedResponse {
    pub status: u16,
    pub content_type: Option<String>,
    pub body: Bytes,
}

impl CachedResponse {
    /// Status in the 2xx range.
    pub fn is_ok(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// One cache namespace, keyed by request URL.
#[derive(Debug, Default)]
pub struct Cache {
    entries: DashMap<String, CachedResponse>,
}

impl Cache {
    pub fn get(&self, url: &str) -> Option<CachedResponse> {
        self.entries.get(url).map(|entry| entry.value().clone())
    }

    pub fn put(&self, url: impl Into<String>, response: CachedResponse) {
        self.entries.insert(url.into(), response);
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Every cache namespace known to the process.
#[derive(Debug, Default)]
pub struct CacheStorage {
    caches: DashMap<String, Arc<Cache>>,
}

impl CacheStorage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Open a namespace, creating it when missing.
    pub fn open(&self, name: &str) -> Arc<Cache> {
        self.caches
            .entry(name.to_owned())
            .or_insert_with(|| Arc::new(Cache::default()))
            .value()
            .clone()
    }

    pub fn keys(&self) -> Vec<String> {
        self.caches.iter().map(|entry| entry.key().clone()).collect()
    }

    /// Drop a namespace, returning whether it existed.
    pub fn delete(&self, name: &str) -> bool {
        self.caches.remove(name).is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn open_returns_the_same_namespace() {
        let storage = CacheStorage::new();
        storage.open("game-night-v1").put(
            "/index.html",
            CachedResponse {
                status: 200,
                content_type: Some("text/html".into()),
                body: Bytes::from_static(b"<html>"),
            },
        );

        let cache = storage.open("game-night-v1");
        assert_eq!(cache.len(), 1);
        assert!(cache.get("/index.html").unwrap().is_ok());
        assert!(storage.delete("game-night-v1"));
        assert!(storage.keys().is_empty());
    }
}
