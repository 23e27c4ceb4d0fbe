//! Process-lifetime artwork cache keyed by file path
//!
//! Unbounded unless a capacity is given, in which case the least recently
//! used entries are evicted. Empty content is never stored.

use bytes::Bytes;
use lru::LruCache;
use std::num::NonZeroUsize;
use tokio::sync::Mutex;
use tracing::trace;

pub struct ArtworkCache {
    entries: Mutex<LruCache<String, Bytes>>,
}

impl ArtworkCache {
    pub fn new() -> Self {
        Self {
            entries: Mutex::new(LruCache::unbounded()),
        }
    }

    /// Bounded cache; a capacity of zero means unbounded
    pub fn with_capacity(capacity: usize) -> Self {
        match NonZeroUsize::new(capacity) {
            Some(capacity) => Self {
                entries: Mutex::new(LruCache::new(capacity)),
            },
            None => Self::new(),
        }
    }

    pub async fn get(&self, key: &str) -> Option<Bytes> {
        let mut entries = self.entries.lock().await;
        entries.get(key).cloned()
    }

    pub async fn set(&self, key: &str, value: Bytes) {
        if value.is_empty() {
            return;
        }
        let mut entries = self.entries.lock().await;
        entries.put(key.to_string(), value);
    }

    /// Store `value` unless the key already has content; returns whichever
    /// value the cache holds afterwards
    pub async fn set_if_absent(&self, key: &str, value: Bytes) -> Bytes {
        let mut entries = self.entries.lock().await;
        if let Some(existing) = entries.get(key) {
            trace!(key, "Artwork already cached");
            return existing.clone();
        }
        if !value.is_empty() {
            entries.put(key.to_string(), value.clone());
        }
        value
    }

    pub async fn clear(&self) {
        self.entries.lock().await.clear();
    }

    pub async fn len(&self) -> usize {
        self.entries.lock().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.entries.lock().await.is_empty()
    }
}

impl Default for ArtworkCache {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_set_and_get() {
        let cache = ArtworkCache::new();
        assert!(cache.get("/a.mp3").await.is_none());

        cache.set("/a.mp3", Bytes::from_static(b"img")).await;
        assert_eq!(cache.get("/a.mp3").await.unwrap(), Bytes::from_static(b"img"));
        assert_eq!(cache.len().await, 1);
    }

    #[tokio::test]
    async fn test_empty_content_is_not_stored() {
        let cache = ArtworkCache::new();
        cache.set("/a.mp3", Bytes::new()).await;
        assert!(cache.is_empty().await);

        let kept = cache.set_if_absent("/a.mp3", Bytes::new()).await;
        assert!(kept.is_empty());
        assert!(cache.is_empty().await);
    }

    #[tokio::test]
    async fn test_set_if_absent_keeps_first_value() {
        let cache = ArtworkCache::new();
        let first = cache.set_if_absent("/a.mp3", Bytes::from_static(b"one")).await;
        let second = cache.set_if_absent("/a.mp3", Bytes::from_static(b"two")).await;

        assert_eq!(first, Bytes::from_static(b"one"));
        assert_eq!(second, Bytes::from_static(b"one"));
    }

    #[tokio::test]
    async fn test_capacity_evicts_least_recently_used() {
        let cache = ArtworkCache::with_capacity(2);
        cache.set("a", Bytes::from_static(b"1")).await;
        cache.set("b", Bytes::from_static(b"2")).await;
        cache.get("a").await;
        cache.set("c", Bytes::from_static(b"3")).await;

        assert!(cache.get("a").await.is_some());
        assert!(cache.get("b").await.is_none());
        assert!(cache.get("c").await.is_some());
    }

    #[tokio::test]
    async fn test_clear() {
        let cache = ArtworkCache::with_capacity(0);
        cache.set("a", Bytes::from_static(b"1")).await;
        cache.clear().await;
        assert_eq!(cache.len().await, 0);
    }
}
