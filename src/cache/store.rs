//! TTL'd LRU storage for rendered pages.

use std::sync::RwLock;
use std::time::Instant;

use bytes::Bytes;
use lru::LruCache;
use metrics::counter;

use super::config::PageCacheConfig;
use super::keys::PageKey;
use super::lock::{rw_read, rw_write};

const SOURCE: &str = "cache::store";

/// A fully rendered response, frozen at store time.
#[derive(Debug, Clone)]
pub struct CachedPage {
    pub status: u16,
    pub headers: Vec<(String, String)>,
    pub body: Bytes,
    stored_at: Instant,
}

impl CachedPage {
    pub fn new(status: u16, headers: Vec<(String, String)>, body: Bytes) -> Self {
        Self {
            status,
            headers,
            body,
            stored_at: Instant::now(),
        }
    }

    pub fn age(&self) -> std::time::Duration {
        self.stored_at.elapsed()
    }
}

/// LRU of cached pages; entries past the TTL expire on read.
pub struct PageStore {
    entries: RwLock<LruCache<PageKey, CachedPage>>,
    ttl: std::time::Duration,
}

impl PageStore {
    pub fn new(config: &PageCacheConfig) -> Self {
        Self {
            entries: RwLock::new(LruCache::new(config.response_limit_non_zero())),
            ttl: config.ttl,
        }
    }

    pub fn get(&self, key: &PageKey) -> Option<CachedPage> {
        let mut entries = rw_write(&self.entries, SOURCE, "get");
        match entries.get(key) {
            Some(page) if page.age() < self.ttl => {
                counter!("piazza_page_cache_hit_total").increment(1);
                Some(page.clone())
            }
            Some(_) => {
                entries.pop(key);
                counter!("piazza_page_cache_expired_total").increment(1);
                counter!("piazza_page_cache_miss_total").increment(1);
                None
            }
            None => {
                counter!("piazza_page_cache_miss_total").increment(1);
                None
            }
        }
    }

    pub fn insert(&self, key: PageKey, page: CachedPage) {
        let evicted = rw_write(&self.entries, SOURCE, "insert").push(key, page);
        if evicted.is_some() {
            counter!("piazza_page_cache_evict_total").increment(1);
        }
    }

    /// Drop every entry for a path, across query variants. Returns the
    /// number of dropped entries.
    pub fn invalidate_path(&self, path: &str) -> usize {
        let mut entries = rw_write(&self.entries, SOURCE, "invalidate_path");
        let keys: Vec<PageKey> = entries
            .iter()
            .filter(|(key, _)| key.path == path)
            .map(|(key, _)| key.clone())
            .collect();

        for key in &keys {
            entries.pop(key);
        }
        keys.len()
    }

    pub fn clear(&self) {
        rw_write(&self.entries, SOURCE, "clear").clear();
    }

    pub fn len(&self) -> usize {
        rw_read(&self.entries, SOURCE, "len").len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
