//! Time-boxed page cache for rendered responses.
//!
//! An explicit service object fronts the feed routes with fully rendered
//! output. Entries live for a fixed TTL; content-mutating operations
//! invalidate the fronted routes through [`PageCache::invalidate_after_write`],
//! and the follow feed's staleness tradeoff is controlled by configuration.

mod config;
mod keys;
mod lock;
mod middleware;
mod store;

pub use config::PageCacheConfig;
pub use keys::{PageKey, hash_query};
pub use middleware::page_cache_layer;
pub use store::{CachedPage, PageStore};

use std::sync::Arc;

use tracing::debug;

pub const INDEX_ROUTE: &str = "/";
pub const FOLLOW_FEED_ROUTE: &str = "/follow";

/// Cache service injected into the router and the mutating services.
pub struct PageCache {
    config: PageCacheConfig,
    store: PageStore,
}

impl PageCache {
    pub fn new(config: PageCacheConfig) -> Self {
        let store = PageStore::new(&config);
        Self { config, store }
    }

    /// Build the shared cache when enabled in settings.
    pub fn from_config(config: PageCacheConfig) -> Option<Arc<Self>> {
        config.enabled.then(|| Arc::new(Self::new(config)))
    }

    pub fn config(&self) -> &PageCacheConfig {
        &self.config
    }

    /// Whether responses for this path are served from and written to the
    /// cache.
    pub fn fronts_path(&self, path: &str) -> bool {
        path == INDEX_ROUTE || (self.config.front_follow_feed && path == FOLLOW_FEED_ROUTE)
    }

    pub fn lookup(&self, key: &PageKey) -> Option<CachedPage> {
        self.store.get(key)
    }

    pub fn insert(&self, key: PageKey, page: CachedPage) {
        self.store.insert(key, page);
    }

    /// Drop every cached query variant of one route.
    pub fn invalidate_route(&self, path: &str) {
        let dropped = self.store.invalidate_path(path);
        if dropped > 0 {
            debug!(
                target = "piazza::cache",
                path,
                dropped,
                "route invalidated"
            );
        }
    }

    /// Invalidation hook for content mutations. The index feed is always
    /// refreshed; the follow feed only when configured, preserving the
    /// original stale-read behavior otherwise.
    pub fn invalidate_after_write(&self) {
        self.invalidate_route(INDEX_ROUTE);
        if self.config.front_follow_feed && self.config.invalidate_follow_feed_on_write {
            self.invalidate_route(FOLLOW_FEED_ROUTE);
        }
    }

    /// Empty the cache entirely.
    pub fn clear(&self) {
        self.store.clear();
    }

    pub fn len(&self) -> usize {
        self.store.len()
    }

    pub fn is_empty(&self) -> bool {
        self.store.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bytes::Bytes;

    fn html_page(body: &str) -> CachedPage {
        CachedPage::new(
            200,
            vec![("content-type".to_string(), "text/html".to_string())],
            Bytes::copy_from_slice(body.as_bytes()),
        )
    }

    #[test]
    fn fronts_index_but_not_detail_routes() {
        let cache = PageCache::new(PageCacheConfig::default());
        assert!(cache.fronts_path("/"));
        assert!(!cache.fronts_path("/posts/abc"));
        assert!(!cache.fronts_path("/follow"));
    }

    #[test]
    fn follow_feed_fronting_is_configurable() {
        let cache = PageCache::new(PageCacheConfig {
            front_follow_feed: true,
            ..Default::default()
        });
        assert!(cache.fronts_path("/follow"));
    }

    #[test]
    fn write_invalidation_spares_follow_feed_by_default() {
        let cache = PageCache::new(PageCacheConfig {
            front_follow_feed: true,
            ..Default::default()
        });

        cache.insert(PageKey::new("/", ""), html_page("index"));
        cache.insert(PageKey::new("/follow", ""), html_page("follow"));

        cache.invalidate_after_write();

        assert!(cache.lookup(&PageKey::new("/", "")).is_none());
        assert!(cache.lookup(&PageKey::new("/follow", "")).is_some());
    }

    #[test]
    fn write_invalidation_covers_follow_feed_when_opted_in() {
        let cache = PageCache::new(PageCacheConfig {
            front_follow_feed: true,
            invalidate_follow_feed_on_write: true,
            ..Default::default()
        });

        cache.insert(PageKey::new("/follow", ""), html_page("follow"));
        cache.invalidate_after_write();
        assert!(cache.lookup(&PageKey::new("/follow", "")).is_none());
    }

    #[test]
    fn route_invalidation_drops_all_query_variants() {
        let cache = PageCache::new(PageCacheConfig::default());
        cache.insert(PageKey::new("/", ""), html_page("page 1"));
        cache.insert(PageKey::new("/", "page=2"), html_page("page 2"));
        cache.insert(PageKey::new("/follow", ""), html_page("follow"));

        cache.invalidate_route("/");

        assert!(cache.lookup(&PageKey::new("/", "")).is_none());
        assert!(cache.lookup(&PageKey::new("/", "page=2")).is_none());
        assert!(cache.lookup(&PageKey::new("/follow", "")).is_some());
    }

    #[test]
    fn disabled_config_builds_no_cache() {
        assert!(
            PageCache::from_config(PageCacheConfig {
                enabled: false,
                ..Default::default()
            })
            .is_none()
        );
    }
}
