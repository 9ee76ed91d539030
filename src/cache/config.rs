//! Page cache configuration.

use std::num::NonZeroUsize;
use std::time::Duration;

const DEFAULT_TTL_SECONDS: u64 = 20;
const DEFAULT_RESPONSE_LIMIT: usize = 64;

#[derive(Debug, Clone)]
pub struct PageCacheConfig {
    /// Serve fronted routes from the cache at all.
    pub enabled: bool,
    /// How long a cached page stays servable.
    pub ttl: Duration,
    /// Maximum cached responses before LRU eviction.
    pub response_limit: usize,
    /// Also front the follow feed route.
    pub front_follow_feed: bool,
    /// Invalidate the follow feed entry on content mutations; off preserves
    /// the stale-until-expiry behavior.
    pub invalidate_follow_feed_on_write: bool,
}

impl Default for PageCacheConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            ttl: Duration::from_secs(DEFAULT_TTL_SECONDS),
            response_limit: DEFAULT_RESPONSE_LIMIT,
            front_follow_feed: false,
            invalidate_follow_feed_on_write: false,
        }
    }
}

impl From<&crate::config::CacheSettings> for PageCacheConfig {
    fn from(settings: &crate::config::CacheSettings) -> Self {
        Self {
            enabled: settings.enabled,
            ttl: settings.ttl,
            response_limit: settings.response_limit,
            front_follow_feed: settings.front_follow_feed,
            invalidate_follow_feed_on_write: settings.invalidate_follow_feed_on_write,
        }
    }
}

impl PageCacheConfig {
    /// Response limit as NonZeroUsize, clamping to 1 if zero.
    pub fn response_limit_non_zero(&self) -> NonZeroUsize {
        NonZeroUsize::new(self.response_limit).unwrap_or(NonZeroUsize::MIN)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_values() {
        let config = PageCacheConfig::default();
        assert!(config.enabled);
        assert_eq!(config.ttl, Duration::from_secs(20));
        assert_eq!(config.response_limit, 64);
        assert!(!config.front_follow_feed);
        assert!(!config.invalidate_follow_feed_on_write);
    }

    #[test]
    fn non_zero_clamps_to_min() {
        let config = PageCacheConfig {
            response_limit: 0,
            ..Default::default()
        };
        assert_eq!(config.response_limit_non_zero().get(), 1);
    }
}
