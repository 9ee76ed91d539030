//! Cache key definitions.

use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};

/// Identifies one cached rendering of a route: the path plus a hash of the
/// query string, so every pagination variant gets its own entry.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PageKey {
    pub path: String,
    pub query_hash: u64,
}

impl PageKey {
    pub fn new(path: impl Into<String>, query: &str) -> Self {
        Self {
            path: path.into(),
            query_hash: hash_query(query),
        }
    }
}

/// Hash a query string for key generation.
pub fn hash_query(query: &str) -> u64 {
    let mut hasher = DefaultHasher::new();
    query.hash(&mut hasher);
    hasher.finish()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn same_route_and_query_produce_equal_keys() {
        assert_eq!(PageKey::new("/", "page=2"), PageKey::new("/", "page=2"));
    }

    #[test]
    fn different_queries_produce_different_keys() {
        assert_ne!(PageKey::new("/", "page=1"), PageKey::new("/", "page=2"));
    }

    #[test]
    fn different_paths_produce_different_keys() {
        assert_ne!(PageKey::new("/", ""), PageKey::new("/follow", ""));
    }
}
