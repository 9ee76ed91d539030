//! Poison-tolerant lock helpers.
//!
//! A panicking request must not take the cache down with it; a poisoned
//! guard is recovered and the incident logged.

use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use tracing::warn;

pub(crate) fn rw_read<'a, T>(
    lock: &'a RwLock<T>,
    source: &'static str,
    operation: &'static str,
) -> RwLockReadGuard<'a, T> {
    match lock.read() {
        Ok(guard) => guard,
        Err(poisoned) => {
            warn!(
                target = "piazza::cache",
                source, operation, "recovered poisoned read lock"
            );
            poisoned.into_inner()
        }
    }
}

pub(crate) fn rw_write<'a, T>(
    lock: &'a RwLock<T>,
    source: &'static str,
    operation: &'static str,
) -> RwLockWriteGuard<'a, T> {
    match lock.write() {
        Ok(guard) => guard,
        Err(poisoned) => {
            warn!(
                target = "piazza::cache",
                source, operation, "recovered poisoned write lock"
            );
            poisoned.into_inner()
        }
    }
}
