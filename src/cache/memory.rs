//! In-process LRU cache

use lru::LruCache;
use std::num::NonZeroUsize;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::SystemTime;

use super::{CacheBackend, CacheItem};
use crate::error::Result;
use crate::model::DigitalObject;

/// Default number of objects kept
pub const DEFAULT_CAPACITY: usize = 256;

pub struct MemoryCache {
    entries: Mutex<LruCache<String, CacheItem>>,
}

impl Default for MemoryCache {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}

impl MemoryCache {
    pub fn new(capacity: usize) -> Self {
        let capacity = NonZeroUsize::new(capacity).unwrap_or(NonZeroUsize::MIN);
        MemoryCache {
            entries: Mutex::new(LruCache::new(capacity)),
        }
    }

    pub fn len(&self) -> usize {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl CacheBackend for MemoryCache {
    fn get(&self, key: &str) -> Result<Option<CacheItem>> {
        let mut entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
        let Some(item) = entries.get(key).cloned() else {
            return Ok(None);
        };
        if item.is_expired(SystemTime::now()) {
            entries.pop(key);
            return Ok(None);
        }
        Ok(Some(item))
    }

    fn set(&self, key: &str, data: Arc<DigitalObject>, expires: SystemTime) -> Result<()> {
        let mut entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
        entries.put(key.to_string(), CacheItem { data, expires });
        Ok(())
    }
}
