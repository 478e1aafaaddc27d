//! Parsed-object caches
//!
//! Entries are keyed by target path and carry an absolute expiry; the
//! orchestrator slides the expiry forward on every hit.

pub mod file;
pub mod memory;

pub use file::FileCache;
pub use memory::MemoryCache;

use std::sync::Arc;
use std::time::SystemTime;

use crate::error::Result;
use crate::model::DigitalObject;

#[derive(Debug, Clone)]
pub struct CacheItem {
    pub data: Arc<DigitalObject>,
    pub expires: SystemTime,
}

impl CacheItem {
    pub fn is_expired(&self, now: SystemTime) -> bool {
        self.expires <= now
    }
}

/// Store for parsed objects shared between parses
///
/// Backends never return expired entries.
pub trait CacheBackend: Send + Sync {
    fn get(&self, key: &str) -> Result<Option<CacheItem>>;

    fn set(&self, key: &str, data: Arc<DigitalObject>, expires: SystemTime) -> Result<()>;
}

/// A cache that stores nothing
#[derive(Debug, Default, Clone, Copy)]
pub struct NoCache;

impl CacheBackend for NoCache {
    fn get(&self, _key: &str) -> Result<Option<CacheItem>> {
        Ok(None)
    }

    fn set(&self, _key: &str, _data: Arc<DigitalObject>, _expires: SystemTime) -> Result<()> {
        Ok(())
    }
}
