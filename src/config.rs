//! Configuration
//!
//! Loaded from TOML; every field has a default so an empty document is a
//! valid configuration.
//!
//! ```toml
//! [parser]
//! read_size = 262144
//! cache_ttl_secs = 604800
//!
//! [storage]
//! archival_object_basepath = "/data/exports"
//! archival_object_file_pattern = '\.xml$'
//! datastream_basepath = "/data/datastreamStore"
//!
//! [cache]
//! backend = "file"
//! dir = "/var/cache/foxml"
//!
//! [lock]
//! backend = "file"
//! dir = "/var/lock/foxml"
//! ```

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use crate::cache::{memory::DEFAULT_CAPACITY, CacheBackend, FileCache, MemoryCache, NoCache};
use crate::error::{Error, Result};
use crate::lock::{LockBackend, MemoryLock, NoLock};
use crate::parser::FoxmlParser;
use crate::storage::{
    AdapterChain, ArchivalObjectAdapter, DirectoryDatastreamAdapter, LowLevelAdapter, ObjectAdapter, ObjectAdapters,
};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub parser: ParserConfig,
    pub storage: StorageConfig,
    pub cache: CacheConfig,
    pub lock: LockConfig,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ParserConfig {
    /// Bytes read from the target per chunk
    pub read_size: usize,
    /// Sliding expiry of cached objects
    pub cache_ttl_secs: u64,
    /// How long a single-flight lock is held, and waited for
    pub lock_timeout_secs: u64,
    /// Expand element names to `namespace-uri:local-name`
    pub namespace_aware: bool,
}

impl Default for ParserConfig {
    fn default() -> Self {
        ParserConfig {
            read_size: 1 << 18,
            cache_ttl_secs: 7 * 24 * 60 * 60,
            lock_timeout_secs: 600,
            namespace_aware: true,
        }
    }
}

impl ParserConfig {
    pub fn cache_ttl(&self) -> Duration {
        Duration::from_secs(self.cache_ttl_secs)
    }

    pub fn lock_timeout(&self) -> Duration {
        Duration::from_secs(self.lock_timeout_secs)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    pub archival_object_basepath: PathBuf,
    pub archival_object_file_pattern: Option<String>,
    /// Directory of datastream files for `INTERNAL_ID` content
    pub datastream_basepath: Option<PathBuf>,
}

impl Default for StorageConfig {
    fn default() -> Self {
        StorageConfig {
            archival_object_basepath: PathBuf::from("exports"),
            archival_object_file_pattern: None,
            datastream_basepath: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "backend", rename_all = "snake_case")]
pub enum CacheConfig {
    None,
    Memory { capacity: usize },
    File { dir: PathBuf },
}

impl Default for CacheConfig {
    fn default() -> Self {
        CacheConfig::Memory {
            capacity: DEFAULT_CAPACITY,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "backend", rename_all = "snake_case")]
pub enum LockConfig {
    None,
    #[default]
    Memory,
    File {
        dir: PathBuf,
    },
}

impl Config {
    pub fn from_toml_str(text: &str) -> Result<Self> {
        Ok(toml::from_str(text)?)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = fs::read_to_string(path).map_err(|e| Error::open(path, e))?;
        Self::from_toml_str(&text)
    }

    /// Datastream adapter chain for `INTERNAL_ID` resolution
    pub fn datastream_adapters(&self) -> AdapterChain<dyn LowLevelAdapter> {
        let mut builder = AdapterChain::<dyn LowLevelAdapter>::builder();
        if let Some(base) = &self.storage.datastream_basepath {
            builder = builder.add(Arc::new(DirectoryDatastreamAdapter::new(base)), 0);
        }
        builder.build()
    }

    /// Object adapter chain enumerating the archival export directory
    pub fn object_adapters(&self) -> Result<ObjectAdapters> {
        let base = &self.storage.archival_object_basepath;
        let adapter = match &self.storage.archival_object_file_pattern {
            Some(pattern) => ArchivalObjectAdapter::with_pattern(base, pattern)?,
            None => ArchivalObjectAdapter::new(base),
        };
        let adapter: Arc<dyn ObjectAdapter> = Arc::new(adapter);
        Ok(AdapterChain::builder().add(adapter, 0).build())
    }

    pub fn cache_backend(&self) -> Arc<dyn CacheBackend> {
        match &self.cache {
            CacheConfig::None => Arc::new(NoCache),
            CacheConfig::Memory { capacity } => Arc::new(MemoryCache::new(*capacity)),
            CacheConfig::File { dir } => Arc::new(FileCache::new(dir)),
        }
    }

    pub fn lock_backend(&self) -> Arc<dyn LockBackend> {
        match &self.lock {
            LockConfig::None => Arc::new(NoLock),
            LockConfig::Memory => Arc::new(MemoryLock::new()),
            #[cfg(unix)]
            LockConfig::File { dir } => Arc::new(crate::lock::FileLock::new(dir)),
            #[cfg(not(unix))]
            LockConfig::File { .. } => {
                tracing::warn!("file locks need flock(2); falling back to in-process locks");
                Arc::new(MemoryLock::new())
            }
        }
    }

    /// Assemble a parser from this configuration
    pub fn build_parser(&self) -> FoxmlParser {
        FoxmlParser::new(
            self.cache_backend(),
            Arc::new(self.datastream_adapters()),
            self.lock_backend(),
        )
        .with_config(self.parser.clone())
    }
}
