//! FOXML Parse Orchestrator
//!
//! [`FoxmlParser`] turns one FOXML file into a [`DigitalObject`]. It owns the
//! read loop, consults and fills the shared cache, and optionally serializes
//! concurrent parses of the same target through a named lock so that only
//! one caller reads the file while the others pick up the cached result.

mod automaton;
mod batch;
mod element_map;
mod session;

pub use element_map::FOXML_NS;

use std::path::Path;
use std::sync::{Arc, OnceLock};
use std::time::SystemTime;
use tracing::{debug, info, warn};

use self::session::Session;
use crate::cache::CacheBackend;
use crate::config::ParserConfig;
use crate::core::PushParser;
use crate::error::{Error, Result};
use crate::lock::{lock_name, LockBackend, LockGuard};
use crate::model::DigitalObject;
use crate::storage::LowLevelAdapter;
use crate::stream::{ByteSource, ChunkReader, FileSource};

pub struct FoxmlParser {
    cache: Arc<dyn CacheBackend>,
    datastreams: Arc<dyn LowLevelAdapter>,
    datastreams_valid: OnceLock<bool>,
    lock: Arc<dyn LockBackend>,
    source: Arc<dyn ByteSource>,
    config: ParserConfig,
}

impl FoxmlParser {
    pub fn new(
        cache: Arc<dyn CacheBackend>,
        datastreams: Arc<dyn LowLevelAdapter>,
        lock: Arc<dyn LockBackend>,
    ) -> Self {
        FoxmlParser {
            cache,
            datastreams,
            datastreams_valid: OnceLock::new(),
            lock,
            source: Arc::new(FileSource),
            config: ParserConfig::default(),
        }
    }

    pub fn with_config(mut self, config: ParserConfig) -> Self {
        self.config = config;
        self
    }

    /// Read targets through `source` instead of the filesystem
    pub fn with_source(mut self, source: Arc<dyn ByteSource>) -> Self {
        self.source = source;
        self
    }

    pub fn config(&self) -> &ParserConfig {
        &self.config
    }

    /// The datastream adapter, when it is usable; validity is checked once
    fn datastream_adapter(&self) -> Option<&dyn LowLevelAdapter> {
        let valid = *self.datastreams_valid.get_or_init(|| {
            let valid = self.datastreams.valid();
            if !valid {
                debug!("no valid datastream adapter; INTERNAL_ID content will not resolve");
            }
            valid
        });
        valid.then_some(&*self.datastreams)
    }

    /// Parse `target`, or return the cached object for it
    ///
    /// With `control_concurrency`, a caller that finds another parse of the
    /// same target in flight waits for it and reuses its result. Should the
    /// wait run out, or the other parse fail, the file is parsed directly.
    pub fn parse(&self, target: impl AsRef<Path>, control_concurrency: bool) -> Result<Arc<DigitalObject>> {
        let target = target.as_ref();
        let key = target.to_string_lossy();

        if let Some(object) = self.cached(&key) {
            return Ok(object);
        }
        if !control_concurrency {
            return self.parse_and_store(target, &key);
        }

        let name = lock_name(target);
        let timeout = self.config.lock_timeout();
        if let Some(_guard) = LockGuard::try_acquire(&*self.lock, name.clone(), timeout) {
            debug!(path = %target.display(), "took parse lock");
            // Another holder may have finished between our miss and the acquire
            if let Some(object) = self.cached(&key) {
                return Ok(object);
            }
            return self.parse_and_store(target, &key);
        }

        debug!(path = %target.display(), "waiting on parse in flight");
        if self.lock.wait(&name, timeout) {
            if let Some(object) = self.cached(&key) {
                return Ok(object);
            }
            debug!(path = %target.display(), "parse in flight left nothing cached");
        } else {
            warn!(path = %target.display(), timeout_secs = timeout.as_secs(), "gave up waiting on parse lock");
        }
        self.parse_and_store(target, &key)
    }

    /// Parse `target` ignoring the cache and locks entirely
    pub fn parse_uncached(&self, target: impl AsRef<Path>) -> Result<DigitalObject> {
        let target = target.as_ref();
        let reader = self
            .source
            .open(target)
            .map_err(|e| Error::open(target, e))?;
        let mut chunks = ChunkReader::with_capacity(reader, self.config.read_size);
        let mut parser = PushParser::new(self.config.namespace_aware);
        let mut session = Session::new(target, self.datastream_adapter());

        while let Some((chunk, is_final)) = chunks.next_chunk().map_err(|e| Error::open(target, e))? {
            session.advance_read(chunk.len());
            parser.feed(chunk, is_final, &mut session)?;
            if is_final {
                break;
            }
        }

        let object = session.finish()?;
        info!(
            path = %target.display(),
            pid = object.pid(),
            datastreams = object.datastream_count(),
            "parsed"
        );
        Ok(object)
    }

    fn parse_and_store(&self, target: &Path, key: &str) -> Result<Arc<DigitalObject>> {
        let object = Arc::new(self.parse_uncached(target)?);
        self.store(key, Arc::clone(&object));
        Ok(object)
    }

    /// Cache lookup that slides the expiry forward on a hit
    fn cached(&self, key: &str) -> Option<Arc<DigitalObject>> {
        match self.cache.get(key) {
            Ok(Some(item)) => {
                debug!(key, "cache hit");
                self.store(key, Arc::clone(&item.data));
                Some(item.data)
            }
            Ok(None) => {
                debug!(key, "cache miss");
                None
            }
            Err(err) => {
                warn!(key, error = %err, "cache read failed; treating as a miss");
                None
            }
        }
    }

    fn store(&self, key: &str, object: Arc<DigitalObject>) {
        let expires = SystemTime::now() + self.config.cache_ttl();
        if let Err(err) = self.cache.set(key, object, expires) {
            warn!(key, error = %err, "cache write failed");
        }
    }
}
