//! On-disk JSON cache
//!
//! One file per key, named by the SHA-256 of the key, holding the key, its
//! expiry and the serialized object. Writes go through a temporary file in
//! the same directory and are renamed into place, so readers in other
//! processes never see a partial entry.

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fs::{self, File};
use std::io::{self, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::SystemTime;
use tracing::debug;

use super::{CacheBackend, CacheItem};
use crate::error::{Error, Result};
use crate::model::DigitalObject;

pub struct FileCache {
    dir: PathBuf,
}

#[derive(Serialize)]
struct EntryRef<'a> {
    key: &'a str,
    expires: SystemTime,
    data: &'a DigitalObject,
}

#[derive(Deserialize)]
struct Entry {
    key: String,
    expires: SystemTime,
    data: DigitalObject,
}

impl FileCache {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        FileCache { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn entry_path(&self, key: &str) -> PathBuf {
        let digest = Sha256::digest(key.as_bytes());
        self.dir.join(format!("{}.json", hex::encode(digest)))
    }
}

impl CacheBackend for FileCache {
    fn get(&self, key: &str) -> Result<Option<CacheItem>> {
        let path = self.entry_path(key);
        let file = match File::open(&path) {
            Ok(file) => file,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(Error::open(path, e)),
        };
        let entry: Entry = serde_json::from_reader(BufReader::new(file))?;

        if entry.key != key {
            debug!(key, stored = %entry.key, "cache file belongs to another key");
            return Ok(None);
        }
        if entry.expires <= SystemTime::now() {
            // Racing removals are harmless
            let _ = fs::remove_file(&path);
            return Ok(None);
        }
        Ok(Some(CacheItem {
            data: Arc::new(entry.data),
            expires: entry.expires,
        }))
    }

    fn set(&self, key: &str, data: Arc<DigitalObject>, expires: SystemTime) -> Result<()> {
        fs::create_dir_all(&self.dir).map_err(|e| Error::open(&self.dir, e))?;

        let tmp = tempfile::NamedTempFile::new_in(&self.dir).map_err(|e| Error::open(&self.dir, e))?;
        {
            let mut writer = BufWriter::new(tmp.as_file());
            let entry = EntryRef {
                key,
                expires,
                data: &data,
            };
            serde_json::to_writer(&mut writer, &entry)?;
            writer.flush()?;
        }

        let path = self.entry_path(key);
        tmp.persist(&path).map_err(|e| Error::open(path, e.error))?;
        Ok(())
    }
}
