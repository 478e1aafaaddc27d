//! Cross-process locks on `flock(2)`
//!
//! Each name maps to a lock file in a shared directory. Locks are advisory
//! and held on an open file description, so the kernel drops them if the
//! holding process dies; the acquire timeout is not enforced here.

use rustix::fs::{flock, FlockOperation};
use rustix::io::Errno;
use sha2::{Digest, Sha256};
use std::collections::HashMap;
use std::fs::{self, File, OpenOptions};
use std::io;
use std::path::PathBuf;
use std::sync::{Mutex, PoisonError};
use std::thread;
use std::time::{Duration, Instant};
use tracing::warn;

use super::LockBackend;

const POLL_INTERVAL: Duration = Duration::from_millis(50);

pub struct FileLock {
    dir: PathBuf,
    /// Lock files this process holds, by name
    held: Mutex<HashMap<String, File>>,
}

impl FileLock {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        FileLock {
            dir: dir.into(),
            held: Mutex::new(HashMap::new()),
        }
    }

    fn open(&self, name: &str) -> io::Result<File> {
        fs::create_dir_all(&self.dir)?;
        let digest = Sha256::digest(name.as_bytes());
        let path = self.dir.join(format!("{}.lock", hex::encode(digest)));
        OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(false)
            .open(path)
    }

    /// Non-blocking `flock`; `Ok(false)` when another holder has it
    fn try_flock(file: &File, operation: FlockOperation) -> io::Result<bool> {
        match flock(file, operation) {
            Ok(()) => Ok(true),
            Err(Errno::AGAIN) => Ok(false),
            Err(e) => Err(e.into()),
        }
    }
}

impl LockBackend for FileLock {
    fn acquire(&self, name: &str, _timeout: Duration) -> bool {
        let mut held = self.held.lock().unwrap_or_else(PoisonError::into_inner);
        if held.contains_key(name) {
            return false;
        }

        let result = self
            .open(name)
            .and_then(|file| Self::try_flock(&file, FlockOperation::NonBlockingLockExclusive).map(|ok| (file, ok)));
        match result {
            Ok((file, true)) => {
                held.insert(name.to_string(), file);
                true
            }
            Ok((_, false)) => false,
            Err(err) => {
                warn!(name, error = %err, "could not take lock file");
                false
            }
        }
    }

    fn wait(&self, name: &str, timeout: Duration) -> bool {
        let file = match self.open(name) {
            Ok(file) => file,
            Err(err) => {
                warn!(name, error = %err, "could not open lock file");
                return false;
            }
        };

        let deadline = Instant::now() + timeout;
        loop {
            match Self::try_flock(&file, FlockOperation::NonBlockingLockShared) {
                Ok(true) => {
                    let _ = flock(&file, FlockOperation::Unlock);
                    return true;
                }
                Ok(false) if Instant::now() < deadline => thread::sleep(POLL_INTERVAL),
                Ok(false) => return false,
                Err(err) => {
                    warn!(name, error = %err, "lock file wait failed");
                    return false;
                }
            }
        }
    }

    fn release(&self, name: &str) {
        let file = self.held.lock().unwrap_or_else(PoisonError::into_inner).remove(name);
        if let Some(file) = file {
            let _ = flock(&file, FlockOperation::Unlock);
        }
    }
}
