//! Named locks guarding single-flight parsing
//!
//! A lock backend hands out named, expiring mutexes. `acquire` never blocks:
//! it either takes the lock for `timeout` or reports it held. `wait` blocks
//! until the name is free or `timeout` elapses, without taking it.

pub mod memory;

#[cfg(unix)]
pub mod file;

#[cfg(unix)]
pub use file::FileLock;
pub use memory::MemoryLock;

use std::path::Path;
use std::time::Duration;

pub trait LockBackend: Send + Sync {
    /// Try to take `name`; the lock lapses on its own after `timeout`
    fn acquire(&self, name: &str, timeout: Duration) -> bool;

    /// Block until `name` is free, returning `false` if `timeout` ran out
    fn wait(&self, name: &str, timeout: Duration) -> bool;

    fn release(&self, name: &str);
}

/// Name of the lock serializing parses of `target`
pub fn lock_name(target: &Path) -> String {
    format!("foxml__parser_lock__{}", target.display())
}

/// Releases a held lock when dropped
pub struct LockGuard<'a> {
    backend: &'a dyn LockBackend,
    name: String,
}

impl<'a> LockGuard<'a> {
    /// Take `name` or return `None` if it is held
    pub fn try_acquire(backend: &'a dyn LockBackend, name: String, timeout: Duration) -> Option<Self> {
        backend
            .acquire(&name, timeout)
            .then(|| LockGuard { backend, name })
    }

    pub fn name(&self) -> &str {
        &self.name
    }
}

impl Drop for LockGuard<'_> {
    fn drop(&mut self) {
        self.backend.release(&self.name);
    }
}

/// Always grants the lock and never waits
#[derive(Debug, Default, Clone, Copy)]
pub struct NoLock;

impl LockBackend for NoLock {
    fn acquire(&self, _name: &str, _timeout: Duration) -> bool {
        true
    }

    fn wait(&self, _name: &str, _timeout: Duration) -> bool {
        true
    }

    fn release(&self, _name: &str) {}
}
