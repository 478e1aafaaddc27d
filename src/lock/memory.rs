//! In-process lock table

use std::collections::HashMap;
use std::sync::{Condvar, Mutex, MutexGuard, PoisonError};
use std::time::{Duration, Instant};
use tracing::debug;

use super::LockBackend;

/// Named locks shared by the threads of one process
///
/// Each held name records when it lapses, so a holder that never releases
/// blocks others for at most its timeout.
#[derive(Default)]
pub struct MemoryLock {
    held: Mutex<HashMap<String, Instant>>,
    released: Condvar,
}

impl MemoryLock {
    pub fn new() -> Self {
        Self::default()
    }

    fn table(&self) -> MutexGuard<'_, HashMap<String, Instant>> {
        self.held.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Whether `name` is held at `now`, dropping a lapsed entry
    fn is_held(held: &mut HashMap<String, Instant>, name: &str, now: Instant) -> bool {
        match held.get(name).copied() {
            Some(lapses) if lapses > now => true,
            Some(_) => {
                debug!(name, "lock lapsed");
                held.remove(name);
                false
            }
            None => false,
        }
    }
}

impl LockBackend for MemoryLock {
    fn acquire(&self, name: &str, timeout: Duration) -> bool {
        let mut held = self.table();
        let now = Instant::now();
        if Self::is_held(&mut held, name, now) {
            return false;
        }
        held.insert(name.to_string(), now + timeout);
        true
    }

    fn wait(&self, name: &str, timeout: Duration) -> bool {
        let deadline = Instant::now() + timeout;
        let mut held = self.table();
        loop {
            let now = Instant::now();
            if !Self::is_held(&mut held, name, now) {
                return true;
            }
            if now >= deadline {
                return false;
            }
            // Wake no later than the holder's own expiry
            let lapses = held.get(name).copied().unwrap_or(deadline);
            let until = lapses.min(deadline).saturating_duration_since(now);
            held = self
                .released
                .wait_timeout(held, until)
                .unwrap_or_else(PoisonError::into_inner)
                .0;
        }
    }

    fn release(&self, name: &str) {
        self.table().remove(name);
        self.released.notify_all();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::thread;

    #[test]
    fn test_acquire_is_exclusive() {
        let lock = MemoryLock::new();
        assert!(lock.acquire("a", Duration::from_secs(5)));
        assert!(!lock.acquire("a", Duration::from_secs(5)));
        assert!(lock.acquire("b", Duration::from_secs(5)));
        lock.release("a");
        assert!(lock.acquire("a", Duration::from_secs(5)));
    }

    #[test]
    fn test_lock_lapses() {
        let lock = MemoryLock::new();
        assert!(lock.acquire("a", Duration::from_millis(20)));
        assert!(lock.wait("a", Duration::from_secs(5)));
        assert!(lock.acquire("a", Duration::from_secs(5)));
    }

    #[test]
    fn test_wait_times_out() {
        let lock = MemoryLock::new();
        assert!(lock.acquire("a", Duration::from_secs(60)));
        assert!(!lock.wait("a", Duration::from_millis(20)));
    }

    #[test]
    fn test_wait_wakes_on_release() {
        let lock = Arc::new(MemoryLock::new());
        assert!(lock.acquire("a", Duration::from_secs(60)));

        let waiter = {
            let lock = Arc::clone(&lock);
            thread::spawn(move || lock.wait("a", Duration::from_secs(30)))
        };
        thread::sleep(Duration::from_millis(20));
        lock.release("a");
        assert!(waiter.join().unwrap());
    }
}
