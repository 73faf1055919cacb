//! RecursiveLock - a semaphore lock the holding thread may take again
//!
//! Only the first acquisition by a thread touches the semaphore; nested ones
//! just count. `owner` and `depth` are written exclusively by the thread that
//! holds the lock, so the semaphore is all the synchronization they need. They
//! are atomics only so that other threads may read `owner` without a data race.

use core::sync::atomic::{AtomicU32, AtomicUsize, Ordering};

use super::semaphore::{Semaphore, SemaphoreMode};
use crate::{
    error::{LockError, Status},
    kernel::{Kernel, ThreadId, Timeout},
};


/// Raw `owner` value while nobody holds the lock
const NO_OWNER: usize = 0;

pub struct RecursiveLock<K: Kernel> {
    semaphore: Semaphore<K>,
    kernel: K,
    owner: AtomicUsize,
    depth: AtomicU32,
}

impl<K: Kernel> RecursiveLock<K> {
    pub fn new(kernel: &K, name: &str) -> Self {
        Self::with_mode(kernel, name, SemaphoreMode::default())
    }

    pub fn with_mode(kernel: &K, name: &str, mode: SemaphoreMode) -> Self {
        Self {
            semaphore: Semaphore::with_mode(kernel, name, mode),
            kernel: kernel.clone(),
            owner: AtomicUsize::new(NO_OWNER),
            depth: AtomicU32::new(0),
        }
    }

    /// Like [`RecursiveLock::new`], but fails instead of handing out a lock
    /// without a semaphore.
    pub fn create(kernel: &K, name: &str) -> Result<Self, LockError> {
        let lock = Self::new(kernel, name);
        lock.init_check()?;
        Ok(lock)
    }

    pub fn init_check(&self) -> Status {
        self.semaphore.init_check()
    }

    #[inline]
    pub fn lock(&self) -> Status {
        self.lock_with_timeout(Timeout::Infinite)
    }

    pub fn lock_with_timeout(&self, timeout: Timeout) -> Status {
        let thread = self.kernel.current_thread();
        if self.owner.load(Ordering::Relaxed) == thread.as_raw() {
            self.depth.fetch_add(1, Ordering::Relaxed);
            return Ok(());
        }

        self.semaphore.lock_with_timeout(timeout)?;
        self.owner.store(thread.as_raw(), Ordering::Relaxed);
        self.depth.store(1, Ordering::Relaxed);
        Ok(())
    }

    /// Releases one level of nesting.
    ///
    /// # Panics
    /// If the calling thread does not hold the lock. Carrying on would corrupt
    /// the owner bookkeeping, so this is treated like a kernel panic.
    pub fn unlock(&self) -> Status {
        let thread = self.kernel.current_thread();
        let owner = self.owner.load(Ordering::Relaxed);
        if owner != thread.as_raw() {
            log::error!("RecursiveLock unlocked by {}, owned by {}", thread, owner);
            panic!("{}: RecursiveLock unlocked by {}, owned by {}", LockError::NotOwner, thread, owner);
        }

        if self.depth.fetch_sub(1, Ordering::Relaxed) == 1 {
            self.owner.store(NO_OWNER, Ordering::Relaxed);
            return self.semaphore.unlock();
        }
        Ok(())
    }

    /// Thread currently holding the lock.
    pub fn owner(&self) -> Option<ThreadId> {
        ThreadId::from_raw(self.owner.load(Ordering::Relaxed))
    }

    /// Unmatched `lock` calls of the owner, only meaningful to the owner itself.
    pub fn depth(&self) -> u32 {
        self.depth.load(Ordering::Relaxed)
    }

    /// Whether the calling thread holds the lock.
    pub fn is_locked(&self) -> bool {
        self.owner() == Some(self.kernel.current_thread())
    }
}

#[must_use = "the lock is released as soon as the RecursiveLocker is dropped"]
pub struct RecursiveLocker<'a, K: Kernel> {
    lock: &'a RecursiveLock<K>,
    status: Status,
}

impl<'a, K: Kernel> RecursiveLocker<'a, K> {
    pub fn new(lock: &'a RecursiveLock<K>) -> Self {
        let status = lock.lock();
        if let Err(err) = status {
            log::warn!("RecursiveLocker failed to lock: {}", err);
        }
        debug_assert!(status.is_ok(), "RecursiveLocker on a lock that cannot be locked");
        Self { lock, status }
    }

    pub fn status(&self) -> Status {
        self.status
    }
}

impl<K: Kernel> Drop for RecursiveLocker<'_, K> {
    fn drop(&mut self) {
        if self.status.is_ok() {
            let _ = self.lock.unlock();
        }
    }
}
