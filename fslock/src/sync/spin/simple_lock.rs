use core::{
    sync::atomic::{AtomicU32, AtomicUsize, Ordering},
    time::Duration,
};

use crate::{
    config::{SIMPLE_LOCKER_SNOOZE, SIMPLE_LOCK_SNOOZE},
    error::{LockError, Status},
    kernel::{Kernel, Timeout},
};

/// Raw `holder` value while the lock is free
const NO_HOLDER: usize = 0;

/// A lock made of two atomics, no kernel semaphore involved
///
/// The calling thread's id is swapped into `holder`; a thread that finds its
/// own id there already holds the lock and just nests. Everyone else snoozes
/// and tries again.
///
/// # Features
/// - No semaphore: as many of these as memory allows
/// - Reentrant for the holder, `depth` counts the nesting
/// - Acquire/Release on `holder` hands the protected data over
/// - Debug-mode check that only the holder unlocks
///
/// # Example
/// ```ignore
/// let lock = SimpleLock::new(&kernel);
/// lock.lock();
/// lock.lock(); // same thread, nests
/// lock.unlock();
/// lock.unlock();
/// ```
///
/// # Safety Note
/// - Without a timeout, `lock` waits as long as it takes, there is no error
/// - Waiters only look again after each snooze, keep the sections short
pub struct SimpleLock<K: Kernel> {
    kernel: K,
    /// Thread id of the holder, `NO_HOLDER` when free
    holder: AtomicUsize,
    /// Unmatched `lock` calls of the holder
    depth: AtomicU32,
}

impl<K: Kernel> SimpleLock<K> {
    pub fn new(kernel: &K) -> Self {
        Self {
            kernel: kernel.clone(),
            holder: AtomicUsize::new(NO_HOLDER),
            depth: AtomicU32::new(0),
        }
    }

    /// Locks, snoozing `SIMPLE_LOCK_SNOOZE` between attempts.
    #[inline]
    pub fn lock(&self) {
        self.lock_with_snooze(SIMPLE_LOCK_SNOOZE);
    }

    pub fn lock_with_snooze(&self, snooze: Duration) {
        // Cannot time out without a timeout
        let _ = self.lock_with_timeout(snooze, Timeout::Infinite);
    }

    /// Locks like [`SimpleLock::lock_with_snooze`], giving up with
    /// `TimedOut` once the snoozes add up to `timeout`.
    pub fn lock_with_timeout(&self, snooze: Duration, timeout: Timeout) -> Status {
        let thread = self.kernel.current_thread().as_raw();
        let mut waited = Duration::ZERO;

        while !self.try_acquire(thread) {
            if let Timeout::Relative(limit) = timeout {
                if waited >= limit {
                    return Err(LockError::TimedOut);
                }
            }
            self.kernel.snooze(snooze);
            waited = waited.saturating_add(snooze);
        }

        self.depth.fetch_add(1, Ordering::Relaxed);
        Ok(())
    }

    /// Locks if that is possible without waiting.
    pub fn try_lock(&self) -> bool {
        let thread = self.kernel.current_thread().as_raw();
        if !self.try_acquire(thread) {
            return false;
        }
        self.depth.fetch_add(1, Ordering::Relaxed);
        true
    }

    pub fn unlock(&self) {
        #[cfg(debug_assertions)]
        self.check_holder();

        self.release();
    }

    /// Drops one level of nesting, freeing the lock at the last one.
    ///
    /// A free lock stays free, `depth` never wraps.
    pub(super) fn release(&self) {
        match self
            .depth
            .fetch_update(Ordering::Relaxed, Ordering::Relaxed, |depth| depth.checked_sub(1))
        {
            Ok(1) => self.holder.store(NO_HOLDER, Ordering::Release),
            Ok(_) => {}
            Err(_) => log::warn!("SimpleLock unlocked while free"),
        }
    }

    /// Whether the calling thread holds the lock.
    pub fn is_locked(&self) -> bool {
        self.holder.load(Ordering::Relaxed) == self.kernel.current_thread().as_raw()
    }

    /// Nesting depth, only meaningful to the holder.
    pub fn depth(&self) -> u32 {
        self.depth.load(Ordering::Relaxed)
    }

    #[inline(always)]
    fn try_acquire(&self, thread: usize) -> bool {
        match self.holder.compare_exchange(NO_HOLDER, thread, Ordering::Acquire, Ordering::Relaxed) {
            Ok(_) => true,
            Err(current) => current == thread,
        }
    }

    /// Checks that the calling thread is the holder (debug builds only)
    #[cfg(debug_assertions)]
    fn check_holder(&self) {
        let thread = self.kernel.current_thread();
        let holder = self.holder.load(Ordering::Relaxed);
        if holder != thread.as_raw() {
            log::error!("SimpleLock unlocked by {}, held by {}", thread, holder);
            panic!("SimpleLock unlocked by {}, held by {}", thread, holder);
        }
    }
}

/// Holds a [`SimpleLock`] until dropped.
///
/// Snoozes `SIMPLE_LOCKER_SNOOZE` between attempts by default, twice as
/// long as a direct [`SimpleLock::lock`].
#[must_use = "the lock is released as soon as the SimpleLocker is dropped"]
pub struct SimpleLocker<'a, K: Kernel> {
    lock: &'a SimpleLock<K>,
}

impl<'a, K: Kernel> SimpleLocker<'a, K> {
    pub fn new(lock: &'a SimpleLock<K>) -> Self {
        Self::with_snooze(lock, SIMPLE_LOCKER_SNOOZE)
    }

    pub fn with_snooze(lock: &'a SimpleLock<K>, snooze: Duration) -> Self {
        lock.lock_with_snooze(snooze);
        Self { lock }
    }
}

impl<K: Kernel> Drop for SimpleLocker<'_, K> {
    fn drop(&mut self) {
        self.lock.unlock();
    }
}
