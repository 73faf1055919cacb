//! A [`Kernel`] on top of std threads.
//!
//! Semaphores are a counter behind a mutex with a condvar for the waiters.
//! Each one counts how often it was entered, which is how the tests see
//! whether a lock took its fast path or went to the kernel.

use core::{
    fmt,
    sync::atomic::{AtomicUsize, Ordering},
    time::Duration,
};
use std::{
    sync::{Arc, Condvar, Mutex, MutexGuard},
    time::Instant,
};

use super::{allocator, Kernel, KernelSemaphore, ThreadId, Timeout};
use crate::error::{LockError, Status};

struct SemaphoreTable {
    limit: Option<usize>,
    live: AtomicUsize,
}

impl SemaphoreTable {
    fn reserve(&self) -> Result<(), LockError> {
        let Some(limit) = self.limit else {
            self.live.fetch_add(1, Ordering::Relaxed);
            return Ok(());
        };

        self.live
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |live| {
                (live < limit).then_some(live + 1)
            })
            .map(|_| ())
            .map_err(|_| LockError::NoMoreSemaphores)
    }

    fn free(&self) {
        self.live.fetch_sub(1, Ordering::AcqRel);
    }
}

/// Kernel services for locks used from ordinary std threads.
#[derive(Clone)]
pub struct HostKernel {
    table: Arc<SemaphoreTable>,
}

impl HostKernel {
    pub fn new() -> Self {
        Self::with_table(None)
    }

    /// A kernel that refuses to create more than `limit` live semaphores.
    pub fn with_semaphore_limit(limit: usize) -> Self {
        Self::with_table(Some(limit))
    }

    fn with_table(limit: Option<usize>) -> Self {
        Self {
            table: Arc::new(SemaphoreTable {
                limit,
                live: AtomicUsize::new(0),
            }),
        }
    }

    /// Semaphores created through this kernel and not yet deleted.
    pub fn live_semaphores(&self) -> usize {
        self.table.live.load(Ordering::Acquire)
    }
}

impl Default for HostKernel {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for HostKernel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HostKernel")
            .field("limit", &self.table.limit)
            .field("live", &self.live_semaphores())
            .finish()
    }
}

impl Kernel for HostKernel {
    type Semaphore = HostSemaphore;

    fn create_semaphore(&self, name: &str, count: u32) -> Result<HostSemaphore, LockError> {
        self.table.reserve()?;
        log::trace!("create semaphore \"{}\" with {} units", name, count);

        Ok(HostSemaphore {
            name: name.into(),
            count: Mutex::new(count),
            available: Condvar::new(),
            acquire_calls: AtomicUsize::new(0),
            release_calls: AtomicUsize::new(0),
            table: self.table.clone(),
        })
    }

    fn current_thread(&self) -> ThreadId {
        allocator::current_thread_id()
    }

    fn snooze(&self, duration: Duration) {
        std::thread::sleep(duration);
    }
}

pub struct HostSemaphore {
    name: String,
    count: Mutex<u32>,
    available: Condvar,
    acquire_calls: AtomicUsize,
    release_calls: AtomicUsize,
    table: Arc<SemaphoreTable>,
}

impl HostSemaphore {
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Units currently available.
    pub fn count(&self) -> u32 {
        *self.units()
    }

    /// How many times a thread entered `acquire_etc`.
    pub fn acquire_calls(&self) -> usize {
        self.acquire_calls.load(Ordering::Acquire)
    }

    /// How many times a thread entered `release_etc`.
    pub fn release_calls(&self) -> usize {
        self.release_calls.load(Ordering::Acquire)
    }

    // A waiter that panicked while holding the counter cannot have left it
    // half-updated, so poisoning is ignored.
    fn units(&self) -> MutexGuard<'_, u32> {
        self.count.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl KernelSemaphore for HostSemaphore {
    fn acquire_etc(&self, count: u32, timeout: Timeout) -> Status {
        self.acquire_calls.fetch_add(1, Ordering::AcqRel);
        let deadline = match timeout {
            Timeout::Infinite => None,
            Timeout::Relative(duration) => Some(Instant::now() + duration),
        };

        let mut units = self.units();
        while *units < count {
            units = match deadline {
                None => self
                    .available
                    .wait(units)
                    .unwrap_or_else(|poisoned| poisoned.into_inner()),
                Some(deadline) => {
                    let now = Instant::now();
                    if now >= deadline {
                        return Err(LockError::TimedOut);
                    }
                    self.available
                        .wait_timeout(units, deadline - now)
                        .unwrap_or_else(|poisoned| poisoned.into_inner())
                        .0
                }
            };
        }

        *units -= count;
        Ok(())
    }

    fn release_etc(&self, count: u32) -> Status {
        self.release_calls.fetch_add(1, Ordering::AcqRel);
        let mut units = self.units();
        *units = units.checked_add(count).ok_or(LockError::BadSemaphore)?;
        drop(units);

        // Waiters may want several units each, let all of them re-check.
        self.available.notify_all();
        Ok(())
    }
}

impl fmt::Debug for HostSemaphore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HostSemaphore")
            .field("name", &self.name)
            .field("count", &self.count())
            .finish_non_exhaustive()
    }
}

impl Drop for HostSemaphore {
    fn drop(&mut self) {
        log::trace!("delete semaphore \"{}\"", self.name);
        self.table.free();
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::lock_test;

    #[lock_test]
    fn limit_refuses_extra_semaphores() {
        let kernel = HostKernel::with_semaphore_limit(1);
        let first = kernel.create_semaphore("first", 1);
        assert!(first.is_ok());
        assert_eq!(
            kernel.create_semaphore("second", 1).err(),
            Some(LockError::NoMoreSemaphores)
        );

        drop(first);
        assert_eq!(kernel.live_semaphores(), 0);
        assert!(kernel.create_semaphore("third", 1).is_ok());
    }

    #[lock_test]
    fn acquire_etc_is_all_or_nothing() {
        let kernel = HostKernel::new();
        let sem = kernel.create_semaphore("units", 2).unwrap();

        let timeout = Timeout::Relative(Duration::from_millis(10));
        assert_eq!(sem.acquire_etc(3, timeout), Err(LockError::TimedOut));
        assert_eq!(sem.count(), 2);

        sem.acquire_etc(2, timeout).unwrap();
        assert_eq!(sem.count(), 0);
        sem.release_etc(2).unwrap();
        assert_eq!(sem.count(), 2);
        assert_eq!((sem.acquire_calls(), sem.release_calls()), (2, 1));
    }

    #[lock_test]
    fn release_wakes_blocked_acquirer() {
        let kernel = HostKernel::new();
        let sem = kernel.create_semaphore("handoff", 0).unwrap();

        std::thread::scope(|s| {
            let waiter = s.spawn(|| sem.acquire());
            std::thread::sleep(Duration::from_millis(20));
            sem.release().unwrap();
            assert_eq!(waiter.join().unwrap(), Ok(()));
        });
        assert_eq!(sem.count(), 0);
    }
}
