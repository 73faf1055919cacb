//! Semaphore - a kernel semaphore used as a mutex
//!
//! In benaphore mode an atomic counter sits in front of the kernel semaphore:
//! uncontended `lock`/`unlock` are a single atomic add, and the kernel is only
//! entered when a thread actually has to wait or to wake a waiter.

use core::sync::atomic::{AtomicI32, Ordering};

use crate::{
    config::USE_BENAPHORE,
    error::{LockError, Status},
    kernel::{Kernel, KernelSemaphore, Timeout},
};


#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SemaphoreMode {
    /// Every lock and unlock goes to the kernel semaphore.
    Kernel,
    /// Atomic fast path, kernel semaphore only under contention.
    Benaphore,
}

impl Default for SemaphoreMode {
    fn default() -> Self {
        if USE_BENAPHORE {
            SemaphoreMode::Benaphore
        } else {
            SemaphoreMode::Kernel
        }
    }
}

pub struct Semaphore<K: Kernel> {
    pub(super) semaphore: Result<K::Semaphore, LockError>,
    /// Benaphore counter: 1 free, 0 held, below 0 held with waiters.
    count: Option<AtomicI32>,
}

impl<K: Kernel> Semaphore<K> {
    pub fn new(kernel: &K, name: &str) -> Self {
        Self::with_mode(kernel, name, SemaphoreMode::default())
    }

    pub fn with_mode(kernel: &K, name: &str, mode: SemaphoreMode) -> Self {
        let (units, count) = match mode {
            SemaphoreMode::Kernel => (1, None),
            SemaphoreMode::Benaphore => (0, Some(AtomicI32::new(1))),
        };

        let semaphore = kernel.create_semaphore(name, units);
        if let Err(err) = &semaphore {
            log::warn!("semaphore \"{}\": {}", name, err);
        }
        Self { semaphore, count }
    }

    /// Like [`Semaphore::new`], but fails instead of handing out a lock that
    /// would not pass `init_check`.
    pub fn create(kernel: &K, name: &str) -> Result<Self, LockError> {
        let semaphore = Self::new(kernel, name);
        semaphore.init_check()?;
        Ok(semaphore)
    }

    pub fn init_check(&self) -> Status {
        self.semaphore.as_ref().map(|_| ()).map_err(|err| *err)
    }

    pub fn mode(&self) -> SemaphoreMode {
        match self.count {
            Some(_) => SemaphoreMode::Benaphore,
            None => SemaphoreMode::Kernel,
        }
    }

    #[inline]
    pub fn lock(&self) -> Status {
        self.lock_with_timeout(Timeout::Infinite)
    }

    pub fn lock_with_timeout(&self, timeout: Timeout) -> Status {
        let semaphore = self.kernel_semaphore()?;
        let Some(count) = &self.count else {
            return semaphore.acquire_etc(1, timeout);
        };

        if count.fetch_sub(1, Ordering::AcqRel) > 0 {
            return Ok(());
        }

        log::trace!("benaphore contended, waiting on the kernel semaphore");
        match semaphore.acquire_etc(1, timeout) {
            Ok(()) => Ok(()),
            Err(err) => Self::withdraw(count, semaphore, err),
        }
    }

    pub fn unlock(&self) -> Status {
        let semaphore = self.kernel_semaphore()?;
        if let Some(count) = &self.count {
            if count.fetch_add(1, Ordering::AcqRel) >= 0 {
                return Ok(());
            }
        }
        semaphore.release()
    }

    /// Takes back the reservation of a waiter whose kernel acquire failed.
    ///
    /// While the counter is negative, someone else is still queued and the
    /// reservation can be dropped. Otherwise an unlock already released the
    /// kernel semaphore for this waiter and the unit has to be consumed.
    fn withdraw(count: &AtomicI32, semaphore: &K::Semaphore, err: LockError) -> Status {
        let mut current = count.load(Ordering::Acquire);
        loop {
            if current >= 0 {
                return semaphore.acquire();
            }
            match count.compare_exchange_weak(current, current + 1, Ordering::AcqRel, Ordering::Acquire) {
                Ok(_) => return Err(err),
                Err(actual) => current = actual,
            }
        }
    }

    fn kernel_semaphore(&self) -> Result<&K::Semaphore, LockError> {
        self.semaphore.as_ref().map_err(|_| LockError::BadSemaphore)
    }
}

/// A guard holding a [`Semaphore`] for the rest of the scope.
///
/// The semaphore is only unlocked on drop if locking succeeded; check
/// [`Locker::status`] before touching the protected data.
#[must_use = "the semaphore is unlocked as soon as the Locker is dropped"]
pub struct Locker<'a, K: Kernel> {
    lock: &'a Semaphore<K>,
    status: Status,
}

impl<'a, K: Kernel> Locker<'a, K> {
    pub fn new(lock: &'a Semaphore<K>) -> Self {
        let status = lock.lock();
        if let Err(err) = status {
            log::warn!("Locker failed to lock semaphore: {}", err);
        }
        debug_assert!(status.is_ok(), "Locker on a semaphore that cannot be locked");
        Self { lock, status }
    }

    pub fn status(&self) -> Status {
        self.status
    }
}

impl<K: Kernel> Drop for Locker<'_, K> {
    fn drop(&mut self) {
        if self.status.is_ok() {
            let _ = self.lock.unlock();
        }
    }
}
