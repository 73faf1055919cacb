use core::{
    cmp::Ordering as Sign,
    sync::atomic::{AtomicI32, Ordering},
};

use super::RawReadWriteLock;
use crate::{
    config::{MAX_READERS, RW_LOCK_NAME, RW_WRITE_LOCK_NAME},
    error::{LockError, Status},
    kernel::{Kernel, KernelSemaphore, Timeout},
    sync::semaphore::Semaphore,
};

/// Reader/writer lock that only enters the kernel under contention.
///
/// `count` starts at `MAX_READERS`. A reader takes one slot, a writer takes
/// `MAX_READERS` slots, and whoever drives the counter below zero sleeps on
/// the kernel semaphore until the thread in its way wakes it. `write_lock`
/// keeps writers from subtracting concurrently, so at most one writer waits
/// for readers to drain.
pub struct FastReadWriteLock<K: Kernel> {
    pub(super) semaphore: Result<K::Semaphore, LockError>,
    pub(super) count: AtomicI32,
    write_lock: Semaphore<K>,
}

impl<K: Kernel> FastReadWriteLock<K> {
    pub fn new(kernel: &K, name: &str) -> Self {
        Self::with_names(kernel, name, name)
    }

    pub fn with_default_name(kernel: &K) -> Self {
        Self::with_names(kernel, RW_LOCK_NAME, RW_WRITE_LOCK_NAME)
    }

    /// Like [`FastReadWriteLock::new`], but fails if either semaphore
    /// could not be created.
    pub fn create(kernel: &K, name: &str) -> Result<Self, LockError> {
        let lock = Self::new(kernel, name);
        lock.init_check()?;
        Ok(lock)
    }

    fn with_names(kernel: &K, name: &str, write_name: &str) -> Self {
        let semaphore = kernel.create_semaphore(name, 0);
        if let Err(err) = &semaphore {
            log::warn!("r/w lock \"{}\": {}", name, err);
        }

        Self {
            semaphore,
            count: AtomicI32::new(MAX_READERS),
            write_lock: Semaphore::new(kernel, write_name),
        }
    }

    fn kernel_semaphore(&self) -> Result<&K::Semaphore, LockError> {
        self.semaphore.as_ref().map_err(|_| LockError::BadSemaphore)
    }

    /// Backs a writer out of the counter after its wait for `units` failed.
    ///
    /// Since the writer subtracted, every reader that left released a unit
    /// for it and every reader that arrived queued on the semaphore. Adding
    /// `MAX_READERS` back stops both, and the counter seen at that moment
    /// tells how far the semaphore is off: `-observed - units` units are
    /// owed to queued readers if positive, or were released for the writer
    /// and must be taken back if negative. If a writer still holds the lock
    /// the semaphore has not been touched and its unlock lets the readers in.
    fn withdraw_writer(&self, semaphore: &K::Semaphore, units: i32) {
        let observed = self.count.fetch_add(MAX_READERS, Ordering::AcqRel);
        if observed <= -MAX_READERS {
            return;
        }

        let owed = -observed - units;
        log::debug!("writer gave up draining, settling {} units", owed);
        let _ = match owed.cmp(&0) {
            Sign::Greater => semaphore.release_etc(owed as u32),
            // Released or about to be, so this does not wait for long.
            Sign::Less => semaphore.acquire_etc(-owed as u32, Timeout::Infinite),
            Sign::Equal => Ok(()),
        };
    }
}

impl<K: Kernel> RawReadWriteLock for FastReadWriteLock<K> {
    fn init_check(&self) -> Status {
        self.semaphore.as_ref().map(|_| ()).map_err(|err| *err)?;
        self.write_lock.init_check()
    }

    fn read_lock(&self) -> Status {
        let semaphore = self.kernel_semaphore()?;
        if self.count.fetch_sub(1, Ordering::AcqRel) > 0 {
            return Ok(());
        }

        log::trace!("reader queued behind a writer");
        semaphore.acquire()
    }

    fn read_unlock(&self) {
        let Ok(semaphore) = self.kernel_semaphore() else {
            return;
        };
        if self.count.fetch_add(1, Ordering::AcqRel) < 0 {
            let _ = semaphore.release();
        }
    }

    fn write_lock_with_timeout(&self, timeout: Timeout) -> Status {
        let semaphore = self.kernel_semaphore()?;
        self.write_lock.lock_with_timeout(timeout)?;

        let readers = self.count.fetch_sub(MAX_READERS, Ordering::AcqRel);
        let status = if readers < MAX_READERS {
            // Wait for every reader holding a slot. If another writer holds
            // the lock instead, its unlock hands over a single unit.
            let units = if readers <= 0 { 1 } else { MAX_READERS - readers };
            log::trace!("writer waiting for {} units", units);
            let status = semaphore.acquire_etc(units as u32, timeout);
            if status.is_err() {
                self.withdraw_writer(semaphore, units);
            }
            status
        } else {
            Ok(())
        };

        let _ = self.write_lock.unlock();
        status
    }

    fn write_unlock(&self) {
        let Ok(semaphore) = self.kernel_semaphore() else {
            return;
        };

        let readers = self.count.fetch_add(MAX_READERS, Ordering::AcqRel);
        if readers < 0 {
            // A writer queued behind us takes over alone, the readers queued
            // behind it are let in by its unlock.
            let units = if readers <= -MAX_READERS { 1 } else { -readers };
            let _ = semaphore.release_etc(units as u32);
        }
    }
}
