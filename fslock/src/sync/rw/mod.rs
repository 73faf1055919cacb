//! Many reader / single writer locks
//!
//! Two implementations of [`RawReadWriteLock`] trade semaphores for speed:
//! - [`SimpleReadWriteLock`] - one kernel semaphore holding `MAX_READERS`
//!   units. Readers take one unit, a writer takes all of them.
//! - [`FastReadWriteLock`] - an atomic reader-slot counter in front of the
//!   kernel semaphore, so uncontended readers never enter the kernel. Costs a
//!   second semaphore serializing writers, which matters when every open inode
//!   carries one of these locks.
//!
//! [`ReadWriteLock`] is whichever the `fast_lock` feature selects.
//!
//! Neither is fair: readers that arrive while a writer waits for the current
//! readers to drain may get in before it.

mod fast;
mod simple;


pub use fast::FastReadWriteLock;
pub use simple::SimpleReadWriteLock;

use crate::{error::Status, kernel::Timeout};

#[cfg(feature = "fast_lock")]
pub type ReadWriteLock<K> = FastReadWriteLock<K>;
#[cfg(not(feature = "fast_lock"))]
pub type ReadWriteLock<K> = SimpleReadWriteLock<K>;

/// The operations shared by both reader/writer strategies.
///
/// Invariant: while a writer holds the lock no reader does, and while any
/// reader holds it no writer does.
pub trait RawReadWriteLock {
    /// Whether the lock got the semaphores it needs.
    fn init_check(&self) -> Status;

    /// Takes a reader slot, blocking while a writer holds the lock.
    fn read_lock(&self) -> Status;

    /// Gives back a reader slot taken by `read_lock`.
    fn read_unlock(&self);

    #[inline]
    fn write_lock(&self) -> Status {
        self.write_lock_with_timeout(Timeout::Infinite)
    }

    /// Takes the lock exclusively, waiting for current readers to leave.
    ///
    /// Gives up with `TimedOut` once `timeout` expires, both while queued
    /// behind another writer and while readers drain. Nothing is held then.
    fn write_lock_with_timeout(&self, timeout: Timeout) -> Status;

    /// Releases the lock taken by `write_lock`, letting queued threads in.
    fn write_unlock(&self);
}

#[must_use = "the reader slot is released as soon as ReadLocked is dropped"]
pub struct ReadLocked<'a, L: RawReadWriteLock + ?Sized> {
    lock: &'a L,
    status: Status,
}

impl<'a, L: RawReadWriteLock + ?Sized> ReadLocked<'a, L> {
    pub fn new(lock: &'a L) -> Self {
        let status = lock.read_lock();
        Self { lock, status }
    }

    pub fn status(&self) -> Status {
        self.status
    }
}

impl<L: RawReadWriteLock + ?Sized> Drop for ReadLocked<'_, L> {
    fn drop(&mut self) {
        if self.status.is_ok() {
            self.lock.read_unlock();
        }
    }
}

#[must_use = "the write lock is released as soon as WriteLocked is dropped"]
pub struct WriteLocked<'a, L: RawReadWriteLock + ?Sized> {
    lock: &'a L,
    status: Status,
}

impl<'a, L: RawReadWriteLock + ?Sized> WriteLocked<'a, L> {
    pub fn new(lock: &'a L) -> Self {
        Self::with_timeout(lock, Timeout::Infinite)
    }

    /// For callers that would rather give up than wait forever for readers,
    /// check [`WriteLocked::is_locked`] afterwards.
    pub fn with_timeout(lock: &'a L, timeout: Timeout) -> Self {
        let status = lock.write_lock_with_timeout(timeout);
        if let Err(err) = status {
            log::debug!("WriteLocked gave up: {}", err);
        }
        Self { lock, status }
    }

    pub fn is_locked(&self) -> bool {
        self.status.is_ok()
    }

    pub fn status(&self) -> Status {
        self.status
    }
}

impl<L: RawReadWriteLock + ?Sized> Drop for WriteLocked<'_, L> {
    fn drop(&mut self) {
        if self.status.is_ok() {
            self.lock.write_unlock();
        }
    }
}
