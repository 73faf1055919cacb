//! Kernel capabilities the locks are built on.
//!
//! The locks never reach for global kernel state. Whoever creates a lock hands
//! it a [`Kernel`] handle, and everything the lock needs from the outside
//! (semaphores, the identity of the calling thread, sleeping) goes through it.

use core::{fmt, num::NonZeroUsize, time::Duration};

use crate::error::{LockError, Status};

#[cfg(any(test, feature = "std"))]
mod allocator;
#[cfg(any(test, feature = "std"))]
mod host;

#[cfg(any(test, feature = "std"))]
pub use host::{HostKernel, HostSemaphore};

/// Identity of a kernel thread.
///
/// Never zero, so `0` is free to mean "no thread" inside atomics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ThreadId(NonZeroUsize);

impl ThreadId {
    pub const fn from_raw(raw: usize) -> Option<Self> {
        match NonZeroUsize::new(raw) {
            Some(id) => Some(Self(id)),
            None => None,
        }
    }

    #[inline(always)]
    pub const fn as_raw(self) -> usize {
        self.0.get()
    }
}

impl From<ThreadId> for usize {
    fn from(value: ThreadId) -> Self {
        value.as_raw()
    }
}

impl fmt::Display for ThreadId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// How long a blocking acquire may wait.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Timeout {
    Infinite,
    Relative(Duration),
}

impl From<Duration> for Timeout {
    fn from(value: Duration) -> Self {
        Timeout::Relative(value)
    }
}

/// A named counting semaphore owned by the kernel.
///
/// Dropping the handle deletes the semaphore. Nobody may be blocked on it at
/// that point.
pub trait KernelSemaphore: Send + Sync {
    /// Takes `count` units at once, or none at all if `timeout` expires.
    fn acquire_etc(&self, count: u32, timeout: Timeout) -> Status;

    /// Returns `count` units, waking as many waiters as they satisfy.
    fn release_etc(&self, count: u32) -> Status;

    #[inline]
    fn acquire(&self) -> Status {
        self.acquire_etc(1, Timeout::Infinite)
    }

    #[inline]
    fn release(&self) -> Status {
        self.release_etc(1)
    }
}

/// The services a lock needs from the kernel underneath.
pub trait Kernel: Clone + Send + Sync {
    type Semaphore: KernelSemaphore;

    /// Creates a semaphore holding `count` units.
    fn create_semaphore(&self, name: &str, count: u32) -> Result<Self::Semaphore, LockError>;

    /// Identity of the calling thread, stable for its whole lifetime.
    fn current_thread(&self) -> ThreadId;

    /// Puts the calling thread to sleep for roughly `duration`.
    fn snooze(&self, duration: Duration);
}
