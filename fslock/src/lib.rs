//! FSLOCK - locking primitives for filesystem metadata records
//!
//! Every open inode of the filesystem driver owns its own lock, so the
//! primitives here are built to be created by the thousand and to stay cheap
//! when nobody contends for them:
//! - [`Semaphore`] - counting semaphore wrapper, optionally a benaphore
//!   (atomic fast path, kernel semaphore only under contention)
//! - [`RecursiveLock`] - owner/depth tracking on top of a semaphore
//! - [`ReadWriteLock`] - many readers or one writer, two strategies
//! - [`SimpleLock`] - reentrant spinlock with snooze backoff
//!
//! Each primitive has a scoped guard releasing it on every exit path.
//!
//! # Architectural Overview
//! ```text
//! +--------------------------------------------+
//! |        filesystem metadata code            |
//! +--------------------------------------------+
//! | Locker | RecursiveLocker | Read/WriteLocked | SimpleLocker
//! +--------------------------------------------+
//! | Semaphore | RecursiveLock | ReadWriteLock   | SimpleLock
//! +--------------------------------------------+
//! |  Kernel: semaphores, thread ids, snooze    |
//! +--------------------------------------------+
//! ```
//!
//! The kernel is reached only through the [`kernel::Kernel`] capability that
//! each lock receives at construction. [`kernel::HostKernel`] provides it on
//! top of std threads.

#![cfg_attr(not(any(test, feature = "std")), no_std)]

pub mod config;
pub mod error;
pub mod kernel;
#[cfg(any(test, feature = "std"))]
pub mod logging;
pub mod sync;

#[cfg(test)]
pub(crate) use fslock_macros::lock_test;

pub use error::{LockError, Status};
pub use kernel::{Kernel, KernelSemaphore, ThreadId, Timeout};
#[cfg(any(test, feature = "std"))]
pub use kernel::HostKernel;
pub use sync::{
    FastReadWriteLock, Locker, RawReadWriteLock, ReadLocked, ReadWriteLock, RecursiveLock,
    RecursiveLocker, Semaphore, SemaphoreMode, SimpleLock, SimpleLocker, SimpleReadWriteLock,
    WriteLocked,
};
