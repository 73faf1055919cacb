//! Locking primitives, leaves first
//!
//! - [`Semaphore`] + [`Locker`]
//! - [`RecursiveLock`] + [`RecursiveLocker`]
//! - [`ReadWriteLock`] + [`ReadLocked`] / [`WriteLocked`]
//! - [`SimpleLock`] + [`SimpleLocker`]
//!
//! A lock lives as long as the inode it protects. Nobody may be blocked on
//! it when it is dropped; the owner of the inode has to make sure of that.

pub mod recursive;
pub mod rw;
pub mod semaphore;
pub mod spin;

#[cfg(test)]
mod probe;

pub use recursive::{RecursiveLock, RecursiveLocker};
pub use rw::{
    FastReadWriteLock, RawReadWriteLock, ReadLocked, ReadWriteLock, SimpleReadWriteLock,
    WriteLocked,
};
pub use semaphore::{Locker, Semaphore, SemaphoreMode};
pub use spin::{SimpleLock, SimpleLocker};
