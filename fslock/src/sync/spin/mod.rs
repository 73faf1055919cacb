//! # Spin Locks Module
//!
//! Locks that never block in a kernel semaphore, for critical sections too
//! short to be worth one.
//!
//! ## Implementations
//! - [`SimpleLock`] - test-and-set on the holder's thread id, reentrant
//!   for the holder, snoozing between attempts
//!
//! ## Usage Guidelines
//! ```ignore
//! let lock = SimpleLock::new(&kernel);
//! {
//!     let _locker = SimpleLocker::new(&lock);
//!     // a few instructions on the inode
//! }
//! ```
//!
//! ## Safety
//! - Waiters sleep between attempts instead of burning the CPU, but a
//!   SimpleLock still MUST NOT be held across anything that may block
//! - Only the holder may unlock

mod simple_lock;
#[cfg(test)]
mod test;

pub use simple_lock::{SimpleLock, SimpleLocker};
