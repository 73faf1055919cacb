use core::time::Duration;

pub const MAX_READERS: i32 = 100_000;             // Reader slots of a ReadWriteLock
pub const SIMPLE_LOCK_SNOOZE: Duration = Duration::from_micros(500);    // SimpleLock::lock backoff
pub const SIMPLE_LOCKER_SNOOZE: Duration = Duration::from_micros(1000); // SimpleLocker backoff

pub const RW_LOCK_NAME: &str = "bfs r/w lock";
pub const RW_WRITE_LOCK_NAME: &str = "bfs r/w w-lock";

// Note: FastReadWriteLock breaks if MAX_READERS readers ever hold the lock at once,
// and the counter leaves i32 after ~20000 queued writers.

/// Semaphores and recursive locks start in benaphore mode.
pub const USE_BENAPHORE: bool = cfg!(feature = "benaphore");
