//! Instrumentation for the concurrency tests: records who is inside a
//! critical section and fails the test when exclusion is broken.

use core::{
    sync::atomic::{AtomicUsize, Ordering},
    time::Duration,
};

#[derive(Default)]
pub struct Probe {
    readers: AtomicUsize,
    writers: AtomicUsize,
    entries: AtomicUsize,
}

impl Probe {
    pub fn new() -> Self {
        Self::default()
    }

    /// Exclusive section: nobody else may be inside.
    pub fn write(&self, hold: Duration) {
        let writers = self.writers.fetch_add(1, Ordering::SeqCst);
        assert_eq!(writers, 0, "two writers inside");
        assert_eq!(self.readers.load(Ordering::SeqCst), 0, "writer entered while readers inside");

        std::thread::sleep(hold);
        self.entries.fetch_add(1, Ordering::SeqCst);

        assert_eq!(self.readers.load(Ordering::SeqCst), 0, "reader entered while writer inside");
        self.writers.fetch_sub(1, Ordering::SeqCst);
    }

    /// Shared section: other readers are fine, writers are not.
    pub fn read(&self, hold: Duration) {
        self.readers.fetch_add(1, Ordering::SeqCst);
        assert_eq!(self.writers.load(Ordering::SeqCst), 0, "reader entered while writer inside");

        std::thread::sleep(hold);
        self.entries.fetch_add(1, Ordering::SeqCst);

        assert_eq!(self.writers.load(Ordering::SeqCst), 0, "writer entered while readers inside");
        self.readers.fetch_sub(1, Ordering::SeqCst);
    }

    pub fn readers(&self) -> usize {
        self.readers.load(Ordering::SeqCst)
    }

    /// Completed sections of either kind.
    pub fn entries(&self) -> usize {
        self.entries.load(Ordering::SeqCst)
    }
}
