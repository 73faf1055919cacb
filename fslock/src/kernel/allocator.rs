use core::sync::atomic::{AtomicUsize, Ordering};

use lazy_static::lazy_static;
use spin::Mutex;

use super::ThreadId;

lazy_static! {
    static ref TID_ALLOCATOR: RecycleAllocator = RecycleAllocator::new();
}

std::thread_local! {
    static CURRENT: ThreadHandle = ThreadHandleAllocator::allocate();
}

/// Identity of the calling std thread, allocated on first use.
pub fn current_thread_id() -> ThreadId {
    CURRENT.with(ThreadHandle::id)
}

pub struct ThreadHandleAllocator;
impl ThreadHandleAllocator {
    pub fn allocate() -> ThreadHandle {
        ThreadHandle::new()
    }
}

/// Owns a thread id for as long as its thread lives.
#[derive(Debug, PartialEq, Eq)]
pub struct ThreadHandle(ThreadId);

impl ThreadHandle {
    fn new() -> Self {
        let raw = TID_ALLOCATOR.alloc();
        // The allocator starts at 1
        match ThreadId::from_raw(raw) {
            Some(id) => Self(id),
            None => unreachable!("thread id allocator handed out 0"),
        }
    }

    #[inline(always)]
    pub fn id(&self) -> ThreadId {
        self.0
    }
}

impl Drop for ThreadHandle {
    fn drop(&mut self) {
        TID_ALLOCATOR.dealloc(self.0.as_raw());
    }
}

pub struct RecycleAllocator {
    current: AtomicUsize,
    recycled: Mutex<Vec<usize>>,
}

impl RecycleAllocator {
    pub fn new() -> Self {
        RecycleAllocator {
            current: AtomicUsize::new(1),
            recycled: Mutex::new(Vec::new()),
        }
    }

    pub fn alloc(&self) -> usize {
        if let Some(id) = self.recycled.lock().pop() {
            return id;
        }

        self.current.fetch_add(1, Ordering::AcqRel)
    }

    pub fn dealloc(&self, id: usize) {
        let mut recycled = self.recycled.lock();
        assert!(id != 0 && id < self.current.load(Ordering::Acquire));
        assert!(
            !recycled.iter().any(|i| *i == id),
            "thread id {} has been deallocated!",
            id
        );
        recycled.push(id);
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::lock_test;

    #[lock_test]
    fn recycled_ids_are_reused() {
        let allocator = RecycleAllocator::new();
        let first = allocator.alloc();
        let second = allocator.alloc();
        assert_eq!((first, second), (1, 2));

        allocator.dealloc(first);
        assert_eq!(allocator.alloc(), first);
        assert_eq!(allocator.alloc(), 3);
    }

    #[lock_test]
    #[should_panic(expected = "has been deallocated")]
    fn double_dealloc_is_caught() {
        let allocator = RecycleAllocator::new();
        let id = allocator.alloc();
        allocator.dealloc(id);
        allocator.dealloc(id);
    }

    #[lock_test]
    fn live_threads_have_distinct_ids() {
        let here = current_thread_id();
        assert_eq!(here, current_thread_id());

        let there = std::thread::spawn(current_thread_id).join().unwrap();
        assert_ne!(here, there);
    }
}
