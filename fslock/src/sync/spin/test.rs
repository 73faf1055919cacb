use core::{
    sync::atomic::{AtomicBool, Ordering},
    time::Duration,
};

use super::{SimpleLock, SimpleLocker};
use crate::{error::LockError, kernel::HostKernel, lock_test, sync::probe::Probe};

#[lock_test]
fn basic_lock_unlock() {
    let kernel = HostKernel::new();
    let lock = SimpleLock::new(&kernel);
    assert!(!lock.is_locked());
    {
        let _locker = SimpleLocker::new(&lock);
        assert!(lock.is_locked());
        assert_eq!(lock.depth(), 1);
    } // the locker leaves scope and unlocks
    assert!(!lock.is_locked());
    assert_eq!(lock.depth(), 0);
}

#[lock_test]
fn holder_nests_and_other_thread_waits_for_both_unlocks() {
    let kernel = HostKernel::new();
    let lock = SimpleLock::new(&kernel);
    let acquired = AtomicBool::new(false);

    lock.lock();
    lock.lock();
    assert_eq!(lock.depth(), 2);

    std::thread::scope(|s| {
        s.spawn(|| {
            assert!(!lock.is_locked());
            lock.lock_with_snooze(Duration::from_micros(100));
            acquired.store(true, Ordering::SeqCst);
            assert!(lock.is_locked());
            lock.unlock();
        });

        std::thread::sleep(Duration::from_millis(20));
        lock.unlock();
        std::thread::sleep(Duration::from_millis(20));
        assert!(!acquired.load(Ordering::SeqCst), "entered while still nested once");
        assert!(lock.is_locked());
        lock.unlock();
    });

    assert!(acquired.load(Ordering::SeqCst));
    assert!(!lock.is_locked());
}

#[lock_test]
fn try_lock_fails_only_for_other_threads() {
    let kernel = HostKernel::new();
    let lock = SimpleLock::new(&kernel);

    assert!(lock.try_lock());
    assert!(lock.try_lock());
    std::thread::scope(|s| {
        assert!(!s.spawn(|| lock.try_lock()).join().unwrap());
    });
    lock.unlock();
    lock.unlock();

    std::thread::scope(|s| {
        s.spawn(|| {
            assert!(lock.try_lock());
            lock.unlock();
        });
    });
}

#[lock_test]
fn bounded_wait_times_out() {
    let kernel = HostKernel::new();
    let lock = SimpleLock::new(&kernel);
    lock.lock();

    std::thread::scope(|s| {
        let waiter = s.spawn(|| {
            lock.lock_with_timeout(Duration::from_micros(500), Duration::from_millis(5).into())
        });
        assert_eq!(waiter.join().unwrap(), Err(LockError::TimedOut));
    });

    // The holder itself is never refused
    assert_eq!(lock.lock_with_timeout(Duration::from_micros(500), Duration::ZERO.into()), Ok(()));
    lock.unlock();
    lock.unlock();
    assert_eq!(lock.depth(), 0);
}

#[lock_test]
fn contended_simple_lock_excludes() {
    let kernel = HostKernel::new();
    let lock = SimpleLock::new(&kernel);
    let probe = Probe::new();

    std::thread::scope(|s| {
        for _ in 0..6 {
            s.spawn(|| {
                for _ in 0..25 {
                    let _outer = SimpleLocker::with_snooze(&lock, Duration::from_micros(20));
                    let _inner = SimpleLocker::new(&lock);
                    probe.write(Duration::from_micros(20));
                }
            });
        }
    });

    assert_eq!(probe.entries(), 150);
    assert!(!lock.is_locked());
    assert!(lock.try_lock());
    lock.unlock();
}

#[lock_test]
fn releasing_a_free_lock_keeps_it_usable() {
    let kernel = HostKernel::new();
    let lock = SimpleLock::new(&kernel);

    lock.release();
    assert_eq!(lock.depth(), 0);
    assert!(!lock.is_locked());

    lock.lock();
    assert_eq!(lock.depth(), 1);
    lock.unlock();
    assert_eq!(lock.depth(), 0);
    std::thread::scope(|s| {
        s.spawn(|| {
            assert!(lock.try_lock());
            lock.unlock();
        });
    });
}

#[cfg(debug_assertions)]
#[lock_test]
#[should_panic(expected = "SimpleLock unlocked by")]
fn unlock_by_non_holder_panics() {
    let kernel = HostKernel::new();
    let lock = SimpleLock::new(&kernel);
    lock.unlock();
}
