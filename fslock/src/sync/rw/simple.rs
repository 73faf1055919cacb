use super::RawReadWriteLock;
use crate::{
    config::{MAX_READERS, RW_LOCK_NAME},
    error::{LockError, Status},
    kernel::{Kernel, KernelSemaphore, Timeout},
};

/// Reader/writer lock made of one kernel semaphore with `MAX_READERS` units.
///
/// A reader holds one unit, a writer holds all of them, so a writer only gets
/// in once every reader has left and keeps new readers out until it unlocks.
pub struct SimpleReadWriteLock<K: Kernel> {
    semaphore: Result<K::Semaphore, LockError>,
}

impl<K: Kernel> SimpleReadWriteLock<K> {
    pub fn new(kernel: &K, name: &str) -> Self {
        let semaphore = kernel.create_semaphore(name, MAX_READERS as u32);
        if let Err(err) = &semaphore {
            log::warn!("r/w lock \"{}\": {}", name, err);
        }
        Self { semaphore }
    }

    pub fn with_default_name(kernel: &K) -> Self {
        Self::new(kernel, RW_LOCK_NAME)
    }

    pub fn create(kernel: &K, name: &str) -> Result<Self, LockError> {
        let lock = Self::new(kernel, name);
        lock.init_check()?;
        Ok(lock)
    }

    fn kernel_semaphore(&self) -> Result<&K::Semaphore, LockError> {
        self.semaphore.as_ref().map_err(|_| LockError::BadSemaphore)
    }
}

impl<K: Kernel> RawReadWriteLock for SimpleReadWriteLock<K> {
    fn init_check(&self) -> Status {
        self.semaphore.as_ref().map(|_| ()).map_err(|err| *err)
    }

    fn read_lock(&self) -> Status {
        self.kernel_semaphore()?.acquire()
    }

    fn read_unlock(&self) {
        if let Ok(semaphore) = self.kernel_semaphore() {
            let _ = semaphore.release();
        }
    }

    fn write_lock_with_timeout(&self, timeout: Timeout) -> Status {
        self.kernel_semaphore()?.acquire_etc(MAX_READERS as u32, timeout)
    }

    fn write_unlock(&self) {
        if let Ok(semaphore) = self.kernel_semaphore() {
            let _ = semaphore.release_etc(MAX_READERS as u32);
        }
    }
}
