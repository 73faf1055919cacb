//! Lock status codes, in the spirit of the kernel's `status_t`

use strum::{Display, FromRepr};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, FromRepr)]
#[repr(i32)]
pub enum LockError {
    /// The kernel semaphore table is full
    #[strum(serialize = "No more semaphores")]
    NoMoreSemaphores = -2,
    /// The lock never got a valid semaphore, or it was deleted
    #[strum(serialize = "Bad semaphore ID")]
    BadSemaphore = -3,
    #[strum(serialize = "Operation timed out")]
    TimedOut = -4,
    /// Unlock attempted by a thread that does not hold the lock
    #[strum(serialize = "Not the lock owner")]
    NotOwner = -5,
}

/// `Ok(())` is `B_OK`
pub type Status = Result<(), LockError>;

impl LockError {
    /// Raised while constructing a lock, see `init_check`.
    pub fn is_init_error(&self) -> bool {
        matches!(self, LockError::NoMoreSemaphores | LockError::BadSemaphore)
    }

    pub fn is_timeout(&self) -> bool {
        *self == LockError::TimedOut
    }
}

impl TryFrom<i32> for LockError {
    type Error = ();

    fn try_from(value: i32) -> Result<Self, Self::Error> {
        LockError::from_repr(value).ok_or(())
    }
}

impl From<LockError> for i32 {
    fn from(value: LockError) -> Self {
        value as i32
    }
}
