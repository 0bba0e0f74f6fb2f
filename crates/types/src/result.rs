//! Error taxonomy returned by every runtime operation.

use thiserror::Error;

/// POSIX codes the reference runtime reports for each error kind.
pub mod errno {
    pub const ENOENT: i32 = 2;
    pub const ENOMEM: i32 = 12;
    pub const EBUSY: i32 = 16;
    pub const EEXIST: i32 = 17;
    pub const EINVAL: i32 = 22;
}

/// Failure kinds. None of them are fatal; the caller owns retry policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Error)]
pub enum Error {
    /// Malformed input, detected before any state is touched.
    #[error("invalid argument")]
    InvalidArgument,
    /// The system could not supply a new segment.
    #[error("out of memory")]
    OutOfMemory,
    /// The map already holds `max_entries` elements.
    #[error("map is at capacity")]
    OutOfCapacity,
    /// `NoExist` update on a key that is present.
    #[error("element already exists")]
    AlreadyExists,
    /// `Exist` update, delete or iteration step on a key that is absent.
    #[error("element not found")]
    NotFound,
}

pub type Result<T> = core::result::Result<T, Error>;

impl Error {
    /// POSIX code used when the error crosses the ioctl boundary.
    pub const fn errno(self) -> i32 {
        match self {
            Error::InvalidArgument => errno::EINVAL,
            Error::OutOfMemory => errno::ENOMEM,
            Error::OutOfCapacity => errno::EBUSY,
            Error::AlreadyExists => errno::EEXIST,
            Error::NotFound => errno::ENOENT,
        }
    }

    pub const fn from_errno(code: i32) -> Option<Self> {
        match code {
            errno::EINVAL => Some(Error::InvalidArgument),
            errno::ENOMEM => Some(Error::OutOfMemory),
            errno::EBUSY => Some(Error::OutOfCapacity),
            errno::EEXIST => Some(Error::AlreadyExists),
            errno::ENOENT => Some(Error::NotFound),
            _ => None,
        }
    }
}

/// Collapses a result into the `0 | errno` convention of the C ABI.
pub fn to_errno<T>(res: &Result<T>) -> i32 {
    match res {
        Ok(_) => 0,
        Err(err) => err.errno(),
    }
}
