//! Maps `EngineError` onto the `libc` errno values `fuser`'s reply types
//! expect, per the taxonomy in this crate's design notes.

use libc::c_int;
use mirrorfs_core::EngineError;

pub fn to_errno(err: &EngineError) -> c_int {
    match err {
        EngineError::NotFound(_) => libc::ENOENT,
        EngineError::PermissionDenied(_) => libc::EACCES,
        EngineError::ReadOnlyFs => libc::EROFS,
        EngineError::NotImplemented => libc::ENOSYS,
        EngineError::CacheMiss(_) => libc::EIO,
        EngineError::IoError(_) => libc::EIO,
        EngineError::DecodeError(_) => libc::EIO,
        EngineError::EncodeError(_) => libc::EIO,
        EngineError::InvalidArgument(_) => libc::EINVAL,
    }
}
