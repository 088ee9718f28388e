// Copyright 2024 RustFS Team
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Translation of raw OS errors into [`DiskError`].
//!
//! Which storage error a raw error becomes depends on the operation that
//! produced it: a missing path is `FileNotFound` for a stat, `VolumeNotFound`
//! for a directory removal and an inaccessible parent for `mkdir`. Each
//! [`ErrorScope`] names one of those contexts.

use crate::error::DiskError;
use std::io::{self, ErrorKind};

#[cfg(unix)]
mod errno {
    pub use libc::{EINVAL, EIO, EISDIR, EMFILE, ENAMETOOLONG, ENFILE, ENOSPC, ENOSYS, ENOTDIR, ENOTEMPTY, ENOTSUP, EOPNOTSUPP, EXDEV};
    // Only Windows reports a missing intermediate component separately.
    pub const PATH_NOT_FOUND: i32 = -1;
}

#[cfg(not(unix))]
mod errno {
    // Win32 system error codes with the same meaning.
    pub const EINVAL: i32 = 87; // ERROR_INVALID_PARAMETER
    pub const EIO: i32 = 1117; // ERROR_IO_DEVICE
    pub const EISDIR: i32 = -1;
    pub const EMFILE: i32 = 4; // ERROR_TOO_MANY_OPEN_FILES
    pub const ENAMETOOLONG: i32 = 206; // ERROR_FILENAME_EXCED_RANGE
    pub const ENFILE: i32 = 4;
    pub const ENOSPC: i32 = 112; // ERROR_DISK_FULL
    pub const ENOSYS: i32 = 50; // ERROR_NOT_SUPPORTED
    pub const ENOTDIR: i32 = 267; // ERROR_DIRECTORY
    pub const ENOTEMPTY: i32 = 145; // ERROR_DIR_NOT_EMPTY
    pub const EOPNOTSUPP: i32 = 50;
    pub const ENOTSUP: i32 = 50;
    pub const EXDEV: i32 = 17; // ERROR_NOT_SAME_DEVICE
    pub const PATH_NOT_FOUND: i32 = 3; // ERROR_PATH_NOT_FOUND
}

fn has_errno(err: &io::Error, codes: &[i32]) -> bool {
    err.raw_os_error().is_some_and(|code| codes.contains(&code))
}

pub fn is_sys_err_no_space(err: &io::Error) -> bool {
    err.kind() == ErrorKind::StorageFull || has_errno(err, &[errno::ENOSPC])
}

pub fn is_sys_err_io(err: &io::Error) -> bool {
    has_errno(err, &[errno::EIO])
}

pub fn is_sys_err_invalid_arg(err: &io::Error) -> bool {
    has_errno(err, &[errno::EINVAL])
}

/// `ENOSYS` and `EOPNOTSUPP`/`ENOTSUP` (identical on Linux).
pub fn is_sys_err_not_supported(err: &io::Error) -> bool {
    err.kind() == ErrorKind::Unsupported || has_errno(err, &[errno::ENOSYS, errno::EOPNOTSUPP, errno::ENOTSUP])
}

pub fn is_sys_err_not_dir(err: &io::Error) -> bool {
    err.kind() == ErrorKind::NotADirectory || has_errno(err, &[errno::ENOTDIR])
}

pub fn is_sys_err_is_dir(err: &io::Error) -> bool {
    err.kind() == ErrorKind::IsADirectory || has_errno(err, &[errno::EISDIR])
}

pub fn is_sys_err_not_empty(err: &io::Error) -> bool {
    err.kind() == ErrorKind::DirectoryNotEmpty || has_errno(err, &[errno::ENOTEMPTY])
}

/// A missing intermediate component. POSIX folds this into `ENOENT`.
pub fn is_sys_err_path_not_found(err: &io::Error) -> bool {
    if cfg!(windows) {
        has_errno(err, &[errno::PATH_NOT_FOUND])
    } else {
        err.kind() == ErrorKind::NotFound
    }
}

pub fn is_sys_err_too_long(err: &io::Error) -> bool {
    err.kind() == ErrorKind::InvalidFilename || has_errno(err, &[errno::ENAMETOOLONG])
}

pub fn is_sys_err_too_many_files(err: &io::Error) -> bool {
    has_errno(err, &[errno::EMFILE, errno::ENFILE])
}

pub fn is_sys_err_cross_device(err: &io::Error) -> bool {
    err.kind() == ErrorKind::CrossesDevices || has_errno(err, &[errno::EXDEV])
}

/// The operation a raw error came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorScope {
    /// Stat, open, rename and link of a single file.
    File,
    /// Lookup of a directory acting as a volume.
    Volume,
    /// Creation of exactly one directory level.
    Mkdir,
    /// Removal of an empty directory.
    RemoveDir,
    /// Recursive removal.
    RemoveAll,
    /// Creation of the parent chain of a file about to be written.
    ParentDir,
    /// Removal of a file or empty directory during delete.
    Delete,
    /// Rename of a file onto a destination.
    Rename,
}

/// Maps `err` into the storage taxonomy according to `scope`.
/// Errors without a storage meaning come back as [`DiskError::Io`].
pub fn translate(err: io::Error, scope: ErrorScope) -> DiskError {
    match scope {
        ErrorScope::File => to_file_error(err),
        ErrorScope::Volume => to_volume_error(err),
        ErrorScope::Mkdir => to_mkdir_error(err),
        ErrorScope::RemoveDir => to_remove_dir_error(err),
        ErrorScope::RemoveAll => to_remove_all_error(err),
        ErrorScope::ParentDir => to_parent_dir_error(err),
        ErrorScope::Delete => to_delete_error(err),
        ErrorScope::Rename => to_rename_error(err),
    }
}

pub fn to_file_error(err: io::Error) -> DiskError {
    match err.kind() {
        ErrorKind::NotFound => return DiskError::FileNotFound,
        ErrorKind::PermissionDenied => return DiskError::FileAccessDenied,
        _ => {}
    }

    if is_sys_err_not_dir(&err) {
        // One of the parents is a file, the path cannot be verified.
        DiskError::FileAccessDenied
    } else if is_sys_err_is_dir(&err) {
        DiskError::IsNotRegular
    } else if is_sys_err_io(&err) {
        DiskError::FaultyDisk
    } else if is_sys_err_no_space(&err) {
        DiskError::DiskFull
    } else if is_sys_err_too_long(&err) {
        DiskError::FileNameTooLong
    } else if is_sys_err_too_many_files(&err) {
        DiskError::TooManyOpenFiles
    } else if is_sys_err_cross_device(&err) {
        DiskError::CrossDeviceLink
    } else {
        DiskError::from(err)
    }
}

pub fn to_volume_error(err: io::Error) -> DiskError {
    match err.kind() {
        ErrorKind::NotFound => DiskError::VolumeNotFound,
        ErrorKind::PermissionDenied => DiskError::VolumeAccessDenied,
        _ if is_sys_err_not_dir(&err) => DiskError::VolumeAccessDenied,
        _ if is_sys_err_io(&err) => DiskError::FaultyDisk,
        _ => DiskError::from(err),
    }
}

pub fn to_mkdir_error(err: io::Error) -> DiskError {
    if err.kind() == ErrorKind::AlreadyExists {
        DiskError::VolumeExists
    } else if err.kind() == ErrorKind::PermissionDenied || is_sys_err_not_dir(&err) || is_sys_err_path_not_found(&err) {
        DiskError::DiskAccessDenied
    } else {
        DiskError::from(err)
    }
}

pub fn to_remove_dir_error(err: io::Error) -> DiskError {
    if err.kind() == ErrorKind::NotFound {
        DiskError::VolumeNotFound
    } else if is_sys_err_not_empty(&err) {
        DiskError::VolumeNotEmpty
    } else {
        DiskError::from(err)
    }
}

pub fn to_remove_all_error(err: io::Error) -> DiskError {
    if err.kind() == ErrorKind::PermissionDenied {
        DiskError::VolumeAccessDenied
    } else if is_sys_err_not_empty(&err) {
        DiskError::VolumeNotEmpty
    } else {
        DiskError::from(err)
    }
}

pub fn to_parent_dir_error(err: io::Error) -> DiskError {
    if matches!(err.kind(), ErrorKind::PermissionDenied | ErrorKind::AlreadyExists) || is_sys_err_not_dir(&err) {
        DiskError::FileAccessDenied
    } else if is_sys_err_io(&err) {
        DiskError::FaultyDisk
    } else if is_sys_err_invalid_arg(&err) {
        DiskError::UnsupportedDisk
    } else if is_sys_err_no_space(&err) {
        DiskError::DiskFull
    } else {
        DiskError::from(err)
    }
}

pub fn to_delete_error(err: io::Error) -> DiskError {
    if err.kind() == ErrorKind::NotFound {
        DiskError::FileNotFound
    } else if err.kind() == ErrorKind::PermissionDenied {
        DiskError::FileAccessDenied
    } else if is_sys_err_io(&err) {
        DiskError::FaultyDisk
    } else {
        DiskError::from(err)
    }
}

pub fn to_rename_error(err: io::Error) -> DiskError {
    match err.kind() {
        ErrorKind::NotFound => return DiskError::FileNotFound,
        ErrorKind::PermissionDenied => return DiskError::FileAccessDenied,
        ErrorKind::AlreadyExists => return DiskError::IsNotRegular,
        _ => {}
    }

    if is_sys_err_not_dir(&err) {
        DiskError::FileAccessDenied
    } else if is_sys_err_not_empty(&err) || is_sys_err_is_dir(&err) {
        // The destination is a directory.
        DiskError::IsNotRegular
    } else {
        to_file_error(err)
    }
}

/// Preallocation failures. `None` means the failure only says the feature
/// is unavailable here and the write should go on without a reservation.
pub fn to_falloc_error(err: io::Error) -> Option<DiskError> {
    if is_sys_err_no_space(&err) {
        Some(DiskError::DiskFull)
    } else if is_sys_err_not_supported(&err) || is_sys_err_invalid_arg(&err) {
        // EINVAL is what some container storage drivers answer instead of EOPNOTSUPP.
        None
    } else if is_sys_err_io(&err) {
        Some(DiskError::Io(err))
    } else {
        Some(DiskError::Unexpected)
    }
}
