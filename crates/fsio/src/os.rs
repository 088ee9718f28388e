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

use crate::error::{DiskError, Result};
use std::borrow::Cow;
use std::fs::File;
use std::io;
use std::path::Path;

/// Longest single path segment, NAME_MAX on every supported Unix.
pub const MAX_SEGMENT_LEN: usize = 255;
/// Whole-path limit on Linux (PATH_MAX, terminating NUL excluded).
pub const LINUX_MAX_PATH_LEN: usize = 4095;
/// Whole-path limit on macOS.
pub const MACOS_MAX_PATH_LEN: usize = 1016;
/// Whole-path limit on Windows. There is no NAME_MAX there.
pub const WINDOWS_MAX_PATH_LEN: usize = 1024;

/// Check path length according to OS limits. Lengths are raw bytes, so
/// names that are not valid UTF-8 are measured as stored.
pub fn check_path_length(path_name: &[u8]) -> Result<()> {
    if cfg!(target_os = "macos") && path_name.len() > MACOS_MAX_PATH_LEN {
        return Err(DiskError::FileNameTooLong);
    }

    if cfg!(target_os = "windows") && path_name.len() > WINDOWS_MAX_PATH_LEN {
        return Err(DiskError::FileNameTooLong);
    }

    if cfg!(target_os = "linux") && path_name.len() > LINUX_MAX_PATH_LEN {
        return Err(DiskError::FileNameTooLong);
    }

    // On Unix we reject paths if they are just '.', '..' or '/'
    let invalid_paths: [&[u8]; 3] = [b".", b"..", b"/"];
    if invalid_paths.contains(&path_name) {
        return Err(DiskError::FileAccessDenied);
    }

    let mut count = 0usize;
    for &c in path_name {
        match c {
            b'/' => count = 0,
            b'\\' if cfg!(target_os = "windows") => count = 0,
            _ => {
                count += 1;
                if count > MAX_SEGMENT_LEN {
                    return Err(DiskError::FileNameTooLong);
                }
            }
        }
    }

    Ok(())
}

/// Rejects empty and over-long paths before any syscall is attempted.
pub fn validate_path(path: &Path) -> Result<()> {
    if path.as_os_str().is_empty() {
        return Err(DiskError::InvalidArgument);
    }

    check_path_length(path.as_os_str().as_encoded_bytes())
}

/// Prefixes absolute Windows paths with `\\?\` once they get close to
/// MAX_PATH, lifting the 260 character limit of the Win32 API.
#[cfg(windows)]
pub fn long_path(path: &Path) -> Cow<'_, Path> {
    const LONG_PATH_PREFIX: &str = r"\\?\";

    let s = path.to_string_lossy();
    if s.len() < 248 || !path.is_absolute() || s.starts_with(LONG_PATH_PREFIX) {
        return Cow::Borrowed(path);
    }

    Cow::Owned(std::path::PathBuf::from(format!("{LONG_PATH_PREFIX}{}", s.replace('/', "\\"))))
}

#[cfg(not(windows))]
pub fn long_path(path: &Path) -> Cow<'_, Path> {
    Cow::Borrowed(path)
}

/// Reserves `len` bytes starting at `offset` for `file`.
#[cfg(target_os = "linux")]
pub fn fallocate(file: &File, offset: u64, len: u64) -> io::Result<()> {
    use std::os::fd::AsRawFd;

    let too_big = || io::Error::from_raw_os_error(libc::EFBIG);
    let offset = libc::off_t::try_from(offset).map_err(|_| too_big())?;
    let len = libc::off_t::try_from(len).map_err(|_| too_big())?;

    loop {
        // SAFETY: the descriptor is owned by `file` and outlives the call.
        let ret = unsafe { libc::fallocate(file.as_raw_fd(), 0, offset, len) };
        if ret == 0 {
            return Ok(());
        }

        let err = io::Error::last_os_error();
        if err.kind() != io::ErrorKind::Interrupted {
            return Err(err);
        }
    }
}

#[cfg(not(target_os = "linux"))]
pub fn fallocate(_file: &File, _offset: u64, _len: u64) -> io::Result<()> {
    Err(io::Error::from(io::ErrorKind::Unsupported))
}

/// Switches `O_DIRECT` on an open descriptor.
#[cfg(target_os = "linux")]
pub fn set_direct_io(file: &File, enable: bool) -> io::Result<()> {
    use std::os::fd::AsRawFd;

    let fd = file.as_raw_fd();
    // SAFETY: F_GETFL/F_SETFL take no pointer arguments.
    let flags = unsafe { libc::fcntl(fd, libc::F_GETFL) };
    if flags < 0 {
        return Err(io::Error::last_os_error());
    }

    let flags = if enable {
        flags | libc::O_DIRECT
    } else {
        flags & !libc::O_DIRECT
    };

    // SAFETY: see above.
    if unsafe { libc::fcntl(fd, libc::F_SETFL, flags) } < 0 {
        return Err(io::Error::last_os_error());
    }

    Ok(())
}

#[cfg(not(target_os = "linux"))]
pub fn set_direct_io(_file: &File, _enable: bool) -> io::Result<()> {
    Err(io::Error::from(io::ErrorKind::Unsupported))
}

/// Switches `O_NONBLOCK` on an open descriptor.
#[cfg(unix)]
pub fn set_nonblocking(file: &File, enable: bool) -> io::Result<()> {
    use std::os::fd::AsRawFd;

    let fd = file.as_raw_fd();
    // SAFETY: F_GETFL/F_SETFL take no pointer arguments.
    let flags = unsafe { libc::fcntl(fd, libc::F_GETFL) };
    if flags < 0 {
        return Err(io::Error::last_os_error());
    }

    let flags = if enable {
        flags | libc::O_NONBLOCK
    } else {
        flags & !libc::O_NONBLOCK
    };

    // SAFETY: see above.
    if unsafe { libc::fcntl(fd, libc::F_SETFL, flags) } < 0 {
        return Err(io::Error::last_os_error());
    }

    Ok(())
}

#[cfg(not(unix))]
pub fn set_nonblocking(_file: &File, _enable: bool) -> io::Result<()> {
    Ok(())
}

/// Open flags for a named destination file.
#[cfg(unix)]
pub(crate) fn write_custom_flags(osync: bool, odirect: bool) -> i32 {
    let mut flags = 0;
    if osync {
        flags |= libc::O_SYNC;
    }
    #[cfg(target_os = "linux")]
    if odirect {
        flags |= libc::O_DIRECT;
    }
    #[cfg(not(target_os = "linux"))]
    let _ = odirect;
    flags
}

/// Open flags for an unnamed inode created inside a directory.
#[cfg(target_os = "linux")]
pub(crate) fn tmpfile_custom_flags(odirect: bool) -> i32 {
    let mut flags = libc::O_TMPFILE;
    if odirect {
        flags |= libc::O_DIRECT;
    }
    flags
}

/// Path under `/proc` through which an unnamed inode can be linked.
#[cfg(target_os = "linux")]
pub(crate) fn proc_fd_path(file: &File) -> std::path::PathBuf {
    use std::os::fd::AsRawFd;

    std::path::PathBuf::from(format!("/proc/self/fd/{}", file.as_raw_fd()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_check_path_length_segments() {
        assert!(check_path_length(b"/data/bucket/object").is_ok());

        let segment = "a".repeat(MAX_SEGMENT_LEN);
        assert!(check_path_length(format!("/data/{segment}/x").as_bytes()).is_ok());

        let segment = "a".repeat(MAX_SEGMENT_LEN + 1);
        assert_eq!(
            check_path_length(format!("/data/{segment}/x").as_bytes()),
            Err(DiskError::FileNameTooLong)
        );
    }

    #[test]
    fn test_check_path_length_reserved_names() {
        for p in [".", "..", "/"] {
            assert_eq!(check_path_length(p.as_bytes()), Err(DiskError::FileAccessDenied), "{p}");
        }
        assert!(check_path_length(b"./a").is_ok());
    }

    #[test]
    fn test_check_path_length_whole_path() {
        // Short segments, long total.
        let path = "/abcdefgh".repeat(460);
        assert!(path.len() > LINUX_MAX_PATH_LEN);
        if cfg!(any(target_os = "linux", target_os = "macos", target_os = "windows")) {
            assert_eq!(check_path_length(path.as_bytes()), Err(DiskError::FileNameTooLong));
        }
    }

    #[test]
    fn test_validate_path_empty() {
        assert_eq!(validate_path(Path::new("")), Err(DiskError::InvalidArgument));
        assert!(validate_path(Path::new("/tmp/x")).is_ok());
    }

    #[cfg(unix)]
    #[test]
    fn test_validate_path_counts_raw_bytes() {
        use std::ffi::OsStr;
        use std::os::unix::ffi::OsStrExt;

        let mut raw = b"/data/".to_vec();
        raw.extend(std::iter::repeat_n(0xFFu8, 100));
        assert!(validate_path(Path::new(OsStr::from_bytes(&raw))).is_ok());

        let mut raw = b"/data/".to_vec();
        raw.extend(std::iter::repeat_n(0xFFu8, MAX_SEGMENT_LEN + 1));
        assert_eq!(
            validate_path(Path::new(OsStr::from_bytes(&raw))),
            Err(DiskError::FileNameTooLong)
        );
    }

    #[cfg(target_os = "linux")]
    #[test]
    fn test_fallocate_reserves_size() {
        let dir = tempfile::tempdir().unwrap();
        let file = File::create(dir.path().join("prealloc")).unwrap();
        match fallocate(&file, 0, 8192) {
            Ok(()) => assert_eq!(file.metadata().unwrap().len(), 8192),
            // tmpfs/overlay variants without fallocate support
            Err(e) => assert!(crate::error_conv::to_falloc_error(e).is_none()),
        }
    }

    #[cfg(target_os = "linux")]
    #[test]
    fn test_fallocate_rejects_oversized_length() {
        let dir = tempfile::tempdir().unwrap();
        let file = File::create(dir.path().join("prealloc")).unwrap();
        let err = fallocate(&file, 0, u64::MAX).unwrap_err();
        assert_eq!(err.raw_os_error(), Some(libc::EFBIG));
    }

    #[cfg(target_os = "linux")]
    #[test]
    fn test_custom_flags() {
        assert_eq!(write_custom_flags(false, false), 0);
        assert_eq!(write_custom_flags(true, false), libc::O_SYNC);
        assert_eq!(write_custom_flags(true, true), libc::O_SYNC | libc::O_DIRECT);
        assert_eq!(tmpfile_custom_flags(false) & libc::O_TMPFILE, libc::O_TMPFILE);
    }
}
