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

//! Vendor ioctl fast path for directory mutation.
//!
//! Some cluster filesystems accept create, link and unlink requests as
//! ioctls on an open directory, skipping the path walk of the regular
//! syscalls. Whether they are usable is decided once, when the
//! [`crate::LocalFs`] is built; callers only ever see a [`FastPath`] and
//! fall back to the regular primitives whenever it reports an error.

use crate::error::{DiskError, Result};
use std::ffi::OsStr;
use std::fmt::Debug;
use std::fs::File;
use std::path::Path;
use std::sync::Arc;

/// 'MKND': create an inode under a directory.
pub const OP_MAKE_NODE: u32 = 0x4D4B_4E44;
/// 'LINK': give an unnamed inode a name under a directory.
pub const OP_LINK: u32 = 0x4C49_4E4B;
/// 'ULNK': remove a name from a directory.
pub const OP_UNLINK: u32 = 0x554C_4E4B;
/// 'STAT': fill the inode identifiers of a directory.
pub const OP_STAT: u32 = 0x5354_4154;

pub const FAST_PATH_NAME_LEN: usize = 256;

/// Parameter block handed to the driver by address.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FastPathParam {
    pub inode_id: u64,
    pub inode_supplemental: u64,
    pub mode: i32,
    /// NUL padded, always NUL terminated.
    pub filename: [u8; FAST_PATH_NAME_LEN],
}

impl Default for FastPathParam {
    fn default() -> Self {
        Self {
            inode_id: 0,
            inode_supplemental: 0,
            mode: 0,
            filename: [0; FAST_PATH_NAME_LEN],
        }
    }
}

impl FastPathParam {
    pub fn new(name: &OsStr, mode: u32) -> Result<Self> {
        let mut param = Self {
            mode: i32::try_from(mode).map_err(|_| DiskError::InvalidArgument)?,
            ..Default::default()
        };
        param.set_name(name)?;
        Ok(param)
    }

    /// Stores a single path segment. The name must leave room for the
    /// terminating NUL and may not contain separators or NUL bytes.
    pub fn set_name(&mut self, name: &OsStr) -> Result<()> {
        let bytes = name.as_encoded_bytes();
        if bytes.is_empty() || bytes.contains(&0) || bytes.contains(&b'/') {
            return Err(DiskError::InvalidArgument);
        }
        if bytes.len() >= FAST_PATH_NAME_LEN {
            return Err(DiskError::FileNameTooLong);
        }

        self.filename = [0; FAST_PATH_NAME_LEN];
        self.filename[..bytes.len()].copy_from_slice(bytes);
        Ok(())
    }

    pub fn name(&self) -> &[u8] {
        let end = self.filename.iter().position(|&b| b == 0).unwrap_or(FAST_PATH_NAME_LEN);
        &self.filename[..end]
    }
}

pub trait FastPath: Send + Sync + Debug {
    fn is_supported(&self) -> bool;

    /// Creates an empty regular file `name` under `dir`.
    fn create(&self, dir: &Path, name: &OsStr, mode: u32) -> Result<()>;

    /// Removes `name` from `dir`.
    fn delete(&self, dir: &Path, name: &OsStr) -> Result<()>;

    /// Names the unnamed inode behind `file` as `path`.
    fn link(&self, path: &Path, file: &File) -> Result<()>;
}

/// Selected when the filesystem has no fast path; never touches the OS.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoFastPath;

impl FastPath for NoFastPath {
    fn is_supported(&self) -> bool {
        false
    }

    fn create(&self, _dir: &Path, _name: &OsStr, _mode: u32) -> Result<()> {
        Err(DiskError::FastPathUnsupported)
    }

    fn delete(&self, _dir: &Path, _name: &OsStr) -> Result<()> {
        Err(DiskError::FastPathUnsupported)
    }

    fn link(&self, _path: &Path, _file: &File) -> Result<()> {
        Err(DiskError::FastPathUnsupported)
    }
}

/// Splits `path` into its directory and final segment.
pub fn split_path(path: &Path) -> Result<(&Path, &OsStr)> {
    let name = path.file_name().ok_or(DiskError::InvalidArgument)?;
    let dir = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };
    Ok((dir, name))
}

#[cfg(target_os = "linux")]
pub use ioctl::IoctlFastPath;

#[cfg(target_os = "linux")]
mod ioctl {
    use super::*;
    use std::io;
    use std::os::fd::AsRawFd;
    use tracing::debug;

    fn fast_ioctl(file: &File, op: u32, param: &mut FastPathParam) -> io::Result<()> {
        // SAFETY: `param` is a live, exclusively borrowed repr(C) block the
        // driver reads and fills; the descriptor is owned by `file`.
        let ret = unsafe { libc::ioctl(file.as_raw_fd(), op as _, param as *mut FastPathParam) };
        if ret < 0 {
            return Err(io::Error::last_os_error());
        }
        Ok(())
    }

    /// Fast path backed by the vendor ioctls.
    #[derive(Debug, Default, Clone, Copy)]
    pub struct IoctlFastPath;

    impl IoctlFastPath {
        fn dir_op(&self, op: u32, dir: &Path, name: &OsStr, mode: u32) -> Result<()> {
            let mut param = FastPathParam::new(name, mode)?;
            let dir_file = File::open(dir).map_err(DiskError::Io)?;
            fast_ioctl(&dir_file, op, &mut param).map_err(|e| {
                debug!("fast path op {:#x} failed, dir: {:?}, name: {:?}, err: {:?}", op, dir, name, e);
                DiskError::Io(e)
            })
        }
    }

    impl FastPath for IoctlFastPath {
        fn is_supported(&self) -> bool {
            true
        }

        fn create(&self, dir: &Path, name: &OsStr, mode: u32) -> Result<()> {
            self.dir_op(OP_MAKE_NODE, dir, name, mode)
        }

        fn delete(&self, dir: &Path, name: &OsStr) -> Result<()> {
            self.dir_op(OP_UNLINK, dir, name, 0)
        }

        fn link(&self, path: &Path, file: &File) -> Result<()> {
            let (dir, name) = split_path(path)?;
            let dir_file = File::open(dir).map_err(DiskError::Io)?;

            let mut param = FastPathParam::default();
            fast_ioctl(&dir_file, OP_STAT, &mut param).map_err(DiskError::Io)?;

            param.mode = 0;
            param.set_name(name)?;
            fast_ioctl(file, OP_LINK, &mut param).map_err(|e| {
                debug!("fast path link failed, path: {:?}, err: {:?}", path, e);
                DiskError::Io(e)
            })
        }
    }

    pub(super) fn probe(dir: &Path) -> bool {
        let Ok(dir_file) = File::open(dir) else {
            return false;
        };
        let mut param = FastPathParam::default();
        fast_ioctl(&dir_file, OP_STAT, &mut param).is_ok()
    }
}

/// Asks the filesystem holding `dir` whether it answers the fast-path
/// ioctls. Meant for startup, its answer goes into
/// [`crate::FsConfig::fast_path`].
pub fn probe_fast_path(dir: &Path) -> bool {
    #[cfg(target_os = "linux")]
    {
        ioctl::probe(dir)
    }
    #[cfg(not(target_os = "linux"))]
    {
        let _ = dir;
        false
    }
}

/// Picks the fast-path implementation for the capability flag.
pub fn select_fast_path(enabled: bool) -> Arc<dyn FastPath> {
    #[cfg(target_os = "linux")]
    {
        if enabled {
            return Arc::new(IoctlFastPath);
        }
    }
    #[cfg(not(target_os = "linux"))]
    {
        let _ = enabled;
    }

    Arc::new(NoFastPath)
}
