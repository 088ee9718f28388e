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

//! The single seam between the filesystem layer and the operating system.
//!
//! Every path-based syscall made by [`crate::LocalFs`] goes through a
//! [`RawFs`], so the layer can be exercised against an instrumented
//! implementation.

use crate::os::long_path;
use std::fmt::Debug;
use std::fs::{self, File, Metadata, OpenOptions};
use std::io;
use std::path::Path;

/// `AT_SYMLINK_FOLLOW`: dereference `old_path` when it is a symbolic link.
#[cfg(unix)]
pub const AT_SYMLINK_FOLLOW: i32 = libc::AT_SYMLINK_FOLLOW;
#[cfg(not(unix))]
pub const AT_SYMLINK_FOLLOW: i32 = 0x400;

/// Directory a relative path passed to [`RawFs::link_at`] is resolved against.
#[derive(Debug, Clone, Copy)]
pub enum LinkDir<'a> {
    /// The process working directory (`AT_FDCWD`).
    Cwd,
    /// An open directory.
    Dir(&'a File),
}

pub trait RawFs: Send + Sync + Debug {
    /// Follows symbolic links.
    fn metadata(&self, path: &Path) -> io::Result<Metadata>;

    fn symlink_metadata(&self, path: &Path) -> io::Result<Metadata>;

    fn create_dir(&self, path: &Path) -> io::Result<()>;

    fn create_dir_all(&self, path: &Path) -> io::Result<()>;

    fn remove_file(&self, path: &Path) -> io::Result<()>;

    fn remove_dir(&self, path: &Path) -> io::Result<()>;

    fn remove_dir_all(&self, path: &Path) -> io::Result<()>;

    fn rename(&self, from: &Path, to: &Path) -> io::Result<()>;

    fn open(&self, path: &Path, opts: &OpenOptions) -> io::Result<File>;

    fn link_at(&self, old_dir: LinkDir<'_>, old_path: &Path, new_dir: LinkDir<'_>, new_path: &Path, flags: i32) -> io::Result<()>;
}

/// [`RawFs`] backed by `std::fs`.
#[derive(Debug, Default, Clone, Copy)]
pub struct StdFs;

impl RawFs for StdFs {
    fn metadata(&self, path: &Path) -> io::Result<Metadata> {
        fs::metadata(long_path(path))
    }

    fn symlink_metadata(&self, path: &Path) -> io::Result<Metadata> {
        fs::symlink_metadata(long_path(path))
    }

    fn create_dir(&self, path: &Path) -> io::Result<()> {
        fs::create_dir(long_path(path))
    }

    fn create_dir_all(&self, path: &Path) -> io::Result<()> {
        fs::create_dir_all(long_path(path))
    }

    fn remove_file(&self, path: &Path) -> io::Result<()> {
        fs::remove_file(long_path(path))
    }

    fn remove_dir(&self, path: &Path) -> io::Result<()> {
        fs::remove_dir(long_path(path))
    }

    fn remove_dir_all(&self, path: &Path) -> io::Result<()> {
        fs::remove_dir_all(long_path(path))
    }

    fn rename(&self, from: &Path, to: &Path) -> io::Result<()> {
        fs::rename(long_path(from), long_path(to))
    }

    fn open(&self, path: &Path, opts: &OpenOptions) -> io::Result<File> {
        opts.open(long_path(path))
    }

    #[cfg(unix)]
    fn link_at(&self, old_dir: LinkDir<'_>, old_path: &Path, new_dir: LinkDir<'_>, new_path: &Path, flags: i32) -> io::Result<()> {
        use std::ffi::CString;
        use std::os::fd::AsRawFd;
        use std::os::unix::ffi::OsStrExt;

        fn dir_fd(dir: LinkDir<'_>) -> libc::c_int {
            match dir {
                LinkDir::Cwd => libc::AT_FDCWD,
                LinkDir::Dir(f) => f.as_raw_fd(),
            }
        }

        let old = CString::new(old_path.as_os_str().as_bytes()).map_err(io::Error::other)?;
        let new = CString::new(new_path.as_os_str().as_bytes()).map_err(io::Error::other)?;

        // SAFETY: both strings are NUL terminated and live across the call;
        // descriptors are either AT_FDCWD or borrowed from open files.
        let ret = unsafe { libc::linkat(dir_fd(old_dir), old.as_ptr(), dir_fd(new_dir), new.as_ptr(), flags) };
        if ret < 0 {
            return Err(io::Error::last_os_error());
        }

        Ok(())
    }

    #[cfg(not(unix))]
    fn link_at(&self, old_dir: LinkDir<'_>, old_path: &Path, new_dir: LinkDir<'_>, new_path: &Path, _flags: i32) -> io::Result<()> {
        match (old_dir, new_dir) {
            (LinkDir::Cwd, LinkDir::Cwd) => fs::hard_link(long_path(old_path), long_path(new_path)),
            _ => Err(io::Error::from(io::ErrorKind::Unsupported)),
        }
    }
}
