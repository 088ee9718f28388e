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

//! Single-path primitives of the local filesystem layer.
//!
//! Every operation validates its path(s) before touching the OS, issues one
//! call through the [`RawFs`] seam and translates the raw error in the scope
//! of that operation.

use crate::config::FsConfig;
use crate::delete::{DeleteStrategy, strategy_for};
use crate::error::{DiskError, Result};
use crate::error_conv::{
    to_file_error, to_mkdir_error, to_parent_dir_error, to_remove_all_error, to_remove_dir_error, to_rename_error,
    to_volume_error,
};
use crate::fast_path::{FastPath, select_fast_path};
use crate::os::{set_nonblocking, validate_path};
use crate::raw::{LinkDir, RawFs, StdFs};
use std::fs::{File, Metadata, OpenOptions};
use std::io::{self, ErrorKind, Seek, SeekFrom};
use std::path::Path;
use std::sync::Arc;
use tracing::warn;

/// Outcomes callers routinely branch on. Anything else is logged once where
/// it is translated.
pub(crate) fn is_expected(err: &DiskError) -> bool {
    matches!(
        err,
        DiskError::FileNotFound
            | DiskError::VolumeNotFound
            | DiskError::VolumeExists
            | DiskError::VolumeNotEmpty
            | DiskError::FileNameTooLong
            | DiskError::InvalidArgument
    )
}

pub(crate) fn log_unexpected(op: &str, path: &Path, err: &DiskError) {
    if !is_expected(err) {
        warn!("{} failed, path: {:?}, err: {:?}", op, path, err);
    }
}

/// Path-oriented file API over one local filesystem tree.
///
/// The OS seam, the fast-path strategy and the delete strategy are chosen
/// when the value is built and never change afterwards, so a `LocalFs` can
/// be shared freely between threads.
#[derive(Debug, Clone)]
pub struct LocalFs {
    config: FsConfig,
    raw: Arc<dyn RawFs>,
    fast_path: Arc<dyn FastPath>,
    deleter: Arc<dyn DeleteStrategy>,
}

impl Default for LocalFs {
    fn default() -> Self {
        Self::new(FsConfig::default())
    }
}

impl LocalFs {
    pub fn new(config: FsConfig) -> Self {
        let fast_path = select_fast_path(config.fast_path);
        let deleter = strategy_for(config.host_os);
        Self {
            config,
            raw: Arc::new(StdFs),
            fast_path,
            deleter,
        }
    }

    pub fn from_env() -> Self {
        Self::new(FsConfig::from_env())
    }

    pub fn with_raw_fs(mut self, raw: Arc<dyn RawFs>) -> Self {
        self.raw = raw;
        self
    }

    pub fn with_fast_path(mut self, fast_path: Arc<dyn FastPath>) -> Self {
        self.fast_path = fast_path;
        self
    }

    pub fn with_delete_strategy(mut self, deleter: Arc<dyn DeleteStrategy>) -> Self {
        self.deleter = deleter;
        self
    }

    pub fn config(&self) -> &FsConfig {
        &self.config
    }

    pub(crate) fn raw(&self) -> &dyn RawFs {
        self.raw.as_ref()
    }

    pub(crate) fn fast_path(&self) -> &dyn FastPath {
        self.fast_path.as_ref()
    }

    pub(crate) fn deleter(&self) -> &dyn DeleteStrategy {
        self.deleter.as_ref()
    }

    /// Metadata of `path`, file or directory alike.
    pub fn stat(&self, path: &Path) -> Result<Metadata> {
        validate_path(path)?;
        self.raw.metadata(path).map_err(to_file_error)
    }

    /// Metadata of a directory used as a volume. A symbolic link is accepted
    /// only when it resolves to a directory.
    pub fn stat_volume(&self, path: &Path) -> Result<Metadata> {
        validate_path(path)?;

        let meta = match self.raw.metadata(path) {
            Ok(meta) => meta,
            // A dangling link reads as absent.
            Err(e) if e.kind() == ErrorKind::NotFound => return Err(DiskError::VolumeNotFound),
            Err(e) => {
                let err = to_volume_error(e);
                log_unexpected("stat_volume", path, &err);
                return Err(err);
            }
        };

        if !meta.is_dir() {
            return Err(DiskError::VolumeAccessDenied);
        }

        Ok(meta)
    }

    /// Metadata of a directory. A file at `path` reads as absent.
    pub fn stat_dir(&self, path: &Path) -> Result<Metadata> {
        let meta = self.stat_logged("stat_dir", path)?;
        if !meta.is_dir() {
            return Err(DiskError::FileNotFound);
        }
        Ok(meta)
    }

    /// Metadata of a non-directory. A directory at `path` reads as absent.
    pub fn stat_file(&self, path: &Path) -> Result<Metadata> {
        let meta = self.stat_logged("stat_file", path)?;
        if meta.is_dir() {
            return Err(DiskError::FileNotFound);
        }
        Ok(meta)
    }

    pub fn is_file(&self, path: &Path) -> bool {
        self.stat(path).is_ok_and(|m| m.is_file())
    }

    fn stat_logged(&self, op: &str, path: &Path) -> Result<Metadata> {
        self.stat(path).inspect_err(|err| log_unexpected(op, path, err))
    }

    /// Creates exactly one directory level; the parent must exist.
    pub fn mkdir(&self, path: &Path) -> Result<()> {
        validate_path(path)?;
        self.raw.create_dir(path).map_err(|e| {
            let err = to_mkdir_error(e);
            if !matches!(err, DiskError::VolumeExists | DiskError::DiskAccessDenied) {
                warn!("mkdir failed, path: {:?}, err: {:?}", path, err);
            }
            err
        })
    }

    /// Removes a single file. A missing file is reported as
    /// [`DiskError::FileNotFound`] and left to the caller to ignore.
    #[tracing::instrument(level = "debug", skip_all)]
    pub fn remove_file(&self, path: &Path) -> Result<()> {
        validate_path(path)?;
        self.raw.remove_file(path).map_err(|e| {
            let err = to_file_error(e);
            log_unexpected("remove_file", path, &err);
            err
        })
    }

    /// Removes an empty directory.
    pub fn remove_dir(&self, path: &Path) -> Result<()> {
        validate_path(path)?;
        self.raw.remove_dir(path).map_err(|e| {
            let err = to_remove_dir_error(e);
            log_unexpected("remove_dir", path, &err);
            err
        })
    }

    /// Removes `path` and everything below it. A missing path is not an error.
    pub fn remove_all(&self, path: &Path) -> Result<()> {
        validate_path(path)?;

        let res = match self.raw.remove_dir_all(path) {
            Err(e) if crate::error_conv::is_sys_err_not_dir(&e) => self.raw.remove_file(path),
            res => res,
        };

        match res {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => {
                let err = to_remove_all_error(e);
                log_unexpected("remove_all", path, &err);
                Err(err)
            }
        }
    }

    /// Renames `src` to `dst`. The parent of `dst` must already exist.
    pub fn simple_rename_file(&self, src: &Path, dst: &Path) -> Result<()> {
        validate_path(src)?;
        validate_path(dst)?;
        self.rename_inner("simple_rename_file", src, dst)
    }

    /// Renames `src` to `dst`, creating the parent chain of `dst` first.
    #[tracing::instrument(level = "debug", skip_all)]
    pub fn rename_file(&self, src: &Path, dst: &Path) -> Result<()> {
        validate_path(src)?;
        validate_path(dst)?;

        self.make_parent_dirs(dst)?;
        self.rename_inner("rename_file", src, dst)
    }

    fn rename_inner(&self, op: &str, src: &Path, dst: &Path) -> Result<()> {
        self.raw.rename(src, dst).map_err(|e| {
            let err = to_rename_error(e);
            if !is_expected(&err) {
                warn!("{} failed, src: {:?}, dst: {:?}, err: {:?}", op, src, dst, err);
            }
            err
        })
    }

    pub(crate) fn make_parent_dirs(&self, path: &Path) -> Result<()> {
        let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) else {
            return Ok(());
        };

        self.raw.create_dir_all(parent).map_err(|e| {
            let err = to_parent_dir_error(e);
            warn!("make parent dirs failed, path: {:?}, err: {:?}", parent, err);
            err
        })
    }

    /// Opens a regular file for reading, positioned at `offset`, and
    /// returns it along with its size.
    pub fn open_file(&self, path: &Path, offset: u64) -> Result<(File, u64)> {
        validate_path(path)?;

        let mut opts = OpenOptions::new();
        opts.read(true);
        // A FIFO would otherwise block the open until a writer shows up.
        #[cfg(unix)]
        {
            use std::os::unix::fs::OpenOptionsExt;
            opts.custom_flags(libc::O_NONBLOCK);
        }
        let mut file = self.raw.open(path, &opts).map_err(to_file_error)?;

        let meta = file.metadata().map_err(to_file_error)?;
        if !meta.is_file() {
            return Err(DiskError::IsNotRegular);
        }

        set_nonblocking(&file, false).map_err(|e| {
            let err = to_file_error(e);
            log_unexpected("open_file", path, &err);
            err
        })?;

        if offset > 0 {
            file.seek(SeekFrom::Start(offset)).map_err(|e| {
                let err = to_file_error(e);
                log_unexpected("open_file", path, &err);
                err
            })?;
        }

        Ok((file, meta.len()))
    }

    /// Creates the hard link `new_path` for `old_path`, each resolved
    /// against its directory.
    pub fn link_at(&self, old_dir: LinkDir<'_>, old_path: &Path, new_dir: LinkDir<'_>, new_path: &Path, flags: i32) -> Result<()> {
        validate_path(old_path)?;
        validate_path(new_path)?;

        self.raw
            .link_at(old_dir, old_path, new_dir, new_path, flags)
            .map_err(|e| link_error(old_path, new_path, e))
    }
}

fn link_error(old_path: &Path, new_path: &Path, e: io::Error) -> DiskError {
    let err = to_file_error(e);
    if !is_expected(&err) {
        warn!("link_at failed, old: {:?}, new: {:?}, err: {:?}", old_path, new_path, err);
    }
    err
}
