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

//! Deletion that keeps directory trees tidy and copes with hosts where an
//! open file cannot simply be unlinked.

use crate::config::HostOs;
use crate::error::{DiskError, Result};
use crate::error_conv::{is_sys_err_not_empty, to_delete_error};
use crate::fast_path::split_path;
use crate::fs::LocalFs;
use crate::os::validate_path;
use rustfs_utils::path::{has_trailing_separator, is_strictly_within};
use std::fmt::Debug;
use std::io::{self, ErrorKind};
use std::path::Path;
use std::sync::Arc;
use tracing::{debug, warn};
use uuid::Uuid;

/// How a file that other handles may still hold open is removed.
pub trait DeleteStrategy: Send + Sync + Debug {
    /// Removes `path`, which lives below `base`. `scratch` is a directory
    /// on the same filesystem the strategy may park the file in first.
    fn remove_locked(&self, fs: &LocalFs, base: &Path, path: &Path, scratch: &Path) -> Result<()>;
}

/// Unlinks in place. Right wherever open files can be deleted.
#[derive(Debug, Default, Clone, Copy)]
pub struct DirectDelete;

impl DeleteStrategy for DirectDelete {
    fn remove_locked(&self, fs: &LocalFs, base: &Path, path: &Path, _scratch: &Path) -> Result<()> {
        fs.delete_file(base, path)
    }
}

/// Moves the file under a random name in `scratch` before deleting it.
///
/// A file still held open is only marked for deletion on Windows: its name
/// keeps the parent directory non-empty and cannot be reused until the
/// last handle closes. Renaming it away first frees both the name and the
/// directory immediately.
#[derive(Debug, Default, Clone, Copy)]
pub struct RenameThenDelete;

impl DeleteStrategy for RenameThenDelete {
    fn remove_locked(&self, fs: &LocalFs, base: &Path, path: &Path, scratch: &Path) -> Result<()> {
        let parked = scratch.join(Uuid::new_v4().to_string());

        if let Err(err) = fs.rename_file(path, &parked) {
            debug!("remove_locked rename failed, deleting in place, path: {:?}, err: {:?}", path, err);
            return fs.delete_file(base, path);
        }

        if let Some(parent) = path.parent()
            && let Err(err) = fs.delete_file(base, parent)
        {
            debug!("remove_locked parent cleanup failed, path: {:?}, err: {:?}", parent, err);
        }

        fs.delete_file(scratch, &parked)
    }
}

/// Picks the delete strategy for the host.
pub fn strategy_for(host_os: HostOs) -> Arc<dyn DeleteStrategy> {
    if host_os.can_delete_open_files() {
        Arc::new(DirectDelete)
    } else {
        Arc::new(RenameThenDelete)
    }
}

impl LocalFs {
    /// Removes the file or empty directory at `path`, then each parent it
    /// leaves empty, up to but excluding `base`.
    ///
    /// Paths outside `base` are ignored and a missing `path` is not an
    /// error. A non-empty directory is kept; it is reported as
    /// [`DiskError::FileNotFound`] only when `path` names a directory object
    /// (trailing separator).
    #[tracing::instrument(level = "debug", skip(self))]
    pub fn delete_file(&self, base: &Path, path: &Path) -> Result<()> {
        validate_path(base)?;
        validate_path(path)?;

        if !is_strictly_within(base, path) {
            return Ok(());
        }

        if self.fast_path().is_supported()
            && let Ok((dir, name)) = split_path(path)
        {
            match self.fast_path().delete(dir, name) {
                Ok(()) => {
                    self.prune_parents(base, path);
                    return Ok(());
                }
                Err(err) => debug!("fast path delete failed, path: {:?}, err: {:?}", path, err),
            }
        }

        match self.remove_entry(path) {
            Ok(()) => {}
            Err(e) if is_sys_err_not_empty(&e) => {
                if has_trailing_separator(path) {
                    return Err(DiskError::FileNotFound);
                }
                return Ok(());
            }
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(()),
            Err(e) => {
                let err = to_delete_error(e);
                warn!("delete_file failed, path: {:?}, err: {:?}", path, err);
                return Err(err);
            }
        }

        self.prune_parents(base, path);
        Ok(())
    }

    /// Removes a file that may still be open elsewhere, using the delete
    /// strategy chosen for the host. Only the error of the final delete is
    /// returned.
    pub fn remove_locked(&self, base: &Path, path: &Path, scratch: &Path) -> Result<()> {
        validate_path(base)?;
        validate_path(path)?;
        validate_path(scratch)?;

        self.deleter().remove_locked(self, base, path, scratch)
    }

    /// Unlinks a file, or removes an empty directory.
    fn remove_entry(&self, path: &Path) -> io::Result<()> {
        match self.raw().remove_file(path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Err(e),
            Err(e) => match self.raw().symlink_metadata(path) {
                Ok(meta) if meta.is_dir() => self.raw().remove_dir(path),
                _ => Err(e),
            },
        }
    }

    fn prune_parents(&self, base: &Path, path: &Path) {
        for dir in path.ancestors().skip(1) {
            if !is_strictly_within(base, dir) {
                break;
            }

            if let Err(e) = self.raw().remove_dir(dir) {
                if !is_sys_err_not_empty(&e) && e.kind() != ErrorKind::NotFound {
                    debug!("prune parents stopped, dir: {:?}, err: {:?}", dir, e);
                }
                break;
            }
        }
    }
}
